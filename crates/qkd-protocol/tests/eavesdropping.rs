//! Statistical detection of an intercept-resend eavesdropper.
//!
//! A relay in the wrong basis half the time, followed by a coin flip at Bob,
//! leaves a quarter of the sifted key wrong. Over many sessions the mean
//! fidelity settles near 0.75.

use std::sync::Arc;

use qkd_adapter_sim::SimulatorBackend;
use qkd_hal::Backend;
use qkd_protocol::{
    DEFAULT_DETECTION_THRESHOLD, SessionConfig, SessionReport, TrialOutcome, TrialRunner,
    run_trials,
};

const TRIALS: usize = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_relay_drives_fidelity_towards_three_quarters() {
    let backend = Arc::new(SimulatorBackend::new().with_seed(2024));
    let config = SessionConfig::new(127)
        .with_seed(2024)
        .with_eavesdropper(true);

    let summary = run_trials(backend, config, TRIALS).await.unwrap();

    assert_eq!(summary.completed, TRIALS);
    let mean = summary.mean_fidelity.unwrap();
    let (lower, upper) = summary.confidence_interval.unwrap();
    assert!(lower <= mean && mean <= upper);
    // Standard error of the mean is about 0.004 here.
    assert!((mean - 0.75).abs() < 0.03, "mean fidelity {mean}");
    assert!(upper < DEFAULT_DETECTION_THRESHOLD);
    assert!(summary.eavesdropping_suspected(DEFAULT_DETECTION_THRESHOLD));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_quiet_channel_is_not_flagged() {
    let backend = Arc::new(SimulatorBackend::new().with_seed(2025));
    let config = SessionConfig::new(127).with_seed(2025);

    let summary = run_trials(backend, config, 50).await.unwrap();

    assert_eq!(summary.completed, 50);
    assert!((summary.mean_fidelity.unwrap() - 1.0).abs() < f64::EPSILON);
    assert!(!summary.eavesdropping_suspected(DEFAULT_DETECTION_THRESHOLD));
}

#[tokio::test]
async fn test_runner_reports_every_trial() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let backend = Arc::new(SimulatorBackend::new().with_seed(7));
    let config = SessionConfig::new(16).with_seed(7).with_eavesdropper(true);
    let done = AtomicUsize::new(0);

    let outcomes = TrialRunner::new(backend, config)
        .with_concurrency(3)
        .run(12, |_| {
            done.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 12);
    assert_eq!(done.load(Ordering::SeqCst), 12);
    assert!(
        outcomes
            .iter()
            .all(|o| !matches!(o, TrialOutcome::Aborted(_)))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_seeded_batches_replay() {
    let backend: Arc<dyn Backend> = Arc::new(SimulatorBackend::new().with_seed(31));
    let config = SessionConfig::new(64).with_seed(31).with_eavesdropper(true);

    let mut batches: Vec<Vec<Option<SessionReport>>> = vec![];
    for _ in 0..4 {
        let outcomes = TrialRunner::new(Arc::clone(&backend), config.clone())
            .run(40, |_| {})
            .await
            .unwrap();
        batches.push(
            outcomes
                .into_iter()
                .map(|o| match o {
                    TrialOutcome::Completed(report) => Some(*report),
                    _ => None,
                })
                .collect(),
        );
    }

    assert!(batches[0].iter().all(Option::is_some));
    for batch in &batches[1..] {
        assert_eq!(batch, &batches[0]);
    }
}
