//! Repeated independent sessions and their statistics.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use qkd_hal::Backend;

use crate::error::{QkdError, QkdResult};
use crate::random::RandomSource;
use crate::report::SessionReport;
use crate::session::{Session, SessionConfig};

/// z-score of a two-sided 95% interval.
const Z_95: f64 = 1.96;

/// Default number of sessions in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// How one trial ended.
#[derive(Debug, Clone)]
pub enum TrialOutcome {
    /// The session finished.
    Completed(Box<SessionReport>),
    /// The bases never agreed.
    Empty,
    /// The session aborted; the message is the error.
    Aborted(String),
}

/// Aggregate fidelity over many sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Trials requested.
    pub trials: usize,
    /// Sessions that reached `Done`.
    pub completed: usize,
    /// Sessions without shared key material.
    pub empty: usize,
    /// Sessions that aborted.
    pub aborted: usize,
    /// Mean fidelity of completed sessions.
    pub mean_fidelity: Option<f64>,
    /// Sample standard deviation of fidelity.
    pub std_dev: Option<f64>,
    /// 95% confidence interval of the mean.
    pub confidence_interval: Option<(f64, f64)>,
    /// Mean sifted key length of completed sessions.
    pub mean_key_length: Option<f64>,
}

impl TrialSummary {
    /// Summarise a batch of outcomes.
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let mut fidelities = vec![];
        let mut key_lengths = 0usize;
        let mut empty = 0;
        let mut aborted = 0;
        for outcome in outcomes {
            match outcome {
                TrialOutcome::Completed(report) => {
                    fidelities.push(report.fidelity);
                    key_lengths += report.key_length();
                }
                TrialOutcome::Empty => empty += 1,
                TrialOutcome::Aborted(_) => aborted += 1,
            }
        }

        let n = fidelities.len();
        let mean = (n > 0).then(|| fidelities.iter().sum::<f64>() / n as f64);
        let std_dev = mean.filter(|_| n > 1).map(|m| {
            let var = fidelities.iter().map(|f| (f - m).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        });
        let confidence_interval = mean.zip(std_dev).map(|(m, sd)| {
            let half = Z_95 * sd / (n as f64).sqrt();
            (m - half, m + half)
        });

        Self {
            trials: outcomes.len(),
            completed: n,
            empty,
            aborted,
            mean_fidelity: mean,
            std_dev,
            confidence_interval,
            mean_key_length: (n > 0).then(|| key_lengths as f64 / n as f64),
        }
    }

    /// Whether the mean fidelity sits clearly below `threshold`.
    ///
    /// Uses the upper end of the confidence interval, so a handful of
    /// noisy sessions does not raise the alarm.
    pub fn eavesdropping_suspected(&self, threshold: f64) -> bool {
        match (self.confidence_interval, self.mean_fidelity) {
            (Some((_, upper)), _) => upper < threshold,
            (None, Some(mean)) => mean < threshold,
            (None, None) => false,
        }
    }
}

/// Runs many independent sessions against one backend.
pub struct TrialRunner {
    backend: Arc<dyn Backend>,
    config: SessionConfig,
    concurrency: usize,
}

impl TrialRunner {
    /// Create a runner; each trial uses `config` with its own seed.
    pub fn new(backend: Arc<dyn Backend>, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Limit how many sessions run at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run `trials` sessions, calling `on_done` after each finishes.
    ///
    /// Per-trial seeds derive from the configured seed, so a seeded batch
    /// on a seeded backend replays regardless of completion order. A trial
    /// whose task panics is reported as [`TrialOutcome::Aborted`].
    #[instrument(skip(self, on_done), fields(backend = self.backend.name()))]
    pub async fn run<F>(&self, trials: usize, on_done: F) -> QkdResult<Vec<TrialOutcome>>
    where
        F: Fn(&TrialOutcome),
    {
        self.config.validate()?;

        let mut seeds = match self.config.seed {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::from_entropy(),
        };
        let configs: Vec<SessionConfig> = (0..trials)
            .map(|_| {
                let mut config = self.config.clone();
                config.seed = Some(seeds.next_seed());
                config
            })
            .collect();

        let mut in_flight = stream::iter(configs.into_iter().enumerate())
            .map(|(index, config)| {
                let task = tokio::spawn(run_one(Arc::clone(&self.backend), config));
                async move { (index, task.await) }
            })
            .buffer_unordered(self.concurrency);

        let mut outcomes: Vec<Option<TrialOutcome>> = vec![None; trials];
        while let Some((index, joined)) = in_flight.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                warn!(trial = index, error = %e, "trial task failed");
                TrialOutcome::Aborted(QkdError::Task(e.to_string()).to_string())
            });
            on_done(&outcome);
            outcomes[index] = Some(outcome);
        }

        let outcomes: Vec<TrialOutcome> = outcomes.into_iter().flatten().collect();
        debug!(finished = outcomes.len(), "trials finished");
        Ok(outcomes)
    }
}

async fn run_one(backend: Arc<dyn Backend>, config: SessionConfig) -> TrialOutcome {
    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => return TrialOutcome::Aborted(e.to_string()),
    };
    match session.run(backend.as_ref()).await {
        Ok(report) => TrialOutcome::Completed(Box::new(report)),
        Err(QkdError::EmptySift { .. }) => TrialOutcome::Empty,
        Err(e) => TrialOutcome::Aborted(e.to_string()),
    }
}

/// Run `trials` independent sessions and summarise them.
pub async fn run_trials(
    backend: Arc<dyn Backend>,
    config: SessionConfig,
    trials: usize,
) -> QkdResult<TrialSummary> {
    let outcomes = TrialRunner::new(backend, config)
        .run(trials, |_| {})
        .await?;
    let summary = TrialSummary::from_outcomes(&outcomes);
    if summary.aborted > 0 {
        warn!(aborted = summary.aborted, "some trials aborted");
    }
    info!(
        completed = summary.completed,
        mean_fidelity = ?summary.mean_fidelity,
        "trials summarised"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Basis::Z;
    use crate::bits::Bit::{One, Zero};
    use crate::party::{PartyRecord, Role};
    use crate::session::SessionState;

    fn completed(fidelity: f64) -> TrialOutcome {
        let record = PartyRecord {
            name: "alice".into(),
            role: Role::Preparer,
            bits: vec![One, Zero],
            bases: vec![Z, Z],
        };
        TrialOutcome::Completed(Box::new(SessionReport {
            rounds: 2,
            eavesdropper: false,
            alice: record.clone(),
            bob: record,
            eve: None,
            sifted_alice: vec![One, Zero],
            sifted_bob: vec![One, Zero],
            match_count: 2,
            fidelity,
            loss: 1.0 - fidelity,
            eve_fidelity: None,
            final_state: SessionState::Done,
        }))
    }

    #[test]
    fn test_summary_statistics() {
        let outcomes = vec![
            completed(1.0),
            completed(0.5),
            completed(0.75),
            TrialOutcome::Empty,
            TrialOutcome::Aborted("boom".into()),
        ];
        let summary = TrialSummary::from_outcomes(&outcomes);

        assert_eq!(summary.trials, 5);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.aborted, 1);
        assert!((summary.mean_fidelity.unwrap() - 0.75).abs() < 1e-12);
        assert!((summary.std_dev.unwrap() - 0.25).abs() < 1e-12);
        let (lo, hi) = summary.confidence_interval.unwrap();
        assert!(lo < 0.75 && hi > 0.75);
        assert!((summary.mean_key_length.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = TrialSummary::from_outcomes(&[]);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.mean_fidelity, None);
        assert_eq!(summary.confidence_interval, None);
        assert!(!summary.eavesdropping_suspected(0.9));
    }

    #[test]
    fn test_single_completed_trial_has_no_interval() {
        let summary = TrialSummary::from_outcomes(&[completed(0.8)]);
        assert_eq!(summary.std_dev, None);
        assert!(summary.eavesdropping_suspected(0.9));
    }
}
