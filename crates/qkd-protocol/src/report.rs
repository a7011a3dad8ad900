//! Session results.

use serde::{Deserialize, Serialize};

use crate::bits::Bit;
use crate::error::QkdResult;
use crate::party::PartyRecord;
use crate::session::SessionState;
use crate::sift::{SiftResult, sift};

/// Fidelity below which a session is flagged as tampered with.
///
/// Intercept-resend on every qubit gives about 0.75; a quiet channel gives
/// 1.0 less device noise.
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 0.9;

/// Everything one finished session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Number of rounds.
    pub rounds: usize,
    /// Whether Eve relayed the register.
    pub eavesdropper: bool,
    /// Alice's choices.
    pub alice: PartyRecord,
    /// Bob's bases and decoded bits.
    pub bob: PartyRecord,
    /// Eve's bases and decoded bits, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eve: Option<PartyRecord>,
    /// Alice's sifted key.
    pub sifted_alice: Vec<Bit>,
    /// Bob's sifted key.
    pub sifted_bob: Vec<Bit>,
    /// Sifted rounds where the keys agree.
    pub match_count: usize,
    /// `match_count / len(sifted)`.
    pub fidelity: f64,
    /// `1 - fidelity`.
    pub loss: f64,
    /// How often Eve's bits agree with Alice's where their bases agreed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eve_fidelity: Option<f64>,
    /// State the session ended in.
    pub final_state: SessionState,
}

impl SessionReport {
    pub(crate) fn new(
        alice: PartyRecord,
        bob: PartyRecord,
        eve: Option<PartyRecord>,
        sifted: SiftResult,
        final_state: SessionState,
    ) -> QkdResult<Self> {
        let fidelity = sifted.fidelity()?;
        let eve_fidelity = match &eve {
            Some(eve) => sift(&alice.bases, &alice.bits, &eve.bases, &eve.bits)?
                .fidelity()
                .ok(),
            None => None,
        };
        Ok(Self {
            rounds: alice.bits.len(),
            eavesdropper: eve.is_some(),
            alice,
            bob,
            eve,
            match_count: sifted.match_count,
            sifted_alice: sifted.sifted_a,
            sifted_bob: sifted.sifted_b,
            fidelity,
            loss: 1.0 - fidelity,
            eve_fidelity,
            final_state,
        })
    }

    /// Length of the sifted keys.
    pub fn key_length(&self) -> usize {
        self.sifted_alice.len()
    }

    /// Observed error rate of the sifted key.
    pub fn error_rate(&self) -> f64 {
        self.loss
    }

    /// Whether fidelity fell below `threshold`.
    pub fn eavesdropping_suspected(&self, threshold: f64) -> bool {
        self.fidelity < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Basis::{X, Z};
    use crate::bits::Bit::{One, Zero};
    use crate::party::Role;

    fn record(name: &str, role: Role, bits: Vec<Bit>, bases: Vec<crate::bits::Basis>) -> PartyRecord {
        PartyRecord {
            name: name.into(),
            role,
            bits,
            bases,
        }
    }

    #[test]
    fn test_report_statistics() {
        let alice = record("alice", Role::Preparer, vec![One, Zero, One, One], vec![Z, Z, X, X]);
        let bob = record("bob", Role::Measurer, vec![One, One, Zero, Zero], vec![Z, X, X, Z]);
        let sifted = sift(&alice.bases, &alice.bits, &bob.bases, &bob.bits).unwrap();

        let report = SessionReport::new(alice, bob, None, sifted, SessionState::Done).unwrap();
        assert_eq!(report.rounds, 4);
        assert_eq!(report.key_length(), 2);
        assert_eq!(report.sifted_alice, vec![One, One]);
        assert_eq!(report.sifted_bob, vec![One, Zero]);
        assert!((report.fidelity - 0.5).abs() < f64::EPSILON);
        assert!((report.error_rate() - 0.5).abs() < f64::EPSILON);
        assert!(report.eavesdropping_suspected(DEFAULT_DETECTION_THRESHOLD));
        assert!(!report.eavesdropper);
        assert_eq!(report.eve_fidelity, None);
    }

    #[test]
    fn test_report_with_eve() {
        let alice = record("alice", Role::Preparer, vec![One, Zero], vec![Z, X]);
        let eve = record("eve", Role::Relay, vec![One, One], vec![Z, X]);
        let bob = record("bob", Role::Measurer, vec![One, Zero], vec![Z, X]);
        let sifted = sift(&alice.bases, &alice.bits, &bob.bases, &bob.bits).unwrap();

        let report = SessionReport::new(alice, bob, Some(eve), sifted, SessionState::Done).unwrap();
        assert!(report.eavesdropper);
        assert_eq!(report.eve_fidelity, Some(0.5));
        assert!(!report.eavesdropping_suspected(DEFAULT_DETECTION_THRESHOLD));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["final_state"], "done");
        assert_eq!(json["sifted_alice"], serde_json::json!([1, 0]));
    }
}
