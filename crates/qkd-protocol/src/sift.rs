//! Basis reconciliation.

use serde::{Deserialize, Serialize};

use crate::bits::{Basis, Bit};
use crate::error::{QkdError, QkdResult};

/// Keys that survive basis reconciliation.
///
/// `sifted_a[k]` and `sifted_b[k]` always come from the same round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiftResult {
    /// Sender bits at agreeing rounds.
    pub sifted_a: Vec<Bit>,
    /// Receiver bits at agreeing rounds.
    pub sifted_b: Vec<Bit>,
    /// Agreeing rounds where the bits also agree.
    pub match_count: usize,
    /// Number of rounds compared.
    pub rounds: usize,
}

impl SiftResult {
    /// Length of the sifted keys.
    pub fn len(&self) -> usize {
        self.sifted_a.len()
    }

    /// Whether no round had agreeing bases.
    pub fn is_empty(&self) -> bool {
        self.sifted_a.is_empty()
    }

    /// Agreeing rounds where the bits differ.
    pub fn mismatch_count(&self) -> usize {
        self.len() - self.match_count
    }

    /// Fraction of sifted rounds whose bits agree.
    pub fn fidelity(&self) -> QkdResult<f64> {
        if self.is_empty() {
            return Err(QkdError::EmptySift {
                rounds: self.rounds,
            });
        }
        Ok(self.match_count as f64 / self.len() as f64)
    }

    /// `1 - fidelity`, the observed error rate of the sifted key.
    pub fn loss(&self) -> QkdResult<f64> {
        Ok(1.0 - self.fidelity()?)
    }
}

/// Keep the rounds where both parties chose the same basis.
///
/// All four sequences must have the same length.
pub fn sift(
    basis_a: &[Basis],
    bits_a: &[Bit],
    basis_b: &[Basis],
    bits_b: &[Bit],
) -> QkdResult<SiftResult> {
    let n = basis_a.len();
    if bits_a.len() != n || basis_b.len() != n || bits_b.len() != n {
        return Err(QkdError::Validation(format!(
            "sifting needs equal lengths, got bases {}/{} and bits {}/{}",
            basis_a.len(),
            basis_b.len(),
            bits_a.len(),
            bits_b.len()
        )));
    }

    let mut result = SiftResult {
        sifted_a: vec![],
        sifted_b: vec![],
        match_count: 0,
        rounds: n,
    };
    for i in 0..n {
        if basis_a[i] == basis_b[i] {
            result.sifted_a.push(bits_a[i]);
            result.sifted_b.push(bits_b[i]);
            if bits_a[i] == bits_b[i] {
                result.match_count += 1;
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Basis::{X, Z};
    use Bit::{One, Zero};

    #[test]
    fn test_sift_keeps_agreeing_rounds() {
        let result = sift(
            &[Z, Z, X, X],
            &[One, Zero, One, One],
            &[Z, X, X, Z],
            &[One, One, One, Zero],
        )
        .unwrap();

        assert_eq!(result.sifted_a, vec![One, One]);
        assert_eq!(result.sifted_b, vec![One, One]);
        assert_eq!(result.match_count, 2);
        assert!((result.fidelity().unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(result.loss().unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_sift_counts_errors() {
        let result = sift(&[Z, X], &[One, Zero], &[Z, X], &[Zero, Zero]).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.match_count, 1);
        assert_eq!(result.mismatch_count(), 1);
        assert!((result.fidelity().unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_sift_is_explicit() {
        let result = sift(&[Z, X, Z], &[One; 3], &[X, Z, X], &[One; 3]).unwrap();
        assert!(result.is_empty());
        assert!(matches!(
            result.fidelity(),
            Err(QkdError::EmptySift { rounds: 3 })
        ));
        assert!(result.loss().is_err());
    }

    #[test]
    fn test_length_mismatch_fails_fast() {
        let err = sift(&[Z, X], &[One], &[Z, X], &[One, Zero]).unwrap_err();
        assert!(matches!(err, QkdError::Validation(_)));
    }
}
