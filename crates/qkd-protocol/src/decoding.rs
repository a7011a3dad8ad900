//! Backend outcome decoding.
//!
//! Backends report the register highest-index-first: qubit `n - 1` is the
//! first character of the outcome string. Decoding reverses that so index
//! `i` of the result is qubit `i`, which is what every later comparison
//! against bit and basis sequences assumes.

use qkd_hal::ExecutionResult;

use crate::bits::Bit;
use crate::error::ExecutionError;

/// Decode a raw `n`-character outcome into bits in protocol order.
///
/// `decode(s, n)[i]` is the bit at `s[n - 1 - i]`.
pub fn decode(raw: &str, n: usize) -> Result<Vec<Bit>, ExecutionError> {
    let len = raw.chars().count();
    if len != n {
        return Err(ExecutionError::MalformedOutcome(format!(
            "outcome '{raw}' has length {len}, expected {n}"
        )));
    }

    let mut bits = raw
        .chars()
        .enumerate()
        .map(|(pos, c)| {
            Bit::from_char(c).ok_or_else(|| {
                ExecutionError::MalformedOutcome(format!(
                    "invalid character '{c}' at position {pos} of '{raw}'"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    bits.reverse();
    Ok(bits)
}

/// The single outcome string of a one-shot result.
pub fn single_outcome(result: &ExecutionResult) -> Result<&str, ExecutionError> {
    match result.counts.len() {
        0 => Err(ExecutionError::MalformedOutcome(
            "backend returned no outcome".into(),
        )),
        1 => result.counts.single_outcome().ok_or_else(|| {
            ExecutionError::MalformedOutcome("backend returned no outcome".into())
        }),
        k => Err(ExecutionError::MalformedOutcome(format!(
            "backend returned {k} distinct outcomes for a single-shot register"
        ))),
    }
}

/// Extract and decode the outcome of a one-shot result.
pub fn decode_result(result: &ExecutionResult, n: usize) -> Result<Vec<Bit>, ExecutionError> {
    decode(single_outcome(result)?, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qkd_hal::Counts;

    #[test]
    fn test_decode_reverses() {
        let bits = decode("0011", 4).unwrap();
        assert_eq!(bits, vec![Bit::One, Bit::One, Bit::Zero, Bit::Zero]);
    }

    #[test]
    fn test_decode_empty_register() {
        assert!(decode("", 0).unwrap().is_empty());
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = decode("101", 4).unwrap_err();
        assert!(matches!(err, ExecutionError::MalformedOutcome(_)));
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = decode("10x1", 4).unwrap_err();
        assert!(err.to_string().contains("invalid character 'x'"));
    }

    #[test]
    fn test_single_outcome() {
        let result = ExecutionResult::new(Counts::from_pairs([("0110", 1)]), 1);
        assert_eq!(single_outcome(&result).unwrap(), "0110");
        assert_eq!(
            decode_result(&result, 4).unwrap(),
            vec![Bit::Zero, Bit::One, Bit::One, Bit::Zero]
        );
    }

    #[test]
    fn test_missing_and_ambiguous_outcomes() {
        let empty = ExecutionResult::new(Counts::new(), 1);
        assert!(single_outcome(&empty).is_err());

        let two = ExecutionResult::new(Counts::from_pairs([("00", 1), ("11", 1)]), 2);
        let err = single_outcome(&two).unwrap_err();
        assert!(err.to_string().contains("2 distinct outcomes"));
    }
}
