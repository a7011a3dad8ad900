//! Classical protocol values: bits and bases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A classical bit.
///
/// Serialized as the integer `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Bit {
    /// 0
    Zero,
    /// 1
    One,
}

impl Bit {
    /// Parse a single outcome character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Bit::Zero),
            '1' => Some(Bit::One),
            _ => None,
        }
    }

    /// The outcome character for this bit.
    pub fn as_char(self) -> char {
        match self {
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }
}

impl From<bool> for Bit {
    fn from(b: bool) -> Self {
        if b { Bit::One } else { Bit::Zero }
    }
}

impl From<Bit> for u8 {
    fn from(b: Bit) -> Self {
        match b {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl TryFrom<u8> for Bit {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Bit::Zero),
            1 => Ok(Bit::One),
            other => Err(format!("{other} is not a bit")),
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A BB84 basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Computational basis, |0> and |1>.
    Z,
    /// Hadamard basis, |+> and |->.
    X,
}

impl From<bool> for Basis {
    fn from(b: bool) -> Self {
        if b { Basis::X } else { Basis::Z }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Z => write!(f, "Z"),
            Basis::X => write!(f, "X"),
        }
    }
}

/// Render a bit sequence as a compact string in protocol order.
pub fn bits_to_string(bits: &[Bit]) -> String {
    bits.iter().map(|b| b.as_char()).collect()
}

/// Render a basis sequence as a compact string in protocol order.
pub fn bases_to_string(bases: &[Basis]) -> String {
    bases.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_chars() {
        assert_eq!(Bit::from_char('0'), Some(Bit::Zero));
        assert_eq!(Bit::from_char('1'), Some(Bit::One));
        assert_eq!(Bit::from_char('2'), None);
        assert_eq!(Bit::One.as_char(), '1');
    }

    #[test]
    fn test_bit_serde_as_integer() {
        let json = serde_json::to_string(&vec![Bit::One, Bit::Zero]).unwrap();
        assert_eq!(json, "[1,0]");
        let back: Vec<Bit> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Bit::One, Bit::Zero]);
        assert!(serde_json::from_str::<Bit>("2").is_err());
    }

    #[test]
    fn test_rendering() {
        assert_eq!(bits_to_string(&[Bit::One, Bit::Zero, Bit::One]), "101");
        assert_eq!(bases_to_string(&[Basis::Z, Basis::X]), "ZX");
    }
}
