use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Encoding used for a stored payload.
///
/// The ordinal is what backends persist in the `format` column, so the
/// numbering must never change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Compact schema-driven binary encoding.
    #[default]
    Binary,
    /// Human-readable JSON encoding.
    Text,
}

impl Format {
    /// Stable one-byte ordinal.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Binary => 0,
            Self::Text => 1,
        }
    }

    /// Parse a persisted ordinal.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, TypeError> {
        match ordinal {
            0 => Ok(Self::Binary),
            1 => Ok(Self::Text),
            other => Err(TypeError::InvalidFormat(other)),
        }
    }

    /// Parse a persisted `format` column (exactly one byte).
    pub fn from_column(bytes: &[u8]) -> Result<Self, TypeError> {
        match bytes {
            [ordinal] => Self::from_ordinal(*ordinal),
            _ => Err(TypeError::InvalidLength {
                expected: 1,
                actual: bytes.len(),
            }),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_stable() {
        assert_eq!(Format::Binary.ordinal(), 0);
        assert_eq!(Format::Text.ordinal(), 1);
    }

    #[test]
    fn parses_ordinals() {
        assert_eq!(Format::from_ordinal(0).unwrap(), Format::Binary);
        assert_eq!(Format::from_ordinal(1).unwrap(), Format::Text);
        assert_eq!(Format::from_ordinal(7), Err(TypeError::InvalidFormat(7)));
    }

    #[test]
    fn column_must_be_one_byte() {
        assert_eq!(Format::from_column(&[1]).unwrap(), Format::Text);
        assert!(Format::from_column(&[]).is_err());
        assert!(Format::from_column(&[0, 0]).is_err());
    }

    #[test]
    fn default_is_binary() {
        assert_eq!(Format::default(), Format::Binary);
    }
}
