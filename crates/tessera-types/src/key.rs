use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Row key of a record.
///
/// Keys are opaque bytes between 1 and [`RecordKey::MAX_LEN`] bytes long. The
/// upper bound matches the row-key column of history segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(Vec<u8>);

impl RecordKey {
    /// Maximum key length in bytes.
    pub const MAX_LEN: usize = 256;

    /// Create a key from raw bytes, validating its length.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, TypeError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(TypeError::InvalidKey("key must not be empty".into()));
        }
        if bytes.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidKey(format!(
                "key is {} bytes, limit is {}",
                bytes.len(),
                Self::MAX_LEN
            )));
        }
        Ok(Self(bytes))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: keys are never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&str> for RecordKey {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s.as_bytes())
    }
}

impl TryFrom<&[u8]> for RecordKey {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for RecordKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({self})")
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_lengths() {
        assert!(RecordKey::new(vec![b'a'; 1]).is_ok());
        assert!(RecordKey::new(vec![b'a'; RecordKey::MAX_LEN]).is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(matches!(RecordKey::new(Vec::new()), Err(TypeError::InvalidKey(_))));
        assert!(matches!(
            RecordKey::new(vec![0u8; RecordKey::MAX_LEN + 1]),
            Err(TypeError::InvalidKey(_))
        ));
    }

    #[test]
    fn display_prefers_utf8() {
        let key = RecordKey::try_from("user-1").unwrap();
        assert_eq!(key.to_string(), "user-1");

        let raw = RecordKey::new(vec![0xff, 0x00]).unwrap();
        assert_eq!(raw.to_string(), "0xff00");
    }
}
