use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Domain tag prepended to every schema hash.
const SCHEMA_DOMAIN: &str = "tessera-schema-v1";

/// Content-addressed identifier for a schema definition.
///
/// A `SchemaId` is the domain-separated BLAKE3 hash of a schema's canonical
/// text. Identical canonical text always produces the same `SchemaId`, which
/// is what lets the registry deduplicate repeated definitions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId([u8; 32]);

impl SchemaId {
    /// Compute the id of a canonical schema text.
    pub fn of_canonical(canonical: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SCHEMA_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(canonical.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation (used as the schema table row key).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Parse from a raw byte slice (must be exactly 32 bytes).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Verify that `canonical` hashes to this id.
    pub fn verify(&self, canonical: &str) -> bool {
        Self::of_canonical(canonical) == *self
    }
}

impl fmt::Debug for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaId({})", self.short_hex())
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for SchemaId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_text_same_id() {
        let a = SchemaId::of_canonical(r#"{"name":"Person","type":"record"}"#);
        let b = SchemaId::of_canonical(r#"{"name":"Person","type":"record"}"#);
        assert_eq!(a, b);
    }

    #[test]
    fn different_text_different_id() {
        let a = SchemaId::of_canonical("\"int\"");
        let b = SchemaId::of_canonical("\"long\"");
        assert_ne!(a, b);
    }

    #[test]
    fn domain_separated_from_plain_blake3() {
        let id = SchemaId::of_canonical("\"string\"");
        assert_ne!(id.as_bytes(), blake3::hash(b"\"string\"").as_bytes());
    }

    #[test]
    fn hex_roundtrip() {
        let id = SchemaId::of_canonical("\"bytes\"");
        let parsed = SchemaId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_hex().len(), 64);
        assert_eq!(id.short_hex().len(), 8);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = SchemaId::from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 3
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            SchemaId::from_hex("not-hex"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn verify_detects_tampering() {
        let id = SchemaId::of_canonical("\"double\"");
        assert!(id.verify("\"double\""));
        assert!(!id.verify("\"float\""));
    }

    #[test]
    fn serde_roundtrip() {
        let id = SchemaId::of_canonical("\"null\"");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: SchemaId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn id_is_deterministic(text in ".{0,64}") {
            prop_assert_eq!(SchemaId::of_canonical(&text), SchemaId::of_canonical(&text));
        }
    }
}
