use bytes::Bytes;

use crate::error::TypeError;
use crate::format::Format;
use crate::key::RecordKey;
use crate::schema_id::SchemaId;

/// Optimistic-concurrency version. `0` means "never written".
pub type Version = u64;

/// Encode a version for persistence (big-endian, so byte order = numeric order).
pub fn version_to_bytes(version: Version) -> [u8; 8] {
    version.to_be_bytes()
}

/// Decode a persisted version column.
pub fn version_from_bytes(bytes: &[u8]) -> Result<Version, TypeError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
        expected: 8,
        actual: bytes.len(),
    })?;
    Ok(Version::from_be_bytes(arr))
}

/// A decoded value together with its storage metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<T> {
    pub key: RecordKey,
    pub value: T,
    pub schema_id: SchemaId,
    pub format: Format,
    pub version: Version,
}

impl<T> Record<T> {
    /// Transform the value while keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Record<U> {
        Record {
            key: self.key,
            value: f(self.value),
            schema_id: self.schema_id,
            format: self.format,
            version: self.version,
        }
    }
}

/// One accepted write, as mirrored into the history log.
///
/// The payload is already encoded; the log never re-encodes values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub key: RecordKey,
    pub schema_id: SchemaId,
    pub version: Version,
    pub format: Format,
    pub payload: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bytes_preserve_order() {
        let a = version_to_bytes(9);
        let b = version_to_bytes(10);
        let c = version_to_bytes(256);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn version_bytes_roundtrip() {
        assert_eq!(version_from_bytes(&version_to_bytes(42)).unwrap(), 42);
    }

    #[test]
    fn version_rejects_short_column() {
        assert_eq!(
            version_from_bytes(&[0, 1]),
            Err(TypeError::InvalidLength {
                expected: 8,
                actual: 2
            })
        );
    }

    #[test]
    fn map_keeps_metadata() {
        let record = Record {
            key: RecordKey::try_from("k").unwrap(),
            value: 3u32,
            schema_id: SchemaId::of_canonical("\"int\""),
            format: Format::Text,
            version: 5,
        };
        let mapped = record.clone().map(|v| v.to_string());
        assert_eq!(mapped.value, "3");
        assert_eq!(mapped.version, record.version);
        assert_eq!(mapped.format, record.format);
    }
}
