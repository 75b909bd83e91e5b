/// Errors produced by schema parsing and value encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The value does not conform to the schema it is being written with.
    #[error("encode error: {0}")]
    Encode(String),

    /// The payload does not conform to the schema, or is truncated.
    #[error("decode error: {0}")]
    Decode(String),

    /// The schema definition itself is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
