use tessera_types::Format;

use crate::binary;
use crate::error::{CodecError, CodecResult};
use crate::schema::{Field, RecordSchema, Schema};
use crate::text;
use crate::value::Value;

/// Encode `value` with `schema` in the given format.
///
/// Fails with [`CodecError::Encode`] if the value does not conform to the
/// schema. Nothing is partially written on failure: the returned buffer is
/// only produced once the whole value has been encoded.
pub fn encode(value: &Value, schema: &Schema, format: Format) -> CodecResult<Vec<u8>> {
    match format {
        Format::Binary => binary::encode(value, schema),
        Format::Text => text::encode(value, schema),
    }
}

/// Decode a payload written with `schema` in the given format.
///
/// Fails with [`CodecError::Decode`] on schema mismatch, truncated input, or
/// trailing bytes.
pub fn decode(bytes: &[u8], schema: &Schema, format: Format) -> CodecResult<Value> {
    match format {
        Format::Binary => binary::decode(bytes, schema),
        Format::Text => text::decode(bytes, schema),
    }
}

pub(crate) fn mismatch(schema: &Schema, value: &Value) -> CodecError {
    CodecError::Encode(format!(
        "expected {}, got {} value",
        schema.type_name(),
        value.kind()
    ))
}

/// Pick the union branch a value is written with.
pub(crate) fn resolve_branch<'a>(
    value: &'a Value,
    branches: &'a [Schema],
) -> CodecResult<(usize, &'a Value)> {
    if let Value::Union(index, inner) = value {
        let idx = *index as usize;
        return if idx < branches.len() {
            Ok((idx, inner))
        } else {
            Err(CodecError::Encode(format!(
                "union branch {index} out of range ({} branches)",
                branches.len()
            )))
        };
    }
    branches
        .iter()
        .position(|branch| value.conforms_to(branch))
        .map(|idx| (idx, value))
        .ok_or_else(|| {
            CodecError::Encode(format!("{} value matches no union branch", value.kind()))
        })
}

/// Pair every schema field with the value to write for it, falling back to
/// field defaults.
pub(crate) fn record_fields<'a>(
    fields: &'a [(String, Value)],
    schema: &'a RecordSchema,
) -> CodecResult<Vec<(&'a Field, &'a Value)>> {
    if let Some((unknown, _)) = fields.iter().find(|(name, _)| schema.field(name).is_none()) {
        return Err(CodecError::Encode(format!(
            "unknown field `{unknown}` for record `{}`",
            schema.name.fullname()
        )));
    }
    schema
        .fields
        .iter()
        .map(|field| {
            let value = fields
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, v)| v)
                .or(field.default.as_ref())
                .ok_or_else(|| {
                    CodecError::Encode(format!(
                        "missing field `{}` for record `{}`",
                        field.name,
                        schema.name.fullname()
                    ))
                })?;
            Ok((field, value))
        })
        .collect()
}

pub(crate) fn as_f32(schema: &Schema, value: &Value) -> CodecResult<f32> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(n) => Ok(*n as f32),
        Value::Long(n) => Ok(*n as f32),
        other => Err(mismatch(schema, other)),
    }
}

pub(crate) fn as_f64(schema: &Schema, value: &Value) -> CodecResult<f64> {
    match value {
        Value::Double(f) => Ok(*f),
        Value::Float(f) => Ok(f64::from(*f)),
        Value::Int(n) => Ok(f64::from(*n)),
        Value::Long(n) => Ok(*n as f64),
        other => Err(mismatch(schema, other)),
    }
}
