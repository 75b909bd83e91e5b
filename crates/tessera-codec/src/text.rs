//! Human-readable JSON encoding.
//!
//! Records and maps are JSON objects, arrays are JSON arrays, bytes are
//! strings whose code points are the byte values (0-255), and enums are their
//! symbol. A union value is `null` for the null branch and otherwise a
//! single-entry object keyed by the branch type name: `{"string": "x"}`.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value as Json};

use crate::codec::{as_f32, as_f64, mismatch, record_fields, resolve_branch};
use crate::error::{CodecError, CodecResult};
use crate::schema::Schema;
use crate::value::Value;

pub(crate) fn encode(value: &Value, schema: &Schema) -> CodecResult<Vec<u8>> {
    let json = to_json(value, schema)?;
    serde_json::to_vec(&json).map_err(|e| CodecError::Encode(e.to_string()))
}

pub(crate) fn decode(bytes: &[u8], schema: &Schema) -> CodecResult<Value> {
    let json: Json =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    from_json(&json, schema)
}

/// Interpret a field default from a schema definition.
///
/// Union defaults always refer to the first branch.
pub(crate) fn value_from_default(json: &Json, schema: &Schema) -> CodecResult<Value> {
    match schema {
        Schema::Union(branches) => {
            let first = branches
                .first()
                .ok_or_else(|| CodecError::Decode("empty union".into()))?;
            Ok(Value::Union(0, Box::new(value_from_default(json, first)?)))
        }
        Schema::Record(record) => {
            let object = expect_object(json, schema)?;
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = match object.get(&field.name) {
                    Some(j) => value_from_default(j, &field.schema)?,
                    None => field.default.clone().ok_or_else(|| {
                        CodecError::Decode(format!("missing field `{}`", field.name))
                    })?,
                };
                fields.push((field.name.clone(), value));
            }
            Ok(Value::Record(fields))
        }
        Schema::Array(items) => expect_array(json, schema)?
            .iter()
            .map(|j| value_from_default(j, items))
            .collect::<CodecResult<_>>()
            .map(Value::Array),
        Schema::Map(values) => expect_object(json, schema)?
            .iter()
            .map(|(k, j)| Ok((k.clone(), value_from_default(j, values)?)))
            .collect::<CodecResult<BTreeMap<_, _>>>()
            .map(Value::Map),
        _ => from_json(json, schema),
    }
}

fn number(f: f64) -> CodecResult<Json> {
    Number::from_f64(f)
        .map(Json::Number)
        .ok_or_else(|| CodecError::Encode(format!("{f} has no text representation")))
}

fn to_json(value: &Value, schema: &Schema) -> CodecResult<Json> {
    Ok(match (schema, value) {
        (Schema::Null, Value::Null) => Json::Null,
        (Schema::Boolean, Value::Boolean(b)) => Json::Bool(*b),
        (Schema::Int, Value::Int(n)) => Json::from(*n),
        (Schema::Long, Value::Int(n)) => Json::from(*n),
        (Schema::Long, Value::Long(n)) => Json::from(*n),
        (Schema::Float, v) => number(f64::from(as_f32(schema, v)?))?,
        (Schema::Double, v) => number(as_f64(schema, v)?)?,
        (Schema::Bytes, Value::Bytes(b)) => Json::String(b.iter().map(|&b| char::from(b)).collect()),
        (Schema::String, Value::String(s)) => Json::String(s.clone()),
        (Schema::Record(record), Value::Record(fields)) => {
            let mut object = Map::new();
            for (field, v) in record_fields(fields, record)? {
                object.insert(field.name.clone(), to_json(v, &field.schema)?);
            }
            Json::Object(object)
        }
        (Schema::Enum(e), Value::Enum(symbol)) => {
            if e.index_of(symbol).is_none() {
                return Err(CodecError::Encode(format!(
                    "`{symbol}` is not a symbol of enum `{}`",
                    e.name.fullname()
                )));
            }
            Json::String(symbol.clone())
        }
        (Schema::Array(items), Value::Array(values)) => Json::Array(
            values
                .iter()
                .map(|v| to_json(v, items))
                .collect::<CodecResult<_>>()?,
        ),
        (Schema::Map(values_schema), Value::Map(entries)) => {
            let mut object = Map::new();
            for (k, v) in entries {
                object.insert(k.clone(), to_json(v, values_schema)?);
            }
            Json::Object(object)
        }
        (Schema::Union(branches), v) => {
            let (idx, inner) = resolve_branch(v, branches)?;
            let branch = &branches[idx];
            if matches!(branch, Schema::Null) {
                if !matches!(inner, Value::Null) {
                    return Err(mismatch(branch, inner));
                }
                Json::Null
            } else {
                let mut object = Map::new();
                object.insert(branch.type_name(), to_json(inner, branch)?);
                Json::Object(object)
            }
        }
        (schema, value) => return Err(mismatch(schema, value)),
    })
}

fn unexpected(schema: &Schema, json: &Json) -> CodecError {
    let found = match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    CodecError::Decode(format!("expected {}, found JSON {found}", schema.type_name()))
}

fn expect_object<'a>(json: &'a Json, schema: &Schema) -> CodecResult<&'a Map<String, Json>> {
    json.as_object().ok_or_else(|| unexpected(schema, json))
}

fn expect_array<'a>(json: &'a Json, schema: &Schema) -> CodecResult<&'a Vec<Json>> {
    json.as_array().ok_or_else(|| unexpected(schema, json))
}

fn from_json(json: &Json, schema: &Schema) -> CodecResult<Value> {
    let value = match schema {
        Schema::Null if json.is_null() => Value::Null,
        Schema::Boolean => Value::Boolean(json.as_bool().ok_or_else(|| unexpected(schema, json))?),
        Schema::Int => {
            let n = json.as_i64().ok_or_else(|| unexpected(schema, json))?;
            Value::Int(
                i32::try_from(n).map_err(|_| CodecError::Decode(format!("int out of range: {n}")))?,
            )
        }
        Schema::Long => Value::Long(json.as_i64().ok_or_else(|| unexpected(schema, json))?),
        Schema::Float => Value::Float(json.as_f64().ok_or_else(|| unexpected(schema, json))? as f32),
        Schema::Double => Value::Double(json.as_f64().ok_or_else(|| unexpected(schema, json))?),
        Schema::Bytes => {
            let s = json.as_str().ok_or_else(|| unexpected(schema, json))?;
            let bytes = s
                .chars()
                .map(u8::try_from)
                .collect::<Result<Vec<u8>, _>>()
                .map_err(|_| CodecError::Decode("bytes string has code point above 255".into()))?;
            Value::Bytes(bytes)
        }
        Schema::String => Value::String(
            json.as_str()
                .ok_or_else(|| unexpected(schema, json))?
                .to_string(),
        ),
        Schema::Record(record) => {
            let object = expect_object(json, schema)?;
            if let Some(unknown) = object.keys().find(|k| record.field(k).is_none()) {
                return Err(CodecError::Decode(format!(
                    "unknown field `{unknown}` for record `{}`",
                    record.name.fullname()
                )));
            }
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = match object.get(&field.name) {
                    Some(j) => from_json(j, &field.schema)?,
                    None => field.default.clone().ok_or_else(|| {
                        CodecError::Decode(format!(
                            "missing field `{}` for record `{}`",
                            field.name,
                            record.name.fullname()
                        ))
                    })?,
                };
                fields.push((field.name.clone(), value));
            }
            Value::Record(fields)
        }
        Schema::Enum(e) => {
            let symbol = json.as_str().ok_or_else(|| unexpected(schema, json))?;
            if e.index_of(symbol).is_none() {
                return Err(CodecError::Decode(format!(
                    "`{symbol}` is not a symbol of enum `{}`",
                    e.name.fullname()
                )));
            }
            Value::Enum(symbol.to_string())
        }
        Schema::Array(items) => Value::Array(
            expect_array(json, schema)?
                .iter()
                .map(|j| from_json(j, items))
                .collect::<CodecResult<_>>()?,
        ),
        Schema::Map(values) => Value::Map(
            expect_object(json, schema)?
                .iter()
                .map(|(k, j)| Ok((k.clone(), from_json(j, values)?)))
                .collect::<CodecResult<_>>()?,
        ),
        Schema::Union(branches) => {
            if json.is_null() {
                let idx = branches
                    .iter()
                    .position(|b| matches!(b, Schema::Null))
                    .ok_or_else(|| unexpected(schema, json))?;
                return Ok(Value::Union(idx as u32, Box::new(Value::Null)));
            }
            let object = expect_object(json, schema)?;
            let (label, inner) = match (object.len(), object.iter().next()) {
                (1, Some(entry)) => entry,
                _ => {
                    return Err(CodecError::Decode(
                        "union value must be an object with exactly one branch label".into(),
                    ))
                }
            };
            let idx = branches
                .iter()
                .position(|b| b.type_name() == *label)
                .ok_or_else(|| CodecError::Decode(format!("unknown union branch `{label}`")))?;
            Value::Union(idx as u32, Box::new(from_json(inner, &branches[idx])?))
        }
        Schema::Null => return Err(unexpected(schema, json)),
    };
    Ok(value)
}
