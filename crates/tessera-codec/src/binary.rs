//! Compact binary encoding.
//!
//! Layout follows the Avro binary encoding:
//!
//! ```text
//! int, long      zig-zag varint
//! float, double  little-endian IEEE 754 (4 / 8 bytes)
//! bytes, string  long length + raw bytes
//! record         fields in schema order, no framing
//! enum           long symbol index
//! array, map     long item count + items, then a 0 terminator
//! union          long branch index + value
//! ```

use std::collections::BTreeMap;

use crate::codec::{as_f32, as_f64, mismatch, record_fields, resolve_branch};
use crate::error::{CodecError, CodecResult};
use crate::schema::Schema;
use crate::value::Value;

/// Upper bound on items in one block whose encoding takes no bytes.
const ZERO_SIZED_ITEM_LIMIT: u64 = 1 << 20;

pub(crate) fn encode(value: &Value, schema: &Schema) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, schema)?;
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8], schema: &Schema) -> CodecResult<Value> {
    let mut reader = Reader { buf: bytes, pos: 0 };
    let value = reader.read_value(schema)?;
    if reader.pos != bytes.len() {
        return Err(CodecError::Decode(format!(
            "{} trailing bytes after value",
            bytes.len() - reader.pos
        )));
    }
    Ok(value)
}

fn write_long(buf: &mut Vec<u8>, n: i64) {
    let mut zz = ((n << 1) ^ (n >> 63)) as u64;
    while zz >= 0x80 {
        buf.push((zz as u8 & 0x7f) | 0x80);
        zz >>= 7;
    }
    buf.push(zz as u8);
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_long(buf, bytes.len() as i64);
    buf.extend_from_slice(bytes);
}

fn write_value(buf: &mut Vec<u8>, value: &Value, schema: &Schema) -> CodecResult<()> {
    match (schema, value) {
        (Schema::Null, Value::Null) => {}
        (Schema::Boolean, Value::Boolean(b)) => buf.push(u8::from(*b)),
        (Schema::Int, Value::Int(n)) => write_long(buf, i64::from(*n)),
        (Schema::Long, Value::Int(n)) => write_long(buf, i64::from(*n)),
        (Schema::Long, Value::Long(n)) => write_long(buf, *n),
        (Schema::Float, v) => buf.extend_from_slice(&as_f32(schema, v)?.to_le_bytes()),
        (Schema::Double, v) => buf.extend_from_slice(&as_f64(schema, v)?.to_le_bytes()),
        (Schema::Bytes, Value::Bytes(b)) => write_bytes(buf, b),
        (Schema::String, Value::String(s)) => write_bytes(buf, s.as_bytes()),
        (Schema::Record(record), Value::Record(fields)) => {
            for (field, v) in record_fields(fields, record)? {
                write_value(buf, v, &field.schema)?;
            }
        }
        (Schema::Enum(e), Value::Enum(symbol)) => {
            let idx = e.index_of(symbol).ok_or_else(|| {
                CodecError::Encode(format!(
                    "`{symbol}` is not a symbol of enum `{}`",
                    e.name.fullname()
                ))
            })?;
            write_long(buf, idx as i64);
        }
        (Schema::Array(items), Value::Array(values)) => {
            if !values.is_empty() {
                write_long(buf, values.len() as i64);
                for v in values {
                    write_value(buf, v, items)?;
                }
            }
            write_long(buf, 0);
        }
        (Schema::Map(values_schema), Value::Map(entries)) => {
            if !entries.is_empty() {
                write_long(buf, entries.len() as i64);
                for (k, v) in entries {
                    write_bytes(buf, k.as_bytes());
                    write_value(buf, v, values_schema)?;
                }
            }
            write_long(buf, 0);
        }
        (Schema::Union(branches), v) => {
            let (idx, inner) = resolve_branch(v, branches)?;
            write_long(buf, idx as i64);
            write_value(buf, inner, &branches[idx])?;
        }
        (schema, value) => return Err(mismatch(schema, value)),
    }
    Ok(())
}

/// Smallest number of bytes any value of `schema` can encode to.
fn min_encoded_len(schema: &Schema) -> usize {
    match schema {
        Schema::Null => 0,
        Schema::Float => 4,
        Schema::Double => 8,
        Schema::Record(r) => r.fields.iter().map(|f| min_encoded_len(&f.schema)).sum(),
        _ => 1,
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::Decode(format!(
                "truncated input: need {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_varint(&mut self) -> CodecResult<u64> {
        let mut result = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.take(1)?[0];
            if shift == 63 && byte > 1 {
                break;
            }
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(CodecError::Decode(format!(
            "varint overflow at offset {}",
            self.pos
        )))
    }

    fn read_long(&mut self) -> CodecResult<i64> {
        let zz = self.read_varint()?;
        Ok(((zz >> 1) as i64) ^ -((zz & 1) as i64))
    }

    fn read_int(&mut self) -> CodecResult<i32> {
        let n = self.read_long()?;
        i32::try_from(n).map_err(|_| CodecError::Decode(format!("int out of range: {n}")))
    }

    fn read_len(&mut self) -> CodecResult<usize> {
        let n = self.read_long()?;
        usize::try_from(n).map_err(|_| CodecError::Decode(format!("negative length: {n}")))
    }

    fn read_bytes(&mut self) -> CodecResult<&'a [u8]> {
        let len = self.read_len()?;
        self.take(len)
    }

    fn read_index(&mut self, len: usize, what: &str) -> CodecResult<usize> {
        let n = self.read_long()?;
        usize::try_from(n)
            .ok()
            .filter(|idx| *idx < len)
            .ok_or_else(|| CodecError::Decode(format!("{what} index {n} out of range")))
    }

    /// Read one block header; returns 0 at the end of the sequence.
    fn read_block_count(&mut self, item_schema_min: usize) -> CodecResult<u64> {
        let mut count = self.read_long()?;
        if count < 0 {
            count = count
                .checked_neg()
                .ok_or_else(|| CodecError::Decode("invalid block count".into()))?;
            // Block byte size, unused.
            self.read_long()?;
        }
        let count = count as u64;
        let fits = if item_schema_min == 0 {
            count <= ZERO_SIZED_ITEM_LIMIT
        } else {
            count.saturating_mul(item_schema_min as u64) <= self.remaining() as u64
        };
        if !fits {
            return Err(CodecError::Decode(format!(
                "block of {count} items exceeds remaining input"
            )));
        }
        Ok(count)
    }

    fn read_value(&mut self, schema: &Schema) -> CodecResult<Value> {
        Ok(match schema {
            Schema::Null => Value::Null,
            Schema::Boolean => match self.take(1)?[0] {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => {
                    return Err(CodecError::Decode(format!("invalid boolean byte {other}")))
                }
            },
            Schema::Int => Value::Int(self.read_int()?),
            Schema::Long => Value::Long(self.read_long()?),
            Schema::Float => {
                let raw: [u8; 4] = self
                    .take(4)?
                    .try_into()
                    .map_err(|_| CodecError::Decode("float width".into()))?;
                Value::Float(f32::from_le_bytes(raw))
            }
            Schema::Double => {
                let raw: [u8; 8] = self
                    .take(8)?
                    .try_into()
                    .map_err(|_| CodecError::Decode("double width".into()))?;
                Value::Double(f64::from_le_bytes(raw))
            }
            Schema::Bytes => Value::Bytes(self.read_bytes()?.to_vec()),
            Schema::String => Value::String(self.read_string()?),
            Schema::Record(record) => {
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    fields.push((field.name.clone(), self.read_value(&field.schema)?));
                }
                Value::Record(fields)
            }
            Schema::Enum(e) => {
                let idx = self.read_index(e.symbols.len(), "enum")?;
                Value::Enum(e.symbols[idx].clone())
            }
            Schema::Array(items) => {
                let min = min_encoded_len(items);
                let mut values = Vec::new();
                loop {
                    let count = self.read_block_count(min)?;
                    if count == 0 {
                        break;
                    }
                    for _ in 0..count {
                        values.push(self.read_value(items)?);
                    }
                }
                Value::Array(values)
            }
            Schema::Map(values_schema) => {
                let min = 1 + min_encoded_len(values_schema);
                let mut entries = BTreeMap::new();
                loop {
                    let count = self.read_block_count(min)?;
                    if count == 0 {
                        break;
                    }
                    for _ in 0..count {
                        let key = self.read_string()?;
                        let value = self.read_value(values_schema)?;
                        entries.insert(key, value);
                    }
                }
                Value::Map(entries)
            }
            Schema::Union(branches) => {
                let idx = self.read_index(branches.len(), "union")?;
                Value::Union(idx as u32, Box::new(self.read_value(&branches[idx])?))
            }
        })
    }

    fn read_string(&mut self) -> CodecResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::Decode(format!("invalid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_bytes(n: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_long(&mut buf, n);
        buf
    }

    #[test]
    fn zigzag_matches_reference_encoding() {
        assert_eq!(long_bytes(0), vec![0x00]);
        assert_eq!(long_bytes(-1), vec![0x01]);
        assert_eq!(long_bytes(1), vec![0x02]);
        assert_eq!(long_bytes(-64), vec![0x7f]);
        assert_eq!(long_bytes(64), vec![0x80, 0x01]);
    }

    #[test]
    fn long_extremes_roundtrip() {
        for n in [i64::MIN, i64::MAX, 0, -1, 1 << 40] {
            let bytes = long_bytes(n);
            assert_eq!(decode(&bytes, &Schema::Long).unwrap(), Value::Long(n));
        }
    }

    #[test]
    fn string_layout() {
        let bytes = encode(&Value::from("hi"), &Schema::String).unwrap();
        assert_eq!(bytes, vec![0x04, b'h', b'i']);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = encode(&Value::from("hello"), &Schema::String).unwrap();
        let err = decode(&bytes[..3], &Schema::String).unwrap_err();
        assert!(err.to_string().contains("truncated"));
        assert!(decode(&[], &Schema::Double).is_err());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode(&Value::Int(7), &Schema::Int).unwrap();
        bytes.push(0);
        assert!(decode(&bytes, &Schema::Int).is_err());
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        assert!(decode(&[2], &Schema::Boolean).is_err());
    }

    #[test]
    fn int_out_of_range_is_rejected() {
        let bytes = long_bytes(i64::from(i32::MAX) + 1);
        assert!(decode(&bytes, &Schema::Int).is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut bytes = long_bytes(2);
        bytes.extend_from_slice(&[0xff, 0xfe]);
        assert!(decode(&bytes, &Schema::String).is_err());
    }

    #[test]
    fn varint_overflow_is_rejected() {
        let bytes = vec![0xff; 11];
        assert!(decode(&bytes, &Schema::Long).is_err());
    }

    #[test]
    fn huge_block_count_is_rejected_without_allocating() {
        let schema = Schema::Array(Box::new(Schema::Long));
        let bytes = long_bytes(i64::MAX / 2);
        assert!(decode(&bytes, &schema).is_err());

        let nulls = Schema::Array(Box::new(Schema::Null));
        assert!(decode(&long_bytes(1 << 40), &nulls).is_err());
    }

    #[test]
    fn negative_block_counts_are_accepted() {
        let schema = Schema::Array(Box::new(Schema::Int));
        let mut bytes = long_bytes(-2);
        bytes.extend(long_bytes(2));
        bytes.extend(long_bytes(5));
        bytes.extend(long_bytes(6));
        bytes.extend(long_bytes(0));
        assert_eq!(
            decode(&bytes, &schema).unwrap(),
            Value::Array(vec![Value::Int(5), Value::Int(6)])
        );
    }

    #[test]
    fn enum_index_out_of_range_is_rejected() {
        let schema = Schema::parse_str(r#"{"type":"enum","name":"E","symbols":["A"]}"#).unwrap();
        assert!(decode(&long_bytes(3), &schema).is_err());
    }
}
