use std::sync::Arc;

use tessera_types::Format;

use crate::codec::{decode, encode};
use crate::error::CodecResult;
use crate::schema::Schema;
use crate::value::Value;

/// A value type that carries its own schema.
///
/// Stores are generic over `Datum`: the schema returned by [`Datum::schema`]
/// is registered on write, and [`Datum::from_value`] receives the schema the
/// stored payload was written with.
pub trait Datum: Sized + Send + Sync + 'static {
    /// Schema this value is written with.
    fn schema(&self) -> Arc<Schema>;

    /// Generic view of the value.
    fn to_value(&self) -> Value;

    /// Rebuild a value from its decoded form.
    fn from_value(value: Value, writer: &Arc<Schema>) -> CodecResult<Self>;
}

/// A schema plus a generic value. Decodes with whatever schema the payload
/// was written with.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericRecord {
    pub schema: Arc<Schema>,
    pub value: Value,
}

impl GenericRecord {
    pub fn new(schema: Arc<Schema>, value: Value) -> Self {
        Self { schema, value }
    }

    /// Field of the wrapped record value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.field(field)
    }
}

impl Datum for GenericRecord {
    fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    fn to_value(&self) -> Value {
        self.value.clone()
    }

    fn from_value(value: Value, writer: &Arc<Schema>) -> CodecResult<Self> {
        Ok(Self::new(Arc::clone(writer), value))
    }
}

/// Encode a datum with its own schema.
pub fn encode_datum<T: Datum>(datum: &T, format: Format) -> CodecResult<Vec<u8>> {
    encode(&datum.to_value(), &datum.schema(), format)
}

/// Decode a payload written with `writer` into a datum.
pub fn decode_datum<T: Datum>(
    bytes: &[u8],
    writer: &Arc<Schema>,
    format: Format,
) -> CodecResult<T> {
    T::from_value(decode(bytes, writer, format)?, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[derive(Debug, PartialEq)]
    struct Counter {
        name: String,
        hits: i64,
    }

    fn counter_schema() -> Arc<Schema> {
        Arc::new(
            Schema::parse_str(
                r#"{"type":"record","name":"Counter","fields":[
                    {"name":"name","type":"string"},
                    {"name":"hits","type":"long"}]}"#,
            )
            .unwrap(),
        )
    }

    impl Datum for Counter {
        fn schema(&self) -> Arc<Schema> {
            counter_schema()
        }

        fn to_value(&self) -> Value {
            Value::record([
                ("name", Value::from(self.name.as_str())),
                ("hits", Value::Long(self.hits)),
            ])
        }

        fn from_value(value: Value, _writer: &Arc<Schema>) -> CodecResult<Self> {
            let missing = |f: &str| CodecError::Decode(format!("missing `{f}`"));
            Ok(Self {
                name: value
                    .field("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| missing("name"))?
                    .to_string(),
                hits: value
                    .field("hits")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| missing("hits"))?,
            })
        }
    }

    #[test]
    fn typed_datum_roundtrip() {
        let counter = Counter {
            name: "home".into(),
            hits: 12,
        };
        for format in [Format::Binary, Format::Text] {
            let bytes = encode_datum(&counter, format).unwrap();
            let back: Counter = decode_datum(&bytes, &counter_schema(), format).unwrap();
            assert_eq!(back, counter);
        }
    }

    #[test]
    fn generic_record_takes_writer_schema() {
        let schema = counter_schema();
        let record = GenericRecord::new(
            Arc::clone(&schema),
            Value::record([("name", Value::from("a")), ("hits", Value::Long(1))]),
        );
        let bytes = encode_datum(&record, Format::Binary).unwrap();
        let back: GenericRecord = decode_datum(&bytes, &schema, Format::Binary).unwrap();
        assert_eq!(back.schema, schema);
        assert_eq!(back.get("hits"), Some(&Value::Long(1)));
    }
}
