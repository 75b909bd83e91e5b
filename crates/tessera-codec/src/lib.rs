//! Schemas and value codecs for Tessera.
//!
//! Values are described by Avro-style JSON schemas ([`Schema`]) and carried
//! as dynamically-typed [`Value`]s. Two wire formats are supported, selected
//! by [`Format`]:
//!
//! - [`Format::Binary`] -- compact Avro binary encoding
//! - [`Format::Text`] -- Avro JSON encoding, for inspection and debugging
//!
//! Every schema has a canonical form ([`Schema::canonical_form`]) whose hash
//! is the schema's identity across processes.
//!
//! Typed values implement [`Datum`]; [`GenericRecord`] is the untyped
//! fallback.

pub mod codec;
pub mod datum;
pub mod error;
pub mod schema;
pub mod value;

mod binary;
mod text;

pub use codec::{decode, encode};
pub use datum::{decode_datum, encode_datum, Datum, GenericRecord};
pub use error::{CodecError, CodecResult};
pub use schema::{EnumSchema, Field, Name, RecordSchema, Schema};
pub use tessera_types::Format;
pub use value::Value;

#[cfg(test)]
mod proptests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn event_schema() -> Schema {
        Schema::parse_str(
            r#"{"type":"record","name":"Event","namespace":"test","fields":[
                {"name":"id","type":"long"},
                {"name":"label","type":"string"},
                {"name":"weight","type":"double"},
                {"name":"payload","type":"bytes"},
                {"name":"note","type":["null","string"]},
                {"name":"counts","type":{"type":"map","values":"int"}},
                {"name":"flags","type":{"type":"array","items":"boolean"}}
            ]}"#,
        )
        .unwrap()
    }

    fn arb_event() -> impl Strategy<Value = Value> {
        (
            any::<i64>(),
            ".*",
            -1.0e12f64..1.0e12,
            proptest::collection::vec(any::<u8>(), 0..64),
            proptest::option::of("[a-z]{0,12}"),
            proptest::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..6),
            proptest::collection::vec(any::<bool>(), 0..16),
        )
            .prop_map(|(id, label, weight, payload, note, counts, flags)| {
                let note = match note {
                    Some(s) => Value::Union(1, Box::new(Value::String(s))),
                    None => Value::Union(0, Box::new(Value::Null)),
                };
                let counts: BTreeMap<String, Value> =
                    counts.into_iter().map(|(k, v)| (k, Value::Int(v))).collect();
                Value::record([
                    ("id", Value::Long(id)),
                    ("label", Value::String(label)),
                    ("weight", Value::Double(weight)),
                    ("payload", Value::Bytes(payload)),
                    ("note", note),
                    ("counts", Value::Map(counts)),
                    ("flags", Value::Array(flags.into_iter().map(Value::Boolean).collect())),
                ])
            })
    }

    proptest! {
        #[test]
        fn prop_both_formats_roundtrip(event in arb_event()) {
            let schema = event_schema();
            for format in [Format::Binary, Format::Text] {
                let bytes = encode(&event, &schema, format).unwrap();
                prop_assert_eq!(decode(&bytes, &schema, format).unwrap(), event.clone());
            }
        }

        #[test]
        fn prop_binary_prefixes_never_decode(event in arb_event(), cut in 0usize..1000) {
            let schema = event_schema();
            let bytes = encode(&event, &schema, Format::Binary).unwrap();
            let cut = cut % bytes.len();
            prop_assert!(decode(&bytes[..cut], &schema, Format::Binary).is_err());
        }

        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let schema = event_schema();
            let _ = decode(&bytes, &schema, Format::Binary);
            let _ = decode(&bytes, &schema, Format::Text);
        }
    }
}
