use std::collections::BTreeMap;

use crate::schema::Schema;

/// Dynamically-typed value interpreted against a [`Schema`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    /// Fields by name. Order does not matter on encode; decoded records list
    /// fields in schema order.
    Record(Vec<(String, Value)>),
    /// Enum symbol.
    Enum(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Explicit union branch index and value. Decoding always produces this
    /// form; encoding also accepts a bare value and picks the first branch it
    /// conforms to.
    Union(u32, Box<Value>),
}

impl Value {
    /// Build a record value from `(name, value)` pairs.
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the value's variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Union(..) => "union",
        }
    }

    /// Field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Remove and return a field of a record value.
    pub fn take_field(&mut self, name: &str) -> Option<Value> {
        match self {
            Self::Record(fields) => {
                let pos = fields.iter().position(|(k, _)| k == name)?;
                Some(fields.remove(pos).1)
            }
            _ => None,
        }
    }

    /// Strip any union wrappers.
    pub fn unwrap_union(self) -> Value {
        match self {
            Self::Union(_, inner) => inner.unwrap_union(),
            other => other,
        }
    }

    /// String content, looking through a union wrapper.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Union(_, inner) => inner.as_str(),
            _ => None,
        }
    }

    /// Integer content (int or long), looking through a union wrapper.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(i64::from(*n)),
            Self::Long(n) => Some(*n),
            Self::Union(_, inner) => inner.as_i64(),
            _ => None,
        }
    }

    /// Whether this value can be written with `schema` (shallow for records:
    /// field names are checked, field values recursively).
    pub fn conforms_to(&self, schema: &Schema) -> bool {
        match (self, schema) {
            (Self::Null, Schema::Null) => true,
            (Self::Boolean(_), Schema::Boolean) => true,
            (Self::Int(_), Schema::Int | Schema::Long | Schema::Float | Schema::Double) => true,
            (Self::Long(_), Schema::Long | Schema::Float | Schema::Double) => true,
            (Self::Float(_), Schema::Float | Schema::Double) => true,
            (Self::Double(_), Schema::Double) => true,
            (Self::Bytes(_), Schema::Bytes) => true,
            (Self::String(_), Schema::String) => true,
            (Self::Enum(symbol), Schema::Enum(e)) => e.index_of(symbol).is_some(),
            (Self::Array(items), Schema::Array(item_schema)) => {
                items.iter().all(|v| v.conforms_to(item_schema))
            }
            (Self::Map(entries), Schema::Map(value_schema)) => {
                entries.values().all(|v| v.conforms_to(value_schema))
            }
            (Self::Record(fields), Schema::Record(r)) => {
                fields
                    .iter()
                    .all(|(name, v)| r.field(name).is_some_and(|f| v.conforms_to(&f.schema)))
                    && r.fields.iter().all(|f| {
                        f.default.is_some() || fields.iter().any(|(name, _)| *name == f.name)
                    })
            }
            (Self::Union(index, inner), Schema::Union(branches)) => branches
                .get(*index as usize)
                .is_some_and(|b| inner.conforms_to(b)),
            (value, Schema::Union(branches)) => branches.iter().any(|b| value.conforms_to(b)),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_schema() -> Schema {
        Schema::parse_str(
            r#"{"type":"record","name":"Person","fields":[
                {"name":"name","type":"string"},
                {"name":"age","type":"int","default":0}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn record_accessors() {
        let mut v = Value::record([("name", Value::from("Ada")), ("age", Value::from(36))]);
        assert_eq!(v.field("name").and_then(Value::as_str), Some("Ada"));
        assert_eq!(v.take_field("age"), Some(Value::Int(36)));
        assert!(v.field("age").is_none());
    }

    #[test]
    fn conforms_allows_missing_defaulted_fields() {
        let schema = person_schema();
        let v = Value::record([("name", Value::from("Ada"))]);
        assert!(v.conforms_to(&schema));
        let missing_required = Value::record([("age", Value::from(1))]);
        assert!(!missing_required.conforms_to(&schema));
    }

    #[test]
    fn conforms_rejects_unknown_fields() {
        let v = Value::record([("name", Value::from("Ada")), ("zzz", Value::Null)]);
        assert!(!v.conforms_to(&person_schema()));
    }

    #[test]
    fn numeric_promotion() {
        assert!(Value::Int(1).conforms_to(&Schema::Long));
        assert!(Value::Long(1).conforms_to(&Schema::Double));
        assert!(!Value::Double(1.0).conforms_to(&Schema::Float));
    }

    #[test]
    fn unwrap_union_is_recursive() {
        let v = Value::Union(1, Box::new(Value::from("x")));
        assert_eq!(v.clone().unwrap_union(), Value::from("x"));
        assert_eq!(v.as_str(), Some("x"));
    }
}
