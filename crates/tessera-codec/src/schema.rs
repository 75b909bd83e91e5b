//! Schema model, JSON schema parser, and canonical form.
//!
//! Schemas are written in the Avro JSON style. Named types (records and
//! enums) may be referenced by full name once they have been defined; the
//! parser inlines the referenced definition, and [`Schema::canonical_form`]
//! writes it back as a name reference on every occurrence after the first.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::{Map, Value as Json};

use crate::error::{CodecError, CodecResult};
use crate::text;
use crate::value::Value;

/// Name of a record or enum, with optional namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
    pub name: String,
    pub namespace: Option<String>,
}

impl Name {
    /// Create a name without namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Dotted full name (`namespace.name`, or just `name`).
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A single record field.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    /// Value written when a record omits this field.
    pub default: Option<Value>,
}

/// Record type definition.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    pub name: Name,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Enum type definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumSchema {
    pub name: Name,
    pub symbols: Vec<String>,
}

impl EnumSchema {
    /// Position of `symbol`, if it belongs to this enum.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// Structural definition of a record's shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record(RecordSchema),
    Enum(EnumSchema),
    Array(Box<Schema>),
    Map(Box<Schema>),
    Union(Vec<Schema>),
}

impl Schema {
    /// Parse a schema from its JSON text.
    pub fn parse_str(text: &str) -> CodecResult<Self> {
        let json: Json =
            serde_json::from_str(text).map_err(|e| CodecError::InvalidSchema(e.to_string()))?;
        Self::parse(&json)
    }

    /// Parse a schema from an already-parsed JSON document.
    pub fn parse(json: &Json) -> CodecResult<Self> {
        Parser::default().parse(json, None)
    }

    /// Type name used in error messages and as the union branch label in the
    /// text format.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Boolean => "boolean".into(),
            Self::Int => "int".into(),
            Self::Long => "long".into(),
            Self::Float => "float".into(),
            Self::Double => "double".into(),
            Self::Bytes => "bytes".into(),
            Self::String => "string".into(),
            Self::Record(r) => r.name.fullname(),
            Self::Enum(e) => e.name.fullname(),
            Self::Array(_) => "array".into(),
            Self::Map(_) => "map".into(),
            Self::Union(_) => "union".into(),
        }
    }

    /// Normalized text used as the hash input for schema identity.
    ///
    /// Docs, defaults and attribute order do not affect the result, and
    /// named types are always written with their full names.
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();
        write_canonical(self, &mut out, &mut seen);
        out
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_form())
    }
}

fn primitive(name: &str) -> Option<Schema> {
    match name {
        "null" => Some(Schema::Null),
        "boolean" => Some(Schema::Boolean),
        "int" => Some(Schema::Int),
        "long" => Some(Schema::Long),
        "float" => Some(Schema::Float),
        "double" => Some(Schema::Double),
        "bytes" => Some(Schema::Bytes),
        "string" => Some(Schema::String),
        _ => None,
    }
}

fn invalid(reason: impl Into<String>) -> CodecError {
    CodecError::InvalidSchema(reason.into())
}

fn validate_identifier(ident: &str) -> CodecResult<()> {
    let mut chars = ident.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(invalid(format!("invalid identifier `{ident}`")))
    }
}

/// Parser state: the named types defined so far.
#[derive(Default)]
struct Parser {
    named: HashMap<String, Schema>,
}

impl Parser {
    fn parse(&mut self, json: &Json, namespace: Option<&str>) -> CodecResult<Schema> {
        match json {
            Json::String(name) => self.resolve_name(name, namespace),
            Json::Array(branches) => self.parse_union(branches, namespace),
            Json::Object(map) => self.parse_complex(map, namespace),
            other => Err(invalid(format!("unexpected schema element: {other}"))),
        }
    }

    fn resolve_name(&self, name: &str, namespace: Option<&str>) -> CodecResult<Schema> {
        if let Some(schema) = primitive(name) {
            return Ok(schema);
        }
        if !name.contains('.') {
            if let Some(ns) = namespace {
                if let Some(schema) = self.named.get(&format!("{ns}.{name}")) {
                    return Ok(schema.clone());
                }
            }
        }
        self.named
            .get(name)
            .cloned()
            .ok_or_else(|| invalid(format!("unknown type `{name}`")))
    }

    fn parse_complex(
        &mut self,
        map: &Map<String, Json>,
        namespace: Option<&str>,
    ) -> CodecResult<Schema> {
        let ty = map
            .get("type")
            .ok_or_else(|| invalid("missing `type` attribute"))?;
        match ty {
            Json::String(t) => match t.as_str() {
                "record" => self.parse_record(map, namespace),
                "enum" => self.parse_enum(map, namespace),
                "array" => {
                    let items = map
                        .get("items")
                        .ok_or_else(|| invalid("array without `items`"))?;
                    Ok(Schema::Array(Box::new(self.parse(items, namespace)?)))
                }
                "map" => {
                    let values = map
                        .get("values")
                        .ok_or_else(|| invalid("map without `values`"))?;
                    Ok(Schema::Map(Box::new(self.parse(values, namespace)?)))
                }
                other => self.resolve_name(other, namespace),
            },
            nested => self.parse(nested, namespace),
        }
    }

    fn parse_name(&self, map: &Map<String, Json>, namespace: Option<&str>) -> CodecResult<Name> {
        let raw = map
            .get("name")
            .and_then(Json::as_str)
            .ok_or_else(|| invalid("named type without `name`"))?;
        let explicit = map
            .get("namespace")
            .and_then(Json::as_str)
            .filter(|ns| !ns.is_empty());
        let name = match raw.rsplit_once('.') {
            Some((ns, simple)) => Name {
                name: simple.to_string(),
                namespace: Some(ns.to_string()),
            },
            None => Name {
                name: raw.to_string(),
                namespace: explicit.or(namespace).map(str::to_string),
            },
        };
        validate_identifier(&name.name)?;
        if let Some(ns) = &name.namespace {
            for part in ns.split('.') {
                validate_identifier(part)?;
            }
        }
        Ok(name)
    }

    fn register(&mut self, name: &Name, schema: &Schema) -> CodecResult<()> {
        let full = name.fullname();
        if primitive(&full).is_some() {
            return Err(invalid(format!("`{full}` shadows a primitive type")));
        }
        if self.named.contains_key(&full) {
            return Err(invalid(format!("duplicate definition of `{full}`")));
        }
        self.named.insert(full, schema.clone());
        Ok(())
    }

    fn parse_record(
        &mut self,
        map: &Map<String, Json>,
        namespace: Option<&str>,
    ) -> CodecResult<Schema> {
        let name = self.parse_name(map, namespace)?;
        let fields_json = map
            .get("fields")
            .and_then(Json::as_array)
            .ok_or_else(|| invalid(format!("record `{}` without `fields`", name.fullname())))?;

        let mut fields = Vec::with_capacity(fields_json.len());
        let mut seen = HashSet::new();
        for field_json in fields_json {
            let field_map = field_json
                .as_object()
                .ok_or_else(|| invalid("record field must be an object"))?;
            let field_name = field_map
                .get("name")
                .and_then(Json::as_str)
                .ok_or_else(|| invalid("record field without `name`"))?;
            validate_identifier(field_name)?;
            if !seen.insert(field_name.to_string()) {
                return Err(invalid(format!(
                    "duplicate field `{field_name}` in `{}`",
                    name.fullname()
                )));
            }
            let field_type = field_map
                .get("type")
                .ok_or_else(|| invalid(format!("field `{field_name}` without `type`")))?;
            let schema = self.parse(field_type, name.namespace.as_deref())?;
            let default = match field_map.get("default") {
                Some(json) => Some(
                    text::value_from_default(json, &schema)
                        .map_err(|e| invalid(format!("default of `{field_name}`: {e}")))?,
                ),
                None => None,
            };
            fields.push(Field {
                name: field_name.to_string(),
                schema,
                default,
            });
        }

        let schema = Schema::Record(RecordSchema {
            name: name.clone(),
            fields,
        });
        self.register(&name, &schema)?;
        Ok(schema)
    }

    fn parse_enum(
        &mut self,
        map: &Map<String, Json>,
        namespace: Option<&str>,
    ) -> CodecResult<Schema> {
        let name = self.parse_name(map, namespace)?;
        let symbols_json = map
            .get("symbols")
            .and_then(Json::as_array)
            .ok_or_else(|| invalid(format!("enum `{}` without `symbols`", name.fullname())))?;
        if symbols_json.is_empty() {
            return Err(invalid(format!("enum `{}` has no symbols", name.fullname())));
        }

        let mut symbols = Vec::with_capacity(symbols_json.len());
        for symbol in symbols_json {
            let symbol = symbol
                .as_str()
                .ok_or_else(|| invalid("enum symbol must be a string"))?;
            validate_identifier(symbol)?;
            if symbols.iter().any(|s| s == symbol) {
                return Err(invalid(format!("duplicate enum symbol `{symbol}`")));
            }
            symbols.push(symbol.to_string());
        }

        let schema = Schema::Enum(EnumSchema {
            name: name.clone(),
            symbols,
        });
        self.register(&name, &schema)?;
        Ok(schema)
    }

    fn parse_union(&mut self, branches: &[Json], namespace: Option<&str>) -> CodecResult<Schema> {
        if branches.is_empty() {
            return Err(invalid("union must have at least one branch"));
        }
        let mut parsed = Vec::with_capacity(branches.len());
        let mut names = HashSet::new();
        for branch in branches {
            let schema = self.parse(branch, namespace)?;
            if matches!(schema, Schema::Union(_)) {
                return Err(invalid("unions may not directly contain unions"));
            }
            if !names.insert(schema.type_name()) {
                return Err(invalid(format!(
                    "duplicate union branch `{}`",
                    schema.type_name()
                )));
            }
            parsed.push(schema);
        }
        Ok(Schema::Union(parsed))
    }
}

fn push_json_str(out: &mut String, s: &str) {
    out.push_str(&Json::String(s.to_string()).to_string());
}

fn write_canonical(schema: &Schema, out: &mut String, seen: &mut HashSet<String>) {
    match schema {
        Schema::Record(record) => {
            let full = record.name.fullname();
            if !seen.insert(full.clone()) {
                push_json_str(out, &full);
                return;
            }
            out.push_str("{\"name\":");
            push_json_str(out, &full);
            out.push_str(",\"type\":\"record\",\"fields\":[");
            for (i, field) in record.fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                push_json_str(out, &field.name);
                out.push_str(",\"type\":");
                write_canonical(&field.schema, out, seen);
                out.push('}');
            }
            out.push_str("]}");
        }
        Schema::Enum(enumeration) => {
            let full = enumeration.name.fullname();
            if !seen.insert(full.clone()) {
                push_json_str(out, &full);
                return;
            }
            out.push_str("{\"name\":");
            push_json_str(out, &full);
            out.push_str(",\"type\":\"enum\",\"symbols\":[");
            for (i, symbol) in enumeration.symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_json_str(out, symbol);
            }
            out.push_str("]}");
        }
        Schema::Array(items) => {
            out.push_str("{\"type\":\"array\",\"items\":");
            write_canonical(items, out, seen);
            out.push('}');
        }
        Schema::Map(values) => {
            out.push_str("{\"type\":\"map\",\"values\":");
            write_canonical(values, out, seen);
            out.push('}');
        }
        Schema::Union(branches) => {
            out.push('[');
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(branch, out, seen);
            }
            out.push(']');
        }
        primitive => push_json_str(out, &primitive.type_name()),
    }
}
