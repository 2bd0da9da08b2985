//! Values flowing through the bridge.
//!
//! [`StateValue`] is what the loosely-typed front-end hands in. [`PropertyValue`]
//! is what the backend keeps after capture: scalars, sequences, dictionaries,
//! structures, or the printed form of a value captured without its structure.

use serde_json::{Map, Number, Value};
use std::fmt::{self, Write};

/// A front-end value attached to a log call.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Seq(Vec<StateValue>),
    Map(Vec<(String, StateValue)>),
    Object(ObjectValue),
}

/// A composite value with a named type and ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub type_name: String,
    pub fields: Vec<(String, StateValue)>,
}

impl ObjectValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, builder style.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

impl StateValue {
    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's runtime shape, used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            StateValue::Null => "null",
            StateValue::Bool(_) => "bool",
            StateValue::Int(_) => "i32",
            StateValue::Long(_) => "i64",
            StateValue::UInt(_) => "u64",
            StateValue::Float(_) => "f64",
            StateValue::Str(_) => "string",
            StateValue::Seq(_) => "sequence",
            StateValue::Map(_) => "map",
            StateValue::Object(obj) => &obj.type_name,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Null => f.write_str("null"),
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Int(i) => write!(f, "{}", i),
            StateValue::Long(i) => write!(f, "{}", i),
            StateValue::UInt(u) => write!(f, "{}", u),
            StateValue::Float(x) => write!(f, "{}", x),
            StateValue::Str(s) => f.write_str(s),
            StateValue::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            StateValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: ", k)?;
                    v.fmt_nested(f)?;
                }
                if !entries.is_empty() {
                    f.write_str(" ")?;
                }
                f.write_str("}")
            }
            StateValue::Object(obj) => {
                f.write_str(&obj.type_name)?;
                if obj.fields.is_empty() {
                    return Ok(());
                }
                f.write_str(" {")?;
                for (i, (k, v)) in obj.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: ", k)?;
                    v.fmt_nested(f)?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Str(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Str(s)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<i32> for StateValue {
    fn from(i: i32) -> Self {
        StateValue::Int(i)
    }
}

impl From<u32> for StateValue {
    fn from(i: u32) -> Self {
        StateValue::Long(i64::from(i))
    }
}

impl From<i64> for StateValue {
    fn from(i: i64) -> Self {
        StateValue::Long(i)
    }
}

impl From<u64> for StateValue {
    fn from(u: u64) -> Self {
        StateValue::UInt(u)
    }
}

impl From<usize> for StateValue {
    fn from(u: usize) -> Self {
        StateValue::UInt(u as u64)
    }
}

impl From<f64> for StateValue {
    fn from(x: f64) -> Self {
        StateValue::Float(x)
    }
}

impl From<ObjectValue> for StateValue {
    fn from(obj: ObjectValue) -> Self {
        StateValue::Object(obj)
    }
}

impl<T: Into<StateValue>> From<Option<T>> for StateValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(StateValue::Null, Into::into)
    }
}

impl<T: Into<StateValue>> From<Vec<T>> for StateValue {
    fn from(items: Vec<T>) -> Self {
        StateValue::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for StateValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => StateValue::Null,
            Value::Bool(b) => StateValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => StateValue::Int(small),
                        Err(_) => StateValue::Long(i),
                    }
                } else if let Some(u) = n.as_u64() {
                    StateValue::UInt(u)
                } else {
                    StateValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => StateValue::Str(s.clone()),
            Value::Array(items) => StateValue::Seq(items.iter().map(StateValue::from).collect()),
            Value::Object(map) => StateValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), StateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// An atomic captured value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    fn render(&self, out: &mut String, literal: bool) {
        // Writing into a String cannot fail.
        let _ = match self {
            ScalarValue::Null => out.write_str("null"),
            ScalarValue::Bool(b) => write!(out, "{}", b),
            ScalarValue::Int(i) => write!(out, "{}", i),
            ScalarValue::Long(i) => write!(out, "{}", i),
            ScalarValue::UInt(u) => write!(out, "{}", u),
            ScalarValue::Float(x) => write!(out, "{}", x),
            ScalarValue::Str(s) if literal => out.write_str(s),
            ScalarValue::Str(s) => write!(out, "{:?}", s),
        };
    }

    fn to_json(&self) -> Value {
        match self {
            ScalarValue::Null => Value::Null,
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Int(i) => Value::from(*i),
            ScalarValue::Long(i) => Value::from(*i),
            ScalarValue::UInt(u) => Value::from(*u),
            ScalarValue::Float(x) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
            ScalarValue::Str(s) => Value::String(s.clone()),
        }
    }
}

/// A value as captured by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(ScalarValue),
    Sequence(Vec<PropertyValue>),
    Dictionary(Vec<(String, PropertyValue)>),
    Structure(StructureValue),
    /// A composite value kept only as its printed form.
    Captured(String),
}

/// A destructured composite value.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureValue {
    pub type_tag: Option<String>,
    pub properties: Vec<(String, PropertyValue)>,
}

impl StructureValue {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl PropertyValue {
    pub fn null() -> Self {
        PropertyValue::Scalar(ScalarValue::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        PropertyValue::Scalar(ScalarValue::Str(s.into()))
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(ScalarValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Render the value into `out`.
    ///
    /// Format `l` renders strings without quotes; any other format is ignored.
    pub fn render(&self, out: &mut String, format: Option<&str>) {
        let literal = format == Some("l");
        match self {
            PropertyValue::Scalar(s) => s.render(out, literal),
            PropertyValue::Captured(text) => out.push_str(text),
            PropertyValue::Sequence(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out, None);
                }
                out.push(']');
            }
            PropertyValue::Dictionary(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "[{:?}]: ", k);
                    v.render(out, None);
                }
                out.push('}');
            }
            PropertyValue::Structure(st) => {
                if let Some(tag) = &st.type_tag {
                    out.push_str(tag);
                    out.push(' ');
                }
                out.push_str("{ ");
                for (i, (k, v)) in st.properties.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(k);
                    out.push_str(": ");
                    v.render(out, None);
                }
                if !st.properties.is_empty() {
                    out.push(' ');
                }
                out.push('}');
            }
        }
    }

    /// JSON form used by the line sinks.
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Scalar(s) => s.to_json(),
            PropertyValue::Captured(text) => Value::String(text.clone()),
            PropertyValue::Sequence(items) => {
                Value::Array(items.iter().map(PropertyValue::to_json).collect())
            }
            PropertyValue::Dictionary(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            PropertyValue::Structure(st) => {
                let mut map = Map::new();
                if let Some(tag) = &st.type_tag {
                    map.insert("$type".to_string(), Value::String(tag.clone()));
                }
                for (k, v) in &st.properties {
                    map.insert(k.clone(), v.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out, None);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_display() {
        let order = ObjectValue::new("Order").field("Id", 7).field("Sku", "A-1");
        assert_eq!(
            StateValue::from(order).to_string(),
            "Order { Id: 7, Sku: \"A-1\" }"
        );
    }

    #[test]
    fn test_json_conversion_narrows_integers() {
        let value = StateValue::from(&json!({"small": 5, "big": 5_000_000_000i64, "f": 1.5}));
        let StateValue::Map(entries) = value else {
            panic!("expected map");
        };
        assert_eq!(entries[0].1, StateValue::Long(5_000_000_000));
        assert_eq!(entries[1].1, StateValue::Float(1.5));
        assert_eq!(entries[2].1, StateValue::Int(5));
    }

    #[test]
    fn test_render_quotes_strings_unless_literal() {
        let v = PropertyValue::string("World");
        let mut quoted = String::new();
        v.render(&mut quoted, None);
        assert_eq!(quoted, "\"World\"");

        let mut literal = String::new();
        v.render(&mut literal, Some("l"));
        assert_eq!(literal, "World");
    }

    #[test]
    fn test_structure_json_carries_type_tag() {
        let v = PropertyValue::Structure(StructureValue {
            type_tag: Some("Order".into()),
            properties: vec![("Id".into(), PropertyValue::Scalar(ScalarValue::Int(7)))],
        });
        assert_eq!(v.to_json(), json!({"$type": "Order", "Id": 7}));
        assert_eq!(v.to_string(), "Order { Id: 7 }");
    }
}
