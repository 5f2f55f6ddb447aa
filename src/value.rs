//! Value objects
//!
//! The normalized unit the engine emits for a resource payload, plus the
//! helpers that compare emitted values with the ones already stored.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Base category of a data type, deciding which identity field a value carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseCategory {
    Literal,
    Uri,
    Resource,
}

impl BaseCategory {
    /// Category of the built-in data types. Returns `None` for types that
    /// need a registry lookup (custom vocabularies, module types).
    pub fn from_builtin(data_type: &str) -> Option<Self> {
        match data_type {
            "literal" | "html" | "xml" | "boolean" => Some(Self::Literal),
            "uri" => Some(Self::Uri),
            "resource" => Some(Self::Resource),
            t if t.starts_with("resource:") => Some(Self::Resource),
            t if t.starts_with("numeric:") => Some(Self::Literal),
            t if t.starts_with("valuesuggest:") || t.starts_with("valuesuggestall:") => {
                Some(Self::Uri)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Uri => "uri",
            Self::Resource => "resource",
        }
    }
}

/// The identity part of a value. Exactly one is present per value object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueContent {
    Literal(String),
    Uri(String),
    Resource(u64),
    /// A resource reference that could not be validated; the raw text is kept
    /// so the caller can decide to keep or drop it.
    Unresolved(String),
}

/// One shaped metadata value, serialized in the host payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueObject {
    pub data_type: String,
    pub content: ValueContent,
    pub language: Option<String>,
    pub is_public: bool,
    pub property_id: Option<u64>,
    pub property_label: Option<String>,
}

impl Serialize for ValueObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.data_type)?;
        match &self.content {
            ValueContent::Literal(v) | ValueContent::Unresolved(v) => {
                map.serialize_entry("@value", v)?
            }
            ValueContent::Uri(v) => map.serialize_entry("@id", v)?,
            ValueContent::Resource(id) => map.serialize_entry("value_resource_id", id)?,
        }
        if let Some(language) = &self.language {
            map.serialize_entry("@language", language)?;
        }
        map.serialize_entry("is_public", &self.is_public)?;
        if let Some(property_id) = self.property_id {
            map.serialize_entry("property_id", &property_id)?;
        }
        if let Some(label) = &self.property_label {
            map.serialize_entry("property_label", label)?;
        }
        map.end()
    }
}

impl ValueObject {
    pub fn literal(data_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(data_type, ValueContent::Literal(value.into()))
    }

    pub fn uri(data_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(data_type, ValueContent::Uri(id.into()))
    }

    pub fn resource(data_type: impl Into<String>, id: u64) -> Self {
        Self::new(data_type, ValueContent::Resource(id))
    }

    fn new(data_type: impl Into<String>, content: ValueContent) -> Self {
        Self {
            data_type: data_type.into(),
            content,
            language: None,
            is_public: true,
            property_id: None,
            property_label: None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.content, ValueContent::Unresolved(_))
    }

    /// The identity text of the value: `@value`, `@id` or the resource id.
    pub fn text(&self) -> String {
        match &self.content {
            ValueContent::Literal(v) | ValueContent::Uri(v) | ValueContent::Unresolved(v) => v.clone(),
            ValueContent::Resource(id) => id.to_string(),
        }
    }

    /// Convert an unresolved resource reference into a plain literal.
    pub fn into_literal_fallback(self) -> Self {
        match self.content {
            ValueContent::Unresolved(raw) => Self {
                data_type: BaseCategory::Literal.as_str().to_string(),
                content: ValueContent::Literal(raw),
                ..self
            },
            _ => self,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Ordered property term → values map in the host payload shape.
pub type ValueMap = IndexMap<String, Vec<ValueObject>>;

/// Interpret the many encodings of a boolean flag found in settings and
/// payloads. Returns `None` when the value says neither yes nor no.
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        Value::Null => Some(false),
        _ => None,
    }
}

/// Whether `candidate` is already present among `existing` payload values.
///
/// Values are the same when their type and identity field match: `@value`
/// and `@id` compared trimmed, `value_resource_id` compared as an integer.
/// Language and visibility are not part of the identity.
pub fn is_duplicate(candidate: &ValueObject, existing: &[Value]) -> bool {
    existing.iter().any(|value| same_value(candidate, value))
}

fn same_value(candidate: &ValueObject, stored: &Value) -> bool {
    let stored_type = stored.get("type").and_then(Value::as_str).unwrap_or_default();
    if stored_type != candidate.data_type {
        return false;
    }
    match &candidate.content {
        ValueContent::Literal(v) | ValueContent::Unresolved(v) => stored
            .get("@value")
            .map(|s| crate::flatten::scalar_to_string(s).trim() == v.trim())
            .unwrap_or(false),
        ValueContent::Uri(v) => stored
            .get("@id")
            .and_then(Value::as_str)
            .map(|s| s.trim() == v.trim())
            .unwrap_or(false),
        ValueContent::Resource(id) => stored
            .get("value_resource_id")
            .and_then(resource_id_of)
            .map(|stored_id| stored_id == *id)
            .unwrap_or(false),
    }
}

/// Read a resource id stored either as a number or a numeric string.
pub fn resource_id_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Append `candidate` to `existing` unless an equal value is already there.
///
/// Returns the appended value, or `None` when it was a duplicate.
pub fn append_unique(existing: &mut Vec<Value>, candidate: ValueObject) -> Option<ValueObject> {
    if is_duplicate(&candidate, existing) {
        return None;
    }
    existing.push(candidate.to_json());
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let mut value = ValueObject::literal("literal", "Paris");
        value.property_id = Some(1);
        assert_eq!(
            value.to_json(),
            json!({"type": "literal", "@value": "Paris", "is_public": true, "property_id": 1})
        );

        let value = ValueObject::uri("uri", "https://example.org/1");
        assert_eq!(value.to_json()["@id"], "https://example.org/1");
        assert!(value.to_json().get("@value").is_none());

        let value = ValueObject::resource("resource:item", 12);
        assert_eq!(value.to_json()["value_resource_id"], 12);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(&json!(true)), Some(true));
        assert_eq!(parse_flag(&json!(1)), Some(true));
        assert_eq!(parse_flag(&json!("1")), Some(true));
        assert_eq!(parse_flag(&json!("Yes")), Some(true));
        assert_eq!(parse_flag(&json!("on")), Some(true));
        assert_eq!(parse_flag(&json!("off")), Some(false));
        assert_eq!(parse_flag(&json!(0)), Some(false));
        assert_eq!(parse_flag(&json!("maybe")), None);
        assert_eq!(parse_flag(&json!(["1"])), None);
    }

    #[test]
    fn test_append_unique() {
        let mut existing = vec![
            json!({"type": "literal", "@value": "Paris ", "is_public": true}),
            json!({"type": "resource:item", "value_resource_id": "7", "is_public": true}),
        ];

        assert!(append_unique(&mut existing, ValueObject::literal("literal", "Paris")).is_none());
        assert!(append_unique(&mut existing, ValueObject::resource("resource:item", 7)).is_none());
        assert_eq!(existing.len(), 2);

        let appended = append_unique(&mut existing, ValueObject::literal("literal", "Lyon"));
        assert!(appended.is_some());
        assert_eq!(existing.len(), 3);
        assert_eq!(existing[2]["@value"], "Lyon");

        // Same text under another type is a different value.
        assert!(append_unique(&mut existing, ValueObject::uri("uri", "Paris")).is_some());
    }

    #[test]
    fn test_language_does_not_change_identity() {
        let existing = vec![json!({"type": "literal", "@value": "Paris", "@language": "fr"})];
        let mut candidate = ValueObject::literal("literal", "Paris");
        candidate.language = Some("en".to_string());
        candidate.is_public = false;
        assert!(is_duplicate(&candidate, &existing));
    }

    #[test]
    fn test_literal_fallback() {
        let value = ValueObject {
            content: ValueContent::Unresolved("Paris".to_string()),
            ..ValueObject::resource("resource:item", 0)
        };
        assert!(value.is_unresolved());
        let value = value.into_literal_fallback();
        assert_eq!(value.data_type, "literal");
        assert_eq!(value.content, ValueContent::Literal("Paris".to_string()));
    }
}
