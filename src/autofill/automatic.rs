//! Template automatic values, default values and validation
//!
//! The host calls these in two phases around a save: first
//! [`compute_automatic_values`] / [`compute_default_values`] produce a patch
//! for the in-progress payload, then [`validate`] checks the patched payload
//! against the template. Nothing here writes to storage.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::collaborators::DataTypeRegistry;
use crate::extractors::Extractor;
use crate::field_spec::FieldSpec;
use crate::mapping::{parse_mapping_lines, MappingEntry, Target, CONSTANT_SOURCE};
use crate::value::{append_unique, parse_flag, BaseCategory, ValueMap, ValueObject};

/// Template settings for one property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateProperty {
    pub term: String,
    /// Allowed data types; the first one types generated values
    pub data_types: Vec<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub required: bool,
    /// Pattern rendered against the payload on every save
    pub automatic_value: Option<String>,
    /// Pattern rendered when the property has no value yet
    pub default_value: Option<String>,
    pub min_values: Option<usize>,
    pub max_values: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Regular expression every literal must match entirely
    pub input_control: Option<String>,
}

impl TemplateProperty {
    fn data_type(&self) -> &str {
        self.data_types
            .first()
            .map(String::as_str)
            .unwrap_or(BaseCategory::Literal.as_str())
    }

    fn constant_entry(&self, pattern: &str) -> MappingEntry {
        MappingEntry {
            from: CONSTANT_SOURCE.to_string(),
            to: Target::from_spec(FieldSpec {
                field: self.term.clone(),
                data_type: Some(self.data_type().to_string()),
                pattern: Some(pattern.to_string()),
                ..FieldSpec::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTemplate {
    pub id: u64,
    pub label: String,
    /// Template-wide automatic values, as header-less mapping lines
    pub automatic_values: String,
    pub properties: Vec<TemplateProperty>,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_flag(&value).unwrap_or(false))
}

/// Parsed template mappings for the duration of one request
#[derive(Debug, Default)]
pub struct TemplateCache {
    automatic: HashMap<u64, Vec<MappingEntry>>,
    defaults: HashMap<u64, Vec<MappingEntry>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, template_id: u64) -> bool {
        self.automatic.contains_key(&template_id) || self.defaults.contains_key(&template_id)
    }

    /// Automatic value mapping of a template, parsed on first use.
    pub fn automatic_mapping(&mut self, template: &ResourceTemplate) -> &[MappingEntry] {
        self.automatic.entry(template.id).or_insert_with(|| {
            let mut mapping = parse_mapping_lines(&template.automatic_values);
            mapping.extend(template.properties.iter().filter_map(|property| {
                non_empty(property.automatic_value.as_deref()).map(|p| property.constant_entry(p))
            }));
            mapping
        })
    }

    pub fn default_mapping(&mut self, template: &ResourceTemplate) -> &[MappingEntry] {
        self.defaults.entry(template.id).or_insert_with(|| {
            template
                .properties
                .iter()
                .filter_map(|property| {
                    non_empty(property.default_value.as_deref()).map(|p| property.constant_entry(p))
                })
                .collect()
        })
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn existing_values(payload: &Value, term: &str) -> Vec<Value> {
    payload
        .get(term)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Values to add to `payload` for the template's automatic values.
///
/// `extractor` should read the payload as an internal source so that linked
/// resources are checked. References that fail the check are kept as
/// literals. Values already present on the property are left out.
pub fn compute_automatic_values(
    extractor: &Extractor,
    template: &ResourceTemplate,
    payload: &Value,
    cache: &mut TemplateCache,
) -> ValueMap {
    let mapping = cache.automatic_mapping(template);
    if mapping.is_empty() {
        return ValueMap::new();
    }
    let extracted = extractor.extract(payload, mapping);
    new_values(payload, extracted.values)
}

/// Values to add to `payload` for properties that have none yet.
pub fn compute_default_values(
    extractor: &Extractor,
    template: &ResourceTemplate,
    payload: &Value,
    cache: &mut TemplateCache,
) -> ValueMap {
    let mapping: Vec<MappingEntry> = cache
        .default_mapping(template)
        .iter()
        .filter(|entry| existing_values(payload, entry.to.field()).is_empty())
        .cloned()
        .collect();
    if mapping.is_empty() {
        return ValueMap::new();
    }
    let extracted = extractor.extract(payload, &mapping);
    new_values(payload, extracted.values)
}

fn new_values(payload: &Value, candidates: ValueMap) -> ValueMap {
    let mut patch = ValueMap::new();
    for (term, values) in candidates {
        let mut present = existing_values(payload, &term);
        for value in values {
            match append_unique(&mut present, value.into_literal_fallback()) {
                Some(added) => patch.entry(term.clone()).or_default().push(added),
                None => tracing::debug!(term = %term, "value already present"),
            }
        }
    }
    patch
}

/// Append patch values to the payload's property lists.
pub fn apply_patch(payload: &mut Value, patch: &ValueMap) {
    let Some(object) = payload.as_object_mut() else {
        tracing::warn!("payload is not an object, patch not applied");
        return;
    };
    for (term, values) in patch {
        let slot = object
            .entry(term.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot.as_array_mut() {
            Some(list) => list.extend(values.iter().map(ValueObject::to_json)),
            None => tracing::warn!(term = %term, "property is not a value list, patch skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{term}: a value is required")]
    Required { term: String },

    #[error("{term}: at least {min} values expected, {count} found")]
    TooFewValues { term: String, min: usize, count: usize },

    #[error("{term}: at most {max} values allowed, {count} found")]
    TooManyValues { term: String, max: usize, count: usize },

    #[error("{term}: \"{value}\" is shorter than {min} characters")]
    TooShort { term: String, value: String, min: usize },

    #[error("{term}: \"{value}\" is longer than {max} characters")]
    TooLong { term: String, value: String, max: usize },

    #[error("{term}: \"{value}\" does not match {pattern}")]
    InputControl { term: String, value: String, pattern: String },

    #[error("{term}: invalid input control {pattern}")]
    InvalidInputControl { term: String, pattern: String },

    #[error("{term}: unknown data type {data_type}")]
    UnknownDataType { term: String, data_type: String },
}

/// Check `payload` against the template's property constraints.
pub fn validate(
    data_types: &dyn DataTypeRegistry,
    template: &ResourceTemplate,
    payload: &Value,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for property in &template.properties {
        let term = &property.term;
        let values = existing_values(payload, term);
        let count = values.len();

        if count == 0 {
            if property.required {
                errors.push(ValidationError::Required { term: term.clone() });
            }
            continue;
        }
        if let Some(min) = property.min_values.filter(|min| count < *min) {
            errors.push(ValidationError::TooFewValues {
                term: term.clone(),
                min,
                count,
            });
        }
        if let Some(max) = property.max_values.filter(|max| count > *max) {
            errors.push(ValidationError::TooManyValues {
                term: term.clone(),
                max,
                count,
            });
        }

        let input_control = match non_empty(property.input_control.as_deref()) {
            Some(pattern) => match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) => Some((pattern, re)),
                Err(_) => {
                    errors.push(ValidationError::InvalidInputControl {
                        term: term.clone(),
                        pattern: pattern.to_string(),
                    });
                    None
                }
            },
            None => None,
        };

        for value in &values {
            let data_type = value.get("type").and_then(Value::as_str).unwrap_or_default();
            if !data_types.has(data_type) {
                errors.push(ValidationError::UnknownDataType {
                    term: term.clone(),
                    data_type: data_type.to_string(),
                });
            }

            let Some(text) = value.get("@value").and_then(Value::as_str) else {
                continue;
            };
            let length = text.chars().count();
            if let Some(min) = property.min_length.filter(|min| length < *min) {
                errors.push(ValidationError::TooShort {
                    term: term.clone(),
                    value: text.to_string(),
                    min,
                });
            }
            if let Some(max) = property.max_length.filter(|max| length > *max) {
                errors.push(ValidationError::TooLong {
                    term: term.clone(),
                    value: text.to_string(),
                    max,
                });
            }
            if let Some((pattern, re)) = &input_control {
                if !re.is_match(text) {
                    errors.push(ValidationError::InputControl {
                        term: term.clone(),
                        value: text.to_string(),
                        pattern: pattern.to_string(),
                    });
                }
            }
        }
    }

    errors
}
