//! Extraction from JSON sources
//!
//! The source is flattened once per call and `from` locators are plain
//! lookups of escaped dotted keys (`response.docs.0.title`).

use serde_json::Value;

use super::{ExtractionResult, Extractor, SimpleExtraction, SourceLookup};
use crate::flatten::{flatten, get_path, scalar_to_string, FlatMap};
use crate::mapping::{MappingEntry, TargetRole};

// Identity fields tried, in order, when a bare term is looked up in a
// resource payload.
const PAYLOAD_VALUE_KEYS: [&str; 3] = ["@value", "@id", "value_resource_id"];

pub(crate) struct JsonSource {
    flat: FlatMap,
    internal: bool,
}

impl JsonSource {
    pub(crate) fn new(source: &Value, internal: bool) -> Self {
        Self {
            flat: flatten(source),
            internal,
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.flat.get(key).filter(|v| !v.is_null()) {
            return Some(scalar_to_string(value));
        }
        if !self.internal {
            return None;
        }
        PAYLOAD_VALUE_KEYS.iter().find_map(|field| {
            self.flat
                .get(&format!("{}.0.{}", key, field))
                .filter(|v| !v.is_null())
                .map(scalar_to_string)
        })
    }
}

impl SourceLookup for JsonSource {
    fn values(&self, locator: &str) -> Vec<String> {
        self.lookup(locator).into_iter().collect()
    }
}

impl<'a> Extractor<'a> {
    /// Extract all mapped values from a JSON document.
    pub fn extract(&self, source: &Value, mapping: &[MappingEntry]) -> ExtractionResult {
        let source = JsonSource::new(source, self.is_internal());
        self.run(&source, mapping)
    }

    /// Extract raw `{field, target, value}` triples without shaping.
    pub fn extract_simple(&self, source: &Value, mapping: &[MappingEntry]) -> Vec<SimpleExtraction> {
        let source = JsonSource::new(source, self.is_internal());
        self.run_simple(&source, mapping)
    }

    /// Resolve a single mapping entry to its final string, before shaping.
    pub fn extract_value(&self, source: &Value, entry: &MappingEntry) -> Option<String> {
        let source = JsonSource::new(source, self.is_internal());
        self.run_value(&source, entry)
    }

    /// Extract one result per record.
    ///
    /// A `{list}` entry selects the records: its `from` path points to an
    /// array (or object) whose members are extracted independently. Without
    /// such an entry the whole document is a single record.
    pub fn extract_list(&self, source: &Value, mapping: &[MappingEntry]) -> Vec<ExtractionResult> {
        let Some(root) = mapping.iter().find(|e| e.to.role() == TargetRole::ListRoot) else {
            return vec![self.extract(source, mapping)];
        };

        let records: Vec<&Value> = match get_path(source, &root.from) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(map)) => map.values().collect(),
            _ => {
                tracing::debug!(root = %root.from, "list root not found in source");
                Vec::new()
            }
        };

        records
            .into_iter()
            .map(|record| self.extract(record, mapping))
            .filter(|result| !result.is_empty() || result.label.is_some())
            .collect()
    }
}
