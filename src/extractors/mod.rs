//! Value extraction
//!
//! One engine, two source formats. A mapping entry resolves its `from`
//! locator against the source (flattened JSON keys or XML node queries),
//! renders the target pattern and filter pipelines, then shapes the result
//! into a [`ValueObject`] according to the target's base category.

mod json_extractor;
mod xml_extractor;
pub mod xpath;

use indexmap::IndexMap;
use serde::Serialize;

use crate::collaborators::{DataTypeRegistry, PropertyCatalog, ResourceReader};
use crate::mapping::{MappingEntry, Target, TargetRole, LABEL_MARKER, VALUE_MARKER};
use crate::value::{BaseCategory, ValueContent, ValueMap, ValueObject};

/// Values extracted from one source record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub values: ValueMap,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, term: &str) -> &[ValueObject] {
        self.values.get(term).map(Vec::as_slice).unwrap_or_default()
    }

    /// First `@id` among the extracted values.
    pub fn first_uri(&self) -> Option<&str> {
        self.values.values().flatten().find_map(|v| match &v.content {
            ValueContent::Uri(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// First value text, used when no explicit label was mapped.
    pub fn first_text(&self) -> Option<String> {
        self.values.values().flatten().next().map(ValueObject::text)
    }
}

/// Raw extraction output without value shaping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleExtraction {
    /// Source locator
    pub field: String,
    /// Target term, or the marker for label and list targets
    pub target: String,
    pub value: String,
}

/// Read access to a source document by locator.
pub(crate) trait SourceLookup {
    /// Every value matching `locator`, in document order.
    fn values(&self, locator: &str) -> Vec<String>;

    fn first(&self, locator: &str) -> Option<String> {
        self.values(locator).into_iter().next()
    }
}

/// Extraction engine bound to the host collaborators of one request.
#[derive(Clone, Copy)]
pub struct Extractor<'a> {
    data_types: &'a dyn DataTypeRegistry,
    properties: Option<&'a dyn PropertyCatalog>,
    resources: Option<&'a dyn ResourceReader>,
    internal_source: bool,
}

impl<'a> Extractor<'a> {
    pub fn new(data_types: &'a dyn DataTypeRegistry) -> Self {
        Self {
            data_types,
            properties: None,
            resources: None,
            internal_source: false,
        }
    }

    pub fn with_properties(mut self, properties: &'a dyn PropertyCatalog) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Check resource references against `resources`. Without a reader,
    /// references stay unresolved.
    pub fn with_resources(mut self, resources: &'a dyn ResourceReader) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Read from the resource's own payload: resource references are checked
    /// against `resources` and bare terms resolve to their first value.
    pub fn internal(mut self, resources: &'a dyn ResourceReader) -> Self {
        self.resources = Some(resources);
        self.internal_source = true;
        self
    }

    pub fn is_internal(&self) -> bool {
        self.internal_source
    }

    pub(crate) fn run(&self, source: &dyn SourceLookup, mapping: &[MappingEntry]) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        for entry in mapping {
            let role = entry.to.role();
            if role == TargetRole::ListRoot {
                continue;
            }

            for raw in self.resolve_from(source, entry) {
                let value = render(&entry.to, &raw, source);
                if role == TargetRole::Label {
                    if result.label.is_none() && !value.is_empty() {
                        result.label = Some(value);
                    }
                    continue;
                }
                if value.is_empty() {
                    tracing::debug!(from = %entry.from, field = %entry.to.field(), "skipping empty value");
                    continue;
                }
                let shaped = self.shape(&entry.to, value);
                result
                    .values
                    .entry(entry.to.field().to_string())
                    .or_default()
                    .push(shaped);
            }
        }

        result
    }

    pub(crate) fn run_simple(&self, source: &dyn SourceLookup, mapping: &[MappingEntry]) -> Vec<SimpleExtraction> {
        let mut out = Vec::new();
        for entry in mapping {
            if entry.to.role() == TargetRole::ListRoot {
                continue;
            }
            let target = match entry.to.role() {
                TargetRole::Label => LABEL_MARKER.to_string(),
                _ => entry.to.field().to_string(),
            };
            for raw in self.resolve_from(source, entry) {
                out.push(SimpleExtraction {
                    field: entry.from.clone(),
                    target: target.clone(),
                    value: render(&entry.to, &raw, source),
                });
            }
        }
        out
    }

    pub(crate) fn run_value(&self, source: &dyn SourceLookup, entry: &MappingEntry) -> Option<String> {
        let raw = self.resolve_from(source, entry).into_iter().next()?;
        Some(render(&entry.to, &raw, source))
    }

    fn resolve_from(&self, source: &dyn SourceLookup, entry: &MappingEntry) -> Vec<String> {
        if entry.is_constant() {
            return vec![String::new()];
        }
        let values = source.values(&entry.from);
        if values.is_empty() {
            tracing::debug!(from = %entry.from, "source value not found");
        }
        values
    }

    /// Base category of a data type, literal when unknown.
    pub fn category(&self, data_type: &str) -> BaseCategory {
        self.data_types
            .base_category(data_type)
            .or_else(|| BaseCategory::from_builtin(data_type))
            .unwrap_or(BaseCategory::Literal)
    }

    fn shape(&self, target: &Target, value: String) -> ValueObject {
        let data_type = target
            .spec
            .data_type
            .clone()
            .unwrap_or_else(|| BaseCategory::Literal.as_str().to_string());
        let category = self.category(&data_type);

        let content = match category {
            BaseCategory::Resource => self.resolve_resource(&data_type, value),
            BaseCategory::Uri => ValueContent::Uri(value),
            BaseCategory::Literal => ValueContent::Literal(value),
        };

        let field = target.field();
        ValueObject {
            language: match category {
                BaseCategory::Resource => None,
                _ => target.spec.language.clone(),
            },
            is_public: target.spec.is_public.unwrap_or(true),
            property_id: self.properties.and_then(|p| p.property_id(field)),
            property_label: self.properties.and_then(|p| p.property_label(field)),
            data_type,
            content,
        }
    }

    fn resolve_resource(&self, data_type: &str, value: String) -> ValueContent {
        let Ok(id) = value.trim().parse::<u64>() else {
            return ValueContent::Unresolved(value);
        };
        let Some(resources) = self.resources else {
            return ValueContent::Unresolved(value);
        };
        match resources.read(resource_kind(data_type), id) {
            Ok(resource) => ValueContent::Resource(resource.id),
            Err(e) => {
                tracing::debug!(error = %e, "linked resource not found");
                ValueContent::Unresolved(value)
            }
        }
    }
}

fn resource_kind(data_type: &str) -> &'static str {
    match data_type {
        "resource:item" => "items",
        "resource:itemset" => "item_sets",
        "resource:media" => "media",
        "resource:annotation" => "annotations",
        _ => "resources",
    }
}

/// Render the target pattern for one raw value.
///
/// Twig expressions are evaluated first, then plain placeholders; the value
/// markers are bound to the raw value.
fn render(target: &Target, raw: &str, source: &dyn SourceLookup) -> String {
    let Some(pattern) = target.pattern() else {
        return raw.to_string();
    };

    let mut substitutions: IndexMap<&str, String> = IndexMap::new();
    for (expression, pipeline) in &target.filters {
        let base = match pipeline.variable.as_str() {
            "value" | "__value__" | VALUE_MARKER | "label" | "__label__" | LABEL_MARKER => raw.to_string(),
            variable => source.first(variable).unwrap_or_default(),
        };
        substitutions.insert(expression.as_str(), pipeline.apply(&base));
    }
    for (placeholder, default) in &target.replace {
        let value = match placeholder.as_str() {
            VALUE_MARKER | LABEL_MARKER => raw.to_string(),
            other => {
                let key = other.trim_start_matches('{').trim_end_matches('}');
                source.first(key).unwrap_or_else(|| default.clone())
            }
        };
        substitutions.insert(placeholder.as_str(), value);
    }
    substitutions.entry(VALUE_MARKER).or_insert_with(|| raw.to_string());
    substitutions.entry(LABEL_MARKER).or_insert_with(|| raw.to_string());

    substitute(pattern, &substitutions)
}

/// Replace every placeholder of `pattern` in a single left-to-right scan.
/// Inserted values are never scanned again; at one position the longest
/// placeholder wins.
fn substitute(pattern: &str, substitutions: &IndexMap<&str, String>) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    loop {
        let next = substitutions
            .iter()
            .filter(|(placeholder, _)| !placeholder.is_empty())
            .filter_map(|(placeholder, value)| rest.find(*placeholder).map(|pos| (pos, *placeholder, value)))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())));
        let Some((pos, placeholder, value)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + placeholder.len()..];
    }
}
