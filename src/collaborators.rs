//! Host collaborators
//!
//! The engine does not own storage. Resource validation, data type lookups,
//! property metadata and value usage counts are read through these traits;
//! the in-memory implementations serve small hosts and tests.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::BaseCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} #{id} not found")]
pub struct NotFound {
    pub kind: String,
    pub id: u64,
}

/// Minimal view of a stored resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: String,
    pub id: u64,
    pub title: Option<String>,
}

pub trait ResourceReader {
    fn read(&self, kind: &str, id: u64) -> Result<Resource, NotFound>;
}

pub trait DataTypeRegistry {
    fn has(&self, data_type: &str) -> bool;

    /// Declared base category of a data type, `None` when unknown.
    fn base_category(&self, data_type: &str) -> Option<BaseCategory>;
}

pub trait ValueCounter {
    /// Number of stored values per distinct value, optionally scoped to one
    /// data type. Values without any usage may be absent from the map.
    fn count_by_value(&self, values: &[String], data_type: Option<&str>) -> HashMap<String, u64>;
}

pub trait PropertyCatalog {
    fn property_id(&self, term: &str) -> Option<u64>;

    fn property_label(&self, term: &str) -> Option<String> {
        let _ = term;
        None
    }
}

/// Built-in data types plus custom vocabularies with a declared base
#[derive(Debug, Clone, Default)]
pub struct StaticDataTypes {
    custom: HashMap<String, BaseCategory>,
}

impl StaticDataTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a data type, e.g. `customvocab:3` with a uri base.
    pub fn with_type(mut self, data_type: impl Into<String>, base: BaseCategory) -> Self {
        self.custom.insert(data_type.into(), base);
        self
    }
}

impl DataTypeRegistry for StaticDataTypes {
    fn has(&self, data_type: &str) -> bool {
        self.custom.contains_key(data_type) || BaseCategory::from_builtin(data_type).is_some()
    }

    fn base_category(&self, data_type: &str) -> Option<BaseCategory> {
        self.custom
            .get(data_type)
            .copied()
            .or_else(|| BaseCategory::from_builtin(data_type))
    }
}

/// Property terms with their ids and labels
#[derive(Debug, Clone, Default)]
pub struct StaticProperties {
    properties: IndexMap<String, (u64, Option<String>)>,
}

impl StaticProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, term: impl Into<String>, id: u64, label: Option<&str>) -> Self {
        self.properties
            .insert(term.into(), (id, label.map(String::from)));
        self
    }
}

impl PropertyCatalog for StaticProperties {
    fn property_id(&self, term: &str) -> Option<u64> {
        self.properties.get(term).map(|(id, _)| *id)
    }

    fn property_label(&self, term: &str) -> Option<String> {
        self.properties.get(term).and_then(|(_, label)| label.clone())
    }
}

/// Resource store holding known ids
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    ids: HashSet<u64>,
}

impl StaticResources {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl ResourceReader for StaticResources {
    fn read(&self, kind: &str, id: u64) -> Result<Resource, NotFound> {
        if self.ids.contains(&id) {
            Ok(Resource {
                kind: kind.to_string(),
                id,
                title: None,
            })
        } else {
            Err(NotFound {
                kind: kind.to_string(),
                id,
            })
        }
    }
}

/// Counter with fixed usage numbers
#[derive(Debug, Clone, Default)]
pub struct StaticCounts {
    counts: HashMap<String, u64>,
}

impl StaticCounts {
    pub fn new(counts: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            counts: counts.into_iter().collect(),
        }
    }
}

impl ValueCounter for StaticCounts {
    fn count_by_value(&self, values: &[String], _data_type: Option<&str>) -> HashMap<String, u64> {
        values
            .iter()
            .filter_map(|v| self.counts.get(v).map(|c| (v.clone(), *c)))
            .collect()
    }
}
