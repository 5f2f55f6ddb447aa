//! Template autofill engine
//!
//! Field mappings and value extraction for metadata templates:
//! - mapping text parsing (`[service] = Label` groups of `from = to` lines)
//! - extraction from JSON (flattened keys) and XML (node queries)
//! - value objects shaped as literal, uri or linked resource
//! - autocomplete suggestions from remote services
//! - template automatic values, default values and validation

pub mod autofill;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod field_spec;
pub mod filters;
pub mod flatten;
pub mod http;
pub mod mapping;
pub mod value;

pub use autofill::{Autofiller, Suggestion};
pub use config::{AutofillerConfig, Settings};
pub use error::{Error, Result};
pub use extractors::{ExtractionResult, Extractor, SimpleExtraction};
pub use ffi::*;
pub use field_spec::{parse_field_spec, FieldSpec};
pub use mapping::{parse_mapping_lines, parse_mapping_text, serialize_mapping, MappingEntry, MappingGroup};
pub use value::{BaseCategory, ValueContent, ValueMap, ValueObject};
