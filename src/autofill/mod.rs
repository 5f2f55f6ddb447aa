//! Autofill orchestration
//!
//! Two entry points share the extraction engine:
//!
//! - [`Autofiller::suggest`] queries a remote service and maps each record
//!   of the response into a [`Suggestion`];
//! - [`automatic`] computes template-driven values from the resource's own
//!   payload and validates payloads against a template.

pub mod automatic;
mod providers;

pub use automatic::*;
pub use providers::{request_url, ProviderKind};

use serde::Serialize;
use serde_json::Value;

use crate::collaborators::ValueCounter;
use crate::config::{AutofillerConfig, Settings};
use crate::error::Error;
use crate::extractors::{ExtractionResult, Extractor};
use crate::http::Fetcher;
use crate::mapping::TargetRole;
use crate::value::{BaseCategory, ValueMap};

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Displayed label
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Values to fill in when the suggestion is picked
    pub data: ValueMap,
    /// Number of stored values already using `uri`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Suggestion {
    /// Suggestion for one extracted record.
    ///
    /// Resource references that could not be validated are dropped. Without
    /// a mapped label the first value is displayed instead.
    fn from_result(result: ExtractionResult) -> Option<Self> {
        let mut data = result.values;
        for values in data.values_mut() {
            values.retain(|v| !v.is_unresolved());
        }
        data.retain(|_, values| !values.is_empty());

        let result = ExtractionResult {
            label: result.label,
            values: data,
        };
        let value = result
            .label
            .clone()
            .or_else(|| result.first_text())
            .filter(|label| !label.trim().is_empty())?;
        Some(Self {
            value,
            uri: result.first_uri().map(String::from),
            data: result.values,
            count: None,
        })
    }
}

pub struct Autofiller<'a> {
    fetcher: &'a dyn Fetcher,
    extractor: Extractor<'a>,
    settings: &'a Settings,
    counter: Option<&'a dyn ValueCounter>,
}

impl<'a> Autofiller<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, extractor: Extractor<'a>, settings: &'a Settings) -> Self {
        Self {
            fetcher,
            extractor,
            settings,
            counter: None,
        }
    }

    /// Annotate uri suggestions with usage counts and rank them.
    pub fn with_counter(mut self, counter: &'a dyn ValueCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Query the autofiller's service for `query`.
    ///
    /// Returns `None` when the service cannot be reached, answers with an
    /// error status or with a body that cannot be decoded. A successful
    /// answer without usable records is `Some(vec![])`.
    pub fn suggest(&self, query: &str, lang: Option<&str>, config: &AutofillerConfig) -> Option<Vec<Suggestion>> {
        let url = match request_url(config.provider, &config.group, query, lang, self.settings) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(autofiller = %config.key, error = %e, "cannot build autofiller request");
                return None;
            }
        };

        let body = match self.fetcher.fetch(&url, config.provider.accept()) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "autofiller request failed");
                return None;
            }
        };

        let results = self.extract_records(&body, config)?;
        let mut suggestions: Vec<Suggestion> = results
            .into_iter()
            .filter_map(Suggestion::from_result)
            .take(self.settings.max_results)
            .collect();

        self.rank(&mut suggestions, config);
        tracing::debug!(autofiller = %config.key, count = suggestions.len(), "suggestions ready");
        Some(suggestions)
    }

    fn extract_records(&self, body: &str, config: &AutofillerConfig) -> Option<Vec<ExtractionResult>> {
        let mapping = &config.group.mapping;
        if config.provider.is_xml() {
            if let Err(e) = roxmltree::Document::parse(body) {
                tracing::warn!(autofiller = %config.key, error = %Error::from(e), "unreadable service response");
                return None;
            }
            return Some(self.extractor.extract_xml_list(body, mapping));
        }
        match serde_json::from_str::<Value>(body) {
            Ok(json) => Some(self.extractor.extract_list(&json, mapping)),
            Err(e) => {
                tracing::warn!(autofiller = %config.key, error = %Error::from(e), "unreadable service response");
                None
            }
        }
    }

    /// Fetch usage counts for all suggested uris in one call, then order
    /// suggestions by count, keeping the service order among equals.
    fn rank(&self, suggestions: &mut [Suggestion], config: &AutofillerConfig) {
        let Some(counter) = self.counter else {
            return;
        };
        let uris: Vec<String> = suggestions.iter().filter_map(|s| s.uri.clone()).collect();
        if uris.is_empty() {
            return;
        }

        let data_type = config
            .group
            .mapping
            .iter()
            .filter(|e| e.to.role() == TargetRole::Field)
            .filter_map(|e| e.to.spec.data_type.as_deref())
            .find(|dt| self.extractor.category(dt) == BaseCategory::Uri);
        let counts = counter.count_by_value(&uris, data_type);

        for suggestion in suggestions.iter_mut() {
            if let Some(uri) = &suggestion.uri {
                suggestion.count = Some(counts.get(uri).copied().unwrap_or(0));
            }
        }
        suggestions.sort_by(|a, b| b.count.unwrap_or(0).cmp(&a.count.unwrap_or(0)));
    }
}
