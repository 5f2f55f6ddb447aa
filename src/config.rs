//! Settings and autofiller definitions
//!
//! Settings arrive as JSON from the host. Built-in autofillers are compiled
//! in from `config/autofillers.ini`; the `autofillers` setting holds extra
//! definitions in the same text format and wins over built-ins sharing a key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::autofill::ProviderKind;
use crate::error::{Error, Result};
use crate::mapping::{parse_mapping_text, MappingGroup};

const BUILTIN_AUTOFILLERS: &str = include_str!("../config/autofillers.ini");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    /// Global HTTP timeout for one autofiller request
    pub timeout_secs: u64,
    /// Maximum suggestions returned per request
    pub max_results: usize,
    pub geonames_username: String,
    /// Extra autofiller definitions (mapping text)
    pub autofillers: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: concat!("template_autofill/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
            max_results: 20,
            geonames_username: "demo".to_string(),
            autofillers: String::new(),
        }
    }
}

/// One usable autofiller: its definition and the provider serving it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutofillerConfig {
    pub key: String,
    pub provider: ProviderKind,
    #[serde(flatten)]
    pub group: MappingGroup,
}

impl Settings {
    /// Parse settings JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        if settings.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        if settings.max_results == 0 {
            return Err(Error::Config("max_results must be positive".to_string()));
        }
        Ok(settings)
    }

    /// Built-in and user autofillers, keyed by group identity.
    ///
    /// Groups whose service has no provider are skipped.
    pub fn load_autofillers(&self) -> IndexMap<String, AutofillerConfig> {
        let mut groups = parse_mapping_text(BUILTIN_AUTOFILLERS);
        for (key, group) in parse_mapping_text(&self.autofillers) {
            groups.insert(key, group);
        }

        groups
            .into_iter()
            .filter_map(|(key, group)| match ProviderKind::from_group(&group) {
                Some(provider) => Some((
                    key.clone(),
                    AutofillerConfig {
                        key,
                        provider,
                        group,
                    },
                )),
                None => {
                    tracing::debug!(key = %key, "no provider for autofiller service");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_json(r#"{"geonames_username": "acme"}"#).unwrap();
        assert_eq!(settings.geonames_username, "acme");
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.max_results, 20);
        assert!(settings.user_agent.starts_with("template_autofill/"));
    }

    #[test]
    fn test_settings_errors() {
        assert!(matches!(Settings::from_json("{"), Err(Error::Json(_))));
        let err = Settings::from_json(r#"{"timeout_secs": 0}"#).unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: timeout_secs must be positive");
    }

    #[test]
    fn test_builtin_autofillers() {
        let autofillers = Settings::default().load_autofillers();
        let keys: Vec<&str> = autofillers.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["geonames", "idref:person", "idref:corporation", "idref:subject"]
        );
        let geonames = &autofillers["geonames"];
        assert_eq!(geonames.provider, ProviderKind::GeoNames);
        assert_eq!(geonames.group.url.as_deref(), Some("http://api.geonames.org/searchJSON"));
        assert_eq!(autofillers["idref:person"].provider, ProviderKind::IdRef);
    }

    #[test]
    fn test_user_autofillers_override() {
        let settings = Settings {
            autofillers: "[geonames] = Places\n\
                          https://geonames.example.org/searchJSON\n\
                          geonames = {list}\n\n\
                          [generic:xml #bnf] = BnF\n\
                          https://catalogue.bnf.fr/api/SRU\n\n\
                          [unknown] = Nothing"
                .to_string(),
            ..Settings::default()
        };
        let autofillers = settings.load_autofillers();
        assert_eq!(autofillers.len(), 5);
        assert_eq!(autofillers.get_index(0).map(|(k, _)| k.as_str()), Some("geonames"));
        assert_eq!(autofillers["geonames"].group.label.as_deref(), Some("Places"));
        assert_eq!(autofillers["generic:xml #bnf"].provider, ProviderKind::GenericXml);
        assert!(!autofillers.contains_key("unknown"));
    }
}
