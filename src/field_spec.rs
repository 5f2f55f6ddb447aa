//! Field specification parsing
//!
//! A field spec describes one target metadata field in the mapping DSL:
//!
//! ```text
//! dcterms:title ^^literal @fr §private ~ Title: {__value__}
//! ```
//!
//! Parsing is best effort. Unknown or malformed parts are dropped and only a
//! missing term makes the whole spec unparsable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TERM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][\w-]*:[a-zA-Z_][\w.-]*$").unwrap());

static DATA_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][\w-]*(?::[\w][\w-]*)*$").unwrap());

// BCP 47 without the grandfathered tags.
static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"(?:[a-zA-Z]{2,3}(?:-[a-zA-Z]{3}){0,3}|[a-zA-Z]{4,8})",
        r"(?:-[a-zA-Z]{4})?",
        r"(?:-(?:[a-zA-Z]{2}|[0-9]{3}))?",
        r"(?:-(?:[a-zA-Z0-9]{5,8}|[0-9][a-zA-Z0-9]{3}))*",
        r"(?:-[0-9a-wyzA-WYZ](?:-[a-zA-Z0-9]{2,8})+)*",
        r"(?:-[xX](?:-[a-zA-Z0-9]{1,8})+)?",
        r"|[xX](?:-[a-zA-Z0-9]{1,8})+",
        r")$"
    ))
    .unwrap()
});

static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static COLON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?: ?").unwrap());

/// Parsed description of a target metadata field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Parse a field spec such as `dcterms:title ^^literal @fr §public ~ pattern`.
///
/// Returns `None` when no `prefix:localname` token is present.
pub fn parse_field_spec(field: &str) -> Option<FieldSpec> {
    let (head, pattern) = match field.split_once('~') {
        Some((head, pattern)) => {
            let pattern = pattern.trim();
            (head, (!pattern.is_empty()).then(|| pattern.to_string()))
        }
        None => (field, None),
    };

    let normalized = normalize_whitespace(head);

    let mut term: Option<String> = None;
    let mut data_type: Option<String> = None;
    let mut language: Option<String> = None;
    let mut is_public: Option<bool> = None;

    for token in normalized.split(' ').filter(|t| !t.is_empty()) {
        if let Some(rest) = token.strip_prefix("^^") {
            if data_type.is_none() && is_valid_data_type(rest) {
                data_type = Some(rest.to_string());
            }
        } else if let Some(rest) = token.strip_prefix('@') {
            if language.is_none() && is_valid_language(rest) {
                language = Some(rest.to_string());
            }
        } else if let Some(rest) = token.strip_prefix('§') {
            if is_public.is_none() {
                is_public = match rest {
                    "public" => Some(true),
                    "private" => Some(false),
                    _ => None,
                };
            }
        } else if term.is_none() && is_valid_term(token) {
            term = Some(token.to_string());
        }
    }

    term.map(|field| FieldSpec {
        field,
        data_type,
        language,
        is_public,
        pattern,
    })
}

/// Collapse whitespace runs and drop spaces around `:`, which spreadsheets
/// tend to introduce in terms and data types.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = SPACES_RE.replace_all(text.trim(), " ");
    COLON_RE.replace_all(&collapsed, ":").into_owned()
}

pub fn is_valid_term(term: &str) -> bool {
    TERM_RE.is_match(term)
}

pub fn is_valid_data_type(data_type: &str) -> bool {
    DATA_TYPE_RE.is_match(data_type)
}

pub fn is_valid_language(tag: &str) -> bool {
    LANGUAGE_RE.is_match(tag)
}

impl FieldSpec {
    /// Render the spec back to its DSL form.
    pub fn to_dsl(&self) -> String {
        let mut out = self.field.clone();
        if let Some(data_type) = &self.data_type {
            out.push_str(" ^^");
            out.push_str(data_type);
        }
        if let Some(language) = &self.language {
            out.push_str(" @");
            out.push_str(language);
        }
        match self.is_public {
            Some(true) => out.push_str(" §public"),
            Some(false) => out.push_str(" §private"),
            None => {}
        }
        if let Some(pattern) = &self.pattern {
            out.push_str(" ~ ");
            out.push_str(pattern);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_spec() {
        let spec = parse_field_spec("dcterms:title @fr ^^literal §private").unwrap();
        assert_eq!(spec.field, "dcterms:title");
        assert_eq!(spec.language.as_deref(), Some("fr"));
        assert_eq!(spec.data_type.as_deref(), Some("literal"));
        assert_eq!(spec.is_public, Some(false));
        assert_eq!(spec.pattern, None);

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "field": "dcterms:title",
                "@language": "fr",
                "type": "literal",
                "is_public": false,
            })
        );
    }

    #[test]
    fn test_missing_term_returns_none() {
        assert!(parse_field_spec("^^literal @fr §public").is_none());
        assert!(parse_field_spec("title").is_none());
        assert!(parse_field_spec("").is_none());
        assert!(parse_field_spec("~ dcterms:title").is_none());
    }

    #[test]
    fn test_spreadsheet_whitespace() {
        let spec = parse_field_spec("  dcterms :  title\u{a0}\t^^customvocab : 12 ").unwrap();
        assert_eq!(spec.field, "dcterms:title");
        assert_eq!(spec.data_type.as_deref(), Some("customvocab:12"));
    }

    #[test]
    fn test_invalid_parts_are_dropped() {
        let spec = parse_field_spec("dcterms:subject @not_a_tag ^^9bad §hidden").unwrap();
        assert_eq!(spec.field, "dcterms:subject");
        assert_eq!(spec.language, None);
        assert_eq!(spec.data_type, None);
        assert_eq!(spec.is_public, None);
    }

    #[test]
    fn test_pattern_is_kept_verbatim() {
        let spec = parse_field_spec("dcterms:identifier ^^uri ~ https://example.org/{__value__}  ").unwrap();
        assert_eq!(spec.data_type.as_deref(), Some("uri"));
        assert_eq!(
            spec.pattern.as_deref(),
            Some("https://example.org/{__value__}")
        );
        assert_eq!(
            spec.to_dsl(),
            "dcterms:identifier ^^uri ~ https://example.org/{__value__}"
        );
    }

    #[test]
    fn test_data_type_grammar() {
        for accepted in ["literal", "resource:item", "customvocab:12", "valuesuggest:idref:person", "numeric:integer"] {
            assert!(is_valid_data_type(accepted), "{accepted}");
        }
        for rejected in ["a:", ":x", "a::b", "9bad", "uri:", "custom vocab", ""] {
            assert!(!is_valid_data_type(rejected), "{rejected}");
        }

        let spec = parse_field_spec("dcterms:title ^^:x ^^literal").unwrap();
        assert_eq!(spec.data_type.as_deref(), Some("literal"));
        let spec = parse_field_spec("dcterms:title ^^:x").unwrap();
        assert_eq!(spec.data_type, None);
    }

    #[test]
    fn test_language_tags() {
        assert!(is_valid_language("en"));
        assert!(is_valid_language("en-GB"));
        assert!(is_valid_language("zh-Hant-TW"));
        assert!(is_valid_language("de-CH-1996"));
        assert!(is_valid_language("x-private"));
        assert!(!is_valid_language("e"));
        assert!(!is_valid_language("en_GB"));
        assert!(!is_valid_language(""));
    }
}
