//! Mapping text parsing
//!
//! Autofiller definitions and template autofilling settings share a small
//! line-oriented format:
//!
//! ```text
//! [geonames] = GeoNames
//! ?q={query}&username={username}&lang={language}
//! http://api.geonames.org/searchJSON
//! geonames = {list}
//! toponymName = {__label__}
//! geonameId = dcterms:identifier ^^uri ~ https://www.geonames.org/{__value__}
//! countryName = dcterms:spatial @en
//! ```
//!
//! Parsing is lenient: malformed headers and lines are skipped.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::field_spec::{parse_field_spec, FieldSpec};
use crate::filters::Pipeline;

/// Marker target selecting the list of records to iterate
pub const LIST_MARKER: &str = "{list}";
/// Marker target (and placeholder) for the suggestion label
pub const LABEL_MARKER: &str = "{__label__}";
/// Placeholder bound to the raw source value
pub const VALUE_MARKER: &str = "{__value__}";
/// Source marker for constant targets, and the pattern separator
pub const CONSTANT_SOURCE: &str = "~";

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[\s*([^\s:#\[\]]+)\s*(?::\s*([^\s#\[\]]+))?\s*(?:#\s*([^\]]*?))?\s*\]\s*(?:=?\s*(.*))?$",
    )
    .unwrap()
});

static TWIG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.+?)\}\}").unwrap());

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}\s][^{}]*\}").unwrap());

/// What a mapping target is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    /// A regular metadata field
    Field,
    /// Provides the suggestion label
    Label,
    /// Selects the records to iterate over
    ListRoot,
}

/// Right-hand side of a mapping line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(flatten)]
    pub spec: FieldSpec,
    /// Placeholder → substitution, resolved from the source at extraction time
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub replace: IndexMap<String, String>,
    /// Twig expression → filter pipeline
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub filters: IndexMap<String, Pipeline>,
}

impl Target {
    /// Parse the right-hand side of a mapping line.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == LIST_MARKER || text == LABEL_MARKER {
            return Some(Self::marker(text));
        }
        parse_field_spec(text).map(Self::from_spec)
    }

    pub fn from_spec(spec: FieldSpec) -> Self {
        let mut target = Self {
            spec,
            ..Self::default()
        };
        if let Some(pattern) = target.spec.pattern.clone() {
            target.index_placeholders(&pattern);
        }
        target
    }

    fn marker(marker: &str) -> Self {
        Self {
            spec: FieldSpec {
                pattern: Some(marker.to_string()),
                ..FieldSpec::default()
            },
            ..Self::default()
        }
    }

    fn index_placeholders(&mut self, pattern: &str) {
        for caps in TWIG_RE.captures_iter(pattern) {
            if let Some(pipeline) = Pipeline::parse(&caps[1]) {
                self.filters.insert(caps[0].to_string(), pipeline);
            }
        }
        let remaining = TWIG_RE.replace_all(pattern, "");
        for m in PLACEHOLDER_RE.find_iter(&remaining) {
            self.replace.entry(m.as_str().to_string()).or_default();
        }
    }

    pub fn field(&self) -> &str {
        &self.spec.field
    }

    pub fn pattern(&self) -> Option<&str> {
        self.spec.pattern.as_deref().filter(|p| !p.is_empty())
    }

    pub fn role(&self) -> TargetRole {
        match self.pattern() {
            Some(LIST_MARKER) => TargetRole::ListRoot,
            Some(LABEL_MARKER) if self.spec.field.is_empty() => TargetRole::Label,
            _ => TargetRole::Field,
        }
    }

    /// Whether the entry is written first when serializing a group.
    fn is_promoted(&self) -> bool {
        matches!(self.pattern(), Some(LIST_MARKER) | Some(LABEL_MARKER))
    }

    pub fn to_dsl(&self) -> String {
        if self.spec.field.is_empty() {
            return self.spec.pattern.clone().unwrap_or_default();
        }
        self.spec.to_dsl()
    }
}

/// One `from = to` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub from: String,
    pub to: Target,
}

impl MappingEntry {
    pub fn is_constant(&self) -> bool {
        self.from == CONSTANT_SOURCE
    }
}

/// A named autofiller or mapping section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingGroup {
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub mapping: Vec<MappingEntry>,
}

impl MappingGroup {
    /// Identity key: `service[:sub][ #variant]`
    pub fn key(&self) -> String {
        let mut key = self.service.clone();
        if let Some(sub) = &self.sub {
            key.push(':');
            key.push_str(sub);
        }
        if let Some(variant) = &self.variant {
            key.push_str(" #");
            key.push_str(variant);
        }
        key
    }
}

/// Parse a whole mapping text into its groups, keyed by identity.
pub fn parse_mapping_text(text: &str) -> IndexMap<String, MappingGroup> {
    let mut groups: IndexMap<String, MappingGroup> = IndexMap::new();
    let mut current: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            match parse_header(line) {
                Some(group) => {
                    let key = group.key();
                    groups.insert(key.clone(), group);
                    current = Some(key);
                }
                None => tracing::debug!(line, "skipping malformed mapping header"),
            }
            continue;
        }

        let Some(group) = current.as_ref().and_then(|key| groups.get_mut(key)) else {
            continue;
        };

        if let Some(query) = line.strip_prefix('?') {
            group.query = Some(query.to_string());
        } else if line.starts_with("http://") || line.starts_with("https://") {
            group.url = Some(line.to_string());
        } else if let Some(entry) = parse_mapping_line(line) {
            group.mapping.push(entry);
        }
    }

    groups
}

/// Parse header-less mapping lines, as stored in template settings.
pub fn parse_mapping_lines(text: &str) -> Vec<MappingEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';') && !line.starts_with('['))
        .filter_map(parse_mapping_line)
        .collect()
}

fn parse_header(line: &str) -> Option<MappingGroup> {
    let caps = HEADER_RE.captures(line)?;
    let capture = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    Some(MappingGroup {
        service: capture(1)?,
        sub: capture(2),
        variant: capture(3),
        label: capture(4),
        ..MappingGroup::default()
    })
}

/// Parse one `from = to` line.
pub fn parse_mapping_line(line: &str) -> Option<MappingEntry> {
    let eq = if line.starts_with('~') {
        let marker = line[1..].find('~').map(|p| p + 1).unwrap_or(line.len());
        line[..marker].rfind('=')?
    } else {
        let limit = line.find('~').unwrap_or(line.len());
        line[..limit].find('=')?
    };

    let from = line[..eq].trim();
    let to = line[eq + 1..].trim();
    if from.is_empty() || to.is_empty() {
        return None;
    }

    Target::parse(to).map(|to| MappingEntry {
        from: from.to_string(),
        to,
    })
}

/// Write groups back to their text form.
///
/// Within a group, list and label entries are written first.
pub fn serialize_mapping(groups: &IndexMap<String, MappingGroup>) -> String {
    let mut blocks = Vec::with_capacity(groups.len());
    for group in groups.values() {
        let mut lines = Vec::new();
        match &group.label {
            Some(label) => lines.push(format!("[{}] = {}", group.key(), label)),
            None => lines.push(format!("[{}]", group.key())),
        }
        if let Some(query) = &group.query {
            lines.push(format!("?{}", query));
        }
        if let Some(url) = &group.url {
            lines.push(url.clone());
        }
        let (promoted, rest): (Vec<&MappingEntry>, Vec<&MappingEntry>) =
            group.mapping.iter().partition(|e| e.to.is_promoted());
        for entry in promoted.into_iter().chain(rest) {
            lines.push(format!("{} = {}", entry.from, entry.to.to_dsl()));
        }
        blocks.push(lines.join("\n"));
    }
    let mut text = blocks.join("\n\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
ignored = dcterms:title

[geonames] = GeoNames
?q={query}&username={username}
http://api.geonames.org/searchJSON
geonames = {list}
geonameId = dcterms:identifier ^^uri ~ https://www.geonames.org/{__value__}
toponymName = {__label__}
countryName = dcterms:spatial @en §private

[idref : person # viaf] = IdRef persons
https://www.idref.fr/Sru/Solr
~ = dcterms:publisher ~ {{ value|upper }} (a=b) {source}
bad line without target
name = not a term

[ ] = broken header
ppn_z = dcterms:source
"#;

    #[test]
    fn test_parse_groups() {
        let groups = parse_mapping_text(SAMPLE);
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["geonames", "idref:person #viaf"]);

        let geonames = &groups["geonames"];
        assert_eq!(geonames.label.as_deref(), Some("GeoNames"));
        assert_eq!(geonames.query.as_deref(), Some("q={query}&username={username}"));
        assert_eq!(geonames.url.as_deref(), Some("http://api.geonames.org/searchJSON"));
        assert_eq!(geonames.mapping.len(), 4);
        assert_eq!(geonames.mapping[0].to.role(), TargetRole::ListRoot);
        assert_eq!(geonames.mapping[2].to.role(), TargetRole::Label);

        let identifier = &geonames.mapping[1];
        assert_eq!(identifier.from, "geonameId");
        assert_eq!(identifier.to.field(), "dcterms:identifier");
        assert_eq!(identifier.to.spec.data_type.as_deref(), Some("uri"));
        assert!(identifier.to.replace.contains_key(VALUE_MARKER));

        let spatial = &geonames.mapping[3].to.spec;
        assert_eq!(spatial.language.as_deref(), Some("en"));
        assert_eq!(spatial.is_public, Some(false));
    }

    #[test]
    fn test_malformed_header_keeps_previous_group() {
        let groups = parse_mapping_text(SAMPLE);
        let idref = &groups["idref:person #viaf"];
        assert_eq!(idref.service, "idref");
        assert_eq!(idref.sub.as_deref(), Some("person"));
        assert_eq!(idref.variant.as_deref(), Some("viaf"));
        // The line after "[ ] = broken header" still lands in idref.
        assert_eq!(idref.mapping.len(), 2);
        assert_eq!(idref.mapping[1].from, "ppn_z");
    }

    #[test]
    fn test_constant_line_with_pattern() {
        let groups = parse_mapping_text(SAMPLE);
        let entry = &groups["idref:person #viaf"].mapping[0];
        assert!(entry.is_constant());
        assert_eq!(entry.to.field(), "dcterms:publisher");
        assert_eq!(entry.to.pattern(), Some("{{ value|upper }} (a=b) {source}"));
        assert!(entry.to.filters.contains_key("{{ value|upper }}"));
        assert_eq!(entry.to.replace.keys().collect::<Vec<_>>(), vec!["{source}"]);
    }

    #[test]
    fn test_split_rules() {
        let entry = parse_mapping_line("a = dcterms:title ~ x=y").unwrap();
        assert_eq!(entry.from, "a");
        assert_eq!(entry.to.pattern(), Some("x=y"));

        let entry = parse_mapping_line("~ = dcterms:title").unwrap();
        assert_eq!(entry.from, "~");

        assert!(parse_mapping_line("a ~ b = dcterms:title").is_none());
        assert!(parse_mapping_line(" = dcterms:title").is_none());
        assert!(parse_mapping_line("a = ").is_none());
    }

    #[test]
    fn test_round_trip() {
        let parsed = parse_mapping_text(SAMPLE);
        let text = serialize_mapping(&parsed);
        let reparsed = parse_mapping_text(&text);

        assert_eq!(parsed.len(), reparsed.len());
        for (key, group) in &parsed {
            let other = &reparsed[key];
            assert_eq!(group.label, other.label);
            assert_eq!(group.url, other.url);
            assert_eq!(group.query, other.query);

            let promoted: Vec<&MappingEntry> =
                group.mapping.iter().filter(|e| e.to.is_promoted()).collect();
            let rest: Vec<&MappingEntry> =
                group.mapping.iter().filter(|e| !e.to.is_promoted()).collect();
            let expected: Vec<&MappingEntry> = promoted.into_iter().chain(rest).collect();
            let actual: Vec<&MappingEntry> = other.mapping.iter().collect();
            assert_eq!(expected, actual);
        }

        // Serializing again is stable.
        assert_eq!(serialize_mapping(&reparsed), text);
    }

    #[test]
    fn test_serialize_promotes_label_and_list() {
        let groups = parse_mapping_text(SAMPLE);
        let text = serialize_mapping(&groups);
        let geonames_block = text.split("\n\n").next().unwrap();
        let lines: Vec<&str> = geonames_block.lines().collect();
        assert_eq!(lines[0], "[geonames] = GeoNames");
        assert_eq!(lines[3], "geonames = {list}");
        assert_eq!(lines[4], "toponymName = {__label__}");
        assert_eq!(
            lines[5],
            "geonameId = dcterms:identifier ^^uri ~ https://www.geonames.org/{__value__}"
        );
    }

    #[test]
    fn test_parse_mapping_lines() {
        let entries = parse_mapping_lines("~ = dcterms:identifier ~ ID-{o:id}\n\n; comment\nfoo = bar");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].to.replace.contains_key("{o:id}"));
    }
}
