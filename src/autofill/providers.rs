//! Suggestion providers
//!
//! A provider knows how to reach one kind of service: the request url, the
//! accepted content type and the format of the response body.

use serde::Serialize;
use url::Url;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::mapping::MappingGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Any endpoint answering JSON (`[generic]`, `[generic:json]`)
    GenericJson,
    /// Any endpoint answering XML (`[generic:xml]`)
    GenericXml,
    /// GeoNames gazetteer
    GeoNames,
    /// IdRef authority files; the sub-service selects the index
    IdRef,
}

impl ProviderKind {
    pub fn from_group(group: &MappingGroup) -> Option<Self> {
        match (group.service.as_str(), group.sub.as_deref()) {
            ("generic", None | Some("json")) => Some(Self::GenericJson),
            ("generic", Some("xml")) => Some(Self::GenericXml),
            ("geonames", _) => Some(Self::GeoNames),
            ("idref", _) => Some(Self::IdRef),
            _ => None,
        }
    }

    pub fn is_xml(&self) -> bool {
        matches!(self, Self::GenericXml)
    }

    pub fn accept(&self) -> &'static str {
        if self.is_xml() {
            "application/xml, text/xml"
        } else {
            "application/json"
        }
    }

    fn default_url(&self) -> Option<&'static str> {
        match self {
            Self::GeoNames => Some("http://api.geonames.org/searchJSON"),
            Self::IdRef => Some("https://www.idref.fr/Sru/Solr"),
            Self::GenericJson | Self::GenericXml => None,
        }
    }

    fn default_query(&self, sub: Option<&str>) -> Option<&'static str> {
        match (self, sub) {
            (Self::GeoNames, _) => {
                Some("q={query}&lang={language}&maxRows={max_results}&username={username}")
            }
            (Self::IdRef, Some("corporation")) => {
                Some("q=corpname_t:({query})&wt=json&rows={max_results}&fl=ppn_z,affcourt_z")
            }
            (Self::IdRef, Some("subject")) => {
                Some("q=subjectheading_t:({query})&wt=json&rows={max_results}&fl=ppn_z,affcourt_z")
            }
            (Self::IdRef, _) => {
                Some("q=persname_t:({query})&wt=json&rows={max_results}&fl=ppn_z,affcourt_z")
            }
            (Self::GenericJson | Self::GenericXml, _) => None,
        }
    }
}

/// Build the request url for one suggestion query.
///
/// The group's query template is appended to its base url after its
/// placeholders are replaced by url-encoded values.
pub fn request_url(
    provider: ProviderKind,
    group: &MappingGroup,
    query: &str,
    lang: Option<&str>,
    settings: &Settings,
) -> Result<String> {
    let base = group
        .url
        .as_deref()
        .or_else(|| provider.default_url())
        .ok_or_else(|| Error::Config(format!("autofiller {} has no url", group.key())))?;
    let mut url = Url::parse(base)
        .map_err(|e| Error::Config(format!("autofiller {} has an invalid url: {}", group.key(), e)))?;

    let template = group
        .query
        .as_deref()
        .or_else(|| provider.default_query(group.sub.as_deref()))
        .unwrap_or_default();

    let language = lang
        .and_then(|l| l.split(['_', '-']).next())
        .unwrap_or_default();
    let max_results = settings.max_results.to_string();
    let params: [(&str, &str); 4] = [
        ("{query}", query.trim()),
        ("{language}", language),
        ("{max_results}", &max_results),
        ("{username}", &settings.geonames_username),
    ];
    let query_string = params.iter().fold(template.to_string(), |acc, (placeholder, value)| {
        acc.replace(placeholder, &encode(value))
    });

    if !query_string.is_empty() {
        let combined = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query_string),
            _ => query_string,
        };
        url.set_query(Some(&combined));
    }

    Ok(url.to_string())
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
