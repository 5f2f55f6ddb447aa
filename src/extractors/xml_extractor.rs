//! Extraction from XML sources
//!
//! `from` locators and placeholders are node queries (see [`super::xpath`]).
//! Every matched node yields one value, its trimmed text content.

use roxmltree::Document;

use super::xpath::{Item, Namespaces, QueryContext};
use super::{ExtractionResult, Extractor, SimpleExtraction, SourceLookup};
use crate::error::Error;
use crate::mapping::{MappingEntry, TargetRole};

pub(crate) struct XmlSource<'a, 'input> {
    context: QueryContext<'a, 'input>,
}

impl SourceLookup for XmlSource<'_, '_> {
    fn values(&self, locator: &str) -> Vec<String> {
        self.context
            .strings(locator)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn parse_document(xml: &str) -> Option<Document<'_>> {
    match Document::parse(xml) {
        Ok(document) => Some(document),
        Err(e) => {
            let error = Error::from(e);
            tracing::warn!(error = %error, "malformed XML source");
            None
        }
    }
}

impl<'a> Extractor<'a> {
    /// Extract all mapped values from an XML document.
    pub fn extract_xml(&self, xml: &str, mapping: &[MappingEntry]) -> ExtractionResult {
        let Some(document) = parse_document(xml) else {
            return ExtractionResult::default();
        };
        let namespaces = Namespaces::collect(&document);
        let source = XmlSource {
            context: QueryContext::new(&document, &namespaces),
        };
        self.run(&source, mapping)
    }

    pub fn extract_xml_simple(&self, xml: &str, mapping: &[MappingEntry]) -> Vec<SimpleExtraction> {
        let Some(document) = parse_document(xml) else {
            return Vec::new();
        };
        let namespaces = Namespaces::collect(&document);
        let source = XmlSource {
            context: QueryContext::new(&document, &namespaces),
        };
        self.run_simple(&source, mapping)
    }

    pub fn extract_xml_value(&self, xml: &str, entry: &MappingEntry) -> Option<String> {
        let document = parse_document(xml)?;
        let namespaces = Namespaces::collect(&document);
        let source = XmlSource {
            context: QueryContext::new(&document, &namespaces),
        };
        self.run_value(&source, entry)
    }

    /// Extract one result per record node.
    ///
    /// The `{list}` entry's query selects the record elements. Within a
    /// record, queries see the record as the document element, so
    /// `/record/title` and `//title` both stay inside it.
    pub fn extract_xml_list(&self, xml: &str, mapping: &[MappingEntry]) -> Vec<ExtractionResult> {
        let Some(root) = mapping.iter().find(|e| e.to.role() == TargetRole::ListRoot) else {
            return vec![self.extract_xml(xml, mapping)];
        };
        let Some(document) = parse_document(xml) else {
            return Vec::new();
        };
        let namespaces = Namespaces::collect(&document);
        let context = QueryContext::new(&document, &namespaces);

        let records: Vec<_> = context
            .select(&root.from)
            .iter()
            .filter_map(Item::node)
            .filter(|node| node.is_element())
            .collect();
        if records.is_empty() {
            tracing::debug!(root = %root.from, "no record nodes matched");
        }

        records
            .into_iter()
            .map(|node| {
                let source = XmlSource {
                    context: context.for_node(node),
                };
                self.run(&source, mapping)
            })
            .filter(|result| !result.is_empty() || result.label.is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StaticDataTypes;
    use crate::mapping::{parse_mapping_lines, parse_mapping_text};
    use crate::value::ValueContent;

    const SRU: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<srw:searchRetrieveResponse xmlns:srw="http://www.loc.gov/zing/srw/" xmlns:dc="http://purl.org/dc/elements/1.1/" version="1.1">
  <srw:records>
    <srw:record id="027">
      <dc:title> Paris </dc:title>
      <dc:subject>Ville</dc:subject>
      <dc:subject>Capitale</dc:subject>
    </srw:record>
    <srw:record id="028">
      <dc:title>Lyon</dc:title>
    </srw:record>
    <srw:record id="029"/>
  </srw:records>
</srw:searchRetrieveResponse>"#;

    #[test]
    fn test_extract_xml_fans_out_nodes() {
        let types = StaticDataTypes::new();
        let extractor = Extractor::new(&types);
        let mapping = parse_mapping_lines(
            "//dc:subject = dcterms:subject\n\
             //srw:record/@id = dcterms:identifier ^^uri ~ https://www.idref.fr/{__value__}",
        );

        let result = extractor.extract_xml(SRU, &mapping);
        let subjects: Vec<String> = result.get("dcterms:subject").iter().map(|v| v.text()).collect();
        assert_eq!(subjects, vec!["Ville", "Capitale"]);
        assert_eq!(result.get("dcterms:identifier").len(), 3);
        assert_eq!(
            result.get("dcterms:identifier")[2].content,
            ValueContent::Uri("https://www.idref.fr/029".to_string())
        );
    }

    #[test]
    fn test_placeholders_are_queries() {
        let types = StaticDataTypes::new();
        let extractor = Extractor::new(&types);
        let mapping = parse_mapping_lines(
            "~ = dcterms:title ~ {//dc:title} (v{/srw:searchRetrieveResponse/@version})",
        );
        let result = extractor.extract_xml(SRU, &mapping);
        assert_eq!(result.get("dcterms:title")[0].text(), "Paris (v1.1)");
        assert_eq!(
            extractor.extract_xml_value(SRU, &mapping[0]).as_deref(),
            Some("Paris (v1.1)")
        );
    }

    #[test]
    fn test_extract_xml_list() {
        let types = StaticDataTypes::new();
        let extractor = Extractor::new(&types);
        let groups = parse_mapping_text(
            "[idref]\n\
             //srw:record = {list}\n\
             //dc:title = {__label__}\n\
             /srw:record/@id = dcterms:identifier ^^uri ~ https://www.idref.fr/{__value__}\n\
             //dc:subject = dcterms:subject",
        );
        let mapping = &groups["idref"].mapping;

        let results = extractor.extract_xml_list(SRU, mapping);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].label.as_deref(), Some("Paris"));
        assert_eq!(results[0].get("dcterms:subject").len(), 2);
        assert_eq!(results[1].label.as_deref(), Some("Lyon"));
        assert!(results[1].get("dcterms:subject").is_empty());
        assert_eq!(results[2].label, None);
        assert_eq!(results[2].first_uri(), Some("https://www.idref.fr/029"));
    }

    #[test]
    fn test_simple_extraction() {
        let types = StaticDataTypes::new();
        let extractor = Extractor::new(&types);
        let mapping = parse_mapping_lines("//dc:title = dcterms:title");
        let simple = extractor.extract_xml_simple(SRU, &mapping);
        assert_eq!(simple.len(), 2);
        assert_eq!(simple[1].value, "Lyon");
        assert_eq!(simple[1].field, "//dc:title");
    }

    #[test]
    fn test_malformed_xml() {
        let types = StaticDataTypes::new();
        let extractor = Extractor::new(&types);
        let mapping = parse_mapping_lines("//a = dcterms:title");
        assert!(extractor.extract_xml("<a><b></a>", &mapping).is_empty());
        assert_eq!(extractor.extract_xml_list("not xml", &mapping), vec![ExtractionResult::default()]);
        assert_eq!(extractor.extract_xml_value("", &mapping[0]), None);
    }
}
