//! Node queries over XML documents
//!
//! A compact XPath 1.0 subset, enough for mapping sources:
//!
//! - absolute, relative and descendant paths: `/a/b`, `a/b`, `//b`, `a//b`
//! - `.`, `..`, `*`, `prefix:name`, `@attr`, `@*`, `text()`, `node()`
//! - `child::`, `descendant::`, `self::`, `parent::`, `attribute::` axes
//! - unions: `a | b`
//! - predicates: `[2]`, `[last()]`, `[@a]`, `[@a='v']`, `[@a!='v']`,
//!   `[name]`, `[name='v']`, `[.='v']`
//!
//! Every namespace declared in the document is registered under its prefix,
//! so queries can use prefixes without declaring them.

use std::collections::HashMap;

use roxmltree::{Document, Node};

const NS_XML: &str = "http://www.w3.org/XML/1998/namespace";

/// A node selected by a query
#[derive(Debug, Clone, PartialEq)]
pub enum Item<'a, 'input: 'a> {
    /// The document root (or the parent of a record node in list mode)
    Root(Node<'a, 'input>),
    /// Stand-in parent whose only child is the record node
    VirtualRoot(Node<'a, 'input>),
    Node(Node<'a, 'input>),
    Attribute {
        owner: Node<'a, 'input>,
        namespace: Option<String>,
        name: String,
        value: String,
    },
}

impl<'a, 'input: 'a> Item<'a, 'input> {
    /// XPath string value: concatenated descendant text, or the attribute value.
    pub fn string_value(&self) -> String {
        match self {
            Item::Root(node) | Item::Node(node) => {
                if node.is_text() {
                    return node.text().unwrap_or_default().to_string();
                }
                node.descendants()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect()
            }
            Item::VirtualRoot(node) => Item::Node(*node).string_value(),
            Item::Attribute { value, .. } => value.clone(),
        }
    }

    pub fn node(&self) -> Option<Node<'a, 'input>> {
        match self {
            Item::Node(node) => Some(*node),
            _ => None,
        }
    }

    fn same_as(&self, other: &Item<'a, 'input>) -> bool {
        match (self, other) {
            (
                Item::Attribute { owner: a, namespace: na, name: x, .. },
                Item::Attribute { owner: b, namespace: nb, name: y, .. },
            ) => a == b && na == nb && x == y,
            (Item::Attribute { .. }, _) | (_, Item::Attribute { .. }) => false,
            _ => self == other,
        }
    }
}

/// Prefix → namespace URI table gathered from a document
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    prefixes: HashMap<String, String>,
    default: Option<String>,
}

impl Namespaces {
    pub fn collect(document: &Document) -> Self {
        let mut namespaces = Self::default();
        namespaces.prefixes.insert("xml".to_string(), NS_XML.to_string());
        for node in document.descendants().filter(|n| n.is_element()) {
            for ns in node.namespaces() {
                match ns.name() {
                    Some(prefix) => {
                        namespaces
                            .prefixes
                            .entry(prefix.to_string())
                            .or_insert_with(|| ns.uri().to_string());
                    }
                    None => {
                        if namespaces.default.is_none() {
                            namespaces.default = Some(ns.uri().to_string());
                        }
                    }
                }
            }
        }
        namespaces
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }
}

/// Query context over one parsed document (or one record node of it)
pub struct QueryContext<'a, 'input: 'a> {
    namespaces: &'a Namespaces,
    root: Item<'a, 'input>,
}

impl<'a, 'input: 'a> QueryContext<'a, 'input> {
    pub fn new(document: &'a Document<'input>, namespaces: &'a Namespaces) -> Self {
        Self {
            namespaces,
            root: Item::Root(document.root()),
        }
    }

    /// Context where `node` stands in for the document element.
    pub fn for_node(&self, node: Node<'a, 'input>) -> Self {
        Self {
            namespaces: self.namespaces,
            root: Item::VirtualRoot(node),
        }
    }

    /// Evaluate `expression` from the context root.
    pub fn select(&self, expression: &str) -> Vec<Item<'a, 'input>> {
        match XPath::parse(expression) {
            Some(xpath) => xpath.evaluate(self, &self.root),
            None => {
                tracing::debug!(expression, "unsupported node query");
                Vec::new()
            }
        }
    }

    /// String values of every selected item.
    pub fn strings(&self, expression: &str) -> Vec<String> {
        self.select(expression).iter().map(Item::string_value).collect()
    }

    fn children(&self, item: &Item<'a, 'input>) -> Vec<Item<'a, 'input>> {
        match item {
            Item::Root(node) | Item::Node(node) => node.children().map(Item::Node).collect(),
            Item::VirtualRoot(node) => vec![Item::Node(*node)],
            Item::Attribute { .. } => Vec::new(),
        }
    }

    fn descendants(&self, item: &Item<'a, 'input>, include_self: bool) -> Vec<Item<'a, 'input>> {
        let mut out = Vec::new();
        if include_self {
            out.push(item.clone());
        }
        match item {
            Item::Root(node) | Item::Node(node) => {
                out.extend(node.descendants().skip(1).map(Item::Node));
            }
            Item::VirtualRoot(node) => out.extend(node.descendants().map(Item::Node)),
            Item::Attribute { .. } => {}
        }
        out
    }

    fn parent(&self, item: &Item<'a, 'input>) -> Option<Item<'a, 'input>> {
        match item {
            Item::Root(_) | Item::VirtualRoot(_) => None,
            Item::Attribute { owner, .. } => Some(Item::Node(*owner)),
            Item::Node(node) => {
                if let Item::VirtualRoot(record) = &self.root {
                    if record == node {
                        return Some(self.root.clone());
                    }
                }
                let parent = node.parent()?;
                if parent.is_root() {
                    Some(Item::Root(parent))
                } else {
                    Some(Item::Node(parent))
                }
            }
        }
    }

    fn attributes(&self, item: &Item<'a, 'input>) -> Vec<Item<'a, 'input>> {
        match item {
            Item::Node(node) if node.is_element() => node
                .attributes()
                .map(|attr| Item::Attribute {
                    owner: *node,
                    namespace: attr.namespace().map(String::from),
                    name: attr.name().to_string(),
                    value: attr.value().to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn name_matches(&self, name: &QName, namespace: Option<&str>, local: &str, is_attribute: bool) -> bool {
        if name.local != "*" && name.local != local {
            return false;
        }
        match &name.prefix {
            Some(prefix) => match self.namespaces.uri(prefix) {
                Some(uri) => namespace == Some(uri),
                None => false,
            },
            None if name.local == "*" => true,
            // Unprefixed attributes have no namespace; unprefixed elements
            // also match the document default namespace.
            None if is_attribute => namespace.is_none(),
            None => namespace.is_none() || namespace == self.namespaces.default.as_deref(),
        }
    }

    fn test_matches(&self, test: &NodeTest, axis: Axis, item: &Item<'a, 'input>) -> bool {
        match (test, item) {
            (NodeTest::AnyNode, _) => true,
            (NodeTest::Text, Item::Node(node)) => node.is_text(),
            (NodeTest::Text, _) => false,
            (NodeTest::Name(name), Item::Attribute { namespace, name: local, .. }) => {
                axis == Axis::Attribute && self.name_matches(name, namespace.as_deref(), local, true)
            }
            (NodeTest::Name(name), Item::Node(node)) => {
                node.is_element()
                    && axis != Axis::Attribute
                    && self.name_matches(
                        name,
                        node.tag_name().namespace(),
                        node.tag_name().name(),
                        false,
                    )
            }
            (NodeTest::Name(_), _) => false,
        }
    }

    fn element_children(&self, item: &Item<'a, 'input>, name: &QName) -> Vec<Item<'a, 'input>> {
        self.children(item)
            .into_iter()
            .filter(|child| self.test_matches(&NodeTest::Name(name.clone()), Axis::Child, child))
            .collect()
    }

    fn attribute(&self, item: &Item<'a, 'input>, name: &QName) -> Option<String> {
        self.attributes(item).into_iter().find_map(|attr| match &attr {
            Item::Attribute { namespace, name: local, value, .. }
                if self.name_matches(name, namespace.as_deref(), local, true) =>
            {
                Some(value.clone())
            }
            _ => None,
        })
    }

    fn predicate_holds(&self, predicate: &Predicate, item: &Item<'a, 'input>) -> bool {
        match predicate {
            Predicate::Position(_) | Predicate::Last => true,
            Predicate::HasAttribute(name) => self.attribute(item, name).is_some(),
            Predicate::AttributeEquals(name, value, negate) => match self.attribute(item, name) {
                Some(actual) => (actual == *value) != *negate,
                None => false,
            },
            Predicate::HasChild(name) => !self.element_children(item, name).is_empty(),
            Predicate::ChildEquals(name, value, negate) => self
                .element_children(item, name)
                .iter()
                .any(|child| (child.string_value() == *value) != *negate),
            Predicate::SelfEquals(value, negate) => (item.string_value() == *value) != *negate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QName {
    prefix: Option<String>,
    local: String,
}

impl QName {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let valid = |s: &str| {
            !s.is_empty()
                && (s == "*" || s.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
        };
        let (prefix, local) = match text.split_once(':') {
            Some((prefix, local)) => (Some(prefix.to_string()), local),
            None => (None, text),
        };
        if !valid(local) || prefix.as_deref().is_some_and(|p| !valid(p) || p == "*") {
            return None;
        }
        Some(Self {
            prefix,
            local: local.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfNode,
    Parent,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(QName),
    Text,
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(QName),
    AttributeEquals(QName, String, bool),
    HasChild(QName),
    ChildEquals(QName, String, bool),
    SelfEquals(String, bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

/// A parsed query: one or more location paths joined by `|`
#[derive(Debug, Clone, PartialEq, Eq)]
struct XPath {
    paths: Vec<LocationPath>,
}

impl XPath {
    fn parse(expression: &str) -> Option<Self> {
        let paths = split_top_level(expression, '|')
            .iter()
            .map(|part| LocationPath::parse(part))
            .collect::<Option<Vec<_>>>()?;
        if paths.is_empty() {
            return None;
        }
        Some(Self { paths })
    }

    fn evaluate<'a, 'input: 'a>(
        &self,
        context: &QueryContext<'a, 'input>,
        start: &Item<'a, 'input>,
    ) -> Vec<Item<'a, 'input>> {
        let mut out: Vec<Item<'a, 'input>> = Vec::new();
        for path in &self.paths {
            for item in path.evaluate(context, start) {
                if !out.iter().any(|seen| seen.same_as(&item)) {
                    out.push(item);
                }
            }
        }
        out
    }
}

impl LocationPath {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let absolute = text.starts_with('/');
        let mut segments = split_top_level(text, '/');
        if absolute {
            segments.remove(0);
        }

        let mut steps = Vec::new();
        let last = segments.len().saturating_sub(1);
        for (i, segment) in segments.iter().enumerate() {
            let segment = segment.trim();
            if segment.is_empty() {
                if i == last {
                    // "/" alone selects the root; a trailing slash is invalid.
                    if absolute && segments.len() == 1 {
                        break;
                    }
                    return None;
                }
                steps.push(Step {
                    axis: Axis::DescendantOrSelf,
                    test: NodeTest::AnyNode,
                    predicates: Vec::new(),
                });
                continue;
            }
            steps.push(Step::parse(segment)?);
        }

        Some(Self { absolute, steps })
    }

    fn evaluate<'a, 'input: 'a>(
        &self,
        context: &QueryContext<'a, 'input>,
        start: &Item<'a, 'input>,
    ) -> Vec<Item<'a, 'input>> {
        let mut current = vec![if self.absolute { context.root.clone() } else { start.clone() }];
        for step in &self.steps {
            let mut next: Vec<Item<'a, 'input>> = Vec::new();
            for item in &current {
                for found in step.evaluate(context, item) {
                    if !next.iter().any(|seen| seen.same_as(&found)) {
                        next.push(found);
                    }
                }
            }
            current = next;
        }
        current
    }
}

impl Step {
    fn parse(segment: &str) -> Option<Self> {
        let (head, predicate_text) = match find_outside_quotes(segment, '[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };
        let head = head.trim();

        let (axis, test) = match head {
            "." => (Axis::SelfNode, NodeTest::AnyNode),
            ".." => (Axis::Parent, NodeTest::AnyNode),
            "text()" => (Axis::Child, NodeTest::Text),
            "node()" => (Axis::Child, NodeTest::AnyNode),
            _ => {
                let (axis, rest) = if let Some(rest) = head.strip_prefix('@') {
                    (Axis::Attribute, rest)
                } else if let Some((axis, rest)) = head.split_once("::") {
                    let axis = match axis.trim() {
                        "child" => Axis::Child,
                        "descendant" => Axis::Descendant,
                        "descendant-or-self" => Axis::DescendantOrSelf,
                        "self" => Axis::SelfNode,
                        "parent" => Axis::Parent,
                        "attribute" => Axis::Attribute,
                        _ => return None,
                    };
                    (axis, rest)
                } else {
                    (Axis::Child, head)
                };
                let test = match rest.trim() {
                    "text()" => NodeTest::Text,
                    "node()" => NodeTest::AnyNode,
                    name => NodeTest::Name(QName::parse(name)?),
                };
                (axis, test)
            }
        };

        let predicates = parse_predicates(predicate_text)?;
        Some(Self {
            axis,
            test,
            predicates,
        })
    }

    fn evaluate<'a, 'input: 'a>(
        &self,
        context: &QueryContext<'a, 'input>,
        item: &Item<'a, 'input>,
    ) -> Vec<Item<'a, 'input>> {
        let candidates = match self.axis {
            Axis::Child => context.children(item),
            Axis::Descendant => context.descendants(item, false),
            Axis::DescendantOrSelf => context.descendants(item, true),
            Axis::SelfNode => vec![item.clone()],
            Axis::Parent => context.parent(item).into_iter().collect(),
            Axis::Attribute => context.attributes(item),
        };

        let mut selected: Vec<Item<'a, 'input>> = candidates
            .into_iter()
            .filter(|c| context.test_matches(&self.test, self.axis, c))
            .collect();

        for predicate in &self.predicates {
            selected = match predicate {
                Predicate::Position(n) => selected
                    .into_iter()
                    .nth(n.saturating_sub(1))
                    .filter(|_| *n > 0)
                    .into_iter()
                    .collect(),
                Predicate::Last => selected.pop().into_iter().collect(),
                other => selected
                    .into_iter()
                    .filter(|c| context.predicate_holds(other, c))
                    .collect(),
            };
        }
        selected
    }
}

fn parse_predicates(text: &str) -> Option<Vec<Predicate>> {
    let mut predicates = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = find_matching_bracket(rest)?;
        predicates.push(Predicate::parse(&rest[1..close])?);
        rest = rest[close + 1..].trim_start();
    }
    Some(predicates)
}

impl Predicate {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(n) = text.parse::<usize>() {
            return Some(Predicate::Position(n));
        }
        if text == "last()" {
            return Some(Predicate::Last);
        }
        if let Some((lhs, rhs, negate)) = split_comparison(text) {
            let value = literal(rhs)?;
            let lhs = lhs.trim();
            return Some(match lhs {
                "." | "text()" => Predicate::SelfEquals(value, negate),
                _ => match lhs.strip_prefix('@') {
                    Some(name) => Predicate::AttributeEquals(QName::parse(name)?, value, negate),
                    None => Predicate::ChildEquals(QName::parse(lhs)?, value, negate),
                },
            });
        }
        match text.strip_prefix('@') {
            Some(name) => Some(Predicate::HasAttribute(QName::parse(name)?)),
            None => Some(Predicate::HasChild(QName::parse(text)?)),
        }
    }
}

fn literal(text: &str) -> Option<String> {
    let text = text.trim();
    let quoted = text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')));
    if quoted {
        Some(text[1..text.len() - 1].to_string())
    } else if text.parse::<f64>().is_ok() {
        Some(text.to_string())
    } else {
        None
    }
}

fn split_comparison(text: &str) -> Option<(&str, &str, bool)> {
    let pos = find_outside_quotes(text, '=')?;
    if pos > 0 && text.as_bytes()[pos - 1] == b'!' {
        Some((&text[..pos - 1], &text[pos + 1..], true))
    } else {
        Some((&text[..pos], &text[pos + 1..], false))
    }
}

fn find_outside_quotes(text: &str, needle: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == needle => return Some(i),
            None => {}
        }
    }
    None
}

fn find_matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' => depth += 1,
                ']' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Split on `separator` outside brackets and quotes.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth = depth.saturating_sub(1),
                c if c == separator && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0"?>
<srw:response xmlns:srw="http://www.loc.gov/zing/srw/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <srw:records>
    <srw:record id="r1" lang="fr">
      <dc:title>Paris</dc:title>
      <dc:subject>Ville</dc:subject>
      <dc:subject>Capitale</dc:subject>
    </srw:record>
    <srw:record id="r2">
      <dc:title>Lyon</dc:title>
    </srw:record>
  </srw:records>
</srw:response>"#;

    #[test]
    fn test_paths_with_registered_prefixes() {
        let doc = Document::parse(XML).unwrap();
        let namespaces = Namespaces::collect(&doc);
        let ctx = QueryContext::new(&doc, &namespaces);
        assert_eq!(ctx.strings("/srw:response/srw:records/srw:record/dc:title"), vec!["Paris", "Lyon"]);
        assert_eq!(ctx.strings("//dc:subject"), vec!["Ville", "Capitale"]);
        assert_eq!(ctx.strings("//srw:record/@id"), vec!["r1", "r2"]);
        assert_eq!(ctx.strings("//dc:title/text()"), vec!["Paris", "Lyon"]);
        assert!(ctx.strings("//unknown:title").is_empty());
        assert!(ctx.strings("//title").is_empty());
    }

    #[test]
    fn test_predicates() {
        let doc = Document::parse(XML).unwrap();
        let namespaces = Namespaces::collect(&doc);
        let ctx = QueryContext::new(&doc, &namespaces);
        assert_eq!(ctx.strings("//srw:record[2]/dc:title"), vec!["Lyon"]);
        assert_eq!(ctx.strings("//srw:record[last()]/@id"), vec!["r2"]);
        assert_eq!(ctx.strings("//srw:record[@lang]/@id"), vec!["r1"]);
        assert_eq!(ctx.strings("//srw:record[@id='r2']/dc:title"), vec!["Lyon"]);
        assert_eq!(ctx.strings("//srw:record[@id!='r2']/dc:title"), vec!["Paris"]);
        assert_eq!(ctx.strings("//srw:record[dc:title='Lyon']/@id"), vec!["r2"]);
        assert_eq!(ctx.strings("//srw:record[dc:subject]/@id"), vec!["r1"]);
        assert_eq!(ctx.strings("//dc:subject[.='Capitale']"), vec!["Capitale"]);
        assert_eq!(ctx.strings("//srw:record/dc:subject[1]"), vec!["Ville"]);
    }

    #[test]
    fn test_unions_and_axes() {
        let doc = Document::parse(XML).unwrap();
        let namespaces = Namespaces::collect(&doc);
        let ctx = QueryContext::new(&doc, &namespaces);
        assert_eq!(ctx.strings("//dc:title | //srw:record/@id").len(), 4);
        assert_eq!(ctx.strings("//dc:title[1]/../@id"), vec!["r1", "r2"]);
        assert_eq!(ctx.strings("//srw:records/descendant::dc:title"), vec!["Paris", "Lyon"]);
    }

    #[test]
    fn test_record_context() {
        let doc = Document::parse(XML).unwrap();
        let namespaces = Namespaces::collect(&doc);
        let ctx = QueryContext::new(&doc, &namespaces);
        let records: Vec<Node> = ctx
            .select("//srw:record")
            .iter()
            .filter_map(Item::node)
            .collect();
        assert_eq!(records.len(), 2);

        let second = ctx.for_node(records[1]);
        assert_eq!(second.strings("/srw:record/dc:title"), vec!["Lyon"]);
        assert_eq!(second.strings("dc:title"), Vec::<String>::new());
        assert_eq!(second.strings("//dc:title"), vec!["Lyon"]);
        assert_eq!(second.strings("/srw:record/@id"), vec!["r2"]);
    }

    #[test]
    fn test_default_namespace() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>A</title></entry></feed>"#;
        let doc = Document::parse(xml).unwrap();
        let namespaces = Namespaces::collect(&doc);
        let ctx = QueryContext::new(&doc, &namespaces);
        assert_eq!(ctx.strings("/feed/entry/title"), vec!["A"]);
    }

    #[test]
    fn test_nested_namespace_declarations() {
        let xml = r#"<results>
  <record><meta xmlns:p="http://example.org/p"><p:x>one</p:x></meta></record>
  <record><p:x xmlns:p="http://example.org/p">two</p:x></record>
</results>"#;
        let doc = Document::parse(xml).unwrap();
        let namespaces = Namespaces::collect(&doc);
        assert_eq!(namespaces.uri("p"), Some("http://example.org/p"));

        let ctx = QueryContext::new(&doc, &namespaces);
        assert_eq!(ctx.strings("//p:x"), vec!["one", "two"]);
        assert_eq!(ctx.strings("/results/record/meta/p:x"), vec!["one"]);
    }

    #[test]
    fn test_invalid_queries() {
        let doc = Document::parse(XML).unwrap();
        let namespaces = Namespaces::collect(&doc);
        let ctx = QueryContext::new(&doc, &namespaces);
        assert!(ctx.select("").is_empty());
        assert!(ctx.select("//srw:record[").is_empty());
        assert!(ctx.select("/a/").is_empty());
        assert!(ctx.select("foo::bar").is_empty());
    }
}

