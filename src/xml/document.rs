use std::borrow::Cow;
use std::io::Cursor;

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::xml::{Result, XmlError};

/// Stable index of an element inside its [`XmlDocument`].
///
/// Ids are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name, e.g. `ID` or `xmlns:samlp`
    pub name: String,
    /// Unescaped value
    pub value: String,
}

/// An element node. Namespace declarations are kept as ordinary
/// `xmlns` / `xmlns:prefix` attributes.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: String,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            text: String::new(),
        }
    }

    /// Qualified tag name, including the prefix if any.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Namespace declarations made on this element as `(prefix, uri)`;
    /// the default namespace has an empty prefix.
    fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|attr| {
            if attr.name == "xmlns" {
                Some(("", attr.value.as_str()))
            } else {
                attr.name
                    .strip_prefix("xmlns:")
                    .map(|prefix| (prefix, attr.value.as_str()))
            }
        })
    }
}

/// A mutable element tree stored as an arena.
///
/// Elements are created detached with [`XmlDocument::create_element`] and
/// become part of the tree once attached to a parent. Detached elements are
/// never serialized.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Element>,
    root: NodeId,
}

impl XmlDocument {
    /// Create a document with a single root element.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Element::new(root_name.into())],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// # Panics
    /// Panics if `id` was not issued by this document.
    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.push(Element::new(name.into()));
        NodeId(self.nodes.len() - 1)
    }

    /// Create an element and append it as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let child = self.create_element(name);
        self.append_child(parent, child);
        child
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.element(parent).children.len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` at `index` among the children of `parent`, moving it
    /// out of its previous position if it was already attached.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.element_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.element_mut(child).parent = Some(parent);
    }

    /// Insert `child` right after `anchor`. Falls back to appending when
    /// `anchor` is not a child of `parent`.
    pub fn insert_child_after(&mut self, parent: NodeId, anchor: NodeId, child: NodeId) {
        let index = self
            .element(parent)
            .children
            .iter()
            .position(|&id| id == anchor)
            .map_or(self.element(parent).children.len(), |pos| pos + 1);
        self.insert_child(parent, index, child);
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.element_mut(child).parent.take() {
            self.element_mut(parent).children.retain(|&id| id != child);
        }
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let attributes = &mut self.element_mut(id).attributes;
        match attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => attributes.push(Attribute { name, value }),
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).attribute(name)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attributes = &mut self.element_mut(id).attributes;
        let pos = attributes.iter().position(|attr| attr.name == name)?;
        Some(attributes.remove(pos).value)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.element_mut(id).text = text.into();
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.element(id).text()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).children()
    }

    /// First child of `parent` with the given local name, ignoring prefixes.
    pub fn find_child(&self, parent: NodeId, local_name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&id| self.element(id).local_name() == local_name)
    }

    /// Follow a path of local names starting at the root, whose own local
    /// name must match the first segment.
    pub fn find_path(&self, path: &[&str]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        if self.element(self.root).local_name() != *first {
            return None;
        }
        rest.iter()
            .try_fold(self.root, |current, segment| self.find_child(current, segment))
    }

    /// Serialize the whole document without declaration or indentation.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_element(&mut writer, self.root, &[])?;
        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    /// Serialize the subtree rooted at `id`. Namespaces declared on
    /// ancestors are re-declared on the subtree's top element so the output
    /// stands on its own.
    pub fn subtree_to_string(&self, id: NodeId) -> Result<String> {
        let inherited = self.inherited_namespaces(id);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_element(&mut writer, id, &inherited)?;
        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    /// Namespace declarations visible at `id` from its ancestors and not
    /// overridden by `id` itself, as attributes.
    fn inherited_namespaces(&self, id: NodeId) -> Vec<Attribute> {
        let mut seen: Vec<String> = self
            .element(id)
            .namespace_declarations()
            .map(|(prefix, _)| prefix.to_string())
            .collect();
        let mut inherited = Vec::new();
        let mut current = self.element(id).parent;
        while let Some(ancestor) = current {
            let element = self.element(ancestor);
            for (prefix, uri) in element.namespace_declarations() {
                if seen.iter().any(|p| p == prefix) {
                    continue;
                }
                seen.push(prefix.to_string());
                let name = if prefix.is_empty() {
                    "xmlns".to_string()
                } else {
                    format!("xmlns:{prefix}")
                };
                inherited.push(Attribute {
                    name,
                    value: uri.to_string(),
                });
            }
            current = element.parent;
        }
        inherited
    }

    fn write_element<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        id: NodeId,
        extra: &[Attribute],
    ) -> Result<()> {
        let element = self.element(id);
        let mut start = BytesStart::new(element.name.as_str());
        for attr in extra.iter().chain(&element.attributes) {
            start.push_attribute(XmlAttribute {
                key: QName(attr.name.as_bytes()),
                value: Cow::Owned(escape_attribute_value(&attr.value).into_bytes()),
            });
        }

        if element.children.is_empty() && element.text.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if !element.text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&element.text)))?;
        }
        for &child in &element.children {
            self.write_element(writer, child, &[])?;
        }
        writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
        Ok(())
    }

    /// Parse XML text into a document.
    ///
    /// Whitespace-only text between elements is not preserved; comments,
    /// processing instructions and the XML declaration are dropped.
    ///
    /// Elements hold a single text value, so mixed content does not round
    /// trip: text after a child element is appended to the element's text
    /// and written back before its children.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut doc: Option<XmlDocument> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = open_element(&mut doc, &stack, &e)?;
                    stack.push(id);
                }
                Event::Empty(e) => {
                    open_element(&mut doc, &stack, &e)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    if let (Some(doc), Some(&current)) = (doc.as_mut(), stack.last()) {
                        doc.element_mut(current).text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let text = std::str::from_utf8(&raw)?;
                    if let (Some(doc), Some(&current)) = (doc.as_mut(), stack.last()) {
                        doc.element_mut(current).text.push_str(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        doc.ok_or(XmlError::MissingRoot)
    }
}

/// Attribute values keep tabs and line breaks as character references;
/// written raw, a parser would normalize them to spaces.
fn escape_attribute_value(value: &str) -> String {
    let escaped = escape(value);
    if !escaped.contains(['\t', '\n', '\r']) {
        return escaped.into_owned();
    }
    escaped
        .replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
}

fn open_element(
    doc: &mut Option<XmlDocument>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        attributes.push(Attribute {
            name: std::str::from_utf8(attr.key.as_ref())?.to_string(),
            value: attr.unescape_value()?.into_owned(),
        });
    }

    match doc {
        None => {
            let mut root = XmlDocument::new(name);
            root.nodes[0].attributes = attributes;
            *doc = Some(root);
            Ok(NodeId(0))
        }
        Some(doc) => {
            let parent = stack
                .last()
                .copied()
                .ok_or_else(|| XmlError::Parse("more than one root element".into()))?;
            let id = doc.add_child(parent, name);
            doc.element_mut(id).attributes = attributes;
            Ok(id)
        }
    }
}
