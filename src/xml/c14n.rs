use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::str;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;

use crate::xml::{Result, XmlError};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Canonical XML variants, identified by their algorithm URIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Canonicalization {
    /// Exclusive XML Canonicalization 1.0 (omits comments)
    #[default]
    #[serde(rename = "http://www.w3.org/2001/10/xml-exc-c14n#")]
    Exclusive,
    /// Canonical XML 1.0 (omits comments)
    #[serde(rename = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315")]
    Inclusive,
}

impl Canonicalization {
    pub const fn uri(self) -> &'static str {
        match self {
            Canonicalization::Exclusive => "http://www.w3.org/2001/10/xml-exc-c14n#",
            Canonicalization::Inclusive => "http://www.w3.org/TR/2001/REC-xml-c14n-20010315",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        [Canonicalization::Exclusive, Canonicalization::Inclusive]
            .into_iter()
            .find(|c| c.uri() == uri)
    }
}

/// Namespace bindings in scope, and those already written by an output
/// ancestor. The default namespace uses the empty prefix.
#[derive(Debug, Clone, Default)]
struct Scope {
    declared: BTreeMap<String, String>,
    rendered: BTreeMap<String, String>,
}

/// Canonicalize a standalone XML fragment.
///
/// `inclusive_prefixes` is the `InclusiveNamespaces PrefixList` of exclusive
/// canonicalization (`#default` names the default namespace); it is ignored
/// in inclusive mode, where every in-scope namespace is rendered.
pub fn canonicalize(
    xml: &str,
    mode: Canonicalization,
    inclusive_prefixes: &[&str],
) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut out = String::with_capacity(xml.len());
    let mut scopes = vec![Scope::default()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let parent = scopes.last().cloned().unwrap_or_default();
                let scope = write_start(&mut out, &e, parent, mode, inclusive_prefixes)?;
                scopes.push(scope);
            }
            Event::End(e) => {
                out.push_str("</");
                out.push_str(str::from_utf8(e.name().as_ref())?);
                out.push('>');
                scopes.pop();
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                escape_text(&mut out, &normalize_line_endings(&text));
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                escape_text(&mut out, &normalize_line_endings(str::from_utf8(&raw)?));
            }
            Event::Eof => break,
            // declarations, comments, PIs and doctypes have no canonical form here
            _ => {}
        }
    }
    Ok(out)
}

fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

fn prefix_of(qname: &str) -> &str {
    qname.split_once(':').map_or("", |(prefix, _)| prefix)
}

/// Write a canonical start tag and return the scope for its content.
fn write_start(
    out: &mut String,
    start: &BytesStart<'_>,
    parent: Scope,
    mode: Canonicalization,
    inclusive_prefixes: &[&str],
) -> Result<Scope> {
    let Scope {
        mut declared,
        mut rendered,
    } = parent;

    let mut attributes = Vec::new();
    for attr in start.attributes().with_checks(false) {
        let attr = attr?;
        let key = str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            declared.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.insert(prefix.to_string(), value);
        } else {
            attributes.push((key.to_string(), value));
        }
    }

    let name = str::from_utf8(start.name().as_ref())?.to_string();

    let candidates: BTreeSet<String> = match mode {
        Canonicalization::Inclusive => declared.keys().cloned().collect(),
        Canonicalization::Exclusive => {
            let mut used = BTreeSet::new();
            used.insert(prefix_of(&name).to_string());
            for (key, _) in &attributes {
                let prefix = prefix_of(key);
                if !prefix.is_empty() {
                    used.insert(prefix.to_string());
                }
            }
            for prefix in inclusive_prefixes {
                let prefix = if *prefix == "#default" { "" } else { prefix };
                if declared.contains_key(prefix) {
                    used.insert(prefix.to_string());
                }
            }
            used
        }
    };

    // BTreeSet iteration keeps declarations sorted by prefix, default first
    let mut namespaces = Vec::new();
    for prefix in candidates {
        if prefix == "xml" {
            continue;
        }
        let uri = match declared.get(&prefix) {
            Some(uri) => uri.clone(),
            None if prefix.is_empty() => String::new(),
            None => return Err(XmlError::UnboundPrefix(prefix)),
        };
        let already = match rendered.get(&prefix) {
            Some(rendered_uri) => *rendered_uri == uri,
            // an empty default namespace needs no declaration unless it undoes one
            None => prefix.is_empty() && uri.is_empty(),
        };
        if !already {
            namespaces.push((prefix, uri));
        }
    }

    let mut sorted_attributes = Vec::with_capacity(attributes.len());
    for (key, value) in attributes {
        let (namespace, local) = match key.split_once(':') {
            Some(("xml", local)) => (XML_NAMESPACE.to_string(), local.to_string()),
            Some((prefix, local)) => {
                let uri = declared
                    .get(prefix)
                    .cloned()
                    .ok_or_else(|| XmlError::UnboundPrefix(prefix.to_string()))?;
                (uri, local.to_string())
            }
            None => (String::new(), key.clone()),
        };
        sorted_attributes.push((namespace, local, key, value));
    }
    sorted_attributes.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));

    out.push('<');
    out.push_str(&name);
    for (prefix, uri) in &namespaces {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attr(out, uri);
        out.push('"');
    }
    for (_, _, key, value) in &sorted_attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(out, value);
        out.push('"');
    }
    out.push('>');

    for (prefix, uri) in namespaces {
        rendered.insert(prefix, uri);
    }
    Ok(Scope { declared, rendered })
}
