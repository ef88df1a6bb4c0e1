//! XML document reading
//!
//! A small element tree built with quick-xml. It keeps what a schema editor
//! needs to rebuild components faithfully: prefixes, namespace declarations,
//! attributes in document order and text content.

use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, ParseError, Result};
use crate::namespaces::NamespaceContext;

/// XML Element in the document tree
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Prefix as written in the source, if any
    pub prefix: Option<String>,
    /// Local name
    pub local_name: String,
    /// Namespace URI resolved from the in-scope declarations
    pub namespace: Option<String>,
    /// Attributes in document order, keyed by their raw (possibly prefixed) name
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations made on this element
    pub namespaces: NamespaceContext,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// 1-based line of the start tag
    pub line: usize,
}

impl Element {
    /// Create a new element
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Default::default()
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Get an attribute value by its raw name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append text content
    pub fn append_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Render this element and its subtree as compact markup, prefixes as written
    ///
    /// Text is written before the child elements.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let name = match self.prefix {
            Some(ref prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        };
        out.push('<');
        out.push_str(&name);
        let declarations = self
            .namespaces
            .get_default_namespace()
            .map(|uri| ("xmlns".to_string(), uri))
            .into_iter()
            .chain(self.namespaces.iter().map(|(p, uri)| (format!("xmlns:{}", p), uri)));
        for (key, value) in declarations {
            out.push_str(&format!(" {}=\"{}\"", key, escape(value)));
        }
        for (key, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(ref text) = self.text {
            out.push_str(&escape(text.as_str()));
        }
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }
}

/// Parsed XML document
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Root element
    root: Option<Element>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        // In-scope declarations, one entry per open element
        let mut scopes: Vec<NamespaceContext> = Vec::new();
        let mut lines = LineCursor::default();

        loop {
            let position = reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let line = lines.line_at(xml, position);
                    let (element, scope) = Self::parse_element(&e, scopes.last(), line)?;
                    element_stack.push(element);
                    scopes.push(scope);
                }
                Ok(Event::End(_)) => {
                    scopes.pop();
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else if doc.root.is_none() {
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let line = lines.line_at(xml, position);
                    let (element, _) = Self::parse_element(&e, scopes.last(), line)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else if doc.root.is_none() {
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    if let Some(current) = element_stack.last_mut() {
                        if !text.trim().is_empty() {
                            current.append_text(&text);
                        }
                    } else if !text.trim().is_empty() {
                        return Err(Error::Parse(
                            ParseError::new("Character data outside the root element")
                                .with_location(format!("line {}", lines.line_at(xml, position))),
                        ));
                    }
                }
                Ok(Event::CData(e)) => {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                    if let Some(current) = element_stack.last_mut() {
                        current.append_text(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Parse(
                        ParseError::new(format!("Malformed XML: {}", e))
                            .with_location(format!("line {}", lines.line_at(xml, reader.buffer_position()))),
                    ))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Parse(
                ParseError::new(format!("Unexpected end of document inside <{}>", open.local_name))
                    .with_location(format!("line {}", open.line)),
            ));
        }

        Ok(doc)
    }

    /// Parse element from BytesStart event, returning it with its in-scope declarations
    fn parse_element(
        start: &BytesStart,
        parent_scope: Option<&NamespaceContext>,
        line: usize,
    ) -> Result<(Element, NamespaceContext)> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;

        let mut element = match name.split_once(':') {
            Some((prefix, local)) => {
                let mut element = Element::new(local);
                element.prefix = Some(prefix.to_string());
                element
            }
            None => Element::new(name),
        };
        element.line = line;

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?;

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                element.namespaces.set_default_namespace(&attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                element.namespaces.add_prefix(prefix, &attr_value);
            } else {
                element.attributes.insert(attr_name.to_string(), attr_value);
            }
        }

        let mut scope = element.namespaces.clone();
        if let Some(parent) = parent_scope {
            scope.merge_missing(parent);
        }

        element.namespace = match element.prefix.as_deref() {
            Some(prefix) => Some(
                scope
                    .get_namespace(prefix)
                    .ok_or_else(|| {
                        Error::Parse(
                            ParseError::new(format!("Undeclared namespace prefix '{}'", prefix))
                                .with_location(format!("line {}", line)),
                        )
                    })?
                    .to_string(),
            ),
            None => scope.get_default_namespace().map(|s| s.to_string()),
        };

        Ok((element, scope))
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

/// Line counter over increasing byte offsets
///
/// Only the bytes since the previous query are scanned, so a whole parse
/// stays linear in the input size.
#[derive(Debug, Clone, Copy)]
struct LineCursor {
    position: usize,
    line: usize,
}

impl Default for LineCursor {
    fn default() -> Self {
        Self { position: 0, line: 1 }
    }
}

impl LineCursor {
    /// 1-based line number of a byte offset
    fn line_at(&mut self, xml: &str, position: usize) -> usize {
        let end = position.min(xml.len());
        if end < self.position {
            *self = Self::default();
        }
        self.line += xml.as_bytes()[self.position..end].iter().filter(|&&b| b == b'\n').count();
        self.position = end;
        self.line
    }
}
