//! XML namespace handling
//!
//! Qualified names and the prefix-to-URI declarations carried by each schema
//! file. Declarations keep their document order so they can be written back
//! exactly as they were read.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// XSD 1.0 namespace (also used by XSD 1.1 documents)
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace used by some early XSD 1.1 drafts
pub const XSD_1_1_DRAFT_NAMESPACE: &str = "http://www.w3.org/2009/XMLSchema";

/// Conventional prefix for the XSD namespace
pub const XSD_PREFIX: &str = "xs";

/// The `xml` prefix, bound to [`crate::XML_NAMESPACE`] without a declaration
pub const XML_PREFIX: &str = "xml";

/// Check whether a URI is one of the XML Schema namespaces
pub fn is_xsd_namespace(uri: &str) -> bool {
    uri == XSD_NAMESPACE || uri == XSD_1_1_DRAFT_NAMESPACE
}

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Check whether this name lives in the XSD namespace (a built-in)
    pub fn is_xsd(&self) -> bool {
        self.namespace.as_deref().map(is_xsd_namespace).unwrap_or(false)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace declarations in scope for one schema file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI, in declaration order
    prefixes: IndexMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that only binds the conventional `xs` prefix
    pub fn with_xsd_prefix() -> Self {
        let mut ctx = Self::new();
        ctx.add_prefix(XSD_PREFIX, XSD_NAMESPACE);
        ctx
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    ///
    /// `xml` is always bound, declared or not.
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(crate::XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Find the first prefix bound to a namespace
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Prefix used for XSD components in this file
    pub fn xsd_prefix(&self) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, uri)| is_xsd_namespace(uri))
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Iterate over prefix declarations in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Check whether nothing is declared
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.default_namespace.is_none()
    }

    /// Merge declarations from another context without overriding existing bindings
    pub fn merge_missing(&mut self, other: &NamespaceContext) {
        for (prefix, uri) in other.iter() {
            if !self.prefixes.contains_key(prefix) {
                self.add_prefix(prefix, uri);
            }
        }
        if self.default_namespace.is_none() {
            self.default_namespace = other.default_namespace.clone();
        }
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_display() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.to_string(), "{http://example.com}element");

        let qname_local = QName::local("element");
        assert_eq!(qname_local.to_string(), "element");
    }

    #[test]
    fn test_qname_is_xsd() {
        assert!(QName::namespaced(XSD_NAMESPACE, "string").is_xsd());
        assert!(!QName::namespaced("urn:other", "string").is_xsd());
        assert!(!QName::local("string").is_xsd());
    }

    #[test]
    fn test_namespace_context() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("xs", XSD_NAMESPACE);
        ctx.set_default_namespace("http://example.com");

        assert_eq!(ctx.get_namespace("xs"), Some(XSD_NAMESPACE));
        assert_eq!(ctx.get_default_namespace(), Some("http://example.com"));
        assert_eq!(ctx.xsd_prefix(), Some("xs"));
        assert_eq!(ctx.prefix_for("http://example.com"), None);
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("tns", "urn:test");

        let qname = ctx.resolve("tns:Foo").unwrap();
        assert_eq!(qname.namespace.as_deref(), Some("urn:test"));
        assert_eq!(qname.local_name, "Foo");

        assert!(ctx.resolve("missing:Foo").is_err());
        assert_eq!(ctx.resolve("Foo").unwrap(), QName::local("Foo"));
    }

    #[test]
    fn test_xml_prefix_is_implicit() {
        let ctx = NamespaceContext::new();
        assert_eq!(ctx.get_namespace("xml"), Some(crate::XML_NAMESPACE));
        let qname = ctx.resolve("xml:lang").unwrap();
        assert_eq!(qname, QName::namespaced(crate::XML_NAMESPACE, "lang"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("xs", XSD_NAMESPACE);
        ctx.add_prefix("b", "urn:b");
        ctx.add_prefix("a", "urn:a");

        let prefixes: Vec<_> = ctx.iter().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["xs", "b", "a"]);
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("t", "urn:one");
        let mut other = NamespaceContext::new();
        other.add_prefix("t", "urn:two");
        other.add_prefix("u", "urn:three");

        ctx.merge_missing(&other);
        assert_eq!(ctx.get_namespace("t"), Some("urn:one"));
        assert_eq!(ctx.get_namespace("u"), Some("urn:three"));
    }
}
