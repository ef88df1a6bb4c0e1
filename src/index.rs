//! Name index and reference resolution
//!
//! References (`ref`, `type`, `base`, ...) are stored on nodes as the
//! qualified names the author wrote. They are resolved on demand through a
//! [`NameIndex`] built from the current tree; nothing caches a resolved node
//! on the referencing node.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::Diagnostic;
use crate::factory::SchemaSet;
use crate::model::{Declaration, NodeId, NodeKind, NodeProperty, NodeTag, XsdTree};
use crate::names::{is_valid_ncname, is_valid_qname, split_qname};
use crate::namespaces::{NamespaceContext, QName};

/// Symbol space a global component is named in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentCategory {
    Element,
    Attribute,
    Type,
    Group,
    AttributeGroup,
}

impl ComponentCategory {
    /// Category a definition of this kind is indexed under
    pub fn of(tag: NodeTag) -> Option<Self> {
        match tag {
            NodeTag::Element => Some(Self::Element),
            NodeTag::Attribute => Some(Self::Attribute),
            NodeTag::ComplexType | NodeTag::SimpleType => Some(Self::Type),
            NodeTag::Group => Some(Self::Group),
            NodeTag::AttributeGroup => Some(Self::AttributeGroup),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::Type => "type",
            Self::Group => "group",
            Self::AttributeGroup => "attributeGroup",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One name-valued attribute pointing at a global component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub node: NodeId,
    pub property: NodeProperty,
    pub category: ComponentCategory,
    /// Qualified name as written
    pub name: String,
}

/// Every reference a node carries, in attribute order
///
/// `memberTypes` yields one site per listed name.
pub fn reference_sites(tree: &XsdTree, id: NodeId) -> Vec<ReferenceSite> {
    use ComponentCategory as C;
    use NodeProperty as P;

    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    let site = |property, category, name: &str| ReferenceSite {
        node: id,
        property,
        category,
        name: name.to_string(),
    };

    let mut sites = Vec::new();
    match node.kind() {
        NodeKind::Element(e) => {
            if let Declaration::Reference(r) = &e.decl {
                sites.push(site(P::Ref, C::Element, r));
            }
            if let Some(t) = &e.type_name {
                sites.push(site(P::Type, C::Type, t));
            }
            if let Some(s) = &e.substitution_group {
                sites.push(site(P::SubstitutionGroup, C::Element, s));
            }
        }
        NodeKind::Attribute(a) => {
            if let Declaration::Reference(r) = &a.decl {
                sites.push(site(P::Ref, C::Attribute, r));
            }
            if let Some(t) = &a.type_name {
                sites.push(site(P::Type, C::Type, t));
            }
        }
        NodeKind::Group(g) => {
            if let Declaration::Reference(r) = &g.decl {
                sites.push(site(P::Ref, C::Group, r));
            }
        }
        NodeKind::AttributeGroup(g) => {
            if let Declaration::Reference(r) = &g.decl {
                sites.push(site(P::Ref, C::AttributeGroup, r));
            }
        }
        NodeKind::Restriction(d) | NodeKind::Extension(d) => {
            if let Some(b) = &d.base {
                sites.push(site(P::Base, C::Type, b));
            }
        }
        NodeKind::List(l) => {
            if let Some(t) = &l.item_type {
                sites.push(site(P::ItemType, C::Type, t));
            }
        }
        NodeKind::Union(u) => {
            for member in &u.member_types {
                sites.push(site(P::MemberTypes, C::Type, member));
            }
        }
        NodeKind::Alternative(a) => {
            if let Some(t) = &a.type_name {
                sites.push(site(P::Type, C::Type, t));
            }
        }
        _ => {}
    }
    sites
}

/// Prefix declarations in effect at a node: those of its origin file
pub fn namespace_context(tree: &XsdTree, node: NodeId) -> &NamespaceContext {
    tree.origin_file(node)
        .and_then(|path| tree.file(&path))
        .map(|file| &file.header.namespaces)
        .unwrap_or(&tree.schema().namespaces)
}

/// Expand a qualified name written at `node`
///
/// Returns `None` when the prefix is not declared. Unprefixed names in a
/// chameleon-included file (no targetNamespace of its own) take the
/// including schema's namespace.
pub fn expand_name(tree: &XsdTree, node: NodeId, name: &str) -> Option<QName> {
    let context = namespace_context(tree, node);
    match split_qname(name) {
        (Some(prefix), local) => context
            .get_namespace(prefix)
            .map(|ns| QName::namespaced(ns, local)),
        (None, local) => {
            if let Some(ns) = context.get_default_namespace() {
                return Some(QName::namespaced(ns, local));
            }
            let chameleon = tree
                .origin_file(node)
                .and_then(|path| tree.file(&path))
                .map(|file| file.header.target_namespace.is_none())
                .unwrap_or(false);
            match tree.target_namespace() {
                Some(tns) if chameleon => Some(QName::namespaced(tns, local)),
                _ => Some(QName::local(local)),
            }
        }
    }
}

/// Global definitions of one tree by category and local name
#[derive(Debug, Clone)]
pub struct NameIndex {
    root: NodeId,
    revision: u64,
    target_namespace: Option<String>,
    entries: HashMap<(ComponentCategory, String), NodeId>,
    duplicates: Vec<(ComponentCategory, String, NodeId)>,
}

impl NameIndex {
    /// Index the top-level definitions of `tree`
    ///
    /// Definitions under `xs:redefine`/`xs:override` replace the ones they
    /// redefine. Among plain duplicates the first in document order wins.
    pub fn build(tree: &XsdTree) -> Self {
        let mut index = Self {
            root: tree.root(),
            revision: tree.revision(),
            target_namespace: tree.target_namespace().map(str::to_string),
            entries: HashMap::new(),
            duplicates: Vec::new(),
        };

        let mut redefinitions = Vec::new();
        for &child in tree.children(tree.root()) {
            match tree.tag(child) {
                Some(NodeTag::Redefine) | Some(NodeTag::Override) => {
                    redefinitions.extend(tree.children(child).iter().copied());
                }
                _ => index.insert(tree, child, false),
            }
        }
        for child in redefinitions {
            index.insert(tree, child, true);
        }
        index
    }

    fn insert(&mut self, tree: &XsdTree, id: NodeId, replace: bool) {
        let Some(node) = tree.get(id) else {
            return;
        };
        if node.is_reference() {
            return;
        }
        let (Some(category), Some(name)) = (ComponentCategory::of(node.tag()), node.name()) else {
            return;
        };
        let key = (category, name.to_string());
        if replace || !self.entries.contains_key(&key) {
            self.entries.insert(key, id);
        } else {
            self.duplicates.push((category, name.to_string(), id));
        }
    }

    /// Check whether the index still reflects `tree`
    pub fn is_current(&self, tree: &XsdTree) -> bool {
        self.root == tree.root() && self.revision == tree.revision()
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Definition with the given local name
    pub fn lookup(&self, category: ComponentCategory, local_name: &str) -> Option<NodeId> {
        self.entries.get(&(category, local_name.to_string())).copied()
    }

    /// Resolve a name written at `from` against this tree's namespace
    pub fn resolve_from(&self, tree: &XsdTree, from: NodeId, category: ComponentCategory, name: &str) -> Option<NodeId> {
        let qname = expand_name(tree, from, name)?;
        if qname.namespace.as_deref() != self.target_namespace() {
            return None;
        }
        self.lookup(category, &qname.local_name)
    }

    /// Sorted names of one category
    pub fn names(&self, category: ComponentCategory) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, n)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Definitions that lost to an earlier one with the same name
    pub fn duplicates(&self) -> &[(ComponentCategory, String, NodeId)] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved reference: the tree holding the definition and its node
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub tree: &'a XsdTree,
    pub node: NodeId,
}

/// A reference that no definition answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub site: ReferenceSite,
    /// Expanded name, absent when the prefix is undeclared
    pub qname: Option<QName>,
    pub file: Option<PathBuf>,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qname {
            Some(qname) => write!(
                f,
                "{} '{}' ({}) on {} does not resolve",
                self.site.category, self.site.name, qname, self.site.node
            )?,
            None => write!(
                f,
                "{} '{}' on {} uses an undeclared prefix",
                self.site.category, self.site.name, self.site.node
            )?,
        }
        if let Some(ref file) = self.file {
            write!(f, " in {}", file.display())?;
        }
        Ok(())
    }
}

impl SchemaSet {
    /// Resolve a qualified name using the main schema's prefix declarations
    pub fn resolve_ref(&self, category: ComponentCategory, qualified_name: &str) -> Option<Resolved<'_>> {
        self.resolve_ref_from(self.tree().root(), category, qualified_name)
    }

    /// Resolve a qualified name written at `from` in the main tree
    ///
    /// Names in an imported namespace resolve into that namespace's tree.
    pub fn resolve_ref_from(
        &self,
        from: NodeId,
        category: ComponentCategory,
        qualified_name: &str,
    ) -> Option<Resolved<'_>> {
        let qname = expand_name(self.tree(), from, qualified_name)?;
        let namespace = qname.namespace.as_deref();
        let tree = self.tree_for_namespace(namespace)?;
        let index = self.index_for(namespace)?;
        let node = index.lookup(category, &qname.local_name)?;
        Some(Resolved { tree, node })
    }

    /// Every reference in the main tree that is neither built in nor resolvable
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        let tree = self.tree();
        let mut unresolved = Vec::new();
        for node in tree.descendants(tree.root()) {
            for site in reference_sites(tree, node) {
                let qname = expand_name(tree, node, &site.name);
                let ok = match &qname {
                    Some(q) if q.is_xsd() => true,
                    Some(_) => self.resolve_ref_from(node, site.category, &site.name).is_some(),
                    None => false,
                };
                if !ok {
                    unresolved.push(UnresolvedReference {
                        site,
                        qname,
                        file: tree.origin_file(node),
                    });
                }
            }
        }
        unresolved
    }

    /// Names that are not valid XML names, and duplicate global definitions
    pub fn validate_names(&self) -> Vec<Diagnostic> {
        let tree = self.tree();
        let mut diagnostics = Vec::new();
        let with_file = |d: Diagnostic, node: NodeId| match tree.origin_file(node) {
            Some(path) => d.in_file(path),
            None => d,
        };

        for node in tree.descendants(tree.root()) {
            let Some(xsd_node) = tree.get(node) else {
                continue;
            };
            if let Some(name) = xsd_node.name() {
                if !is_valid_ncname(name) {
                    diagnostics.push(with_file(
                        Diagnostic::warning(format!(
                            "{} name '{}' is not a valid NCName",
                            xsd_node.kind().local_name(),
                            name
                        )),
                        node,
                    ));
                }
            } else if tree.parent(node) == Some(tree.root())
                && ComponentCategory::of(xsd_node.tag()).is_some()
                && !xsd_node.is_reference()
            {
                diagnostics.push(with_file(
                    Diagnostic::warning(format!("global {} has no name", xsd_node.kind().local_name())),
                    node,
                ));
            }
            for site in reference_sites(tree, node) {
                if !is_valid_qname(&site.name) {
                    diagnostics.push(with_file(
                        Diagnostic::warning(format!(
                            "{} '{}' is not a valid QName",
                            site.property, site.name
                        )),
                        node,
                    ));
                }
            }
        }

        for (category, name, node) in self.index().duplicates() {
            diagnostics.push(with_file(
                Diagnostic::warning(format!("duplicate global {} '{}'", category, name)),
                *node,
            ));
        }
        diagnostics
    }
}
