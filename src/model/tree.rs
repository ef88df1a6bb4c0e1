//! Arena-backed schema tree
//!
//! [`XsdTree`] owns every node of one logical schema. Child lists are the only
//! owning edges; parents are stored as ids. Nodes removed from the tree stay in
//! the arena, detached, so that commands can put them back on undo.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::node::{AnnotationExtras, NodeId, NodeKind, NodeTag, SchemaData, XsdNode};
use super::properties::NodeProperty;
use super::source::{IncludeSourceInfo, SchemaFile};

/// A change notification delivered to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A property value changed
    PropertyChanged {
        node: NodeId,
        property: NodeProperty,
        old: Option<String>,
        new: Option<String>,
    },
    /// A child was inserted into `parent` at `index`
    ChildInserted {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    /// A child was removed from `parent` at `index`
    ChildRemoved {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
}

impl TreeEvent {
    /// Node whose own state changed
    pub fn subject(&self) -> NodeId {
        match self {
            TreeEvent::PropertyChanged { node, .. } => *node,
            TreeEvent::ChildInserted { parent, .. } | TreeEvent::ChildRemoved { parent, .. } => {
                *parent
            }
        }
    }
}

/// Handle returned by [`XsdTree::observe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&TreeEvent)>;

/// Id-free structural copy of a subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub documentation: Option<String>,
    pub annotation: AnnotationExtras,
    pub children: Vec<NodeSnapshot>,
}

/// One logical schema: the node arena plus the files it was read from
pub struct XsdTree {
    nodes: HashMap<NodeId, XsdNode>,
    root: NodeId,
    files: IndexMap<PathBuf, SchemaFile>,
    revision: u64,
    observers: Vec<(ObserverId, Option<NodeId>, Observer)>,
    next_observer: u64,
}

impl std::fmt::Debug for XsdTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XsdTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .field("revision", &self.revision)
            .finish()
    }
}

impl XsdTree {
    /// Create a tree whose root is an `xs:schema` with the given payload
    pub fn new(schema: SchemaData) -> Self {
        let root = XsdNode::new(NodeKind::Schema(schema), None);
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            nodes,
            root: root_id,
            files: IndexMap::new(),
            revision: 0,
            observers: Vec::new(),
            next_observer: 1,
        }
    }

    /// Root `xs:schema` node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Schema payload of the root
    pub fn schema(&self) -> &SchemaData {
        match self.nodes.get(&self.root).map(|n| &n.kind) {
            Some(NodeKind::Schema(data)) => data,
            _ => unreachable!("tree root is always a schema node"),
        }
    }

    /// Target namespace of the logical schema
    pub fn target_namespace(&self) -> Option<&str> {
        self.schema().target_namespace.as_deref()
    }

    /// Main file of this tree, if it has one
    pub fn main_file(&self) -> Option<&Path> {
        self.schema().main_file.as_deref()
    }

    /// Counter bumped by every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of nodes in the arena, including detached ones
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    // ========== Node access ==========

    /// Look up a node
    pub fn get(&self, id: NodeId) -> Option<&XsdNode> {
        self.nodes.get(&id)
    }

    /// Check if the arena holds this node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|n| &n.kind)
    }

    /// Kind discriminant of a node
    pub fn tag(&self, id: NodeId) -> Option<NodeTag> {
        self.nodes.get(&id).map(|n| n.tag())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Ordered children of a node (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Position of `child` in `parent`'s child list
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Check if `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Check if the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor_or_self(self.root, id)
    }

    /// Pre-order list of `id` and all its descendants
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Depth of a node below the root (root is 0)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// Children of `id` with the given tag
    pub fn children_with_tag(&self, id: NodeId, tag: NodeTag) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.tag(*c) == Some(tag))
            .collect()
    }

    // ========== Structure ==========

    /// Create a detached node
    pub fn create_node(&mut self, kind: NodeKind, name: Option<String>) -> NodeId {
        let node = XsdNode::new(kind, name);
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Append `child` to `parent`, detaching it from any previous parent
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let len = self.children(parent).len();
        let len = match self.parent(child) {
            Some(old) if old == parent => len - 1,
            _ => len,
        };
        self.insert_child(parent, len, child)
    }

    /// Insert `child` into `parent` at `index`, detaching it from any previous parent
    ///
    /// The index refers to `parent`'s child list after the detach. Returns
    /// `false` without changing anything when the index is out of range or the
    /// move would create a cycle.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) || child == self.root {
            return false;
        }
        if self.is_ancestor_or_self(child, parent) {
            return false;
        }
        let same_parent = self.parent(child) == Some(parent);
        let available = self.children(parent).len() - usize::from(same_parent);
        if index > available {
            return false;
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.revision += 1;
        self.notify(TreeEvent::ChildInserted {
            parent,
            child,
            index,
        });
        true
    }

    /// Remove `child` from `parent`, returning the index it occupied
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<usize> {
        let index = self.index_of(parent, child)?;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.remove(index);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        self.revision += 1;
        self.notify(TreeEvent::ChildRemoved {
            parent,
            child,
            index,
        });
        Some(index)
    }

    /// Detach a node from its parent, returning (parent, index)
    pub fn detach(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(child)?;
        let index = self.remove_child(parent, child)?;
        Some((parent, index))
    }

    /// Deep-copy a subtree into new detached nodes, returning the new root
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(&id)?.clone();
        let copy = self.create_node(node.kind.clone(), node.name.clone());
        if let Some(n) = self.nodes.get_mut(&copy) {
            n.documentation = node.documentation.clone();
            n.annotation = node.annotation.clone();
            n.source = node.source.clone();
        }
        for child in node.children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.add_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    /// Drop a detached subtree from the arena
    pub(crate) fn discard(&mut self, id: NodeId) {
        if id == self.root || self.parent(id).is_some() {
            return;
        }
        for node in self.descendants(id) {
            self.nodes.remove(&node);
        }
    }

    // ========== Properties ==========

    /// Read a property of a node
    pub fn property(&self, id: NodeId, prop: NodeProperty) -> Option<String> {
        self.nodes.get(&id).and_then(|n| n.property(prop))
    }

    /// Write a property of a node and notify observers when the value changes
    ///
    /// Returns `false` if the node is unknown, the property does not exist on
    /// its kind, or a `ref` would be set on a node that still has children.
    /// Other values are never rejected.
    pub fn set_property(&mut self, id: NodeId, prop: NodeProperty, value: Option<String>) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let Ok(old) = node.apply_property(prop, value.clone()) else {
            return false;
        };
        let new = node.property(prop);
        if old != new {
            self.revision += 1;
            self.notify(TreeEvent::PropertyChanged {
                node: id,
                property: prop,
                old,
                new,
            });
        }
        true
    }

    /// Set the component name
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) -> bool {
        self.set_property(id, NodeProperty::Name, name)
    }

    /// Set the documentation text
    pub fn set_documentation(&mut self, id: NodeId, text: Option<String>) -> bool {
        self.set_property(id, NodeProperty::Documentation, text)
    }

    /// Replace the appinfo and language kept with a node's annotation
    pub fn set_annotation(&mut self, id: NodeId, annotation: AnnotationExtras) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        if node.annotation != annotation {
            node.annotation = annotation;
            self.revision += 1;
        }
        true
    }

    // ========== Source tracking ==========

    /// Record where a node came from
    pub fn set_source(&mut self, id: NodeId, source: IncludeSourceInfo) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.source = Some(source);
        }
    }

    /// Source info recorded on a node
    pub fn source(&self, id: NodeId) -> Option<&IncludeSourceInfo> {
        self.nodes.get(&id).and_then(|n| n.source.as_ref())
    }

    /// Originating file of a node; nodes without source info belong to the main file
    pub fn origin_file(&self, id: NodeId) -> Option<PathBuf> {
        match self.source(id) {
            Some(source) => Some(source.origin_file.clone()),
            None => self.main_file().map(Path::to_path_buf),
        }
    }

    /// Register a physical file merged into this tree
    pub fn register_file(&mut self, file: SchemaFile) {
        self.files.insert(file.path.clone(), file);
    }

    /// Physical files in discovery order (main file first)
    pub fn files(&self) -> impl Iterator<Item = &SchemaFile> {
        self.files.values()
    }

    /// Record for one physical file
    pub fn file(&self, path: &Path) -> Option<&SchemaFile> {
        self.files.get(path)
    }

    /// Check if a file has been merged into this tree
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    // ========== Observers ==========

    /// Observe changes to one node
    pub fn observe(&mut self, node: NodeId, observer: impl FnMut(&TreeEvent) + 'static) -> ObserverId {
        self.add_observer(Some(node), Box::new(observer))
    }

    /// Observe every change in the tree
    pub fn observe_all(&mut self, observer: impl FnMut(&TreeEvent) + 'static) -> ObserverId {
        self.add_observer(None, Box::new(observer))
    }

    /// Remove an observer
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _, _)| *oid != id);
        self.observers.len() != before
    }

    fn add_observer(&mut self, node: Option<NodeId>, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, node, observer));
        id
    }

    fn notify(&mut self, event: TreeEvent) {
        let subject = event.subject();
        for (_, filter, observer) in self.observers.iter_mut() {
            if filter.map(|n| n == subject).unwrap_or(true) {
                observer(&event);
            }
        }
    }

    // ========== Snapshots ==========

    /// Structural copy of a subtree without identities
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.nodes.get(&id)?;
        Some(NodeSnapshot {
            kind: node.kind.clone(),
            name: node.name.clone(),
            documentation: node.documentation.clone(),
            annotation: node.annotation.clone(),
            children: node
                .children
                .iter()
                .filter_map(|c| self.snapshot(*c))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{ElementData, FacetData, FacetKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tree_with_element() -> (XsdTree, NodeId) {
        let mut tree = XsdTree::new(SchemaData::new_document(None));
        let el = tree.create_node(NodeKind::Element(ElementData::typed("xs:string")), Some("a".into()));
        assert!(tree.add_child(tree.root(), el));
        (tree, el)
    }

    #[test]
    fn test_add_child_sets_parent() {
        let (tree, el) = tree_with_element();
        assert_eq!(tree.parent(el), Some(tree.root()));
        assert_eq!(tree.children(tree.root()), &[el]);
        assert!(tree.is_attached(el));
    }

    #[test]
    fn test_add_child_moves_between_parents() {
        let (mut tree, el) = tree_with_element();
        let ct = tree.create_node(NodeKind::ComplexType(Default::default()), Some("T".into()));
        tree.add_child(tree.root(), ct);

        assert!(tree.add_child(ct, el));
        assert_eq!(tree.parent(el), Some(ct));
        assert_eq!(tree.children(tree.root()), &[ct]);
        assert_eq!(tree.children(ct), &[el]);
    }

    #[test]
    fn test_cycles_rejected() {
        let (mut tree, el) = tree_with_element();
        let ct = tree.create_node(NodeKind::ComplexType(Default::default()), None);
        tree.add_child(el, ct);

        assert!(!tree.add_child(ct, el));
        assert!(!tree.add_child(el, el));
        assert!(!tree.add_child(ct, tree.root()));
        assert_eq!(tree.parent(el), Some(tree.root()));
    }

    #[test]
    fn test_remove_and_reinsert_at_index() {
        let mut tree = XsdTree::new(SchemaData::default());
        let restriction = tree.create_node(NodeKind::Restriction(Default::default()), None);
        tree.add_child(tree.root(), restriction);
        let facets: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|v| {
                let f = tree.create_node(NodeKind::Facet(FacetData::new(FacetKind::Enumeration, *v)), None);
                tree.add_child(restriction, f);
                f
            })
            .collect();

        assert_eq!(tree.remove_child(restriction, facets[1]), Some(1));
        assert_eq!(tree.children(restriction), &[facets[0], facets[2]]);
        assert!(tree.contains(facets[1]));
        assert!(!tree.is_attached(facets[1]));

        assert!(tree.insert_child(restriction, 1, facets[1]));
        assert_eq!(tree.children(restriction), facets.as_slice());
        assert!(!tree.insert_child(restriction, 9, facets[1]));
    }

    #[test]
    fn test_reorder_within_parent() {
        let mut tree = XsdTree::new(SchemaData::default());
        let root = tree.root();
        let a = tree.create_node(NodeKind::SimpleType, Some("a".into()));
        let b = tree.create_node(NodeKind::SimpleType, Some("b".into()));
        tree.add_child(root, a);
        tree.add_child(root, b);

        assert!(tree.insert_child(root, 1, a));
        assert_eq!(tree.children(root), &[b, a]);
        assert!(tree.add_child(root, b));
        assert_eq!(tree.children(root), &[a, b]);
    }

    #[test]
    fn test_property_observers() {
        let (mut tree, el) = tree_with_element();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let handle = tree.observe(el, move |e| sink.borrow_mut().push(e.clone()));

        assert!(tree.set_name(el, Some("b".into())));
        assert!(tree.set_name(el, Some("b".into())));
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(
            events.borrow()[0],
            TreeEvent::PropertyChanged {
                node: el,
                property: NodeProperty::Name,
                old: Some("a".into()),
                new: Some("b".into()),
            }
        );

        assert!(tree.unobserve(handle));
        tree.set_name(el, Some("c".into()));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_set_property_not_applicable() {
        let (mut tree, el) = tree_with_element();
        let revision = tree.revision();
        assert!(!tree.set_property(el, NodeProperty::XPath, Some(".//a".into())));
        assert_eq!(tree.revision(), revision);
    }

    #[test]
    fn test_snapshot_ignores_identity() {
        let (mut tree, el) = tree_with_element();
        let copy = tree.clone_subtree(el).unwrap();
        assert_ne!(copy, el);
        assert_eq!(tree.snapshot(copy), tree.snapshot(el));
        assert!(!tree.is_attached(copy));
    }

    #[test]
    fn test_origin_defaults_to_main_file() {
        let mut data = SchemaData::default();
        data.main_file = Some(PathBuf::from("/s/main.xsd"));
        let mut tree = XsdTree::new(data);
        let el = tree.create_node(NodeKind::Element(ElementData::default()), Some("a".into()));
        assert_eq!(tree.origin_file(el), Some(PathBuf::from("/s/main.xsd")));

        tree.set_source(el, IncludeSourceInfo::main("/s/other.xsd"));
        assert_eq!(tree.origin_file(el), Some(PathBuf::from("/s/other.xsd")));
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, el) = tree_with_element();
        let ct = tree.create_node(NodeKind::ComplexType(Default::default()), None);
        let seq = tree.create_node(NodeKind::Sequence(Default::default()), None);
        tree.add_child(el, ct);
        tree.add_child(ct, seq);
        assert_eq!(tree.descendants(tree.root()), vec![tree.root(), el, ct, seq]);
        assert_eq!(tree.depth(seq), 3);
    }
}
