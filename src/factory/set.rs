//! Result of a load: the logical main tree plus imported namespaces

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::Diagnostic;
use crate::index::NameIndex;
use crate::model::{SchemaData, SchemaFile, XsdTree};

/// A logical schema and the foreign-namespace schemas it imports
pub struct SchemaSet {
    tree: XsdTree,
    imports: IndexMap<String, XsdTree>,
    diagnostics: Vec<Diagnostic>,
    /// Name indexes keyed by namespace ("" for none), rebuilt when a tree's revision moves
    indexes: RefCell<HashMap<Option<String>, Rc<NameIndex>>>,
}

impl std::fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSet")
            .field("tree", &self.tree)
            .field("imports", &self.imports.keys().collect::<Vec<_>>())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

impl SchemaSet {
    pub(crate) fn new(tree: XsdTree, imports: IndexMap<String, XsdTree>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            tree,
            imports,
            diagnostics,
            indexes: RefCell::new(HashMap::new()),
        }
    }

    /// An empty, unsaved schema with the given target namespace
    pub fn new_document(target_namespace: Option<String>) -> Self {
        Self::from_tree(XsdTree::new(SchemaData::new_document(target_namespace)))
    }

    /// Wrap a tree built elsewhere
    pub fn from_tree(tree: XsdTree) -> Self {
        Self::new(tree, IndexMap::new(), Vec::new())
    }

    /// The main logical tree
    pub fn tree(&self) -> &XsdTree {
        &self.tree
    }

    /// Mutable access to the main logical tree
    pub fn tree_mut(&mut self) -> &mut XsdTree {
        &mut self.tree
    }

    /// Imported schemas keyed by namespace URI ("" for no namespace)
    pub fn imports(&self) -> &IndexMap<String, XsdTree> {
        &self.imports
    }

    /// Imported schema for one namespace
    pub fn imported(&self, namespace: &str) -> Option<&XsdTree> {
        self.imports.get(namespace)
    }

    /// Tree holding the components of a namespace, main tree first
    pub fn tree_for_namespace(&self, namespace: Option<&str>) -> Option<&XsdTree> {
        if namespace == self.tree.target_namespace() {
            return Some(&self.tree);
        }
        self.imports.get(namespace.unwrap_or_default())
    }

    /// Recoverable problems recorded while loading
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Files merged into the main tree other than the main file, in discovery order
    pub fn included_files(&self) -> impl Iterator<Item = &SchemaFile> {
        self.tree.files().filter(|f| !f.is_main())
    }

    /// Check if a file was merged into the main tree
    pub fn contains_file(&self, path: &Path) -> bool {
        self.tree.has_file(path)
    }

    /// Name index of the tree for `namespace`, rebuilt if the tree changed
    pub fn index_for(&self, namespace: Option<&str>) -> Option<Rc<NameIndex>> {
        let tree = self.tree_for_namespace(namespace)?;
        let key = namespace.map(str::to_string);
        let mut cache = self.indexes.borrow_mut();
        if let Some(index) = cache.get(&key) {
            if index.is_current(tree) {
                return Some(Rc::clone(index));
            }
        }
        let index = Rc::new(NameIndex::build(tree));
        cache.insert(key, Rc::clone(&index));
        Some(index)
    }

    /// Name index of the main tree
    pub fn index(&self) -> Rc<NameIndex> {
        match self.index_for(self.tree.target_namespace()) {
            Some(index) => index,
            None => Rc::new(NameIndex::build(&self.tree)),
        }
    }
}
