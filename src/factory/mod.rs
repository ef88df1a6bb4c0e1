//! Node factory and multi-file resolver
//!
//! Turns a main schema file into one logical [`XsdTree`]:
//!
//! - `xs:include` targets are spliced into the same tree, each node tagged
//!   with the file it came from and the directive that pulled it in
//! - `xs:redefine`/`xs:override` keep their redefinitions under the directive
//!   and merge the target file like an include
//! - `xs:import` targets are loaded into separate trees, one per namespace
//!
//! Included files are deduplicated by canonical absolute path. Unreadable
//! targets and include cycles become [`Diagnostic`]s; only the main file is
//! fail-fast.

mod parsing;
mod set;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::documents::{Document, Element};
use crate::error::{Diagnostic, Error, ParseError, Result, Severity};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::{canonical_path, Location};
use crate::model::{IncludeSourceInfo, NodeId, NodeKind, NodeTag, SchemaFile, XsdTree};

pub(crate) use parsing::is_xsd_element;
use parsing::{annotation_extras_of, documentation_of, schema_header, xsd_elements, ComponentBuilder};
pub use set::SchemaSet;

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Resource limits applied to every file
    pub limits: Limits,
    /// Whether `xs:import` targets are loaded
    pub load_imports: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            load_imports: true,
        }
    }
}

impl FactoryOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set whether imports are loaded
    pub fn with_load_imports(mut self, load: bool) -> Self {
        self.load_imports = load;
        self
    }

}

/// Builds schema sets from files or strings
#[derive(Debug, Clone)]
pub struct NodeFactory {
    options: FactoryOptions,
    loader: Loader,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::with_options(FactoryOptions::default())
    }
}

impl NodeFactory {
    /// Create a factory with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with the given options
    pub fn with_options(options: FactoryOptions) -> Self {
        let loader = Loader::new().with_limits(options.limits.clone());
        Self { options, loader }
    }

    /// Options in effect
    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// Load a main schema file and everything it includes and imports
    ///
    /// Fails only when the main file itself cannot be read or parsed.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SchemaSet> {
        let path = canonical_path(path.as_ref());
        let mut session = Session::new(self);
        let text = self.loader.load(&Location::Path(path.clone()))?;
        let tree = session.build_tree(&text, Some(path), true)?;
        Ok(session.finish(tree))
    }

    /// Load a schema from a string
    ///
    /// Relative `schemaLocation`s are resolved against `base_dir`, or the
    /// current directory when it is absent. The resulting tree has no main
    /// file until it is saved.
    pub fn load_str(&self, xml: &str, base_dir: Option<&Path>) -> Result<SchemaSet> {
        let mut session = Session::new(self);
        session.base_override = base_dir.map(Path::to_path_buf);
        let tree = session.build_tree(xml, None, true)?;
        Ok(session.finish(tree))
    }
}

/// File being merged, as seen by its directives
struct FileContext {
    path: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    source: Option<IncludeSourceInfo>,
}

/// State shared by every tree built during one load
struct Session<'f> {
    factory: &'f NodeFactory,
    imports: IndexMap<String, XsdTree>,
    pending_imports: HashSet<String>,
    main_namespace: Option<Option<String>>,
    diagnostics: Vec<Diagnostic>,
    base_override: Option<PathBuf>,
}

impl<'f> Session<'f> {
    fn new(factory: &'f NodeFactory) -> Self {
        Self {
            factory,
            imports: IndexMap::new(),
            pending_imports: HashSet::new(),
            main_namespace: None,
            diagnostics: Vec::new(),
            base_override: None,
        }
    }

    fn finish(self, tree: XsdTree) -> SchemaSet {
        info!(
            "loaded schema with {} file(s), {} import(s), {} diagnostic(s)",
            tree.files().count().max(1),
            self.imports.len(),
            self.diagnostics.len()
        );
        SchemaSet::new(tree, self.imports, self.diagnostics)
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Info => debug!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    fn limits(&self) -> &Limits {
        &self.factory.options.limits
    }

    /// Build one logical tree from the text of its main file
    fn build_tree(&mut self, text: &str, path: Option<PathBuf>, is_main: bool) -> Result<XsdTree> {
        let label = file_label(path.as_deref());
        let doc = parse_document(text, &label)?;
        let root = schema_root(&doc, &label)?;

        let mut header = schema_header(root);
        header.main_file = path.clone();
        if is_main {
            self.main_namespace = Some(header.target_namespace.clone());
        }

        let mut tree = XsdTree::new(header.clone());
        let components = self.build_components(&mut tree, root, &label)?;
        let root_id = tree.root();
        if let Some(doc) = documentation_of(root) {
            tree.set_documentation(root_id, Some(doc));
        }
        tree.set_annotation(root_id, annotation_extras_of(root));
        if let Some(ref p) = path {
            tree.register_file(SchemaFile::main(p.clone(), header));
        }
        debug!("parsed {} ({} top-level components)", label, components.len());

        let base_dir = match path {
            Some(ref p) => p.parent().map(Path::to_path_buf),
            None => self.base_override.clone(),
        };
        let context = FileContext {
            source: path.as_ref().map(|p| IncludeSourceInfo::main(p.clone())),
            path: path.clone(),
            base_dir,
        };
        let mut active: Vec<PathBuf> = path.into_iter().collect();
        self.attach(&mut tree, components, &context, &mut active);
        Ok(tree)
    }

    /// Convert the children of a schema root into detached nodes
    ///
    /// Either every component of the file is built or none is.
    fn build_components(&mut self, tree: &mut XsdTree, root: &Element, label: &str) -> Result<Vec<NodeId>> {
        let factory = self.factory;
        let mut builder = ComponentBuilder::new(tree, &factory.options.limits, label);
        let mut components = Vec::new();
        for child in &root.children {
            match builder.build(child, 1) {
                Ok(Some(id)) => components.push(id),
                Ok(None) => {}
                Err(e) => {
                    builder.abort();
                    return Err(e);
                }
            }
        }
        let skipped = std::mem::take(&mut builder.skipped);
        for diagnostic in skipped {
            self.diagnose(diagnostic);
        }
        Ok(components)
    }

    /// Attach a file's components to the root, following its directives
    fn attach(&mut self, tree: &mut XsdTree, components: Vec<NodeId>, context: &FileContext, active: &mut Vec<PathBuf>) {
        let root = tree.root();
        let mut targets_in_file: HashSet<PathBuf> = HashSet::new();

        for id in components {
            let tag = match tree.tag(id) {
                Some(tag) => tag,
                None => continue,
            };

            if tag.is_directive() && tag != NodeTag::Import {
                let location = tree
                    .kind(id)
                    .and_then(NodeKind::schema_location)
                    .unwrap_or_default()
                    .to_string();
                let target = self.locate(&location, context);

                if let Some(ref target) = target {
                    if tag == NodeTag::Include && !targets_in_file.insert(target.clone()) {
                        self.diagnose(
                            Diagnostic::info(format!("duplicate xs:include of '{}' dropped", location))
                                .in_file(file_label(context.path.as_deref())),
                        );
                        tree.discard(id);
                        continue;
                    }
                }

                self.attach_node(tree, root, id, context);
                if let Some(target) = target {
                    self.merge_include(tree, id, &location, target, context, active);
                }
                continue;
            }

            self.attach_node(tree, root, id, context);
            if tag == NodeTag::Import {
                self.resolve_import(tree, id, context);
            }
        }
    }

    fn attach_node(&mut self, tree: &mut XsdTree, root: NodeId, id: NodeId, context: &FileContext) {
        tree.add_child(root, id);
        if let Some(ref source) = context.source {
            for node in tree.descendants(id) {
                tree.set_source(node, source.clone());
            }
        }
    }

    /// Canonical path of a directive target, or a diagnostic
    fn locate(&mut self, location: &str, context: &FileContext) -> Option<PathBuf> {
        let file = file_label(context.path.as_deref());
        match Location::resolve(location, context.base_dir.as_deref()) {
            Ok(Location::Path(path)) => Some(canonical_path(&path)),
            Ok(other) => {
                self.diagnose(
                    Diagnostic::warning(format!("remote location '{}' was not loaded", other.as_str()))
                        .in_file(file),
                );
                None
            }
            Err(e) => {
                self.diagnose(
                    Diagnostic::warning(format!("invalid schemaLocation '{}': {}", location, e)).in_file(file),
                );
                None
            }
        }
    }

    /// Merge an included, redefined or overridden file into `tree`
    fn merge_include(
        &mut self,
        tree: &mut XsdTree,
        directive: NodeId,
        location: &str,
        target: PathBuf,
        context: &FileContext,
        active: &mut Vec<PathBuf>,
    ) {
        let including = file_label(context.path.as_deref());

        if active.contains(&target) {
            let chain: Vec<String> = active
                .iter()
                .chain(std::iter::once(&target))
                .map(|p| p.display().to_string())
                .collect();
            self.diagnose(
                Diagnostic::warning(format!("include cycle: {}", chain.join(" -> "))).in_file(&including),
            );
            return;
        }
        if tree.has_file(&target) {
            debug!("{} already merged, not merging again", target.display());
            return;
        }
        if let Err(e) = self.limits().check_include_depth(active.len()) {
            self.diagnose(Diagnostic::warning(e.to_string()).in_file(&including));
            return;
        }

        let label = target.display().to_string();
        let text = match self.factory.loader.load(&Location::Path(target.clone())) {
            Ok(text) => text,
            Err(e) => {
                self.diagnose(
                    Diagnostic::warning(format!("could not load '{}': {}", location, e)).in_file(&including),
                );
                return;
            }
        };
        let doc = match parse_document(&text, &label) {
            Ok(doc) => doc,
            Err(e) => {
                self.diagnose(Diagnostic::warning(e.to_string()).in_file(&target));
                return;
            }
        };
        let root = match schema_root(&doc, &label) {
            Ok(root) => root,
            Err(e) => {
                self.diagnose(Diagnostic::warning(e.to_string()).in_file(&target));
                return;
            }
        };

        let header = schema_header(root);
        if let Some(ref ns) = header.target_namespace {
            if Some(ns.as_str()) != tree.target_namespace() {
                self.diagnose(
                    Diagnostic::warning(format!(
                        "'{}' has targetNamespace '{}' but is included into '{}'",
                        location,
                        ns,
                        tree.target_namespace().unwrap_or("(none)")
                    ))
                    .in_file(&including),
                );
                return;
            }
        }

        let components = match self.build_components(tree, root, &label) {
            Ok(components) => components,
            Err(e) => {
                self.diagnose(Diagnostic::warning(e.to_string()).in_file(&target));
                return;
            }
        };

        tree.register_file(SchemaFile {
            path: target.clone(),
            header,
            included_from: context.path.clone(),
            declared_location: Some(location.to_string()),
            directive: Some(directive),
            documentation: documentation_of(root),
            annotation: annotation_extras_of(root),
        });
        debug!(
            "merged {} ({} top-level components) via {}",
            label,
            components.len(),
            location
        );

        let child_context = FileContext {
            base_dir: target.parent().map(Path::to_path_buf),
            source: Some(IncludeSourceInfo::included(target.clone(), location, directive)),
            path: Some(target.clone()),
        };
        active.push(target);
        self.attach(tree, components, &child_context, active);
        active.pop();
    }

    /// Load an imported namespace into its own tree
    fn resolve_import(&mut self, tree: &XsdTree, directive: NodeId, context: &FileContext) {
        if !self.factory.options.load_imports {
            return;
        }
        let (namespace, location) = match tree.kind(directive) {
            Some(NodeKind::Import(data)) => (data.namespace.clone(), data.schema_location.clone()),
            _ => return,
        };
        let file = file_label(context.path.as_deref());
        let key = namespace.clone().unwrap_or_default();

        if namespace.as_deref() == tree.target_namespace() {
            self.diagnose(
                Diagnostic::warning(format!(
                    "xs:import of the schema's own namespace '{}' ignored",
                    namespace.as_deref().unwrap_or("(none)")
                ))
                .in_file(file),
            );
            return;
        }
        if self.main_namespace.as_ref() == Some(&namespace) {
            debug!("import of the main namespace from {} resolves to the main tree", file);
            return;
        }
        if self.imports.contains_key(&key) || self.pending_imports.contains(&key) {
            debug!("namespace '{}' already imported", key);
            return;
        }
        let location = match location {
            Some(location) => location,
            None => {
                self.diagnose(
                    Diagnostic::info(format!("xs:import of '{}' has no schemaLocation; not loaded", key)).in_file(file),
                );
                return;
            }
        };
        let path = match self.locate(&location, context) {
            Some(path) => path,
            None => return,
        };

        let text = match self.factory.loader.load(&Location::Path(path.clone())) {
            Ok(text) => text,
            Err(e) => {
                self.diagnose(
                    Diagnostic::warning(format!("could not load import '{}': {}", location, e)).in_file(file),
                );
                return;
            }
        };

        self.pending_imports.insert(key.clone());
        let result = self.build_tree(&text, Some(path.clone()), false);
        self.pending_imports.remove(&key);

        match result {
            Ok(imported) => {
                if imported.target_namespace() != namespace.as_deref() {
                    self.diagnose(
                        Diagnostic::warning(format!(
                            "imported schema '{}' has targetNamespace '{}', expected '{}'",
                            location,
                            imported.target_namespace().unwrap_or("(none)"),
                            key
                        ))
                        .in_file(&path),
                    );
                }
                debug!("registered import of '{}' from {}", key, path.display());
                self.imports.insert(key, imported);
            }
            Err(e) => {
                self.diagnose(Diagnostic::warning(e.to_string()).in_file(&path));
            }
        }
    }
}

fn file_label(path: Option<&Path>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<memory>".to_string(),
    }
}

fn parse_document(text: &str, label: &str) -> Result<Document> {
    Document::from_string(text).map_err(|e| match e {
        Error::Parse(p) if p.location.is_none() => Error::Parse(p.with_location(label.to_string())),
        Error::Xml(message) => Error::Parse(ParseError::new(message).with_location(label.to_string())),
        other => other,
    })
}

fn schema_root<'d>(doc: &'d Document, label: &str) -> Result<&'d Element> {
    let root = doc
        .root()
        .ok_or_else(|| Error::Parse(ParseError::new("Empty document").with_location(label.to_string())))?;
    if !is_xsd_element(root) || root.local_name() != xsd_elements::SCHEMA {
        return Err(Error::Parse(
            ParseError::new(format!("Expected xs:schema root element, got {}", root.local_name()))
                .with_location(label.to_string()),
        ));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEAD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" targetNamespace="urn:t" elementFormDefault="qualified">"#;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("{}{}</xs:schema>", HEAD, body)).unwrap();
        path
    }

    fn top_level_names(tree: &XsdTree) -> Vec<String> {
        tree.children(tree.root())
            .iter()
            .filter_map(|c| tree.get(*c).and_then(|n| n.name()).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.xsd", r#"<xs:element name="a" type="xs:string"/>"#);

        let set = NodeFactory::new().load(&main).unwrap();
        let tree = set.tree();
        assert_eq!(tree.target_namespace(), Some("urn:t"));
        assert_eq!(top_level_names(tree), vec!["a"]);
        assert!(set.diagnostics().is_empty());
        assert_eq!(tree.files().count(), 1);
    }

    #[test]
    fn test_include_is_merged_with_source_info() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "base.xsd", r#"<xs:simpleType name="Code"><xs:restriction base="xs:string"/></xs:simpleType>"#);
        let main = write(
            dir.path(),
            "main.xsd",
            r#"<xs:include schemaLocation="base.xsd"/><xs:element name="a" type="t:Code"/>"#,
        );

        let set = NodeFactory::new().load(&main).unwrap();
        let tree = set.tree();
        let children = tree.children(tree.root());
        assert_eq!(children.len(), 3);
        assert_eq!(tree.tag(children[0]), Some(NodeTag::Include));

        let code = children
            .iter()
            .copied()
            .find(|c| tree.get(*c).and_then(|n| n.name()) == Some("Code"))
            .unwrap();
        let source = tree.source(code).unwrap();
        assert!(source.origin_file.ends_with("base.xsd"));
        assert_eq!(source.schema_location.as_deref(), Some("base.xsd"));
        assert_eq!(source.directive, Some(children[0]));
    }

    #[test]
    fn test_missing_include_keeps_directive() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.xsd",
            r#"<xs:include schemaLocation="missing.xsd"/><xs:element name="a" type="xs:string"/>"#,
        );

        let set = NodeFactory::new().load(&main).unwrap();
        let tree = set.tree();
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert_eq!(set.diagnostics().len(), 1);
        assert_eq!(set.diagnostics()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_include_cycle_is_broken() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.xsd", r#"<xs:include schemaLocation="b.xsd"/><xs:element name="a" type="xs:string"/>"#);
        write(dir.path(), "b.xsd", r#"<xs:include schemaLocation="a.xsd"/><xs:element name="b" type="xs:string"/>"#);

        let set = NodeFactory::new().load(dir.path().join("a.xsd")).unwrap();
        let tree = set.tree();
        let mut names = top_level_names(tree);
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert!(set.diagnostics().iter().any(|d| d.message.contains("include cycle")));
    }

    #[test]
    fn test_remote_include_keeps_directive() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.xsd",
            r#"<xs:include schemaLocation="http://example.com/common.xsd"/><xs:element name="a" type="xs:string"/>"#,
        );

        let set = NodeFactory::new().load(&main).unwrap();
        let tree = set.tree();
        assert_eq!(tree.tag(tree.children(tree.root())[0]), Some(NodeTag::Include));
        assert_eq!(set.diagnostics().len(), 1);
        assert!(set.diagnostics()[0].message.contains("http://example.com/common.xsd"));
    }

    #[test]
    fn test_malformed_main_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.xsd");
        fs::write(&path, "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"><xs:element").unwrap();
        assert!(NodeFactory::new().load(&path).is_err());
    }

    #[test]
    fn test_malformed_include_adds_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("bad.xsd"),
            format!("{}<xs:element name=\"ok\" type=\"xs:int\"/><xs:element type=\"xs:int\"/></xs:schema>", HEAD),
        )
        .unwrap();
        let main = write(dir.path(), "main.xsd", r#"<xs:include schemaLocation="bad.xsd"/>"#);

        let set = NodeFactory::new().load(&main).unwrap();
        let tree = set.tree();
        assert_eq!(tree.children(tree.root()).len(), 1);
        assert_eq!(tree.arena_len(), 2);
        assert_eq!(set.diagnostics().len(), 1);
    }

    #[test]
    fn test_import_loads_separate_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("other.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:o"><xs:complexType name="O"/></xs:schema>"#,
        )
        .unwrap();
        let main = write(
            dir.path(),
            "main.xsd",
            r#"<xs:import namespace="urn:o" schemaLocation="other.xsd"/><xs:import namespace="urn:o" schemaLocation="other.xsd"/>"#,
        );

        let set = NodeFactory::new().load(&main).unwrap();
        assert_eq!(set.imports().len(), 1);
        let imported = set.imported("urn:o").unwrap();
        assert_eq!(top_level_names(imported), vec!["O"]);
        assert_eq!(set.tree().children(set.tree().root()).len(), 2);
    }

    #[test]
    fn test_imports_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.xsd", r#"<xs:import namespace="urn:o" schemaLocation="other.xsd"/>"#);
        let factory = NodeFactory::with_options(FactoryOptions::new().with_load_imports(false));
        let set = factory.load(&main).unwrap();
        assert!(set.imports().is_empty());
        assert!(set.diagnostics().is_empty());
    }

    #[test]
    fn test_load_str_without_file() {
        let xml = format!("{}<xs:element name=\"a\" type=\"xs:string\"/></xs:schema>", HEAD);
        let set = NodeFactory::new().load_str(&xml, None).unwrap();
        assert!(set.tree().main_file().is_none());
        assert_eq!(top_level_names(set.tree()), vec!["a"]);
    }
}
