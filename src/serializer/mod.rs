//! XSD text output
//!
//! - [`XsdSerializer`] renders a tree (or the part of it that came from one
//!   file) as one XSD document
//! - [`MultiFileSerializer`] writes every physical file of a tree back to
//!   disk, preserving the include topology
//!
//! Definitions render as open/close tags with nested children, references as
//! self-closing tags carrying `ref`. Every attribute value and text node is
//! escaped.

mod markup;
mod multi;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::index::ComponentCategory;
use crate::model::{AnnotationExtras, Declaration, NodeId, NodeKind, NodeTag, SchemaData, XsdTree};
use crate::namespaces::{is_xsd_namespace, NamespaceContext, XSD_NAMESPACE, XSD_PREFIX};

use markup::Markup;
pub use multi::{BackupPolicy, MultiFileSerializer, SaveOptions, SaveReport};

/// Output formatting options
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Indentation unit
    pub indent: String,
    /// Whether to start with `<?xml ...?>`
    pub xml_declaration: bool,
    /// Write an anonymous `simpleType`/`restriction` without facets as a plain `type`
    pub collapse_unconstrained: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            xml_declaration: true,
            collapse_unconstrained: true,
        }
    }
}

impl SerializerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    pub fn with_collapse_unconstrained(mut self, enabled: bool) -> Self {
        self.collapse_unconstrained = enabled;
        self
    }
}

/// Single-document serializer
#[derive(Debug, Clone, Default)]
pub struct XsdSerializer {
    config: SerializerConfig,
}

impl XsdSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Render every top-level node of the tree, directives included
    pub fn serialize(&self, tree: &XsdTree) -> String {
        let root = tree.root();
        let nodes = tree.children(root).to_vec();
        self.render_document(tree, tree.schema(), root_annotation(tree), &nodes, &PrefixRemap::default())
    }

    /// Render the whole logical tree as one self-contained document
    ///
    /// `xs:include` directives are dropped since their content is written
    /// inline. Redefinitions replace the components they redefine and their
    /// directive is dropped as well. Prefixes declared only by included files
    /// are declared on the root; a prefix that an included file binds to a
    /// different namespace is renamed in that file's references.
    pub fn serialize_flattened(&self, tree: &XsdTree) -> String {
        let root = tree.root();
        let mut redefined: HashSet<(ComponentCategory, String)> = HashSet::new();
        for &child in tree.children(root) {
            if matches!(tree.tag(child), Some(NodeTag::Redefine) | Some(NodeTag::Override)) {
                redefined.extend(tree.children(child).iter().filter_map(|r| component_key(tree, *r)));
            }
        }

        let mut nodes = Vec::new();
        for &child in tree.children(root) {
            match tree.tag(child) {
                Some(NodeTag::Include) => {}
                Some(NodeTag::Redefine) | Some(NodeTag::Override) => {
                    nodes.extend(tree.children(child).iter().copied());
                }
                _ => {
                    let replaced = component_key(tree, child)
                        .map(|key| redefined.contains(&key))
                        .unwrap_or(false);
                    if !replaced {
                        nodes.push(child);
                    }
                }
            }
        }
        let mut header = tree.schema().clone();
        let remap = PrefixRemap::merge_into(tree, &mut header);
        self.render_document(tree, &header, root_annotation(tree), &nodes, &remap)
    }

    /// Render the nodes that originate from one physical file
    ///
    /// Nodes without source info belong to the main file. The document uses
    /// that file's own root attributes.
    pub fn serialize_file(&self, tree: &XsdTree, file: &Path) -> String {
        let is_main = tree.main_file() == Some(file) || tree.file(file).map(|f| f.is_main()).unwrap_or(false);
        if is_main {
            self.serialize_main_file(tree)
        } else {
            self.serialize_part(tree, file)
        }
    }

    /// Render the nodes of the main file, including those of an unsaved tree
    pub(crate) fn serialize_main_file(&self, tree: &XsdTree) -> String {
        let root = tree.root();
        let main = tree.main_file();
        let nodes: Vec<NodeId> = tree
            .children(root)
            .iter()
            .copied()
            .filter(|c| match tree.source(*c) {
                Some(source) => Some(source.origin_file.as_path()) == main,
                None => true,
            })
            .collect();
        self.render_document(tree, tree.schema(), root_annotation(tree), &nodes, &PrefixRemap::default())
    }

    fn serialize_part(&self, tree: &XsdTree, file: &Path) -> String {
        let root = tree.root();
        let record = tree.file(file);
        let header = record.map(|f| &f.header).unwrap_or_else(|| tree.schema());
        let annotation = record.map(|f| (f.documentation.as_deref(), &f.annotation));
        let nodes: Vec<NodeId> = tree
            .children(root)
            .iter()
            .copied()
            .filter(|c| tree.source(*c).map(|s| s.is_from(file)).unwrap_or(false))
            .collect();
        self.render_document(tree, header, annotation, &nodes, &PrefixRemap::default())
    }

    /// Render one node and its subtree as a fragment using the tree's XSD prefix
    pub fn serialize_node(&self, tree: &XsdTree, id: NodeId) -> String {
        let (prefix, _) = xsd_prefix(tree.schema());
        let mut markup = Markup::new(&self.config.indent, &prefix);
        self.render_node(tree, id, 0, &mut markup, &PrefixRemap::default());
        markup.finish()
    }

    fn render_document(
        &self,
        tree: &XsdTree,
        header: &SchemaData,
        annotation: Option<(Option<&str>, &AnnotationExtras)>,
        nodes: &[NodeId],
        remap: &PrefixRemap,
    ) -> String {
        let (prefix, declare_xs) = xsd_prefix(header);
        let mut markup = Markup::new(&self.config.indent, &prefix);
        if self.config.xml_declaration {
            markup.declaration();
        }

        let mut attributes: Vec<(String, String)> = Vec::new();
        if declare_xs {
            attributes.push((format!("xmlns:{}", XSD_PREFIX), XSD_NAMESPACE.to_string()));
        }
        if let Some(default_ns) = header.namespaces.get_default_namespace() {
            attributes.push(("xmlns".to_string(), default_ns.to_string()));
        }
        for (p, uri) in header.namespaces.iter() {
            attributes.push((format!("xmlns:{}", p), uri.to_string()));
        }
        push(&mut attributes, "targetNamespace", header.target_namespace.as_deref());
        push(&mut attributes, "elementFormDefault", header.element_form_default.as_deref());
        push(&mut attributes, "attributeFormDefault", header.attribute_form_default.as_deref());
        for (key, value) in &header.extra_attributes {
            attributes.push((key.clone(), value.clone()));
        }

        let annotation = annotation.filter(|(doc, extras)| doc.is_some() || !extras.is_empty());
        if nodes.is_empty() && annotation.is_none() {
            markup.empty(0, "schema", &attributes);
            return markup.finish();
        }

        markup.open(0, "schema", &attributes);
        if let Some((doc, extras)) = annotation {
            write_annotation(&mut markup, 1, doc, extras);
        }
        let mut directives: HashSet<(NodeTag, String)> = HashSet::new();
        for &node in nodes {
            if let Some(key) = directive_key(tree, node) {
                if !directives.insert(key) {
                    continue;
                }
            }
            self.render_node(tree, node, 1, &mut markup, remap);
        }
        markup.close(0, "schema");
        markup.finish()
    }

    fn render_node(&self, tree: &XsdTree, id: NodeId, depth: usize, markup: &mut Markup, remap: &PrefixRemap) {
        let Some(node) = tree.get(id) else {
            return;
        };
        let local = element_name(tree, id);
        let mut attributes = attributes_of(node.name(), node.kind());
        let doc = node.documentation();
        let extras = node.annotation();
        let annotated = doc.is_some() || !extras.is_empty();
        let mut children: &[NodeId] = node.children();

        if node.is_reference() {
            children = &[];
        } else if self.config.collapse_unconstrained {
            if let Some(base) = collapsible_base(tree, id) {
                let at = attributes
                    .iter()
                    .position(|(k, _)| k == "name" || k == "ref")
                    .map(|i| i + 1)
                    .unwrap_or(0);
                attributes.insert(at, ("type".to_string(), base));
                children = &[];
            }
        }

        remap.apply(tree, id, &mut attributes);

        if children.is_empty() && !annotated {
            markup.empty(depth, local, &attributes);
            return;
        }
        markup.open(depth, local, &attributes);
        if annotated {
            write_annotation(markup, depth + 1, doc, extras);
        }
        for &child in children {
            self.render_node(tree, child, depth + 1, markup, remap);
        }
        markup.close(depth, local);
    }
}

fn root_annotation(tree: &XsdTree) -> Option<(Option<&str>, &AnnotationExtras)> {
    tree.get(tree.root()).map(|n| (n.documentation(), n.annotation()))
}

fn write_annotation(markup: &mut Markup, depth: usize, doc: Option<&str>, extras: &AnnotationExtras) {
    markup.open(depth, "annotation", &[]);
    if let Some(text) = doc {
        let mut attributes = Vec::new();
        push(&mut attributes, "xml:lang", extras.lang.as_deref());
        markup.text(depth + 1, "documentation", &attributes, text);
    }
    for appinfo in &extras.appinfo {
        markup.raw(depth + 1, appinfo);
    }
    markup.close(depth, "annotation");
}

/// Attributes whose values are qualified names
const QNAME_ATTRIBUTES: [&str; 7] = ["ref", "type", "base", "itemType", "memberTypes", "substitutionGroup", "refer"];

/// Prefix renames for a document that merges several files
#[derive(Debug, Default)]
struct PrefixRemap {
    /// Per origin file: prefix as written to prefix declared on the merged root
    by_file: HashMap<PathBuf, HashMap<String, String>>,
}

impl PrefixRemap {
    /// Declare every included file's prefixes on `header`
    fn merge_into(tree: &XsdTree, header: &mut SchemaData) -> Self {
        let mut remap = Self::default();
        for file in tree.files().filter(|f| !f.is_main()) {
            let mut renames = HashMap::new();
            for (prefix, uri) in file.header.namespaces.iter() {
                match header.namespaces.get_namespace(prefix) {
                    Some(bound) if bound == uri => {}
                    None => header.namespaces.add_prefix(prefix, uri),
                    Some(_) => {
                        let target = match header.namespaces.prefix_for(uri) {
                            Some(existing) => existing.to_string(),
                            None => {
                                let fresh = fresh_prefix(&header.namespaces, prefix);
                                header.namespaces.add_prefix(fresh.as_str(), uri);
                                fresh
                            }
                        };
                        renames.insert(prefix.to_string(), target);
                    }
                }
            }
            if !renames.is_empty() {
                remap.by_file.insert(file.path.clone(), renames);
            }
        }
        remap
    }

    fn apply(&self, tree: &XsdTree, id: NodeId, attributes: &mut [(String, String)]) {
        if self.by_file.is_empty() {
            return;
        }
        let Some(renames) = tree.origin_file(id).and_then(|f| self.by_file.get(&f)) else {
            return;
        };
        for (key, value) in attributes.iter_mut() {
            if QNAME_ATTRIBUTES.contains(&key.as_str()) {
                *value = value
                    .split_whitespace()
                    .map(|name| match name.split_once(':') {
                        Some((prefix, local)) => match renames.get(prefix) {
                            Some(renamed) => format!("{}:{}", renamed, local),
                            None => name.to_string(),
                        },
                        None => name.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }
    }
}

/// First of `base1`, `base2`, ... not bound in `context`
fn fresh_prefix(context: &NamespaceContext, base: &str) -> String {
    (1..)
        .map(|i| format!("{}{}", base, i))
        .find(|p| context.get_namespace(p).is_none())
        .unwrap_or_else(|| format!("{}_", base))
}

/// XSD prefix to write with, and whether `xmlns:xs` must be added
fn xsd_prefix(header: &SchemaData) -> (String, bool) {
    if let Some(prefix) = header.namespaces.xsd_prefix() {
        return (prefix.to_string(), false);
    }
    if header.namespaces.get_default_namespace().map(is_xsd_namespace).unwrap_or(false) {
        return (String::new(), false);
    }
    (XSD_PREFIX.to_string(), true)
}

fn component_key(tree: &XsdTree, id: NodeId) -> Option<(ComponentCategory, String)> {
    let node = tree.get(id)?;
    if node.is_reference() {
        return None;
    }
    Some((ComponentCategory::of(node.tag())?, node.name()?.to_string()))
}

fn directive_key(tree: &XsdTree, id: NodeId) -> Option<(NodeTag, String)> {
    match tree.kind(id)? {
        NodeKind::Import(data) => Some((
            NodeTag::Import,
            format!(
                "{} {}",
                data.namespace.as_deref().unwrap_or_default(),
                data.schema_location.as_deref().unwrap_or_default()
            ),
        )),
        kind if kind.tag().is_directive() => Some((kind.tag(), kind.schema_location()?.to_string())),
        _ => None,
    }
}

/// Element name for a node; `assert` inside a restriction is `assertion`
fn element_name(tree: &XsdTree, id: NodeId) -> &'static str {
    match tree.tag(id) {
        Some(NodeTag::Assert) => match tree.parent(id).and_then(|p| tree.tag(p)) {
            Some(NodeTag::Restriction) => "assertion",
            _ => "assert",
        },
        Some(_) => tree.kind(id).map(NodeKind::local_name).unwrap_or("annotation"),
        None => "annotation",
    }
}

/// Base type of an element/attribute whose only content is a facet-less inline restriction
fn collapsible_base(tree: &XsdTree, id: NodeId) -> Option<String> {
    let node = tree.get(id)?;
    let type_name = match node.kind() {
        NodeKind::Element(e) => &e.type_name,
        NodeKind::Attribute(a) => &a.type_name,
        _ => return None,
    };
    if type_name.is_some() {
        return None;
    }
    let [simple_type] = node.children() else {
        return None;
    };
    let st = tree.get(*simple_type)?;
    if st.tag() != NodeTag::SimpleType || st.name().is_some() || st.documentation().is_some() || !st.annotation().is_empty() {
        return None;
    }
    let [restriction] = st.children() else {
        return None;
    };
    let r = tree.get(*restriction)?;
    match r.kind() {
        NodeKind::Restriction(d) if r.children().is_empty() && r.documentation().is_none() && r.annotation().is_empty() => {
            d.base.clone()
        }
        _ => None,
    }
}

fn push(attributes: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        attributes.push((key.to_string(), v.to_string()));
    }
}

/// Like `push`, but skips occurrence bounds equal to the default of 1
fn push_occurs(attributes: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    match value {
        Some(v) if v.trim() != "1" => push(attributes, key, Some(v)),
        _ => {}
    }
}

fn push_ref(attributes: &mut Vec<(String, String)>, decl: &Declaration) {
    push(attributes, "ref", decl.ref_name());
}

/// Attributes of a node in conventional hand-written order
fn attributes_of(name: Option<&str>, kind: &NodeKind) -> Vec<(String, String)> {
    let mut a = Vec::new();
    let is_reference = kind.is_reference();
    if !is_reference {
        push(&mut a, "name", name);
    }

    match kind {
        NodeKind::Schema(_) => {}
        NodeKind::Element(e) => {
            push_ref(&mut a, &e.decl);
            if !is_reference {
                push(&mut a, "type", e.type_name.as_deref());
                push(&mut a, "substitutionGroup", e.substitution_group.as_deref());
            }
            push_occurs(&mut a, "minOccurs", e.min_occurs.as_deref());
            push_occurs(&mut a, "maxOccurs", e.max_occurs.as_deref());
            if !is_reference {
                push(&mut a, "default", e.default.as_deref());
                push(&mut a, "fixed", e.fixed.as_deref());
                push(&mut a, "nillable", e.nillable.as_deref());
                push(&mut a, "abstract", e.is_abstract.as_deref());
                push(&mut a, "form", e.form.as_deref());
            }
        }
        NodeKind::Attribute(at) => {
            push_ref(&mut a, &at.decl);
            if !is_reference {
                push(&mut a, "type", at.type_name.as_deref());
            }
            push(&mut a, "use", at.use_.as_deref());
            push(&mut a, "default", at.default.as_deref());
            push(&mut a, "fixed", at.fixed.as_deref());
            if !is_reference {
                push(&mut a, "form", at.form.as_deref());
            }
        }
        NodeKind::ComplexType(c) => {
            push(&mut a, "mixed", c.mixed.as_deref());
            push(&mut a, "abstract", c.is_abstract.as_deref());
        }
        NodeKind::SimpleType | NodeKind::SimpleContent | NodeKind::Key | NodeKind::Unique => {}
        NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::All(c) => {
            push_occurs(&mut a, "minOccurs", c.min_occurs.as_deref());
            push_occurs(&mut a, "maxOccurs", c.max_occurs.as_deref());
        }
        NodeKind::Group(g) => {
            push_ref(&mut a, &g.decl);
            push_occurs(&mut a, "minOccurs", g.min_occurs.as_deref());
            push_occurs(&mut a, "maxOccurs", g.max_occurs.as_deref());
        }
        NodeKind::AttributeGroup(g) => push_ref(&mut a, &g.decl),
        NodeKind::ComplexContent(c) => push(&mut a, "mixed", c.mixed.as_deref()),
        NodeKind::Restriction(d) | NodeKind::Extension(d) => push(&mut a, "base", d.base.as_deref()),
        NodeKind::Facet(f) => {
            push(&mut a, "value", Some(&f.value));
            if f.fixed {
                push(&mut a, "fixed", Some("true"));
            }
        }
        NodeKind::List(l) => push(&mut a, "itemType", l.item_type.as_deref()),
        NodeKind::Union(u) => {
            if !u.member_types.is_empty() {
                push(&mut a, "memberTypes", Some(&u.member_types.join(" ")));
            }
        }
        NodeKind::Any(w) | NodeKind::AnyAttribute(w) => {
            push(&mut a, "namespace", w.namespace.as_deref());
            push(&mut a, "processContents", w.process_contents.as_deref());
            push_occurs(&mut a, "minOccurs", w.min_occurs.as_deref());
            push_occurs(&mut a, "maxOccurs", w.max_occurs.as_deref());
        }
        NodeKind::Import(i) => {
            push(&mut a, "namespace", i.namespace.as_deref());
            push(&mut a, "schemaLocation", i.schema_location.as_deref());
        }
        NodeKind::Include(d) | NodeKind::Redefine(d) | NodeKind::Override(d) => {
            push(&mut a, "schemaLocation", Some(&d.schema_location));
        }
        NodeKind::KeyRef(k) => push(&mut a, "refer", Some(&k.refer)),
        NodeKind::Selector(x) | NodeKind::Field(x) => push(&mut a, "xpath", Some(&x.xpath)),
        NodeKind::Assert(t) => {
            push(&mut a, "test", Some(&t.test));
            push(&mut a, "xpathDefaultNamespace", t.xpath_default_namespace.as_deref());
        }
        NodeKind::Alternative(alt) => {
            push(&mut a, "test", alt.test.as_deref());
            push(&mut a, "type", alt.type_name.as_deref());
        }
        NodeKind::OpenContent(o) => push(&mut a, "mode", o.mode.as_deref()),
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::NodeFactory;
    use crate::model::{ElementData, FacetData, FacetKind};
    use pretty_assertions::assert_eq;

    fn serializer() -> XsdSerializer {
        XsdSerializer::with_config(SerializerConfig::new().with_indent("  ").with_xml_declaration(false))
    }

    #[test]
    fn test_new_document_shape() {
        let mut tree = XsdTree::new(SchemaData::new_document(Some("urn:t".into())));
        let root = tree.root();
        let el = tree.create_node(NodeKind::Element(ElementData::typed("xs:string")), Some("a".into()));
        tree.add_child(root, el);

        let text = XsdSerializer::new().serialize(&tree);
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<xs:schema "));
        assert!(text.contains(r#"xmlns:xs="http://www.w3.org/2001/XMLSchema""#));
        assert!(text.contains(r#"targetNamespace="urn:t""#));
        assert!(text.contains(r#"elementFormDefault="qualified""#));
        assert!(text.contains(r#"<xs:element name="a" type="xs:string"/>"#));
    }

    #[test]
    fn test_references_are_self_closing() {
        let mut tree = XsdTree::new(SchemaData::new_document(None));
        let root = tree.root();
        let seq_parent = tree.create_node(NodeKind::ComplexType(Default::default()), Some("T".into()));
        tree.add_child(root, seq_parent);
        let seq = tree.create_node(NodeKind::Sequence(Default::default()), None);
        tree.add_child(seq_parent, seq);
        let mut data = ElementData::reference("Foo");
        data.max_occurs = Some("unbounded".into());
        data.min_occurs = Some("1".into());
        let r = tree.create_node(NodeKind::Element(data), None);
        tree.add_child(seq, r);

        let text = serializer().serialize_node(&tree, seq_parent);
        assert_eq!(
            text,
            "<xs:complexType name=\"T\">\n  <xs:sequence>\n    <xs:element ref=\"Foo\" maxOccurs=\"unbounded\"/>\n  </xs:sequence>\n</xs:complexType>\n"
        );
    }

    #[test]
    fn test_unconstrained_wrapper_collapses() {
        let mut tree = XsdTree::new(SchemaData::new_document(None));
        let root = tree.root();
        let el = tree.create_node(NodeKind::Element(ElementData::default()), Some("a".into()));
        tree.add_child(root, el);
        let st = tree.create_node(NodeKind::SimpleType, None);
        tree.add_child(el, st);
        let restriction = tree.create_node(
            NodeKind::Restriction(crate::model::DerivationData { base: Some("xs:string".into()) }),
            None,
        );
        tree.add_child(st, restriction);

        assert_eq!(serializer().serialize_node(&tree, el), "<xs:element name=\"a\" type=\"xs:string\"/>\n");

        let facet = tree.create_node(NodeKind::Facet(FacetData::new(FacetKind::Enumeration, "x")), None);
        tree.add_child(restriction, facet);
        assert_eq!(
            serializer().serialize_node(&tree, el),
            "<xs:element name=\"a\">\n  <xs:simpleType>\n    <xs:restriction base=\"xs:string\">\n      <xs:enumeration value=\"x\"/>\n    </xs:restriction>\n  </xs:simpleType>\n</xs:element>\n"
        );
    }

    #[test]
    fn test_documentation_and_escaping() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a" type="xs:string">
                <xs:annotation><xs:documentation>Use &lt;b&gt; &amp; "q"</xs:documentation></xs:annotation>
                <xs:unique name="u"><xs:selector xpath="x[@n &lt; 2]"/><xs:field xpath="@id"/></xs:unique>
            </xs:element>
        </xs:schema>"#;
        let set = NodeFactory::new().load_str(xml, None).unwrap();
        let text = serializer().serialize(set.tree());
        assert!(text.contains("<xs:documentation>Use &lt;b&gt; &amp; &quot;q&quot;</xs:documentation>"));
        assert!(text.contains(r#"<xs:selector xpath="x[@n &lt; 2]"/>"#));
    }

    #[test]
    fn test_unprefixed_schema_stays_unprefixed() {
        let xml = r#"<schema xmlns="http://www.w3.org/2001/XMLSchema"><element name="a" type="string"/></schema>"#;
        let set = NodeFactory::new().load_str(xml, None).unwrap();
        let text = serializer().serialize(set.tree());
        assert_eq!(
            text,
            "<schema xmlns=\"http://www.w3.org/2001/XMLSchema\">\n  <element name=\"a\" type=\"string\"/>\n</schema>\n"
        );
    }

    #[test]
    fn test_flattened_drops_includes() {
        let mut tree = XsdTree::new(SchemaData::new_document(None));
        let root = tree.root();
        let include = tree.create_node(
            NodeKind::Include(crate::model::DirectiveData { schema_location: "base.xsd".into() }),
            None,
        );
        tree.add_child(root, include);
        let el = tree.create_node(NodeKind::Element(ElementData::typed("xs:int")), Some("a".into()));
        tree.add_child(root, el);

        let s = serializer();
        assert!(s.serialize(&tree).contains("xs:include"));
        let flat = s.serialize_flattened(&tree);
        assert!(!flat.contains("xs:include"));
        assert!(flat.contains(r#"<xs:element name="a" type="xs:int"/>"#));
    }

    #[test]
    fn test_assertion_inside_restriction() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:simpleType name="S"><xs:restriction base="xs:int"><xs:assertion test="$value &gt; 0"/></xs:restriction></xs:simpleType>
            <xs:complexType name="C"><xs:assert test="@a &lt; @b"/></xs:complexType>
        </xs:schema>"#;
        let set = NodeFactory::new().load_str(xml, None).unwrap();
        let text = serializer().serialize(set.tree());
        assert!(text.contains(r#"<xs:assertion test="$value &gt; 0"/>"#));
        assert!(text.contains(r#"<xs:assert test="@a &lt; @b"/>"#));
    }
}
