//! XSD element to node conversion
//!
//! Converts one parsed schema element (and its subtree) into detached nodes
//! of an [`XsdTree`]. Names in `ref`/`type`/`base` attributes are stored as
//! written; nothing is resolved here.

use log::debug;

use crate::documents::Element;
use crate::error::{Diagnostic, Error, ParseError, Result};
use crate::limits::Limits;
use crate::model::{
    AlternativeData, AnnotationExtras, AssertData, AttributeData, ComplexTypeData, CompositorData, ContentData,
    Declaration, DerivationData, DirectiveData, ElementData, FacetData, FacetKind, GroupData,
    ImportData, KeyRefData, ListData, NodeId, NodeKind, OpenContentData, SchemaData, UnionData,
    WildcardData, XPathData, XsdTree,
};
use crate::namespaces::is_xsd_namespace;

/// XSD element local names
pub(crate) mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const ATTRIBUTE: &str = "attribute";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const GROUP: &str = "group";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const OVERRIDE: &str = "override";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
    pub const UNIQUE: &str = "unique";
    pub const SELECTOR: &str = "selector";
    pub const FIELD: &str = "field";
    pub const ASSERT: &str = "assert";
    pub const ASSERTION: &str = "assertion";
    pub const ALTERNATIVE: &str = "alternative";
    pub const OPEN_CONTENT: &str = "openContent";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const APPINFO: &str = "appinfo";
}

/// XSD attribute names
pub(crate) mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const NILLABLE: &str = "nillable";
    pub const ABSTRACT: &str = "abstract";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const FORM: &str = "form";
    pub const USE: &str = "use";
    pub const MIXED: &str = "mixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const NAMESPACE: &str = "namespace";
    pub const PROCESS_CONTENTS: &str = "processContents";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const REFER: &str = "refer";
    pub const XPATH: &str = "xpath";
    pub const TEST: &str = "test";
    pub const XPATH_DEFAULT_NAMESPACE: &str = "xpathDefaultNamespace";
    pub const MODE: &str = "mode";
    pub const XML_LANG: &str = "xml:lang";
}

use xsd_attrs as attrs;
use xsd_elements as names;

/// Check whether an element belongs to the XML Schema namespace
pub(crate) fn is_xsd_element(elem: &Element) -> bool {
    elem.namespace().map(is_xsd_namespace).unwrap_or(false)
}

/// Read the root attributes of an `xs:schema` element
pub(crate) fn schema_header(elem: &Element) -> SchemaData {
    let mut data = SchemaData {
        namespaces: elem.namespaces.clone(),
        ..Default::default()
    };
    for (key, value) in &elem.attributes {
        match key.as_str() {
            attrs::TARGET_NAMESPACE => data.target_namespace = Some(value.clone()),
            attrs::ELEMENT_FORM_DEFAULT => data.element_form_default = Some(value.clone()),
            attrs::ATTRIBUTE_FORM_DEFAULT => data.attribute_form_default = Some(value.clone()),
            _ => data.extra_attributes.push((key.clone(), value.clone())),
        }
    }
    data
}

/// Documentation text of an element's `xs:annotation` children
pub(crate) fn documentation_of(elem: &Element) -> Option<String> {
    let texts: Vec<String> = elem
        .children
        .iter()
        .filter(|c| is_xsd_element(c) && c.local_name() == names::ANNOTATION)
        .flat_map(|a| a.children.iter())
        .filter(|d| is_xsd_element(d) && d.local_name() == names::DOCUMENTATION)
        .filter_map(|d| d.text.as_deref())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

/// `xml:lang` and `xs:appinfo` of an element's `xs:annotation` children
pub(crate) fn annotation_extras_of(elem: &Element) -> AnnotationExtras {
    let mut extras = AnnotationExtras::default();
    let annotations = elem
        .children
        .iter()
        .filter(|c| is_xsd_element(c) && c.local_name() == names::ANNOTATION);
    for child in annotations.flat_map(|a| a.children.iter()).filter(|c| is_xsd_element(c)) {
        match child.local_name() {
            names::DOCUMENTATION if extras.lang.is_none() => {
                extras.lang = child.get_attribute(attrs::XML_LANG).map(str::to_string);
            }
            names::APPINFO => extras.appinfo.push(child.to_markup()),
            _ => {}
        }
    }
    extras
}

/// Lexical `xs:boolean` truth
fn is_true(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true") | Some("1"))
}

/// Builds detached nodes for one file
pub(crate) struct ComponentBuilder<'a> {
    tree: &'a mut XsdTree,
    limits: &'a Limits,
    file_label: String,
    /// Elements that were skipped because they are not modeled
    pub(crate) skipped: Vec<Diagnostic>,
    /// Every node created, for cleanup if the file fails
    pub(crate) created: Vec<NodeId>,
}

impl<'a> ComponentBuilder<'a> {
    pub(crate) fn new(tree: &'a mut XsdTree, limits: &'a Limits, file_label: impl Into<String>) -> Self {
        Self {
            tree,
            limits,
            file_label: file_label.into(),
            skipped: Vec::new(),
            created: Vec::new(),
        }
    }

    /// Drop every node created so far
    pub(crate) fn abort(self) {
        for id in self.created {
            self.tree.discard(id);
        }
    }

    /// Build a detached subtree for `elem`; `Ok(None)` for elements that are not modeled
    pub(crate) fn build(&mut self, elem: &Element, depth: usize) -> Result<Option<NodeId>> {
        self.limits.check_tree_depth(depth)?;

        if !is_xsd_element(elem) {
            debug!(
                "{}: skipping foreign element <{}> at line {}",
                self.file_label, elem.local_name, elem.line
            );
            return Ok(None);
        }

        let local = elem.local_name();
        if local == names::ANNOTATION {
            return Ok(None);
        }

        let kind = match self.kind_for(elem)? {
            Some(kind) => kind,
            None => {
                self.skipped.push(Diagnostic::info(format!(
                    "{}: <{}> at line {} is not modeled and was dropped",
                    self.file_label, local, elem.line
                )));
                return Ok(None);
            }
        };

        let is_reference = kind.is_reference();
        let name = elem.get_attribute(attrs::NAME).map(str::to_string);
        let id = self.tree.create_node(kind, name);
        self.created.push(id);

        if let Some(doc) = documentation_of(elem) {
            self.tree.set_documentation(id, Some(doc));
        }
        let extras = annotation_extras_of(elem);
        if !extras.is_empty() {
            self.tree.set_annotation(id, extras);
        }

        if is_reference {
            return Ok(Some(id));
        }

        for child in &elem.children {
            if let Some(child_id) = self.build(child, depth + 1)? {
                self.tree.add_child(id, child_id);
            }
        }

        Ok(Some(id))
    }

    fn kind_for(&self, elem: &Element) -> Result<Option<NodeKind>> {
        let attr = |name: &str| elem.get_attribute(name).map(str::to_string);
        let local = elem.local_name();

        let kind = match local {
            names::ELEMENT => {
                let decl = self.declaration(elem, true)?;
                NodeKind::Element(ElementData {
                    decl,
                    type_name: attr(attrs::TYPE),
                    min_occurs: attr(attrs::MIN_OCCURS),
                    max_occurs: attr(attrs::MAX_OCCURS),
                    default: attr(attrs::DEFAULT),
                    fixed: attr(attrs::FIXED),
                    nillable: attr(attrs::NILLABLE),
                    is_abstract: attr(attrs::ABSTRACT),
                    substitution_group: attr(attrs::SUBSTITUTION_GROUP),
                    form: attr(attrs::FORM),
                })
            }
            names::ATTRIBUTE => {
                let decl = self.declaration(elem, true)?;
                NodeKind::Attribute(AttributeData {
                    decl,
                    type_name: attr(attrs::TYPE),
                    use_: attr(attrs::USE),
                    default: attr(attrs::DEFAULT),
                    fixed: attr(attrs::FIXED),
                    form: attr(attrs::FORM),
                })
            }
            names::COMPLEX_TYPE => NodeKind::ComplexType(ComplexTypeData {
                mixed: attr(attrs::MIXED),
                is_abstract: attr(attrs::ABSTRACT),
            }),
            names::SIMPLE_TYPE => NodeKind::SimpleType,
            names::SEQUENCE => NodeKind::Sequence(compositor(elem)),
            names::CHOICE => NodeKind::Choice(compositor(elem)),
            names::ALL => NodeKind::All(compositor(elem)),
            names::GROUP => NodeKind::Group(GroupData {
                decl: self.declaration(elem, true)?,
                min_occurs: attr(attrs::MIN_OCCURS),
                max_occurs: attr(attrs::MAX_OCCURS),
            }),
            names::ATTRIBUTE_GROUP => NodeKind::AttributeGroup(GroupData {
                decl: self.declaration(elem, true)?,
                ..Default::default()
            }),
            names::COMPLEX_CONTENT => NodeKind::ComplexContent(ContentData {
                mixed: attr(attrs::MIXED),
            }),
            names::SIMPLE_CONTENT => NodeKind::SimpleContent,
            names::RESTRICTION => NodeKind::Restriction(DerivationData {
                base: attr(attrs::BASE),
            }),
            names::EXTENSION => NodeKind::Extension(DerivationData {
                base: attr(attrs::BASE),
            }),
            names::LIST => NodeKind::List(ListData {
                item_type: attr(attrs::ITEM_TYPE),
            }),
            names::UNION => NodeKind::Union(UnionData {
                member_types: elem
                    .get_attribute(attrs::MEMBER_TYPES)
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
            }),
            names::ANY | names::ANY_ATTRIBUTE => {
                let data = WildcardData {
                    namespace: attr(attrs::NAMESPACE),
                    process_contents: attr(attrs::PROCESS_CONTENTS),
                    min_occurs: attr(attrs::MIN_OCCURS),
                    max_occurs: attr(attrs::MAX_OCCURS),
                };
                if local == names::ANY {
                    NodeKind::Any(data)
                } else {
                    NodeKind::AnyAttribute(data)
                }
            }
            names::IMPORT => NodeKind::Import(ImportData {
                namespace: attr(attrs::NAMESPACE),
                schema_location: attr(attrs::SCHEMA_LOCATION),
            }),
            names::INCLUDE => NodeKind::Include(self.directive(elem)?),
            names::REDEFINE => NodeKind::Redefine(self.directive(elem)?),
            names::OVERRIDE => NodeKind::Override(self.directive(elem)?),
            names::KEY => NodeKind::Key,
            names::UNIQUE => NodeKind::Unique,
            names::KEYREF => NodeKind::KeyRef(KeyRefData {
                refer: self.required(elem, attrs::REFER)?,
            }),
            names::SELECTOR => NodeKind::Selector(XPathData {
                xpath: self.required(elem, attrs::XPATH)?,
            }),
            names::FIELD => NodeKind::Field(XPathData {
                xpath: self.required(elem, attrs::XPATH)?,
            }),
            names::ASSERT | names::ASSERTION => NodeKind::Assert(AssertData {
                test: self.required(elem, attrs::TEST)?,
                xpath_default_namespace: attr(attrs::XPATH_DEFAULT_NAMESPACE),
            }),
            names::ALTERNATIVE => NodeKind::Alternative(AlternativeData {
                test: attr(attrs::TEST),
                type_name: attr(attrs::TYPE),
            }),
            names::OPEN_CONTENT => NodeKind::OpenContent(OpenContentData {
                mode: attr(attrs::MODE),
            }),
            other => match FacetKind::from_local_name(other) {
                Some(kind) => NodeKind::Facet(FacetData {
                    kind,
                    value: self.required(elem, attrs::VALUE)?,
                    fixed: is_true(elem.get_attribute(attrs::FIXED)),
                }),
                None => return Ok(None),
            },
        };
        Ok(Some(kind))
    }

    fn declaration(&self, elem: &Element, needs_identity: bool) -> Result<Declaration> {
        if let Some(r) = elem.get_attribute(attrs::REF) {
            return Ok(Declaration::Reference(r.to_string()));
        }
        if needs_identity && elem.get_attribute(attrs::NAME).is_none() {
            return Err(self.missing(elem, "name or ref"));
        }
        Ok(Declaration::Definition)
    }

    fn directive(&self, elem: &Element) -> Result<DirectiveData> {
        Ok(DirectiveData {
            schema_location: self.required(elem, attrs::SCHEMA_LOCATION)?,
        })
    }

    fn required(&self, elem: &Element, name: &str) -> Result<String> {
        elem.get_attribute(name)
            .map(str::to_string)
            .ok_or_else(|| self.missing(elem, name))
    }

    fn missing(&self, elem: &Element, what: &str) -> Error {
        Error::Parse(
            ParseError::new(format!(
                "<{}> is missing required attribute '{}'",
                elem.local_name(),
                what
            ))
            .with_location(format!("{}:{}", self.file_label, elem.line)),
        )
    }
}

fn compositor(elem: &Element) -> CompositorData {
    CompositorData {
        min_occurs: elem.get_attribute(attrs::MIN_OCCURS).map(str::to_string),
        max_occurs: elem.get_attribute(attrs::MAX_OCCURS).map(str::to_string),
    }
}
