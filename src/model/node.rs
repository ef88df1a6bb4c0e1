//! Schema component nodes
//!
//! Every XSD component is an [`XsdNode`] whose [`NodeKind`] carries the
//! kind-specific payload. Attribute values are stored in their lexical form so
//! that the editor can hold transiently invalid input; typed accessors parse
//! them on demand.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use super::source::IncludeSourceInfo;
use crate::namespaces::NamespaceContext;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque node identity, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a definable component declares something or points at a declaration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Declaration {
    /// Named declaration that may own children
    #[default]
    Definition,
    /// `ref="..."` pointer by qualified name; never owns children
    Reference(String),
}

impl Declaration {
    /// Check if this is a reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Declaration::Reference(_))
    }

    /// The referenced qualified name, if any
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            Declaration::Reference(name) => Some(name),
            Declaration::Definition => None,
        }
    }
}

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u64,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u64>,
}

impl Occurs {
    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Parse lexical minOccurs/maxOccurs values, falling back to 1 for anything unreadable
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Self {
        let min = min.and_then(|m| m.trim().parse().ok()).unwrap_or(1);
        let max = match max.map(str::trim) {
            Some("unbounded") => None,
            Some(m) => Some(m.parse().unwrap_or(1)),
            None => Some(1),
        };
        Self { min, max }
    }

    /// Check if this particle can be absent (minOccurs == 0)
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Check if maxOccurs is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Form default for elements and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Unqualified (XSD default)
    #[default]
    Unqualified,
    /// Qualified
    Qualified,
}

impl FormDefault {
    /// Parse from string value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// Lexical form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::Unqualified => "unqualified",
        }
    }
}

/// Constraining facet kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    Length,
    MinLength,
    MaxLength,
    Pattern,
    Enumeration,
    WhiteSpace,
    MaxInclusive,
    MaxExclusive,
    MinInclusive,
    MinExclusive,
    TotalDigits,
    FractionDigits,
    ExplicitTimezone,
}

impl FacetKind {
    /// All facet kinds
    pub const ALL: [FacetKind; 13] = [
        FacetKind::Length,
        FacetKind::MinLength,
        FacetKind::MaxLength,
        FacetKind::Pattern,
        FacetKind::Enumeration,
        FacetKind::WhiteSpace,
        FacetKind::MaxInclusive,
        FacetKind::MaxExclusive,
        FacetKind::MinInclusive,
        FacetKind::MinExclusive,
        FacetKind::TotalDigits,
        FacetKind::FractionDigits,
        FacetKind::ExplicitTimezone,
    ];

    /// Element local name of this facet
    pub fn local_name(&self) -> &'static str {
        match self {
            FacetKind::Length => "length",
            FacetKind::MinLength => "minLength",
            FacetKind::MaxLength => "maxLength",
            FacetKind::Pattern => "pattern",
            FacetKind::Enumeration => "enumeration",
            FacetKind::WhiteSpace => "whiteSpace",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
            FacetKind::ExplicitTimezone => "explicitTimezone",
        }
    }

    /// Look up a facet kind by element local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.local_name() == name)
    }
}

/// `xs:openContent` mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenContentMode {
    None,
    #[default]
    Interleave,
    Suffix,
}

impl OpenContentMode {
    /// Parse from string value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "interleave" => Some(Self::Interleave),
            "suffix" => Some(Self::Suffix),
            _ => None,
        }
    }

    /// Lexical form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Interleave => "interleave",
            Self::Suffix => "suffix",
        }
    }
}

/// Root `xs:schema` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaData {
    /// targetNamespace
    pub target_namespace: Option<String>,
    /// elementFormDefault (lexical)
    pub element_form_default: Option<String>,
    /// attributeFormDefault (lexical)
    pub attribute_form_default: Option<String>,
    /// Prefix declarations of the schema root
    pub namespaces: NamespaceContext,
    /// Other root attributes (version, blockDefault, finalDefault, ...) in document order
    pub extra_attributes: Vec<(String, String)>,
    /// Main file path, absent for schemas that were never saved
    pub main_file: Option<PathBuf>,
}

impl SchemaData {
    /// Payload for a brand new schema: `xs` prefix and qualified element form
    pub fn new_document(target_namespace: Option<String>) -> Self {
        let mut namespaces = NamespaceContext::with_xsd_prefix();
        if let Some(ref ns) = target_namespace {
            namespaces.add_prefix("tns", ns.clone());
        }
        Self {
            target_namespace,
            element_form_default: Some(FormDefault::Qualified.as_str().to_string()),
            namespaces,
            ..Default::default()
        }
    }

    /// Typed elementFormDefault
    pub fn element_form(&self) -> FormDefault {
        self.element_form_default
            .as_deref()
            .and_then(FormDefault::parse)
            .unwrap_or_default()
    }
}

/// `xs:element` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementData {
    pub decl: Declaration,
    pub type_name: Option<String>,
    pub min_occurs: Option<String>,
    pub max_occurs: Option<String>,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub nillable: Option<String>,
    pub is_abstract: Option<String>,
    pub substitution_group: Option<String>,
    pub form: Option<String>,
}

impl ElementData {
    /// Reference to a global element
    pub fn reference(ref_name: impl Into<String>) -> Self {
        Self {
            decl: Declaration::Reference(ref_name.into()),
            ..Default::default()
        }
    }

    /// Definition with a type
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Default::default()
        }
    }

    /// Typed occurrence bounds
    pub fn occurs(&self) -> Occurs {
        Occurs::parse(self.min_occurs.as_deref(), self.max_occurs.as_deref())
    }
}

/// `xs:attribute` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeData {
    pub decl: Declaration,
    pub type_name: Option<String>,
    pub use_: Option<String>,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub form: Option<String>,
}

impl AttributeData {
    /// Whether `use="required"`
    pub fn is_required(&self) -> bool {
        self.use_.as_deref() == Some("required")
    }
}

/// `xs:complexType` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplexTypeData {
    pub mixed: Option<String>,
    pub is_abstract: Option<String>,
}

/// `xs:group` / `xs:attributeGroup` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupData {
    pub decl: Declaration,
    pub min_occurs: Option<String>,
    pub max_occurs: Option<String>,
}

/// Compositor (`sequence`/`choice`/`all`) payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositorData {
    pub min_occurs: Option<String>,
    pub max_occurs: Option<String>,
}

/// `xs:restriction` / `xs:extension` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationData {
    pub base: Option<String>,
}

/// `xs:complexContent` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentData {
    pub mixed: Option<String>,
}

/// Facet payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetData {
    pub kind: FacetKind,
    pub value: String,
    pub fixed: bool,
}

impl FacetData {
    /// Facet with a value
    pub fn new(kind: FacetKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            fixed: false,
        }
    }
}

/// `xs:list` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListData {
    pub item_type: Option<String>,
}

/// `xs:union` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionData {
    pub member_types: Vec<String>,
}

/// `xs:any` / `xs:anyAttribute` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardData {
    pub namespace: Option<String>,
    pub process_contents: Option<String>,
    pub min_occurs: Option<String>,
    pub max_occurs: Option<String>,
}

/// `xs:import` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportData {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

/// `xs:include` / `xs:redefine` / `xs:override` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveData {
    pub schema_location: String,
}

/// `xs:keyref` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRefData {
    pub refer: String,
}

/// `xs:selector` / `xs:field` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XPathData {
    pub xpath: String,
}

/// `xs:assert` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssertData {
    pub test: String,
    pub xpath_default_namespace: Option<String>,
}

/// `xs:alternative` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativeData {
    pub test: Option<String>,
    pub type_name: Option<String>,
}

/// `xs:openContent` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenContentData {
    pub mode: Option<String>,
}

impl OpenContentData {
    /// Typed mode, `interleave` when absent or unreadable
    pub fn mode(&self) -> OpenContentMode {
        self.mode
            .as_deref()
            .and_then(OpenContentMode::parse)
            .unwrap_or_default()
    }
}

/// The closed set of schema component kinds with their payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Schema(SchemaData),
    Element(ElementData),
    Attribute(AttributeData),
    ComplexType(ComplexTypeData),
    SimpleType,
    Sequence(CompositorData),
    Choice(CompositorData),
    All(CompositorData),
    Group(GroupData),
    AttributeGroup(GroupData),
    ComplexContent(ContentData),
    SimpleContent,
    Restriction(DerivationData),
    Extension(DerivationData),
    Facet(FacetData),
    List(ListData),
    Union(UnionData),
    Any(WildcardData),
    AnyAttribute(WildcardData),
    Import(ImportData),
    Include(DirectiveData),
    Redefine(DirectiveData),
    Override(DirectiveData),
    Key,
    KeyRef(KeyRefData),
    Unique,
    Selector(XPathData),
    Field(XPathData),
    Assert(AssertData),
    Alternative(AlternativeData),
    OpenContent(OpenContentData),
}

/// Payload-free discriminant of [`NodeKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Schema,
    Element,
    Attribute,
    ComplexType,
    SimpleType,
    Sequence,
    Choice,
    All,
    Group,
    AttributeGroup,
    ComplexContent,
    SimpleContent,
    Restriction,
    Extension,
    Facet,
    List,
    Union,
    Any,
    AnyAttribute,
    Import,
    Include,
    Redefine,
    Override,
    Key,
    KeyRef,
    Unique,
    Selector,
    Field,
    Assert,
    Alternative,
    OpenContent,
}

impl NodeTag {
    /// XSD element local name; facets report the generic name `facet`
    pub fn local_name(&self) -> &'static str {
        match self {
            NodeTag::Schema => "schema",
            NodeTag::Element => "element",
            NodeTag::Attribute => "attribute",
            NodeTag::ComplexType => "complexType",
            NodeTag::SimpleType => "simpleType",
            NodeTag::Sequence => "sequence",
            NodeTag::Choice => "choice",
            NodeTag::All => "all",
            NodeTag::Group => "group",
            NodeTag::AttributeGroup => "attributeGroup",
            NodeTag::ComplexContent => "complexContent",
            NodeTag::SimpleContent => "simpleContent",
            NodeTag::Restriction => "restriction",
            NodeTag::Extension => "extension",
            NodeTag::Facet => "facet",
            NodeTag::List => "list",
            NodeTag::Union => "union",
            NodeTag::Any => "any",
            NodeTag::AnyAttribute => "anyAttribute",
            NodeTag::Import => "import",
            NodeTag::Include => "include",
            NodeTag::Redefine => "redefine",
            NodeTag::Override => "override",
            NodeTag::Key => "key",
            NodeTag::KeyRef => "keyref",
            NodeTag::Unique => "unique",
            NodeTag::Selector => "selector",
            NodeTag::Field => "field",
            NodeTag::Assert => "assert",
            NodeTag::Alternative => "alternative",
            NodeTag::OpenContent => "openContent",
        }
    }

    /// Check if this is a schema composition directive
    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            NodeTag::Import | NodeTag::Include | NodeTag::Redefine | NodeTag::Override
        )
    }

    /// Check if this is a compositor
    pub fn is_compositor(&self) -> bool {
        matches!(self, NodeTag::Sequence | NodeTag::Choice | NodeTag::All)
    }

    /// Check if this is an identity constraint
    pub fn is_identity_constraint(&self) -> bool {
        matches!(self, NodeTag::Key | NodeTag::KeyRef | NodeTag::Unique)
    }
}

impl NodeKind {
    /// Discriminant of this kind
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Schema(_) => NodeTag::Schema,
            NodeKind::Element(_) => NodeTag::Element,
            NodeKind::Attribute(_) => NodeTag::Attribute,
            NodeKind::ComplexType(_) => NodeTag::ComplexType,
            NodeKind::SimpleType => NodeTag::SimpleType,
            NodeKind::Sequence(_) => NodeTag::Sequence,
            NodeKind::Choice(_) => NodeTag::Choice,
            NodeKind::All(_) => NodeTag::All,
            NodeKind::Group(_) => NodeTag::Group,
            NodeKind::AttributeGroup(_) => NodeTag::AttributeGroup,
            NodeKind::ComplexContent(_) => NodeTag::ComplexContent,
            NodeKind::SimpleContent => NodeTag::SimpleContent,
            NodeKind::Restriction(_) => NodeTag::Restriction,
            NodeKind::Extension(_) => NodeTag::Extension,
            NodeKind::Facet(_) => NodeTag::Facet,
            NodeKind::List(_) => NodeTag::List,
            NodeKind::Union(_) => NodeTag::Union,
            NodeKind::Any(_) => NodeTag::Any,
            NodeKind::AnyAttribute(_) => NodeTag::AnyAttribute,
            NodeKind::Import(_) => NodeTag::Import,
            NodeKind::Include(_) => NodeTag::Include,
            NodeKind::Redefine(_) => NodeTag::Redefine,
            NodeKind::Override(_) => NodeTag::Override,
            NodeKind::Key => NodeTag::Key,
            NodeKind::KeyRef(_) => NodeTag::KeyRef,
            NodeKind::Unique => NodeTag::Unique,
            NodeKind::Selector(_) => NodeTag::Selector,
            NodeKind::Field(_) => NodeTag::Field,
            NodeKind::Assert(_) => NodeTag::Assert,
            NodeKind::Alternative(_) => NodeTag::Alternative,
            NodeKind::OpenContent(_) => NodeTag::OpenContent,
        }
    }

    /// Element local name, with facets reporting their concrete kind
    pub fn local_name(&self) -> &'static str {
        match self {
            NodeKind::Facet(facet) => facet.kind.local_name(),
            other => other.tag().local_name(),
        }
    }

    /// Definition/reference flag for definable kinds
    pub fn declaration(&self) -> Option<&Declaration> {
        match self {
            NodeKind::Element(data) => Some(&data.decl),
            NodeKind::Attribute(data) => Some(&data.decl),
            NodeKind::Group(data) | NodeKind::AttributeGroup(data) => Some(&data.decl),
            _ => None,
        }
    }

    /// Check if this node is a `ref=` pointer
    pub fn is_reference(&self) -> bool {
        self.declaration().map(|d| d.is_reference()).unwrap_or(false)
    }

    /// Facet payload, if this is a facet
    pub fn as_facet(&self) -> Option<&FacetData> {
        match self {
            NodeKind::Facet(facet) => Some(facet),
            _ => None,
        }
    }

    /// Schema payload, if this is the root
    pub fn as_schema(&self) -> Option<&SchemaData> {
        match self {
            NodeKind::Schema(data) => Some(data),
            _ => None,
        }
    }

    /// Declared schemaLocation of a directive
    pub fn schema_location(&self) -> Option<&str> {
        match self {
            NodeKind::Import(data) => data.schema_location.as_deref(),
            NodeKind::Include(data) | NodeKind::Redefine(data) | NodeKind::Override(data) => {
                Some(&data.schema_location)
            }
            _ => None,
        }
    }
}

/// Parts of an `xs:annotation` kept alongside its documentation text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationExtras {
    /// `xml:lang` of the first `xs:documentation`
    pub lang: Option<String>,
    /// Each `xs:appinfo` element as markup, in document order
    pub appinfo: Vec<String>,
}

impl AnnotationExtras {
    pub fn is_empty(&self) -> bool {
        self.lang.is_none() && self.appinfo.is_empty()
    }
}

/// One schema component in the arena
///
/// Equality and hashing use the node identity only.
#[derive(Debug, Clone)]
pub struct XsdNode {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) name: Option<String>,
    pub(crate) documentation: Option<String>,
    pub(crate) annotation: AnnotationExtras,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) source: Option<IncludeSourceInfo>,
}

impl XsdNode {
    pub(crate) fn new(kind: NodeKind, name: Option<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
            name,
            documentation: None,
            annotation: AnnotationExtras::default(),
            children: Vec::new(),
            parent: None,
            source: None,
        }
    }

    /// Node identity
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Kind and payload
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Kind discriminant
    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    /// Component name (`name="..."`)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Annotation documentation text
    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    /// Appinfo and language of the annotation
    pub fn annotation(&self) -> &AnnotationExtras {
        &self.annotation
    }

    /// Ordered children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent, if attached
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Originating file information, if recorded
    pub fn source(&self) -> Option<&IncludeSourceInfo> {
        self.source.as_ref()
    }

    /// Check if this node is a `ref=` pointer
    pub fn is_reference(&self) -> bool {
        self.kind.is_reference()
    }
}

impl PartialEq for XsdNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for XsdNode {}

impl Hash for XsdNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
