//! In-memory XSD document model
//!
//! - [`XsdTree`]: arena of [`XsdNode`]s forming one logical schema
//! - [`NodeKind`]: closed set of component kinds with their payloads
//! - [`IncludeSourceInfo`] / [`SchemaFile`]: which physical file each node came from
//! - [`NodeProperty`] / [`TreeEvent`]: uniform property access and change notification

mod node;
mod properties;
mod source;
mod tree;

pub use node::{
    AlternativeData, AnnotationExtras, AssertData, AttributeData, ComplexTypeData, CompositorData, ContentData,
    Declaration, DerivationData, DirectiveData, ElementData, FacetData, FacetKind, FormDefault,
    GroupData, ImportData, KeyRefData, ListData, NodeId, NodeKind, NodeTag, Occurs,
    OpenContentData, OpenContentMode, SchemaData, UnionData, WildcardData, XPathData, XsdNode,
};
pub use properties::NodeProperty;
pub use source::{IncludeSourceInfo, SchemaFile};
pub use tree::{NodeSnapshot, ObserverId, TreeEvent, XsdTree};
