//! # xsd-editor
//!
//! An editable in-memory model of XML Schema (XSD) documents.
//!
//! ## Features
//!
//! - Arena-backed node tree covering the XSD component kinds found in
//!   hand-written schemas, with property observers
//! - Multi-file loading: `xs:include` and `xs:redefine` are merged into one
//!   logical tree with per-node source tracking, `xs:import` builds one
//!   subschema per namespace
//! - Lazy, namespace-aware name index for `ref`/`type`/`base` resolution
//! - Undoable commands with a bounded history
//! - Selection model for editor views
//! - Serialization back to one file or to the original set of files
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdedit::commands::{CommandHistory, SetPropertyCommand};
//! use xsdedit::model::NodeProperty;
//! use xsdedit::serializer::{MultiFileSerializer, SaveOptions};
//! use xsdedit::{ComponentCategory, NodeFactory};
//!
//! let mut set = NodeFactory::new().load("schemas/main.xsd")?;
//! let order = set.index().lookup(ComponentCategory::Element, "order").unwrap();
//!
//! let mut history = CommandHistory::default();
//! history.execute(
//!     set.tree_mut(),
//!     Box::new(SetPropertyCommand::new(order, NodeProperty::Type, Some("OrderV2".into()))),
//! );
//!
//! MultiFileSerializer::new().save(set.tree(), &SaveOptions::into_dir("out"))?;
//! ```

#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Utilities
pub mod names;
pub mod namespaces;
pub mod locations;

// Resource loading
pub mod documents;
pub mod loaders;

// Document model and editing
pub mod model;
pub mod factory;
pub mod index;
pub mod commands;
pub mod selection;

// Output
pub mod serializer;
pub mod statistics;

// Re-exports for convenience
pub use error::{Diagnostic, Error, ParseError, Result, Severity};
pub use factory::{FactoryOptions, NodeFactory, SchemaSet};
pub use index::{ComponentCategory, NameIndex};
pub use limits::Limits;
pub use model::{NodeId, NodeKind, NodeProperty, NodeTag, XsdNode, XsdTree};
pub use namespaces::{QName, XSD_NAMESPACE};
pub use selection::SelectionModel;
pub use serializer::{MultiFileSerializer, XsdSerializer};
pub use statistics::SchemaStatistics;

/// Version of the xsd-editor library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
