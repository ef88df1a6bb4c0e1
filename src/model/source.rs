//! Source tracking for multi-file schemas
//!
//! Every node parsed from disk remembers which physical file it came from and
//! which directive pulled that file in. The per-file [`SchemaFile`] records
//! keep each file's own root attributes and its place in the include graph.

use std::path::{Path, PathBuf};

use super::node::{AnnotationExtras, NodeId, SchemaData};

/// Where a node originally came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSourceInfo {
    /// Canonical absolute path of the originating file
    pub origin_file: PathBuf,
    /// `schemaLocation` as written in the including file (None for the main file)
    pub schema_location: Option<String>,
    /// Directive node responsible for bringing the file in (None for the main file)
    pub directive: Option<NodeId>,
}

impl IncludeSourceInfo {
    /// Source info for nodes of the main file
    pub fn main(origin_file: impl Into<PathBuf>) -> Self {
        Self {
            origin_file: origin_file.into(),
            schema_location: None,
            directive: None,
        }
    }

    /// Source info for nodes of an included/redefined file
    pub fn included(
        origin_file: impl Into<PathBuf>,
        schema_location: impl Into<String>,
        directive: NodeId,
    ) -> Self {
        Self {
            origin_file: origin_file.into(),
            schema_location: Some(schema_location.into()),
            directive: Some(directive),
        }
    }

    /// Check if the node came from the given file
    pub fn is_from(&self, path: &Path) -> bool {
        self.origin_file == path
    }
}

/// One physical file merged into a logical tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    /// Canonical absolute path
    pub path: PathBuf,
    /// Root attributes and namespace declarations of this file
    pub header: SchemaData,
    /// File whose directive pulled this one in (None for the main file)
    pub included_from: Option<PathBuf>,
    /// `schemaLocation` as declared in `included_from`
    pub declared_location: Option<String>,
    /// Directive node in `included_from`
    pub directive: Option<NodeId>,
    /// Documentation of the file's root `xs:annotation`
    ///
    /// Only read for included files; the main file keeps its root
    /// annotation on the tree root.
    pub documentation: Option<String>,
    pub annotation: AnnotationExtras,
}

impl SchemaFile {
    /// Record for the main file
    pub fn main(path: impl Into<PathBuf>, header: SchemaData) -> Self {
        Self {
            path: path.into(),
            header,
            included_from: None,
            declared_location: None,
            directive: None,
            documentation: None,
            annotation: AnnotationExtras::default(),
        }
    }

    /// Check if this is the main file of its tree
    pub fn is_main(&self) -> bool {
        self.directive.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_constructors() {
        let main = IncludeSourceInfo::main("/s/main.xsd");
        assert!(main.is_from(Path::new("/s/main.xsd")));
        assert!(main.directive.is_none());

        let directive = NodeId::fresh();
        let included = IncludeSourceInfo::included("/s/base.xsd", "base.xsd", directive);
        assert_eq!(included.schema_location.as_deref(), Some("base.xsd"));
        assert_eq!(included.directive, Some(directive));
    }

    #[test]
    fn test_schema_file_is_main() {
        let file = SchemaFile::main("/s/main.xsd", SchemaData::default());
        assert!(file.is_main());
    }
}
