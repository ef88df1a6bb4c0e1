//! Resource location resolution
//!
//! Resolves `schemaLocation` strings against the directory of the file that
//! declares them and produces the canonical paths used as include dedup keys.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

/// Resource location - can be a URL, file path, or in-memory identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// Remote URL (http, https, ftp, etc.)
    Url(Url),
    /// In-memory document text
    String(String),
}

impl Location {
    /// Resolve a `schemaLocation` relative to the directory of the declaring file
    ///
    /// Absolute URLs other than `file:` stay remote; `file:` URLs and relative
    /// references become paths.
    pub fn resolve(schema_location: &str, base_dir: Option<&Path>) -> Result<Self> {
        if let Ok(url) = Url::parse(schema_location) {
            // Single letters are Windows drive prefixes, not URL schemes
            if url.scheme().len() > 1 {
                if url.scheme() == "file" {
                    let path = url.to_file_path().map_err(|_| {
                        Error::Resource(format!("Invalid file URL: {}", schema_location))
                    })?;
                    return Ok(Location::Path(path));
                }
                return Ok(Location::Url(url));
            }
        }

        let location_path = Path::new(schema_location);
        if location_path.is_absolute() {
            return Ok(Location::Path(location_path.to_path_buf()));
        }

        match base_dir {
            Some(base) => Ok(Location::Path(base.join(location_path))),
            None => Ok(Location::Path(location_path.to_path_buf())),
        }
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::String(s) => s.clone(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}

/// Normalize `.` and `..` components without touching the file system
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonical absolute form of a path, used as the include dedup key
///
/// Falls back to a lexically normalized absolute path when the file does not
/// exist (yet), so unreadable targets still get a stable key.
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize_lexically(&absolute)
}
