//! Resource loading utilities
//!
//! This module handles loading schema files from the locations the resolver
//! computes for `xs:include`/`xs:import` targets.

use std::fs;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;

/// Resource loader for schema documents
#[derive(Debug, Clone)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits applied by this loader
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;

                self.limits.check_file_size(content.len())?;

                Ok(content)
            }
            Location::Url(url) => Err(Error::Resource(format!(
                "Remote schema locations are not loaded: {}",
                url
            ))),
            Location::String(s) => {
                self.limits.check_file_size(s.len())?;
                Ok(s.clone())
            }
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
