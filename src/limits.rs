//! Limits and constraints for schema loading
//!
//! This module defines limits that protect the resolver against resource
//! exhaustion: oversized files, runaway include chains and pathologically
//! deep component nesting.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum schema file size in bytes
    pub max_file_size: usize,

    /// Maximum length of an include/import/redefine chain
    pub max_include_depth: usize,

    /// Maximum nesting depth of components inside one file
    pub max_tree_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100 MB
            max_include_depth: 100,
            max_tree_depth: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            max_include_depth: 20,
            max_tree_depth: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024, // 1 GB
            max_include_depth: 1000,
            max_tree_depth: 10000,
        }
    }

    /// Check if a file size is within limits
    pub fn check_file_size(&self, size: usize) -> Result<()> {
        if size > self.max_file_size {
            Err(Error::LimitExceeded(format!(
                "file size {} bytes exceeds maximum {} bytes",
                size, self.max_file_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if an include chain depth is within limits
    pub fn check_include_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_include_depth {
            Err(Error::LimitExceeded(format!(
                "include depth {} exceeds maximum {}",
                depth, self.max_include_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if component nesting depth is within limits
    pub fn check_tree_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_tree_depth {
            Err(Error::LimitExceeded(format!(
                "component nesting depth {} exceeds maximum {}",
                depth, self.max_tree_depth
            )))
        } else {
            Ok(())
        }
    }
}
