//! Compiled class introspection and test class filtering

pub mod filter;
mod reader;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ClassfileError;

pub use filter::{ClassFilter, FilterChain, PatternSet};
pub use reader::{ClassfileReader, ACC_ABSTRACT, ACC_INTERFACE};

/// Compiled class file suffix
pub const CLASS_SUFFIX: &str = ".class";

/// A compiled class together with its introspected metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Path of the `.class` file
    pub path: PathBuf,
    /// Fully-qualified class name (dot-separated)
    pub class_name: String,
    /// Declared as an interface
    pub is_interface: bool,
    /// Declared abstract
    pub is_abstract: bool,
}

impl ClassDescriptor {
    /// File name of the originating class file
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }
}

/// Capability to introspect a single compiled class file
pub trait ClassReader: Send + Sync {
    /// Read the descriptor of the class file at `path`
    fn read(&self, path: &Path) -> Result<ClassDescriptor, ClassfileError>;
}
