//! Build module type

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classfile::ClassDescriptor;

/// Build descriptor file that marks a module root
pub const BUILD_DESCRIPTOR: &str = "pom.xml";

/// Build output directory inside a module root
pub const OUTPUT_DIR: &str = "target";

/// A build unit with its own compiled output and packaged artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Module root directory
    pub root: PathBuf,
    /// Display name, the root directory's name
    pub name: String,
    /// Test classes accepted by the filter chain
    pub test_classes: Vec<ClassDescriptor>,
    /// Runtime jars under the output directory
    pub source_artifacts: Vec<PathBuf>,
    /// Test jars under the output directory (included modules only)
    pub test_artifacts: Vec<PathBuf>,
}

impl Module {
    /// Create an empty module rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            root,
            name,
            test_classes: Vec::new(),
            source_artifacts: Vec::new(),
            test_artifacts: Vec::new(),
        }
    }

    /// Path to the module's build output directory
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Whether `dir` qualifies as a module root
    pub fn is_module_root(dir: &Path) -> bool {
        dir.join(BUILD_DESCRIPTOR).is_file() && dir.join(OUTPUT_DIR).is_dir()
    }
}
