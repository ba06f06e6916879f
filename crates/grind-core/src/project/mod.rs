//! Multi-module project support
//!
//! - Module discovery: every directory holding both `pom.xml` and `target/`
//! - Module selection by name (include list, exclude list)
//! - Test class scanning through the class filter chain
//! - Artifact collection per module

pub mod artifacts;
pub mod discovery;
pub mod model;
pub mod module;

pub use artifacts::ArtifactKind;
pub use discovery::{discover_modules, normalize_root};
pub use model::{ProjectModel, ProjectOptions};
pub use module::{Module, BUILD_DESCRIPTOR, OUTPUT_DIR};
