//! grind core - test discovery for multi-module builds
//!
//! This crate provides the error types, configuration, class file
//! introspection, the test class filter chain and the project model that
//! discovers modules and selects their test classes.

pub mod classfile;
pub mod config;
pub mod error;
pub mod project;

pub use classfile::{ClassDescriptor, ClassReader, ClassfileReader, FilterChain};
pub use config::Config;
pub use error::{ClassfileError, ConfigError, GrindError, ProjectError, Result};
pub use project::{Module, ProjectModel, ProjectOptions};
