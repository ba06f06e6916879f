//! Module discovery in a project tree

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ProjectError, Result};

use super::module::{Module, BUILD_DESCRIPTOR};

/// Drop `.` components and append a trailing path separator if missing
pub fn normalize_root(root: &Path) -> PathBuf {
    let cleaned: PathBuf = root.components().collect();
    let mut raw: OsString = cleaned.into_os_string();
    if !raw.to_string_lossy().ends_with(MAIN_SEPARATOR) {
        raw.push(MAIN_SEPARATOR.to_string());
    }
    PathBuf::from(raw)
}

/// Check that `root` is a directory holding a build descriptor
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(ProjectError::NotAProject {
            path: root.to_path_buf(),
            reason: "path is not a directory".to_string(),
        }
        .into());
    }
    if !root.join(BUILD_DESCRIPTOR).is_file() {
        return Err(ProjectError::NotAProject {
            path: root.to_path_buf(),
            reason: format!("no {} file found", BUILD_DESCRIPTOR),
        }
        .into());
    }
    Ok(())
}

/// Walk the whole tree under `root` and return every module root, in
/// depth-first order with siblings sorted by name.
pub fn discover_modules(root: &Path) -> Result<Vec<Module>> {
    validate_root(root)?;
    debug!(root = %root.display(), "discovering modules");

    let mut modules = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if Module::is_module_root(entry.path()) {
            debug!(path = %entry.path().display(), "found module");
            modules.push(Module::new(entry.path()));
        }
    }

    info!(count = modules.len(), root = %root.display(), "discovered modules");
    Ok(modules)
}
