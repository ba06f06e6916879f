//! Packaged artifact classification

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// How a packaged file under a module's output directory is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Test jar, only needed when the module's tests run
    Test,
    /// Runtime jar, needed by any module that depends on this one
    Runtime,
    /// Not a runtime artifact (sources, javadoc, anything that is not a jar)
    Ignored,
}

impl ArtifactKind {
    /// Classify an artifact by file name
    pub fn classify(file_name: &str) -> Self {
        if file_name.ends_with("-test-sources.jar") || file_name.ends_with("-tests.jar") {
            Self::Test
        } else if file_name.ends_with(".jar")
            && !file_name.ends_with("-sources.jar")
            && !file_name.ends_with("-javadoc.jar")
        {
            Self::Runtime
        } else {
            Self::Ignored
        }
    }
}

/// List classified artifacts directly under `output_dir`, sorted by file name.
/// Directories and ignored files are left out.
pub fn scan_artifacts(output_dir: &Path) -> Vec<(PathBuf, ArtifactKind)> {
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %output_dir.display(), error = %e, "cannot list output directory");
            return Vec::new();
        }
    };

    let mut artifacts: Vec<(PathBuf, ArtifactKind)> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name();
            let kind = ArtifactKind::classify(&name.to_string_lossy());
            (kind != ArtifactKind::Ignored).then(|| (entry.path(), kind))
        })
        .collect();
    artifacts.sort_by(|a, b| a.0.cmp(&b.0));

    debug!(
        path = %output_dir.display(),
        count = artifacts.len(),
        "scanned artifacts"
    );
    artifacts
}
