//! Task manifest generation

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::archive::read_hashes;
use crate::error::PipelineError;

/// One remotely executable task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescription {
    /// Content hash of the archived task
    pub isolate_hash: String,
    /// Logical task name
    pub description: String,
    /// Execution timeout in seconds
    pub timeout: u64,
}

/// The set of tasks submitted together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskManifest {
    pub tasks: Vec<TaskDescription>,
}

impl TaskManifest {
    /// One task per (name, hash) pair, in name order
    pub fn from_hashes(hashes: &BTreeMap<String, String>, timeout_secs: u64) -> Self {
        let tasks = hashes
            .iter()
            .map(|(name, hash)| TaskDescription {
                isolate_hash: hash.clone(),
                description: name.clone(),
                timeout: timeout_secs,
            })
            .collect();
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Write the manifest as JSON
    pub fn write(&self, path: &Path) -> Result<(), PipelineError> {
        std::fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    /// Read a manifest back from JSON
    pub fn read(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }
}

/// Turn the archiver's hash mapping at `infile` into a manifest at `outfile`
pub fn hashes_to_manifest(
    infile: &Path,
    outfile: &Path,
    timeout_secs: u64,
) -> Result<TaskManifest, PipelineError> {
    debug!(path = %infile.display(), "reading hash mapping");
    let hashes = read_hashes(infile)?;
    let manifest = TaskManifest::from_hashes(&hashes, timeout_secs);

    debug!(path = %outfile.display(), tasks = manifest.len(), "writing task manifest");
    manifest.write(outfile)?;
    Ok(manifest)
}
