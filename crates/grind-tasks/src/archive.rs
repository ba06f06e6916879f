//! Archiving bridge to the content-addressing service

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grind_core::config::ISOLATE_SERVER_ENV;
use grind_core::Config;
use tracing::{info, instrument};

use crate::error::{PipelineError, ProcessError};
use crate::process::ToolInvocation;
use crate::reporter::PipelineReporter;

/// Uploads task descriptions and records their content hashes
#[async_trait::async_trait]
pub trait Archiver: Send + Sync {
    /// Archive every descriptor and write the name -> hash mapping to
    /// `hashes_file`
    async fn archive(
        &self,
        descriptors: &[PathBuf],
        hashes_file: &Path,
        reporter: &dyn PipelineReporter,
    ) -> Result<(), ProcessError>;
}

/// Runs `isolate batcharchive`
#[derive(Debug, Clone)]
pub struct IsolateArchiver {
    program: PathBuf,
    server: String,
    timeout: Duration,
}

impl IsolateArchiver {
    pub fn new(program: impl Into<PathBuf>, server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            server: server.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.isolate_executable(),
            config.isolate_server.clone(),
            config.process_timeout(),
        )
    }

    fn invocation(&self, descriptors: &[PathBuf], hashes_file: &Path) -> ToolInvocation {
        let mut dump = std::ffi::OsString::from("--dump-json=");
        dump.push(hashes_file.as_os_str());

        ToolInvocation::new(&self.program, self.timeout)
            .arg("batcharchive")
            .arg(dump)
            .arg("--")
            .args(descriptors)
            .env(ISOLATE_SERVER_ENV, self.server.clone())
    }
}

#[async_trait::async_trait]
impl Archiver for IsolateArchiver {
    #[instrument(skip_all, fields(descriptors = descriptors.len()))]
    async fn archive(
        &self,
        descriptors: &[PathBuf],
        hashes_file: &Path,
        reporter: &dyn PipelineReporter,
    ) -> Result<(), ProcessError> {
        info!(
            program = %self.program.display(),
            server = %self.server,
            "archiving task descriptions"
        );
        self.invocation(descriptors, hashes_file).run(reporter).await
    }
}

/// Read the name -> hash mapping written by the archiver
pub fn read_hashes(path: &Path) -> Result<BTreeMap<String, String>, PipelineError> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::InvalidHashes {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::InvalidHashes {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
