//! Submission bridge to the remote task queue

use std::path::{Path, PathBuf};
use std::time::Duration;

use grind_core::config::ISOLATE_SERVER_ENV;
use grind_core::Config;
use tracing::{info, instrument};

use crate::error::ProcessError;
use crate::process::ToolInvocation;
use crate::reporter::PipelineReporter;

/// Hands a task manifest to the remote queue
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        manifest: &Path,
        reporter: &dyn PipelineReporter,
    ) -> Result<(), ProcessError>;
}

/// Runs `<dist_test client> submit <manifest>`
#[derive(Debug, Clone)]
pub struct DistTestSubmitter {
    program: PathBuf,
    server: String,
    timeout: Duration,
}

impl DistTestSubmitter {
    pub fn new(program: impl Into<PathBuf>, server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            server: server.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.client_executable(),
            config.isolate_server.clone(),
            config.process_timeout(),
        )
    }

    fn invocation(&self, manifest: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program, self.timeout)
            .arg("submit")
            .arg(manifest)
            .env(ISOLATE_SERVER_ENV, self.server.clone())
    }
}

#[async_trait::async_trait]
impl Submitter for DistTestSubmitter {
    #[instrument(skip_all, fields(manifest = %manifest.display()))]
    async fn submit(
        &self,
        manifest: &Path,
        reporter: &dyn PipelineReporter,
    ) -> Result<(), ProcessError> {
        info!(program = %self.program.display(), "submitting task manifest");
        self.invocation(manifest).run(reporter).await
    }
}
