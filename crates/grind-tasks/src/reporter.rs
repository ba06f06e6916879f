//! Pipeline progress reporting

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Module discovery and test class selection
    Discovery,
    /// Writing one task description per test
    Packaging,
    /// Content-addressing the task descriptions
    Archiving,
    /// Turning hashes into the task manifest
    Manifest,
    /// Handing the manifest to the remote queue
    Submission,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Packaging => write!(f, "packaging"),
            Self::Archiving => write!(f, "archiving"),
            Self::Manifest => write!(f, "manifest"),
            Self::Submission => write!(f, "submission"),
        }
    }
}

/// Events emitted while the pipeline runs
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage is starting
    StageStarted { stage: Stage },
    /// A stage finished
    StageCompleted { stage: Stage, duration: Duration },
    /// A stage was skipped on purpose (e.g. submission on dry run)
    StageSkipped { stage: Stage, reason: String },
    /// The working directory will outlive the run
    WorkDirKept { path: PathBuf },
    /// An external tool produced a line of output
    ToolOutput {
        tool: String,
        line: String,
        is_stderr: bool,
    },
    /// The pipeline finished successfully
    Finished {
        tasks: usize,
        submitted: bool,
        duration: Duration,
    },
}

/// Trait for reporting pipeline progress
pub trait PipelineReporter: Send + Sync {
    /// Handle a pipeline event
    fn report(&self, event: &PipelineEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl PipelineReporter for TracingReporter {
    fn report(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => {
                tracing::debug!("Starting {}", stage);
            }
            PipelineEvent::StageCompleted { stage, duration } => {
                tracing::debug!("{} completed in {:.1}s", stage, duration.as_secs_f64());
            }
            PipelineEvent::StageSkipped { stage, reason } => {
                tracing::info!("{} skipped: {}", stage, reason);
            }
            PipelineEvent::WorkDirKept { path } => {
                tracing::warn!(path = %path.display(), "intermediate files kept");
            }
            PipelineEvent::ToolOutput {
                tool,
                line,
                is_stderr,
            } => {
                if *is_stderr {
                    tracing::warn!("[{}] {}", tool, line);
                } else {
                    tracing::info!("[{}] {}", tool, line);
                }
            }
            PipelineEvent::Finished {
                tasks,
                submitted,
                duration,
            } => {
                tracing::info!(
                    "Finished: {} tasks, submitted: {} ({:.1}s)",
                    tasks,
                    submitted,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: std::sync::Mutex<Vec<PipelineEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Stages that were started, in order
    pub fn started_stages(&self) -> Vec<Stage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::StageStarted { stage } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl PipelineReporter for CollectingReporter {
    fn report(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
