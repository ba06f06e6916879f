//! Exit codes for the CLI

use grind_core::{GrindError, ProjectError};
use grind_tasks::PipelineError;

/// Success
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// No test class was selected
pub const NO_TESTS: i32 = 2;

/// Configuration error, including invalid class name patterns
pub const CONFIG_ERROR: i32 = 3;

/// Project structure or module selection error
pub const PROJECT_ERROR: i32 = 4;

/// An external tool failed or timed out
pub const EXTERNAL_PROCESS_ERROR: i32 = 5;

/// Interrupted by the user
pub const CANCELLED: i32 = 130;

/// Map a command error to the process exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<PipelineError>() {
        return match err {
            PipelineError::Core(core) => for_core(core),
            PipelineError::NoTestsFound { .. } => NO_TESTS,
            PipelineError::ArchiveFailed(_)
            | PipelineError::SubmitFailed(_)
            | PipelineError::InvalidHashes { .. } => EXTERNAL_PROCESS_ERROR,
            PipelineError::Interrupted => CANCELLED,
            PipelineError::Io(_) | PipelineError::Json(_) => ERROR,
        };
    }
    if let Some(err) = err.downcast_ref::<GrindError>() {
        return for_core(err);
    }
    ERROR
}

fn for_core(err: &GrindError) -> i32 {
    match err {
        GrindError::Config(_) => CONFIG_ERROR,
        GrindError::Project(ProjectError::InvalidPattern { .. }) => CONFIG_ERROR,
        GrindError::Project(_) => PROJECT_ERROR,
        _ => ERROR,
    }
}
