//! Error types for the task pipeline

use std::path::PathBuf;
use std::time::Duration;

use grind_core::GrindError;
use thiserror::Error;

/// Failures of an external tool invocation
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The tool could not be started
    #[error("Failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the tool failed
    #[error("Failed to wait on {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully
    #[error("{program} exited with {}", exit_label(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool did not finish in time and was killed
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Errors that abort the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Discovery, selection or configuration failure
    #[error(transparent)]
    Core(#[from] GrindError),

    /// The filter chain accepted no test classes anywhere
    #[error(
        "No tests found for project {} (include patterns: {:?}, exclude patterns: {:?})",
        .root.display(),
        .include_patterns,
        .exclude_patterns
    )]
    NoTestsFound {
        root: PathBuf,
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
    },

    /// The content-addressing service failed
    #[error("isolate batcharchive failed")]
    ArchiveFailed(#[source] ProcessError),

    /// The hash mapping could not be read
    #[error("Invalid hash mapping in {path}: {message}")]
    InvalidHashes { path: PathBuf, message: String },

    /// The submission client failed
    #[error("dist_test client submit failed")]
    SubmitFailed(#[source] ProcessError),

    /// The run was cancelled before it finished
    #[error("Interrupted")]
    Interrupted,

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = ProcessError::Failed {
            program: "isolate".to_string(),
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "isolate exited with code 1");

        let err = ProcessError::Failed {
            program: "isolate".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "isolate exited with a signal");
    }

    #[test]
    fn test_no_tests_found_reports_patterns() {
        let err = PipelineError::NoTestsFound {
            root: PathBuf::from("/work/project/"),
            include_patterns: vec!["com.acme.*".to_string()],
            exclude_patterns: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("/work/project/"));
        assert!(msg.contains("com.acme.*"));
    }

    #[test]
    fn test_tool_failure_chain_names_cause_once() {
        use std::error::Error as _;

        let err = PipelineError::ArchiveFailed(ProcessError::Failed {
            program: "isolate".to_string(),
            code: Some(1),
            stderr: String::new(),
        });
        assert_eq!(err.to_string(), "isolate batcharchive failed");
        let source = err.source().unwrap().to_string();
        assert_eq!(source, "isolate exited with code 1");

        let err = PipelineError::SubmitFailed(ProcessError::Spawn {
            program: "client.py".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(err.to_string(), "dist_test client submit failed");
        let spawn = err.source().unwrap();
        assert_eq!(spawn.to_string(), "Failed to spawn client.py");
        assert!(spawn.source().is_some());
    }

    #[test]
    fn test_timeout_display() {
        let err = ProcessError::Timeout {
            program: "client.py".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "client.py timed out after 30s");
    }
}
