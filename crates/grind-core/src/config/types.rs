//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::defaults::{
    DEFAULT_DIST_TEST_CLIENT_PATH, DEFAULT_ISOLATE_PATH, DEFAULT_ISOLATE_SERVER, DEFAULT_JAVA,
    DEFAULT_JUNIT_RUNNER, DEFAULT_PROCESS_TIMEOUT_SECS, DEFAULT_TASK_TIMEOUT_SECS,
};

/// Main configuration for grind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Isolate server endpoint, exported as `ISOLATE_SERVER` to subprocesses
    pub isolate_server: String,

    /// Path to the isolate binary
    pub isolate_path: String,

    /// Path to the dist_test client
    pub dist_test_client_path: String,

    /// Timeout written into every task record (seconds)
    pub task_timeout_secs: u64,

    /// Upper bound on each external tool invocation (seconds)
    pub process_timeout_secs: u64,

    /// Java launcher used in generated task commands
    pub java: String,

    /// JUnit runner main class used in generated task commands
    pub junit_runner: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            isolate_server: DEFAULT_ISOLATE_SERVER.to_string(),
            isolate_path: DEFAULT_ISOLATE_PATH.to_string(),
            dist_test_client_path: DEFAULT_DIST_TEST_CLIENT_PATH.to_string(),
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            process_timeout_secs: DEFAULT_PROCESS_TIMEOUT_SECS,
            java: DEFAULT_JAVA.to_string(),
            junit_runner: DEFAULT_JUNIT_RUNNER.to_string(),
        }
    }
}

impl Config {
    /// Resolved location of the isolate binary
    pub fn isolate_executable(&self) -> PathBuf {
        resolve_tool(&self.isolate_path)
    }

    /// Resolved location of the dist_test client
    pub fn client_executable(&self) -> PathBuf {
        resolve_tool(&self.dist_test_client_path)
    }

    /// Timeout applied to each external process
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Expand `~` and look bare command names up on `PATH`.
///
/// Names that cannot be found are returned unchanged so the spawn error names
/// the tool the user configured.
pub fn resolve_tool(path: &str) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.components().count() == 1 && !expanded.is_absolute() {
        match which::which(&expanded) {
            Ok(found) => {
                debug!(tool = path, resolved = %found.display(), "resolved tool on PATH");
                return found;
            }
            Err(_) => {
                debug!(tool = path, "tool not found on PATH");
            }
        }
    }
    expanded
}
