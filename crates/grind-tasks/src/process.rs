//! Timeout-bounded external tool invocation

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::ProcessError;
use crate::reporter::{PipelineEvent, PipelineReporter};

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// A single blocking call to an external tool
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
    timeout: Duration,
}

impl ToolInvocation {
    /// Create an invocation of `program` with the given timeout
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            timeout,
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable for the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// The program being invoked
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the program
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    fn label(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Run to completion, forwarding output lines to `reporter`.
    ///
    /// The child is killed if it outlives the timeout.
    pub async fn run(&self, reporter: &dyn PipelineReporter) -> Result<(), ProcessError> {
        let label = self.label();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %self.program.display(),
            args = self.args.len(),
            timeout_secs = self.timeout.as_secs(),
            "invoking tool"
        );

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = tokio::time::timeout(self.timeout, async {
            let (_, stderr_tail) = tokio::join!(
                forward_lines(stdout, &label, false, reporter),
                forward_lines(stderr, &label, true, reporter),
            );
            (child.wait().await, stderr_tail)
        })
        .await;

        let (status, stderr_tail) = match outcome {
            Ok(done) => done,
            Err(_) => {
                error!(program = %label, timeout_secs = self.timeout.as_secs(), "tool timed out");
                let _ = child.kill().await;
                return Err(ProcessError::Timeout {
                    program: label,
                    timeout: self.timeout,
                });
            }
        };

        let status = status.map_err(|source| ProcessError::Wait {
            program: label.clone(),
            source,
        })?;

        if status.success() {
            debug!(program = %label, "tool finished");
            Ok(())
        } else {
            error!(program = %label, exit_code = status.code(), "tool failed");
            Err(ProcessError::Failed {
                program: label,
                code: status.code(),
                stderr: stderr_tail.into_iter().collect::<Vec<_>>().join("\n"),
            })
        }
    }
}

/// Forward each line to the reporter; keep the last few lines
async fn forward_lines<R>(
    stream: Option<R>,
    tool: &str,
    is_stderr: bool,
    reporter: &dyn PipelineReporter,
) -> VecDeque<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let Some(stream) = stream else {
        return tail;
    };

    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        reporter.report(&PipelineEvent::ToolOutput {
            tool: tool.to_string(),
            line: line.clone(),
            is_stderr,
        });
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail
}
