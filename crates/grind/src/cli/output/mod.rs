//! Output formatting utilities

use std::time::Duration;

use console::{style, Style};
use grind_tasks::{PipelineEvent, PipelineReporter, Stage};
use indicatif::{ProgressBar, ProgressStyle};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Shows a spinner per pipeline stage and forwards everything to tracing.
///
/// Tool output and the kept working directory are printed above the
/// spinner instead of going through the console log filter.
pub struct SpinnerReporter {
    spinner: ProgressBar,
    inner: grind_tasks::TracingReporter,
    echo: Echo,
}

enum Echo {
    Stdout,
    #[cfg(test)]
    Capture(std::sync::Mutex<Vec<String>>),
}

impl SpinnerReporter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
            spinner.set_style(template);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner,
            inner: grind_tasks::TracingReporter,
            echo: Echo::Stdout,
        }
    }

    #[cfg(test)]
    fn capturing() -> Self {
        Self {
            spinner: ProgressBar::hidden(),
            inner: grind_tasks::TracingReporter,
            echo: Echo::Capture(std::sync::Mutex::default()),
        }
    }

    #[cfg(test)]
    fn captured(&self) -> Vec<String> {
        match &self.echo {
            Echo::Capture(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
            Echo::Stdout => Vec::new(),
        }
    }

    fn message(stage: Stage) -> &'static str {
        match stage {
            Stage::Discovery => "Scanning modules for test classes",
            Stage::Packaging => "Writing task descriptions",
            Stage::Archiving => "Archiving with isolate",
            Stage::Manifest => "Building task manifest",
            Stage::Submission => "Submitting to dist_test",
        }
    }

    /// Print a line above the spinner; works when the spinner is hidden too
    fn emit(&self, line: String) {
        match &self.echo {
            Echo::Stdout => self.spinner.suspend(|| println!("{}", line)),
            #[cfg(test)]
            Echo::Capture(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(line);
                }
            }
        }
    }

    /// Stop and clear the spinner
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

/// A line of external tool output, prefixed with the tool name
fn tool_line(tool: &str, line: &str, is_stderr: bool) -> String {
    let prefix = style(format!("[{}]", tool)).dim();
    if is_stderr {
        format!("{} {}", prefix, style(line).yellow())
    } else {
        format!("{} {}", prefix, line)
    }
}

impl Default for SpinnerReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineReporter for SpinnerReporter {
    fn report(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => {
                self.spinner.set_message(Self::message(*stage));
            }
            PipelineEvent::StageCompleted { stage, duration } => {
                self.emit(format!(
                    "{} {} {}",
                    style("✓").green().bold(),
                    Self::message(*stage),
                    style(format!("({:.1}s)", duration.as_secs_f64())).dim()
                ));
            }
            PipelineEvent::ToolOutput {
                tool,
                line,
                is_stderr,
            } => {
                self.emit(tool_line(tool, line, *is_stderr));
                tracing::debug!(tool = %tool, stderr = is_stderr, "{}", line);
                return;
            }
            PipelineEvent::WorkDirKept { path } => {
                self.emit(format!(
                    "{} Intermediate files kept in {}",
                    style("→").blue(),
                    path_style().apply_to(path.display())
                ));
                tracing::debug!(path = %path.display(), "intermediate files kept");
                return;
            }
            PipelineEvent::Finished { .. } => self.spinner.finish_and_clear(),
            PipelineEvent::StageSkipped { .. } => {}
        }
        self.inner.report(event);
    }
}

impl Drop for SpinnerReporter {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
