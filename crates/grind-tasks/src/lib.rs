//! grind tasks - from selected test classes to submitted tasks
//!
//! Packages each selected test class into a task description, archives the
//! descriptions through `isolate`, turns the resulting hashes into a task
//! manifest and hands it to the `dist_test` client.

pub mod archive;
pub mod error;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod process;
pub mod reporter;
pub mod submit;

pub use archive::{read_hashes, Archiver, IsolateArchiver};
pub use error::{PipelineError, ProcessError};
pub use manifest::{hashes_to_manifest, TaskDescription, TaskManifest};
pub use package::{PackagedTest, TaskPackager};
pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome};
pub use process::ToolInvocation;
pub use reporter::{CollectingReporter, PipelineEvent, PipelineReporter, Stage, TracingReporter};
pub use submit::{DistTestSubmitter, Submitter};
