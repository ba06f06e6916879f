//! End-to-end pipeline: discovery, packaging, archiving, manifest, submission
//!
//! All intermediate files live in a scoped temporary working directory that
//! is removed when the pipeline returns, on success and on error alike,
//! unless the caller asks to keep it or the run is interrupted.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use grind_core::{ClassReader, ClassfileReader, Config, ProjectModel, ProjectOptions};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::archive::{Archiver, IsolateArchiver};
use crate::error::PipelineError;
use crate::manifest::{hashes_to_manifest, TaskManifest};
use crate::package::TaskPackager;
use crate::reporter::{PipelineEvent, PipelineReporter, Stage, TracingReporter};
use crate::submit::{DistTestSubmitter, Submitter};

/// File the archiver writes its name -> hash mapping to
pub const HASHES_FILE: &str = "hashes.json";

/// File the task manifest is written to
pub const MANIFEST_FILE: &str = "run.json";

const WORK_DIR_PREFIX: &str = "grind.";

/// Options for a single pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Module and test class selection
    pub project: ProjectOptions,
    /// Build the manifest but do not submit it
    pub dry_run: bool,
    /// Keep the working directory after the run
    pub leak_temp: bool,
    /// Parent of the working directory; the system temp dir when unset
    pub temp_root: Option<PathBuf>,
}

/// Result of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Modules discovered under the project root
    pub modules: usize,
    /// The manifest that was built
    pub manifest: TaskManifest,
    /// Whether the manifest was handed to the submission client
    pub submitted: bool,
    /// Location of the kept working directory, when leaking
    pub work_dir: Option<PathBuf>,
}

/// Scoped working directory
enum WorkDir {
    Scoped(TempDir),
    Leaked(PathBuf),
}

impl WorkDir {
    fn create(temp_root: Option<&Path>, leak: bool) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let dir = match temp_root {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        if leak {
            let path = dir.keep();
            debug!(path = %path.display(), "keeping temporary directory");
            Ok(Self::Leaked(path))
        } else {
            Ok(Self::Scoped(dir))
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Scoped(dir) => dir.path(),
            Self::Leaked(path) => path,
        }
    }

    fn leaked(&self) -> Option<PathBuf> {
        match self {
            Self::Scoped(_) => None,
            Self::Leaked(path) => Some(path.clone()),
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Self::Leaked(path) = self {
            info!(path = %path.display(), "intermediate files left in temporary directory");
        }
    }
}

/// Runs the stages in order against one project
pub struct Pipeline<'a> {
    config: &'a Config,
    reader: Box<dyn ClassReader>,
    archiver: Box<dyn Archiver>,
    submitter: Box<dyn Submitter>,
    reporter: Arc<dyn PipelineReporter>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline backed by the real class reader and external tools
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            reader: Box::new(ClassfileReader::new()),
            archiver: Box::new(IsolateArchiver::from_config(config)),
            submitter: Box::new(DistTestSubmitter::from_config(config)),
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reader(mut self, reader: impl ClassReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn with_archiver(mut self, archiver: impl Archiver + 'static) -> Self {
        self.archiver = Box::new(archiver);
        self
    }

    pub fn with_submitter(mut self, submitter: impl Submitter + 'static) -> Self {
        self.submitter = Box::new(submitter);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn PipelineReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run like [`Pipeline::run`] until `interrupt` completes.
    ///
    /// On interruption the in-flight stage is dropped. That kills a running
    /// tool and removes the working directory unless it is being kept.
    pub async fn run_until<F>(
        &self,
        root: &Path,
        options: &PipelineOptions,
        interrupt: F,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run(root, options) => result,
            () = interrupt => {
                warn!(root = %root.display(), "pipeline interrupted");
                Err(PipelineError::Interrupted)
            }
        }
    }

    /// Run every stage against the project at `root`.
    ///
    /// Fails before archiving when no test class was selected. Nothing is
    /// submitted unless every earlier stage succeeded.
    #[instrument(skip_all, fields(root = %root.display(), dry_run = options.dry_run))]
    pub async fn run(
        &self,
        root: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();
        let work_dir = WorkDir::create(options.temp_root.as_deref(), options.leak_temp)?;
        let work = work_dir.path();
        if let Some(path) = work_dir.leaked() {
            self.reporter.report(&PipelineEvent::WorkDirKept { path });
        }

        let timer = self.begin(Stage::Discovery);
        let model = ProjectModel::load(root, &options.project, self.reader.as_ref())?;
        self.end(Stage::Discovery, timer);

        let timer = self.begin(Stage::Packaging);
        let packaged = TaskPackager::new(self.config).package(&model, work)?;
        self.end(Stage::Packaging, timer);

        if packaged.is_empty() {
            return Err(PipelineError::NoTestsFound {
                root: model.root().to_path_buf(),
                include_patterns: options.project.include_patterns.clone(),
                exclude_patterns: options.project.exclude_patterns.clone(),
            });
        }

        let timer = self.begin(Stage::Archiving);
        let descriptors: Vec<PathBuf> = packaged.iter().map(|p| p.gen_file.clone()).collect();
        let hashes_file = work.join(HASHES_FILE);
        self.archiver
            .archive(&descriptors, &hashes_file, self.reporter.as_ref())
            .await
            .map_err(PipelineError::ArchiveFailed)?;
        self.end(Stage::Archiving, timer);

        let timer = self.begin(Stage::Manifest);
        let manifest_file = work.join(MANIFEST_FILE);
        let manifest =
            hashes_to_manifest(&hashes_file, &manifest_file, self.config.task_timeout_secs)?;
        self.end(Stage::Manifest, timer);

        let submitted = if options.dry_run {
            self.reporter.report(&PipelineEvent::StageSkipped {
                stage: Stage::Submission,
                reason: "dry run".to_string(),
            });
            false
        } else {
            let timer = self.begin(Stage::Submission);
            self.submitter
                .submit(&manifest_file, self.reporter.as_ref())
                .await
                .map_err(PipelineError::SubmitFailed)?;
            self.end(Stage::Submission, timer);
            true
        };

        self.reporter.report(&PipelineEvent::Finished {
            tasks: manifest.len(),
            submitted,
            duration: started.elapsed(),
        });

        Ok(PipelineOutcome {
            modules: model.modules().len(),
            manifest,
            submitted,
            work_dir: work_dir.leaked(),
        })
    }

    fn begin(&self, stage: Stage) -> Instant {
        self.reporter.report(&PipelineEvent::StageStarted { stage });
        Instant::now()
    }

    fn end(&self, stage: Stage, started: Instant) {
        self.reporter.report(&PipelineEvent::StageCompleted {
            stage,
            duration: started.elapsed(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::reporter::CollectingReporter;
    use grind_core::classfile::fixtures::{write_class, write_module};
    use grind_core::{ClassDescriptor, ClassfileError, GrindError, ProjectError};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    const GEN_SUFFIX: &str = ".isolated.gen.json";

    /// Writes a fake hash per descriptor
    #[derive(Clone, Default)]
    struct FakeArchiver {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Archiver for FakeArchiver {
        async fn archive(
            &self,
            descriptors: &[PathBuf],
            hashes_file: &Path,
            _reporter: &dyn PipelineReporter,
        ) -> Result<(), ProcessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let hashes: BTreeMap<String, String> = descriptors
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let file = path.file_name().unwrap().to_string_lossy();
                    let name = file.trim_end_matches(GEN_SUFFIX).to_string();
                    (name, format!("{:040x}", i + 1))
                })
                .collect();
            std::fs::write(hashes_file, serde_json::to_vec(&hashes).unwrap()).unwrap();
            Ok(())
        }
    }

    /// Signals once archiving starts, then never finishes
    #[derive(Clone, Default)]
    struct StalledArchiver {
        started: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl Archiver for StalledArchiver {
        async fn archive(
            &self,
            _descriptors: &[PathBuf],
            _hashes_file: &Path,
            _reporter: &dyn PipelineReporter,
        ) -> Result<(), ProcessError> {
            self.started.notify_one();
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeSubmitter {
        calls: Arc<AtomicUsize>,
        manifests: Arc<std::sync::Mutex<Vec<TaskManifest>>>,
    }

    #[async_trait::async_trait]
    impl Submitter for FakeSubmitter {
        async fn submit(
            &self,
            manifest: &Path,
            _reporter: &dyn PipelineReporter,
        ) -> Result<(), ProcessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let manifest = TaskManifest::read(manifest).unwrap();
            self.manifests.lock().unwrap().push(manifest);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingReader {
        reads: Arc<AtomicUsize>,
    }

    impl ClassReader for CountingReader {
        fn read(&self, path: &Path) -> Result<ClassDescriptor, ClassfileError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            ClassfileReader::new().read(path)
        }
    }

    /// Project with modules `core` (com.acme) and `tools` (org.tools)
    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_module(root);

        let core = root.join("core");
        write_module(&core);
        let classes = core.join("target/test-classes");
        write_class(&classes, "com.acme.WidgetTest", 0x0021);
        write_class(&classes, "com.acme.Widget", 0x0021);
        std::fs::write(core.join("target/core-1.0.jar"), "").unwrap();

        let tools = root.join("tools");
        write_module(&tools);
        write_class(&tools.join("target/test-classes"), "org.tools.CliTest", 0x0021);
        std::fs::write(tools.join("target/tools-1.0.jar"), "").unwrap();

        temp
    }

    fn options(temp_root: &TempDir) -> PipelineOptions {
        PipelineOptions {
            temp_root: Some(temp_root.path().to_path_buf()),
            ..PipelineOptions::default()
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    fn descriptions(manifest: &TaskManifest) -> Vec<&str> {
        manifest.tasks.iter().map(|t| t.description.as_str()).collect()
    }

    #[tokio::test]
    async fn test_full_run_submits_manifest() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let submitter = FakeSubmitter::default();
        let reporter = Arc::new(CollectingReporter::default());

        let outcome = Pipeline::new(&config)
            .with_archiver(FakeArchiver::default())
            .with_submitter(submitter.clone())
            .with_reporter(reporter.clone())
            .run(project.path(), &options(&scratch))
            .await
            .unwrap();

        assert!(outcome.submitted);
        assert_eq!(outcome.modules, 3);
        assert_eq!(
            descriptions(&outcome.manifest),
            vec!["com.acme.WidgetTest", "org.tools.CliTest"]
        );
        assert!(outcome.manifest.tasks.iter().all(|t| t.timeout == 300));
        assert_eq!(submitter.manifests.lock().unwrap()[0], outcome.manifest);
        assert_eq!(
            reporter.started_stages(),
            vec![
                Stage::Discovery,
                Stage::Packaging,
                Stage::Archiving,
                Stage::Manifest,
                Stage::Submission,
            ]
        );
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_include_pattern_selects_matching_module() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let mut opts = options(&scratch);
        opts.project = ProjectOptions::default()
            .with_include_patterns(vec!["com.acme.*Test".to_string()]);

        let outcome = Pipeline::new(&config)
            .with_archiver(FakeArchiver::default())
            .with_submitter(FakeSubmitter::default())
            .run(project.path(), &opts)
            .await
            .unwrap();

        assert_eq!(descriptions(&outcome.manifest), vec!["com.acme.WidgetTest"]);
    }

    #[tokio::test]
    async fn test_no_tests_found_reports_patterns() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let archiver = FakeArchiver::default();
        let submitter = FakeSubmitter::default();
        let mut opts = options(&scratch);
        opts.project = ProjectOptions::default()
            .with_include_patterns(vec!["net.nothing.*".to_string()])
            .with_exclude_patterns(vec!["*Slow*".to_string()]);

        let err = Pipeline::new(&config)
            .with_archiver(archiver.clone())
            .with_submitter(submitter.clone())
            .run(project.path(), &opts)
            .await
            .unwrap_err();

        match err {
            PipelineError::NoTestsFound {
                include_patterns,
                exclude_patterns,
                ..
            } => {
                assert_eq!(include_patterns, vec!["net.nothing.*"]);
                assert_eq!(exclude_patterns, vec!["*Slow*"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(archiver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_module_fails_without_reading_classes() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let reader = CountingReader::default();
        let mut opts = options(&scratch);
        opts.project =
            ProjectOptions::default().with_include_modules(vec!["core".into(), "ghost".into()]);

        let err = Pipeline::new(&config)
            .with_reader(reader.clone())
            .with_archiver(FakeArchiver::default())
            .with_submitter(FakeSubmitter::default())
            .run(project.path(), &opts)
            .await
            .unwrap_err();

        match err {
            PipelineError::Core(GrindError::Project(ProjectError::ModulesNotFound(missing))) => {
                assert_eq!(missing, vec!["ghost"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dry_run_writes_manifest_without_submitting() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let submitter = FakeSubmitter::default();
        let reporter = Arc::new(CollectingReporter::default());
        let mut opts = options(&scratch);
        opts.dry_run = true;
        opts.leak_temp = true;

        let outcome = Pipeline::new(&config)
            .with_archiver(FakeArchiver::default())
            .with_submitter(submitter.clone())
            .with_reporter(reporter.clone())
            .run(project.path(), &opts)
            .await
            .unwrap();

        assert!(!outcome.submitted);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
        assert!(reporter.events().iter().any(|e| matches!(
            e,
            PipelineEvent::StageSkipped {
                stage: Stage::Submission,
                ..
            }
        )));

        let work = outcome.work_dir.unwrap();
        assert!(work.starts_with(scratch.path()));
        let written = TaskManifest::read(&work.join(MANIFEST_FILE)).unwrap();
        assert_eq!(written, outcome.manifest);
        assert_eq!(written.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_archiver_removes_work_dir() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config {
            isolate_path: "false".to_string(),
            ..Config::default()
        };
        let submitter = FakeSubmitter::default();

        let err = Pipeline::new(&config)
            .with_submitter(submitter.clone())
            .run(project.path(), &options(&scratch))
            .await
            .unwrap_err();

        match err {
            PipelineError::ArchiveFailed(ProcessError::Failed { code, .. }) => {
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_archiver_keeps_leaked_work_dir() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config {
            isolate_path: "false".to_string(),
            ..Config::default()
        };
        let mut opts = options(&scratch);
        opts.leak_temp = true;

        let err = Pipeline::new(&config)
            .with_submitter(FakeSubmitter::default())
            .run(project.path(), &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ArchiveFailed(_)));
        assert_eq!(entries(scratch.path()), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_run_reports_kept_work_dir() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config {
            isolate_path: "false".to_string(),
            ..Config::default()
        };
        let reporter = Arc::new(CollectingReporter::default());
        let mut opts = options(&scratch);
        opts.leak_temp = true;

        let err = Pipeline::new(&config)
            .with_submitter(FakeSubmitter::default())
            .with_reporter(reporter.clone())
            .run(project.path(), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ArchiveFailed(_)));

        let kept: Vec<PathBuf> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::WorkDirKept { path } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(kept.len(), 1);
        assert!(kept[0].is_dir());
        assert!(kept[0].starts_with(scratch.path()));
    }

    #[tokio::test]
    async fn test_scoped_run_does_not_report_work_dir() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let reporter = Arc::new(CollectingReporter::default());

        Pipeline::new(&config)
            .with_archiver(FakeArchiver::default())
            .with_submitter(FakeSubmitter::default())
            .with_reporter(reporter.clone())
            .run(project.path(), &options(&scratch))
            .await
            .unwrap();

        assert!(!reporter
            .events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::WorkDirKept { .. })));
    }

    #[tokio::test]
    async fn test_interrupt_removes_work_dir() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let archiver = StalledArchiver::default();
        let submitter = FakeSubmitter::default();
        let started = archiver.started.clone();

        let err = Pipeline::new(&config)
            .with_archiver(archiver)
            .with_submitter(submitter.clone())
            .run_until(project.path(), &options(&scratch), async move {
                started.notified().await;
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Interrupted));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_interrupt_keeps_leaked_work_dir() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();
        let archiver = StalledArchiver::default();
        let started = archiver.started.clone();
        let mut opts = options(&scratch);
        opts.leak_temp = true;

        let err = Pipeline::new(&config)
            .with_archiver(archiver)
            .with_submitter(FakeSubmitter::default())
            .run_until(project.path(), &opts, async move {
                started.notified().await;
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Interrupted));
        assert_eq!(entries(scratch.path()), 1);
    }

    #[tokio::test]
    async fn test_run_until_without_interrupt_completes() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let config = Config::default();

        let outcome = Pipeline::new(&config)
            .with_archiver(FakeArchiver::default())
            .with_submitter(FakeSubmitter::default())
            .run_until(project.path(), &options(&scratch), std::future::pending::<()>())
            .await
            .unwrap();

        assert!(outcome.submitted);
        assert_eq!(entries(scratch.path()), 0);
    }
}
