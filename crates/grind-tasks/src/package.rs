//! Packaging coordinator
//!
//! Writes one task description per selected test class. Each test gets an
//! `.isolate` file listing the files it needs plus the JUnit launch command,
//! and an `.isolated.gen.json` file that the archiving service consumes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use grind_core::{ClassDescriptor, Config, Module, ProjectModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::PipelineError;

/// Separator between classpath entries in the generated command
pub const CLASSPATH_SEPARATOR: &str = ":";

/// Compiled output directories shipped with a module's tests, when present
const COMPILED_DIRS: [&str; 2] = ["test-classes", "classes"];

/// `.isolate` file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolateFile {
    pub variables: IsolateVariables,
}

/// Variables section of an `.isolate` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolateVariables {
    /// Command line run remotely
    pub command: Vec<String>,
    /// Files relative to the project root; directories end with `/`
    pub files: Vec<String>,
}

/// `.isolated.gen.json` file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolatedGenFile {
    pub version: u32,
    pub dir: String,
    pub args: Vec<String>,
}

/// A test class that has been packaged into a task description
#[derive(Debug, Clone)]
pub struct PackagedTest {
    /// Logical task name
    pub name: String,
    /// Generated `.isolate` file
    pub isolate_file: PathBuf,
    /// Generated `.isolated.gen.json` file, the input of the archiver
    pub gen_file: PathBuf,
}

/// Builds task descriptions for every selected test class
#[derive(Debug, Clone)]
pub struct TaskPackager {
    java: String,
    junit_runner: String,
}

impl TaskPackager {
    /// Create a packager using the launcher and runner from `config`
    pub fn new(config: &Config) -> Self {
        Self {
            java: config.java.clone(),
            junit_runner: config.junit_runner.clone(),
        }
    }

    /// Write task descriptions into `work_dir`, one per selected test class.
    ///
    /// Tests are visited module by module, in discovery order.
    #[instrument(skip_all, fields(root = %model.root().display()))]
    pub fn package(
        &self,
        model: &ProjectModel,
        work_dir: &Path,
    ) -> Result<Vec<PackagedTest>, PipelineError> {
        let mut used_names: HashSet<String> = HashSet::new();
        let mut packaged = Vec::new();

        for module in model.included_modules() {
            if module.test_classes.is_empty() {
                continue;
            }
            let files = module_files(model, module);
            debug!(
                module = %module.name,
                tests = module.test_classes.len(),
                files = files.len(),
                "packaging module"
            );

            for class in &module.test_classes {
                let name = unique_name(&mut used_names, class, module);
                packaged.push(self.write_task(model.root(), work_dir, &name, class, &files)?);
            }
        }

        info!(tasks = packaged.len(), "generated task descriptions");
        Ok(packaged)
    }

    fn write_task(
        &self,
        root: &Path,
        work_dir: &Path,
        name: &str,
        class: &ClassDescriptor,
        files: &[String],
    ) -> Result<PackagedTest, PipelineError> {
        let isolate_file = work_dir.join(format!("{}.isolate", name));
        let isolated_file = work_dir.join(format!("{}.isolated", name));
        let gen_file = work_dir.join(format!("{}.isolated.gen.json", name));

        let isolate = IsolateFile {
            variables: IsolateVariables {
                command: self.command(files, &class.class_name),
                files: files.to_vec(),
            },
        };
        std::fs::write(&isolate_file, serde_json::to_vec_pretty(&isolate)?)?;

        let gen = IsolatedGenFile {
            version: 1,
            dir: root.display().to_string(),
            args: vec![
                "-i".to_string(),
                isolate_file.display().to_string(),
                "-s".to_string(),
                isolated_file.display().to_string(),
            ],
        };
        std::fs::write(&gen_file, serde_json::to_vec_pretty(&gen)?)?;

        Ok(PackagedTest {
            name: name.to_string(),
            isolate_file,
            gen_file,
        })
    }

    fn command(&self, files: &[String], class_name: &str) -> Vec<String> {
        vec![
            self.java.clone(),
            "-cp".to_string(),
            files.join(CLASSPATH_SEPARATOR),
            self.junit_runner.clone(),
            class_name.to_string(),
        ]
    }
}

/// Files a test of `module` needs, relative to the project root.
///
/// Order: the module's compiled output, its own runtime jars, the runtime
/// jars of every other module, then the test jars of included modules.
fn module_files(model: &ProjectModel, module: &Module) -> Vec<String> {
    let root = model.root();
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    let mut push = |entry: String| {
        if seen.insert(entry.clone()) {
            files.push(entry);
        }
    };

    for dir in COMPILED_DIRS {
        let path = module.output_dir().join(dir);
        if path.is_dir() {
            push(relative_dir(root, &path));
        }
    }
    for jar in &module.source_artifacts {
        push(relative(root, jar));
    }
    for other in model.modules().iter().filter(|m| m.root != module.root) {
        for jar in &other.source_artifacts {
            push(relative(root, jar));
        }
    }
    for included in model.included_modules() {
        for jar in &included.test_artifacts {
            push(relative(root, jar));
        }
    }
    files
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn relative_dir(root: &Path, path: &Path) -> String {
    let mut rel = relative(root, path);
    if !rel.ends_with('/') {
        rel.push('/');
    }
    rel
}

/// Fully-qualified name, suffixed with `@module` when already taken
fn unique_name(used: &mut HashSet<String>, class: &ClassDescriptor, module: &Module) -> String {
    let base = class.class_name.clone();
    if used.insert(base.clone()) {
        return base;
    }

    let qualified = format!("{}@{}", base, module.name);
    let mut candidate = qualified.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}.{}", qualified, n);
        n += 1;
    }
    debug!(class = %base, name = %candidate, "renamed colliding test");
    candidate
}
