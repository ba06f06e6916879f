//! Project model: module selection and test class scanning

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::classfile::{ClassReader, FilterChain, CLASS_SUFFIX};
use crate::error::{ProjectError, Result};

use super::artifacts::{scan_artifacts, ArtifactKind};
use super::discovery::{discover_modules, normalize_root};
use super::module::Module;

/// Selection options for building a project model
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    /// Modules to include by name; `None` includes all
    pub include_modules: Option<Vec<String>>,
    /// Modules to drop from the included set by name
    pub exclude_modules: Vec<String>,
    /// Glob patterns a test class name must match
    pub include_patterns: Vec<String>,
    /// Glob patterns that veto a test class name
    pub exclude_patterns: Vec<String>,
}

impl ProjectOptions {
    /// Set the modules to include
    pub fn with_include_modules(mut self, modules: Vec<String>) -> Self {
        self.include_modules = Some(modules);
        self
    }

    /// Set the modules to exclude
    pub fn with_exclude_modules(mut self, modules: Vec<String>) -> Self {
        self.exclude_modules = modules;
        self
    }

    /// Set include patterns
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    /// Set exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }
}

/// The aggregate of all modules of a project and the selected test classes
#[derive(Debug)]
pub struct ProjectModel {
    root: PathBuf,
    modules: Vec<Module>,
    included: Vec<usize>,
}

impl ProjectModel {
    /// Discover modules only, without selecting or scanning test classes
    pub fn discover(root: &Path) -> Result<Self> {
        let root = normalize_root(root);
        let modules = discover_modules(&root)?;
        let included = (0..modules.len()).collect();
        Ok(Self {
            root,
            modules,
            included,
        })
    }

    /// Discover modules, apply module selection, scan included modules for
    /// test classes and collect artifacts.
    ///
    /// Missing modules are reported before any class file is read.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(root: &Path, options: &ProjectOptions, reader: &dyn ClassReader) -> Result<Self> {
        let filters = FilterChain::new(&options.include_patterns, &options.exclude_patterns)?;
        let mut model = Self::discover(root)?;

        model.included = select_modules(&model.modules, options)?;

        for &idx in &model.included {
            let module = &mut model.modules[idx];
            module.test_classes = scan_test_classes(module, &filters, reader);
        }

        let included: HashSet<usize> = model.included.iter().copied().collect();
        for (idx, module) in model.modules.iter_mut().enumerate() {
            for (path, kind) in scan_artifacts(&module.output_dir()) {
                match kind {
                    ArtifactKind::Test if included.contains(&idx) => {
                        module.test_artifacts.push(path)
                    }
                    ArtifactKind::Runtime => module.source_artifacts.push(path),
                    _ => {}
                }
            }
        }

        info!(
            modules = model.modules.len(),
            test_classes = model.test_class_count(),
            root = %model.root.display(),
            "found modules with test classes"
        );
        Ok(model)
    }

    /// Project root, always ending with a path separator
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All discovered modules
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Modules selected for test execution
    pub fn included_modules(&self) -> impl Iterator<Item = &Module> {
        self.included.iter().map(|&idx| &self.modules[idx])
    }

    /// Whether the named module is selected for test execution
    pub fn is_included(&self, name: &str) -> bool {
        self.included_modules().any(|m| m.name == name)
    }

    /// Total accepted test classes across all modules
    pub fn test_class_count(&self) -> usize {
        self.modules.iter().map(|m| m.test_classes.len()).sum()
    }
}

fn select_modules(modules: &[Module], options: &ProjectOptions) -> Result<Vec<usize>> {
    let mut included: Vec<usize> = match &options.include_modules {
        None => (0..modules.len()).collect(),
        Some(requested) => {
            let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
            let included: Vec<usize> = modules
                .iter()
                .enumerate()
                .filter(|(_, m)| wanted.contains(m.name.as_str()))
                .map(|(idx, _)| idx)
                .collect();

            let matched: HashSet<&str> = included
                .iter()
                .map(|&idx| modules[idx].name.as_str())
                .collect();
            let mut missing: Vec<String> = Vec::new();
            for name in requested {
                if !matched.contains(name.as_str()) && !missing.contains(name) {
                    missing.push(name.clone());
                }
            }
            if !missing.is_empty() {
                return Err(ProjectError::ModulesNotFound(missing).into());
            }
            included
        }
    };

    if !options.exclude_modules.is_empty() {
        for name in &options.exclude_modules {
            if !modules.iter().any(|m| &m.name == name) {
                warn!(module = %name, "excluded module not found");
            }
        }
        included.retain(|&idx| !options.exclude_modules.contains(&modules[idx].name));
    }

    debug!(
        included = included.len(),
        total = modules.len(),
        "selected modules"
    );
    Ok(included)
}

fn scan_test_classes(
    module: &Module,
    filters: &FilterChain,
    reader: &dyn ClassReader,
) -> Vec<crate::classfile::ClassDescriptor> {
    debug!(module = %module.name, root = %module.root.display(), "traversing module");
    let mut accepted = Vec::new();

    for entry in WalkDir::new(module.output_dir()).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(module = %module.name, error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(CLASS_SUFFIX) {
            continue;
        }

        let class = match reader.read(entry.path()) {
            Ok(class) => class,
            Err(e) => {
                warn!(error = %e, "skipping unreadable class file");
                continue;
            }
        };
        if filters.accept(&class) {
            accepted.push(class);
        }
    }

    accepted.sort_by(|a, b| a.class_name.cmp(&b.class_name));
    debug!(module = %module.name, accepted = accepted.len(), "scanned module");
    accepted
}
