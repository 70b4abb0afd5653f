//! Manifest discovery and the scan lifecycle.
//!
//! A [`ManifestStore`] owns nothing but a directory path: the manifest files
//! themselves are externally owned and only ever read. Every scan folds each
//! `*.json` file into either a validated project or a diagnostic; a bad file
//! never aborts the rest of the scan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::manifest::{ManifestError, ManifestValidator, RawManifest};
use crate::models::Project;

/// Whether a diagnostic rejected its file or merely degraded a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The file was rejected and is absent from the project set.
    Error,
    /// The file was accepted with a degraded or dropped value.
    Warning,
}

/// A recorded reason a manifest file or field was rejected.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub severity: Severity,
    pub error: ManifestError,
}

impl Diagnostic {
    fn error(path: &Path, error: ManifestError) -> Self {
        Self {
            path: path.to_path_buf(),
            severity: Severity::Error,
            error,
        }
    }

    fn warning(path: &Path, error: ManifestError) -> Self {
        Self {
            path: path.to_path_buf(),
            severity: Severity::Warning,
            error,
        }
    }
}

/// One complete scan outcome.
///
/// Built fully off to the side during a reload and published in a single
/// pointer swap, so a reader holding an `Arc` to one of these always sees a
/// consistent pairing of projects and diagnostics.
#[derive(Debug, Default)]
pub struct ScanResult {
    projects: BTreeMap<String, Project>,
    diagnostics: Vec<Diagnostic>,
}

impl ScanResult {
    /// Valid projects in ascending-id order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Totals for one reload, for logging and the reload response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReloadSummary {
    pub projects: usize,
    pub rejected: usize,
    pub warnings: usize,
}

/// Scans a directory of JSON manifests into validated projects.
///
/// Readers racing a [`reload`](ManifestStore::reload) see either the prior
/// complete scan or the new one, never a mix.
pub struct ManifestStore {
    dir: PathBuf,
    validator: ManifestValidator,
    inner: RwLock<Arc<ScanResult>>,
}

impl ManifestStore {
    /// Create a store without scanning. [`reload`](Self::reload) performs
    /// the first scan.
    pub fn open(dir: impl Into<PathBuf>, validator: ManifestValidator) -> Self {
        Self {
            dir: dir.into(),
            validator,
            inner: RwLock::new(Arc::new(ScanResult::default())),
        }
    }

    /// Open and run the initial scan.
    pub fn load(dir: impl Into<PathBuf>, validator: ManifestValidator) -> Result<Self> {
        let store = Self::open(dir, validator);
        store.reload()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The current complete scan. Cheap; clones an `Arc`.
    pub fn current(&self) -> Arc<ScanResult> {
        self.inner.read().expect("store lock poisoned").clone()
    }

    /// Current valid project set, ascending by id.
    pub fn projects(&self) -> Vec<Project> {
        self.current().projects().cloned().collect()
    }

    pub fn project(&self, id: &str) -> Option<Project> {
        self.current().project(id).cloned()
    }

    /// Current diagnostics list. Ordering follows file discovery order and
    /// is not guaranteed stable across platforms.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.current().diagnostics().to_vec()
    }

    /// Rescan the directory and atomically replace the published result.
    ///
    /// Per-file failures become diagnostics. The only hard error is a
    /// manifest directory that cannot be read at all, which is a
    /// precondition of the whole engine rather than a property of any one
    /// record.
    pub fn reload(&self) -> Result<ReloadSummary> {
        let result = self.scan()?;
        let summary = ReloadSummary {
            projects: result.projects.len(),
            rejected: result
                .diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count(),
            warnings: result
                .diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Warning)
                .count(),
        };

        *self.inner.write().expect("store lock poisoned") = Arc::new(result);

        tracing::info!(
            dir = %self.dir.display(),
            projects = summary.projects,
            rejected = summary.rejected,
            warnings = summary.warnings,
            "manifest scan complete"
        );
        Ok(summary)
    }

    fn scan(&self) -> Result<ScanResult> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("cannot read manifest directory {}", self.dir.display()))?;

        let mut result = ScanResult::default();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("cannot read manifest directory {}", self.dir.display())
            })?;
            let path = entry.path();
            if is_manifest(&path) {
                self.scan_file(&path, &mut result);
            }
        }
        Ok(result)
    }

    fn scan_file(&self, path: &Path, result: &mut ScanResult) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable manifest");
                result
                    .diagnostics
                    .push(Diagnostic::error(path, ManifestError::Parse(e.to_string())));
                return;
            }
        };

        // Malformed JSON is a parse error; well-formed JSON of the wrong
        // shape is a schema violation.
        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unparseable manifest");
                result
                    .diagnostics
                    .push(Diagnostic::error(path, ManifestError::Parse(e.to_string())));
                return;
            }
        };
        let raw: RawManifest = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping misshapen manifest");
                result.diagnostics.push(Diagnostic::error(
                    path,
                    ManifestError::Schema(format!("invalid manifest shape: {e}")),
                ));
                return;
            }
        };

        match self.validator.validate(raw, path) {
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "rejected manifest");
                result.diagnostics.push(Diagnostic::error(path, e));
            }
            Ok((project, warnings)) => {
                for warning in warnings {
                    tracing::warn!(file = %path.display(), warning = %warning, "degraded manifest value");
                    result.diagnostics.push(Diagnostic::warning(path, warning));
                }
                if result.projects.contains_key(&project.id) {
                    // Discovery order is not stable across platforms, so a
                    // duplicate id is an operator error to fix, not a merge.
                    tracing::warn!(file = %path.display(), id = %project.id, "duplicate project id");
                    result.diagnostics.push(Diagnostic::error(
                        path,
                        ManifestError::DuplicateId(project.id),
                    ));
                } else {
                    result.projects.insert(project.id.clone(), project);
                }
            }
        }
    }
}

fn is_manifest(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
