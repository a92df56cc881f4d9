//! Public output types for rewrite runs.
//!
//! These are part of the library API and are serialized as-is by the CLI.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::matcher::Reference;

/// Overall status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Unchanged,
    WouldChange,
    Rewritten,
    Failed,
}

/// A per-file failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub path: PathBuf,
    pub code: String,
    pub reason: String,
}

/// Per-file detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub replacements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// Located replacements; filled for dry runs only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

/// Summary of a rewrite run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub dry_run: bool,
    /// Files rewritten, or that would be rewritten in a dry run.
    pub changed_files: usize,
    pub unchanged_files: usize,
    pub errors: Vec<FileError>,
    pub files: Vec<FileReport>,
    /// Files skipped because the run was cancelled before they started.
    pub not_started: usize,
    pub cancelled: bool,
}

impl RunResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn record_changed(
        &mut self,
        path: PathBuf,
        replacements: usize,
        backup: Option<PathBuf>,
        references: Vec<Reference>,
    ) {
        self.changed_files += 1;
        let status = if self.dry_run {
            FileStatus::WouldChange
        } else {
            FileStatus::Rewritten
        };
        self.files.push(FileReport {
            path,
            status,
            replacements,
            backup,
            references,
        });
    }

    pub fn record_unchanged(&mut self, path: PathBuf) {
        self.unchanged_files += 1;
        self.files.push(FileReport {
            path,
            status: FileStatus::Unchanged,
            replacements: 0,
            backup: None,
            references: Vec::new(),
        });
    }

    pub fn record_error(&mut self, path: &Path, error: &Error) {
        self.errors.push(FileError {
            path: path.to_path_buf(),
            code: error.code.as_str().to_string(),
            reason: error.message.clone(),
        });
        self.files.push(FileReport {
            path: path.to_path_buf(),
            status: FileStatus::Failed,
            replacements: 0,
            backup: None,
            references: Vec::new(),
        });
    }

    pub fn record_not_started(&mut self) {
        self.not_started += 1;
    }

    /// True when no file failed and the run was not cancelled.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }

    pub fn status(&self) -> RunStatus {
        if self.cancelled {
            RunStatus::Cancelled
        } else if self.errors.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure
        }
    }
}
