//! Walks targets, rewrites each file and aggregates outcomes.
//!
//! Per file: read, match, rewrite, then back up and commit unless this is a
//! dry run. A failing file is recorded and the run moves on.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::commit::{self, FileTask, Mode, Outcome};
use crate::defaults::Settings;
use crate::error::{Error, Result};
use crate::local_files::FileSystem;
use crate::matcher::{self, Direction, Reference};
use crate::name_map::NameMap;
use crate::output::RunResult;
use crate::rewriter;
use crate::walker::{self, WalkRules};

/// Backup stamp format, local time.
pub const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub targets: Vec<PathBuf>,
    pub dry_run: bool,
    pub backup: bool,
    pub direction: Direction,
    /// Worker threads; 1 processes files sequentially.
    pub jobs: usize,
    pub rules: WalkRules,
}

impl RunOptions {
    pub fn new(targets: Vec<PathBuf>) -> Self {
        Self {
            targets,
            dry_run: false,
            backup: false,
            direction: Direction::ToShort,
            jobs: 1,
            rules: WalkRules::from_settings(&Settings::default()),
        }
    }
}

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn run(options: &RunOptions, map: &NameMap, fs: &dyn FileSystem) -> RunResult {
    run_with_cancel(options, map, fs, &CancelToken::new())
}

/// Like [`run`], but files not yet started when `cancel` fires are skipped.
/// Files already in flight finish their commit.
pub fn run_with_cancel(
    options: &RunOptions,
    map: &NameMap,
    fs: &dyn FileSystem,
    cancel: &CancelToken,
) -> RunResult {
    execute(options, map, fs, cancel, &run_stamp())
}

fn execute(
    options: &RunOptions,
    map: &NameMap,
    fs: &dyn FileSystem,
    cancel: &CancelToken,
    stamp: &str,
) -> RunResult {
    let mut result = RunResult::new(options.dry_run);
    let discovery = walker::discover(fs, &options.targets, &options.rules);

    for (path, error) in &discovery.problems {
        result.record_error(path, error);
    }

    let ctx = FileContext {
        fs,
        map,
        direction: options.direction,
        mode: if options.dry_run {
            Mode::DryRun
        } else {
            Mode::Write
        },
        backup: options.backup,
        stamp,
    };

    crate::log_status!(
        "rewrite",
        "{} file(s) to process ({})",
        discovery.files.len(),
        options.direction.as_str()
    );

    let task = |path: &PathBuf| -> Option<Result<Processed>> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(process_file(&ctx, path))
    };

    let outcomes: Vec<Option<Result<Processed>>> = if options.jobs > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| discovery.files.par_iter().map(task).collect()),
            Err(e) => {
                crate::log_status!("rewrite", "Falling back to one worker: {}", e);
                discovery.files.iter().map(task).collect()
            }
        }
    } else {
        discovery.files.iter().map(task).collect()
    };

    for (path, outcome) in discovery.files.into_iter().zip(outcomes) {
        match outcome {
            None => result.record_not_started(),
            Some(Err(error)) => {
                crate::log_status!("rewrite", "{}", error.message);
                result.record_error(&path, &error);
            }
            Some(Ok(processed)) => match processed.outcome {
                Outcome::Unchanged => result.record_unchanged(path),
                Outcome::WouldChange => result.record_changed(
                    path,
                    processed.replacements,
                    None,
                    processed.references,
                ),
                Outcome::Rewritten { backup } => {
                    crate::log_status!(
                        "rewrite",
                        "{} ({} replacement(s))",
                        path.display(),
                        processed.replacements
                    );
                    result.record_changed(path, processed.replacements, backup, Vec::new());
                }
            },
        }
    }

    result.cancelled = cancel.is_cancelled();
    result
}

/// Timestamp shared by every backup of one run.
pub fn run_stamp() -> String {
    chrono::Local::now().format(STAMP_FORMAT).to_string()
}

struct FileContext<'a> {
    fs: &'a dyn FileSystem,
    map: &'a NameMap,
    direction: Direction,
    mode: Mode,
    backup: bool,
    stamp: &'a str,
}

struct Processed {
    outcome: Outcome,
    replacements: usize,
    references: Vec<Reference>,
}

fn process_file(ctx: &FileContext<'_>, path: &Path) -> Result<Processed> {
    let display = path.display().to_string();
    let original = ctx
        .fs
        .read(path)
        .map_err(|e| Error::file_read(display.clone(), e.to_string()))?;
    let task = FileTask {
        path: path.to_path_buf(),
        original,
        mode: ctx.mode,
        backup_requested: ctx.backup,
    };
    let text = std::str::from_utf8(&task.original)
        .map_err(|e| Error::file_read(display, format!("not valid UTF-8: {}", e)))?;

    let rewrite = rewriter::rewrite(text, ctx.map, ctx.direction);
    let references = match ctx.mode {
        Mode::DryRun => matcher::locate(text, &rewrite.spans),
        Mode::Write => Vec::new(),
    };

    let outcome = commit::commit(ctx.fs, &task, &rewrite.text, ctx.stamp)?;

    Ok(Processed {
        outcome,
        replacements: rewrite.spans.len(),
        references,
    })
}

// ============================================================================
// Tests
// ============================================================================
