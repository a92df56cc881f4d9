//! Backup and commit of a single rewritten file.
//!
//! A file is only replaced after its backup (when requested) is safely on
//! disk. Replacement itself goes through [`FileSystem::write_atomic`], so an
//! interrupted run leaves each file either fully old or fully new.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::local_files::FileSystem;
use crate::walker::BACKUP_EXTENSION;

/// Attempts at a free backup name before giving up.
const MAX_BACKUP_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DryRun,
    Write,
}

/// One discovered file, read and ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    /// Exact bytes that were read; the backup is a copy of these.
    pub original: Vec<u8>,
    pub mode: Mode,
    pub backup_requested: bool,
}

/// What the commit step did with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Content was already in its final form; nothing touched.
    Unchanged,
    /// Dry run: the file would have been rewritten.
    WouldChange,
    Rewritten { backup: Option<PathBuf> },
}

/// Backup location for `path`: `<path>.<stamp>.bak`.
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.{}", stamp, BACKUP_EXTENSION));
    PathBuf::from(name)
}

fn numbered_backup_path(path: &Path, stamp: &str, n: usize) -> PathBuf {
    if n <= 1 {
        return backup_path(path, stamp);
    }
    backup_path(path, &format!("{}-{}", stamp, n))
}

/// Persist `new_text` for `task` according to its mode.
///
/// `stamp` names the backup and is shared by every file of a run. When the
/// backup cannot be created the file is left untouched.
pub fn commit(fs: &dyn FileSystem, task: &FileTask, new_text: &str, stamp: &str) -> Result<Outcome> {
    if new_text.as_bytes() == task.original.as_slice() {
        return Ok(Outcome::Unchanged);
    }
    if task.mode == Mode::DryRun {
        return Ok(Outcome::WouldChange);
    }

    let path = task.path.as_path();
    let backup = if task.backup_requested {
        Some(write_backup(fs, path, &task.original, stamp)?)
    } else {
        None
    };

    fs.write_atomic(path, new_text.as_bytes())
        .map_err(|e| Error::file_write(path.display().to_string(), e.to_string()))?;

    Ok(Outcome::Rewritten { backup })
}

/// Create a fresh backup, never overwriting an earlier one.
fn write_backup(
    fs: &dyn FileSystem,
    path: &Path,
    original: &[u8],
    stamp: &str,
) -> Result<PathBuf> {
    let mut last_error = None;

    for n in 1..=MAX_BACKUP_ATTEMPTS {
        let candidate = numbered_backup_path(path, stamp, n);
        match fs.write_new(&candidate, original) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_error = Some(e),
            Err(e) => {
                return Err(Error::file_backup(
                    candidate.display().to_string(),
                    e.to_string(),
                ))
            }
        }
    }

    Err(Error::file_backup(
        backup_path(path, stamp).display().to_string(),
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no free backup name".to_string()),
    ))
}
