use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Prefix of in-flight temporary files written next to their target.
pub const TEMP_PREFIX: &str = ".shorthand-";
pub const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// Entry returned from directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Byte-level file access used by the walker and the commit step.
///
/// Implementations must be shareable across worker threads.
pub trait FileSystem: Send + Sync {
    /// Kind of `path` without following symlinks; `None` if it does not exist.
    fn kind(&self, path: &Path) -> Option<EntryKind>;
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Replace `path` so readers see either the old or the new content.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()>;
    /// Create `path`, failing if it already exists.
    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()>;
    /// Absolute, resolved form of `path`; `path` itself when it cannot be resolved.
    fn canonical(&self, path: &Path) -> PathBuf;
}

/// Local filesystem implementation
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFs {
    fn kind(&self, path: &Path) -> Option<EntryKind> {
        let meta = fs::symlink_metadata(path).ok()?;
        let file_type = meta.file_type();
        Some(if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        })
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            result.push(Entry {
                path: entry.path(),
                kind,
            });
        }
        Ok(result)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        // Atomic write: temp file in the same directory, then rename
        let tmp = staged(path, content)?;

        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }

        // On failure the temp file is dropped, which removes it.
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        // Only a fully synced file ever appears under `path`.
        let tmp = staged(path, content)?;
        tmp.persist_noclobber(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Write `content` to a synced temp file beside `path`.
fn staged(path: &Path, content: &[u8]) -> io::Result<tempfile::NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Convenience function to get local filesystem
pub fn local() -> LocalFs {
    LocalFs::new()
}

// ============================================================================
// In-memory filesystem
// ============================================================================

/// In-memory substitute for tests and dry embedding.
///
/// Directories are implicit: a path is a directory when some file lives
/// below it. Failures can be injected per path.
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    symlinks: Mutex<BTreeSet<PathBuf>>,
    fail_reads: Mutex<BTreeSet<PathBuf>>,
    fail_writes: Mutex<BTreeSet<PathBuf>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        guard(&self.files).insert(path.into(), content.into());
    }

    /// Register a symlink entry; it is listed but never read through.
    pub fn insert_symlink(&self, path: impl Into<PathBuf>) {
        guard(&self.symlinks).insert(path.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        guard(&self.files).get(path.as_ref()).cloned()
    }

    pub fn get_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.get(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        guard(&self.files).keys().cloned().collect()
    }

    /// Make every read of `path` fail.
    pub fn fail_reads_of(&self, path: impl Into<PathBuf>) {
        guard(&self.fail_reads).insert(path.into());
    }

    /// Make every write or create of `path` fail.
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>) {
        guard(&self.fail_writes).insert(path.into());
    }

    fn check_write(&self, path: &Path) -> io::Result<()> {
        if guard(&self.fail_writes).contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "simulated write failure",
            ));
        }
        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn kind(&self, path: &Path) -> Option<EntryKind> {
        if guard(&self.symlinks).contains(path) {
            return Some(EntryKind::Symlink);
        }
        let files = guard(&self.files);
        if files.contains_key(path) {
            Some(EntryKind::File)
        } else if files.keys().any(|p| p != path && p.starts_with(path)) {
            Some(EntryKind::Dir)
        } else {
            None
        }
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        if self.kind(dir) != Some(EntryKind::Dir) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }

        let mut children: BTreeMap<PathBuf, EntryKind> = BTreeMap::new();
        for path in guard(&self.files).keys() {
            let Ok(rest) = path.strip_prefix(dir) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let child = dir.join(first);
            let kind = if components.next().is_some() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            children.insert(child, kind);
        }
        for link in guard(&self.symlinks).iter() {
            if link.parent() == Some(dir) {
                children.insert(link.clone(), EntryKind::Symlink);
            }
        }

        Ok(children
            .into_iter()
            .map(|(path, kind)| Entry { path, kind })
            .collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if guard(&self.fail_reads).contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "simulated read failure",
            ));
        }
        guard(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        self.check_write(path)?;
        guard(&self.files).insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        self.check_write(path)?;
        let mut files = guard(&self.files);
        if files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "file already exists",
            ));
        }
        files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        // Lexical only: drops `.` segments and doubled separators.
        path.components().collect()
    }
}
