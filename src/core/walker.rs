//! Expands file and directory targets into a sorted file list.

use glob_match::glob_match;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::defaults::Settings;
use crate::error::Error;
use crate::local_files::{EntryKind, FileSystem, TEMP_PREFIX, TEMP_SUFFIX};

/// Directories to always skip at any depth (dependency/VCS directories).
const ALWAYS_SKIP_DIRS: &[&str] = &["node_modules", "vendor", ".git", ".svn", ".hg"];

/// Directories to skip only directly under a directory target (build output).
/// Deeper down (e.g. `scripts/build/`) they may hold sources.
const ROOT_ONLY_SKIP_DIRS: &[&str] = &["build", "dist", "target", "cache", "tmp"];

pub const BACKUP_EXTENSION: &str = "bak";

/// Exclusion and inclusion rules applied during traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkRules {
    /// Glob patterns matched against the path relative to the target, or the bare name.
    pub exclude: Vec<String>,
    /// Extensions accepted for files found by traversal; `"*"` accepts all.
    pub extensions: Vec<String>,
    /// Files never returned, even when named explicitly (the schema itself).
    pub protected: Vec<PathBuf>,
}

impl WalkRules {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            exclude: settings.exclude.clone(),
            extensions: settings.extensions.clone(),
            protected: Vec::new(),
        }
    }

    /// Never return `path`, however it is reached.
    pub fn protect(&mut self, path: &Path) {
        self.protected.push(path.to_path_buf());
    }

    fn is_excluded(&self, relative: &str, name: &str) -> bool {
        self.exclude
            .iter()
            .any(|pattern| glob_match(pattern, relative) || glob_match(pattern, name))
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        if self.extensions.iter().any(|e| e == "*") {
            return true;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Result of expanding targets.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Files to process, sorted and de-duplicated.
    pub files: Vec<PathBuf>,
    /// Targets or directories that could not be inspected.
    pub problems: Vec<(PathBuf, Error)>,
    /// Symlinks named as explicit targets; never followed.
    pub skipped_symlinks: Vec<PathBuf>,
}

/// Expand `targets` into the files to process.
///
/// Explicit file targets are kept whatever their extension; symlinks are never
/// followed; backups and temporary files are never returned.
pub fn discover(fs: &dyn FileSystem, targets: &[PathBuf], rules: &WalkRules) -> Discovery {
    let mut files = BTreeSet::new();
    let mut discovery = Discovery::default();
    let protected: Vec<PathBuf> = rules.protected.iter().map(|p| fs.canonical(p)).collect();

    for target in targets {
        match fs.kind(target) {
            None => discovery.problems.push((
                target.clone(),
                Error::file_not_found(target.display().to_string()),
            )),
            Some(EntryKind::Symlink) => {
                crate::log_status!("walk", "Skipping symlink {}", target.display());
                discovery.skipped_symlinks.push(target.clone());
            }
            Some(EntryKind::File) => {
                let is_protected = !protected.is_empty() && protected.contains(&fs.canonical(target));
                if !is_artifact(target) && !is_protected {
                    files.insert(target.clone());
                }
            }
            Some(EntryKind::Dir) => {
                let walk = Walk {
                    fs,
                    root: target,
                    canonical_root: fs.canonical(target),
                    rules,
                    protected: &protected,
                };
                walk.visit(target, &mut files, &mut discovery.problems);
            }
        }
    }

    discovery.files = files.into_iter().collect();
    discovery
}

/// Traversal of one directory target.
struct Walk<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
    /// Resolved once; symlinks are never entered, so every file below it
    /// resolves to `canonical_root` joined with its relative path.
    canonical_root: PathBuf,
    rules: &'a WalkRules,
    protected: &'a [PathBuf],
}

impl Walk<'_> {
    fn visit(&self, dir: &Path, files: &mut BTreeSet<PathBuf>, problems: &mut Vec<(PathBuf, Error)>) {
        let entries = match self.fs.list(dir) {
            Ok(entries) => entries,
            Err(e) => {
                problems.push((
                    dir.to_path_buf(),
                    Error::file_read(dir.display().to_string(), e.to_string()),
                ));
                return;
            }
        };

        let is_root = dir == self.root;

        for entry in entries {
            let name = entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let relative_path = entry.path.strip_prefix(self.root).unwrap_or(&entry.path);
            let relative = relative_path.to_string_lossy().replace('\\', "/");

            if self.rules.is_excluded(&relative, &name) {
                continue;
            }

            match entry.kind {
                EntryKind::Symlink => continue,
                EntryKind::Dir => {
                    if ALWAYS_SKIP_DIRS.contains(&name.as_str()) {
                        continue;
                    }
                    if is_root && ROOT_ONLY_SKIP_DIRS.contains(&name.as_str()) {
                        continue;
                    }
                    self.visit(&entry.path, files, problems);
                }
                EntryKind::File => {
                    if !is_artifact(&entry.path)
                        && self.rules.accepts_extension(&entry.path)
                        && !self.is_protected(relative_path)
                    {
                        files.insert(entry.path);
                    }
                }
            }
        }
    }

    fn is_protected(&self, relative: &Path) -> bool {
        if self.protected.is_empty() {
            return false;
        }
        let resolved = self.canonical_root.join(relative);
        self.protected.contains(&resolved)
    }
}

/// Backups and in-flight temporary files written by this tool.
fn is_artifact(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) == Some(BACKUP_EXTENSION) {
        return true;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(TEMP_PREFIX) && n.ends_with(TEMP_SUFFIX))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::local_files::{local, MemoryFs};

    fn rules() -> WalkRules {
        WalkRules::from_settings(&Settings::default())
    }

    fn names(discovery: &Discovery) -> Vec<String> {
        discovery
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    fn sample_fs() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.insert("/repo/src/lib.rs", "");
        fs.insert("/repo/src/a.rs", "");
        fs.insert("/repo/README.md", "");
        fs.insert("/repo/logo.png", "");
        fs.insert("/repo/node_modules/pkg/index.js", "");
        fs.insert("/repo/src/vendor/dep.rs", "");
        fs.insert("/repo/build/out.rs", "");
        fs.insert("/repo/scripts/build/setup.sh", "");
        fs.insert("/repo/src/lib.rs.20260101T000000.bak", "");
        fs.insert("/repo/src/.shorthand-abc123.tmp", "");
        fs
    }

    #[test]
    fn walks_sorted_and_skips_excluded_dirs() {
        let fs = sample_fs();
        let found = discover(&fs, &[PathBuf::from("/repo")], &rules());

        assert_eq!(
            names(&found),
            vec![
                "/repo/README.md",
                "/repo/scripts/build/setup.sh",
                "/repo/src/a.rs",
                "/repo/src/lib.rs",
            ]
        );
        assert!(found.problems.is_empty());
    }

    #[test]
    fn explicit_file_ignores_extension_filter() {
        let fs = sample_fs();
        let found = discover(
            &fs,
            &[PathBuf::from("/repo/logo.png"), PathBuf::from("/repo/src/a.rs")],
            &rules(),
        );
        assert_eq!(names(&found), vec!["/repo/logo.png", "/repo/src/a.rs"]);
    }

    #[test]
    fn overlapping_targets_are_deduplicated() {
        let fs = sample_fs();
        let found = discover(
            &fs,
            &[PathBuf::from("/repo/src/a.rs"), PathBuf::from("/repo/src")],
            &rules(),
        );
        assert_eq!(names(&found), vec!["/repo/src/a.rs", "/repo/src/lib.rs"]);
    }

    #[test]
    fn glob_excludes_prune_subtrees_and_names() {
        let fs = sample_fs();
        let rules = WalkRules {
            exclude: vec!["scripts".to_string(), "*.md".to_string()],
            ..rules()
        };
        let found = discover(&fs, &[PathBuf::from("/repo")], &rules);
        assert_eq!(names(&found), vec!["/repo/src/a.rs", "/repo/src/lib.rs"]);
    }

    #[test]
    fn wildcard_extension_accepts_everything() {
        let fs = sample_fs();
        let rules = WalkRules {
            extensions: vec!["*".to_string()],
            ..rules()
        };
        let found = discover(&fs, &[PathBuf::from("/repo")], &rules);
        assert!(names(&found).contains(&"/repo/logo.png".to_string()));
        assert!(!names(&found).iter().any(|n| n.ends_with(".bak")));
    }

    #[test]
    fn protected_files_are_never_returned() {
        let fs = sample_fs();
        fs.insert("/repo/shorthand.json", "[]");
        let mut rules = rules();
        rules.protect(Path::new("/repo/shorthand.json"));

        let found = discover(
            &fs,
            &[PathBuf::from("/repo"), PathBuf::from("/repo/shorthand.json")],
            &rules,
        );
        assert!(!names(&found).contains(&"/repo/shorthand.json".to_string()));
        assert!(names(&found).contains(&"/repo/README.md".to_string()));
    }

    #[test]
    fn protection_resolves_relative_paths_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("shorthand.json");
        std::fs::write(&schema, "[]").unwrap();
        std::fs::write(dir.path().join("a.rs"), "").unwrap();

        let mut rules = rules();
        rules.protect(&schema);
        let dotted = dir.path().join(".");
        let found = discover(&local(), &[dotted.clone()], &rules);
        assert_eq!(found.files, vec![dotted.join("a.rs")]);
    }

    /// Counts path resolutions made during a walk.
    struct CountingFs {
        inner: MemoryFs,
        resolved: std::sync::atomic::AtomicUsize,
    }

    impl FileSystem for CountingFs {
        fn kind(&self, path: &Path) -> Option<EntryKind> {
            self.inner.kind(path)
        }
        fn list(&self, dir: &Path) -> std::io::Result<Vec<crate::local_files::Entry>> {
            self.inner.list(dir)
        }
        fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            self.inner.read(path)
        }
        fn write_atomic(&self, path: &Path, content: &[u8]) -> std::io::Result<()> {
            self.inner.write_atomic(path, content)
        }
        fn write_new(&self, path: &Path, content: &[u8]) -> std::io::Result<()> {
            self.inner.write_new(path, content)
        }
        fn canonical(&self, path: &Path) -> PathBuf {
            self.resolved
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.canonical(path)
        }
    }

    #[test]
    fn protection_resolves_each_target_once() {
        let fs = CountingFs {
            inner: sample_fs(),
            resolved: std::sync::atomic::AtomicUsize::new(0),
        };
        fs.inner.insert("/repo/src/shorthand.json", "[]");
        let mut rules = rules();
        rules.extensions.push("json".to_string());
        rules.protect(Path::new("/repo/./src/shorthand.json"));

        let found = discover(&fs, &[PathBuf::from("/repo")], &rules);
        assert!(!names(&found).contains(&"/repo/src/shorthand.json".to_string()));
        assert!(names(&found).len() > 1);
        // One for the protected path, one for the directory target.
        assert_eq!(fs.resolved.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_target_is_reported() {
        let fs = sample_fs();
        let found = discover(&fs, &[PathBuf::from("/nowhere")], &rules());
        assert!(found.files.is_empty());
        assert_eq!(found.problems.len(), 1);
        assert_eq!(found.problems[0].1.code, ErrorCode::FileNotFound);
    }

    #[test]
    fn symlinks_are_not_followed() {
        let fs = sample_fs();
        fs.insert_symlink("/repo/src/linked");
        let found = discover(
            &fs,
            &[PathBuf::from("/repo/src"), PathBuf::from("/repo/src/linked")],
            &rules(),
        );
        assert_eq!(names(&found), vec!["/repo/src/a.rs", "/repo/src/lib.rs"]);
        assert_eq!(found.skipped_symlinks, vec![PathBuf::from("/repo/src/linked")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_on_disk_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("a.rs"), "").unwrap();
        std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

        let found = discover(&local(), &[dir.path().to_path_buf()], &rules());
        assert_eq!(found.files, vec![sub.join("a.rs")]);
    }
}
