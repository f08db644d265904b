use crate::budget::SizeBudgetTracker;
use crate::cancel::CancellationFlag;
use crate::ignore_rules::{ExtensionFilter, IgnoreMatcher};
use crate::limits::{clamp_walk_threads, walk_threads_from_env};
use crate::root::workspace_folder_path;
use crate::stats::DiscoveryStats;
use context_protocol::{ContextConfiguration, WorkspaceFolder};
use ignore::{DirEntry, WalkBuilder, WalkState};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Everything one discovery pass needs to know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryRequest {
    pub workspace_folders: Vec<WorkspaceFolder>,
    pub ignore_file_patterns: Vec<String>,
    /// Keep symlinked paths as-is instead of resolving them to real paths.
    pub include_sym_links: bool,
    /// Extensions with their leading dot; empty accepts every file.
    pub file_extensions: Vec<String>,
    pub max_file_size_mb: Option<f64>,
    pub max_index_size_mb: Option<f64>,
}

impl DiscoveryRequest {
    /// Unfiltered, unbounded pass over `workspace_folders`.
    pub fn new(workspace_folders: Vec<WorkspaceFolder>) -> Self {
        Self {
            workspace_folders,
            ..Self::default()
        }
    }

    pub fn from_configuration(
        workspace_folders: &[WorkspaceFolder],
        config: &ContextConfiguration,
    ) -> Self {
        Self {
            workspace_folders: workspace_folders.to_vec(),
            ignore_file_patterns: config.ignore_file_patterns.clone(),
            include_sym_links: config.include_sym_links,
            file_extensions: config.file_extensions.clone(),
            max_file_size_mb: config.max_file_size_mb,
            max_index_size_mb: config.max_index_size_mb,
        }
    }
}

/// Scanner for finding the files of a workspace that belong in the index
#[derive(Debug, Clone, Copy)]
pub struct FileScanner {
    threads: usize,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            threads: walk_threads_from_env(),
        }
    }

    /// Walk each folder with `threads` workers. More than one thread walks
    /// subtrees in parallel; each folder's results are then sorted by path.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: clamp_walk_threads(threads),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Absolute paths of every eligible file, folder by folder.
    pub fn discover(&self, request: &DiscoveryRequest) -> Vec<PathBuf> {
        self.discover_with_stats(request).0
    }

    pub fn discover_with_stats(
        &self,
        request: &DiscoveryRequest,
    ) -> (Vec<PathBuf>, DiscoveryStats) {
        self.discover_cancellable(request, &CancellationFlag::new())
    }

    /// Discovery that stops early once `cancel` is set, either by the caller or
    /// by the aggregate budget running out. Whatever was collected up to that
    /// point is returned.
    pub fn discover_cancellable(
        &self,
        request: &DiscoveryRequest,
        cancel: &CancellationFlag,
    ) -> (Vec<PathBuf>, DiscoveryStats) {
        let start = Instant::now();
        let mut stats = DiscoveryStats::default();
        if request.workspace_folders.is_empty() {
            return (Vec::new(), stats);
        }

        let ignore = Arc::new(IgnoreMatcher::new(&request.ignore_file_patterns));
        let extensions = ExtensionFilter::new(&request.file_extensions);
        let budget = SizeBudgetTracker::new(request.max_file_size_mb, request.max_index_size_mb);

        let mut files = Vec::new();
        for folder in &request.workspace_folders {
            if budget.is_exhausted() {
                cancel.cancel();
            }
            if cancel.is_cancelled() {
                break;
            }
            let root = match resolve_folder(folder) {
                Some(root) => root,
                None => continue,
            };

            let walk = RootWalk {
                root: &root,
                ignore: &ignore,
                extensions: &extensions,
                budget: &budget,
                cancel,
                include_sym_links: request.include_sym_links,
                found: Mutex::new(Vec::new()),
                linked_dirs: Mutex::new(Vec::new()),
                ignored: Arc::new(AtomicUsize::new(0)),
                walk_errors: AtomicUsize::new(0),
            };
            let found = self.walk(&walk);

            stats.roots += 1;
            stats.ignored += walk.ignored.load(Ordering::Relaxed);
            stats.walk_errors += walk.walk_errors.load(Ordering::Relaxed);
            log::debug!("Found {} files under {}", found.len(), root.display());
            files.extend(found);
        }

        stats.files = files.len();
        stats.bytes = budget.accepted_bytes();
        stats.stat_failures = budget.stat_failures();
        stats.cancelled = cancel.is_cancelled();
        stats.remaining_bytes = budget.remaining();
        stats.time_ms = start.elapsed().as_millis() as u64;

        if stats.cancelled {
            log::info!(
                "Discovery stopped early: {} files ({} bytes) across {} folders",
                stats.files,
                stats.bytes,
                stats.roots
            );
        } else {
            log::info!(
                "Found {} source files across {} folders in {} ms",
                stats.files,
                stats.roots,
                stats.time_ms
            );
        }
        (files, stats)
    }

    fn walk(&self, walk: &RootWalk<'_>) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(walk.root);
        builder
            .standard_filters(false) // only the caller's patterns apply
            .follow_links(true);

        let root = walk.root.to_path_buf();
        let ignore = Arc::clone(walk.ignore);
        let cancel = walk.cancel.clone();
        let ignored = Arc::clone(&walk.ignored);
        builder.filter_entry(move |entry| {
            if cancel.is_cancelled() {
                return false;
            }
            if entry.depth() == 0 || !is_dir(entry) {
                return true;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let keep = !ignore.is_ignored(relative, true);
            if !keep {
                log::debug!("Pruning ignored directory {}", entry.path().display());
                ignored.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });

        if self.threads > 1 {
            builder.threads(self.threads);
            builder
                .build_parallel()
                .run(move || Box::new(move |entry| walk.visit(entry)));
            let mut found = walk.take_found();
            found.sort();
            found
        } else {
            builder.sort_by_file_name(|a, b| a.cmp(b));
            for entry in builder.build() {
                if matches!(walk.visit(entry), WalkState::Quit) {
                    break;
                }
            }
            walk.take_found()
        }
    }
}

/// Shared state of the walk over one workspace folder.
struct RootWalk<'a> {
    root: &'a Path,
    ignore: &'a Arc<IgnoreMatcher>,
    extensions: &'a ExtensionFilter,
    budget: &'a SizeBudgetTracker,
    cancel: &'a CancellationFlag,
    include_sym_links: bool,
    found: Mutex<Vec<PathBuf>>,
    linked_dirs: Mutex<Vec<PathBuf>>,
    ignored: Arc<AtomicUsize>,
    walk_errors: AtomicUsize,
}

impl RootWalk<'_> {
    fn visit(&self, entry: Result<DirEntry, ignore::Error>) -> WalkState {
        if self.cancel.is_cancelled() {
            return WalkState::Quit;
        }
        if self.budget.is_exhausted() {
            log::debug!("Index size budget exhausted; stopping discovery");
            self.cancel.cancel();
            return WalkState::Quit;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Failed to read entry: {e}");
                self.walk_errors.fetch_add(1, Ordering::Relaxed);
                return WalkState::Continue;
            }
        };
        if is_dir(&entry) {
            // The folder itself is kept as given even when it is a link.
            if entry.depth() > 0 && entry.path_is_symlink() && !self.include_sym_links {
                self.linked_dirs
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(entry.path().to_path_buf());
            }
            return WalkState::Continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(self.root).unwrap_or(path);
        if self.ignore.is_ignored(relative, false) {
            log::debug!("Skipping ignored file {}", path.display());
            self.ignored.fetch_add(1, Ordering::Relaxed);
            return WalkState::Continue;
        }
        if !self.extensions.matches(relative) {
            return WalkState::Continue;
        }
        if !self.budget.is_unbounded() && !self.budget.accepts(path) {
            return WalkState::Continue;
        }

        let path = if !self.include_sym_links && self.is_linked(&entry) {
            match std::fs::canonicalize(path) {
                Ok(real) => real,
                Err(e) => {
                    log::warn!("Failed to resolve symlink {}: {e}", path.display());
                    return WalkState::Continue;
                }
            }
        } else {
            path.to_path_buf()
        };

        self.found
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
        WalkState::Continue
    }

    /// The entry is a symlink or was reached through a symlinked directory.
    fn is_linked(&self, entry: &DirEntry) -> bool {
        entry.path_is_symlink()
            || self
                .linked_dirs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .any(|dir| entry.path().starts_with(dir))
    }

    fn take_found(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.found.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|ft| ft.is_dir())
}

/// Absolute, existing directory for a workspace folder; logs and skips
/// anything else.
fn resolve_folder(folder: &WorkspaceFolder) -> Option<PathBuf> {
    let path = match workspace_folder_path(folder) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("Skipping workspace folder {}: {e}", folder.uri);
            return None;
        }
    };
    if !path.is_dir() {
        log::warn!("Skipping missing workspace folder {}", path.display());
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, bytes: usize) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; bytes]).unwrap();
    }

    fn relative_names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn empty_folder_list_finds_nothing() {
        let (files, stats) =
            FileScanner::with_threads(1).discover_with_stats(&DiscoveryRequest::default());
        assert!(files.is_empty());
        assert_eq!(stats, DiscoveryStats::default());
    }

    #[test]
    fn sequential_walk_is_sorted_and_includes_hidden_files() {
        let temp = tempdir().unwrap();
        write(temp.path(), "b.rs", 1);
        write(temp.path(), "a/z.rs", 1);
        write(temp.path(), ".config/x.rs", 1);

        let request = DiscoveryRequest::new(vec![WorkspaceFolder::from_path(temp.path())]);
        let files = FileScanner::with_threads(1).discover(&request);

        assert_eq!(
            relative_names(temp.path(), &files),
            vec![".config/x.rs", "a/z.rs", "b.rs"]
        );
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn ignores_patterns_not_gitignore_files() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/main.rs", 1);
        write(temp.path(), "target/debug/out.rs", 1);
        write(temp.path(), "vendor/lib.rs", 1);
        fs::write(temp.path().join(".gitignore"), "vendor/\n").unwrap();

        let request = DiscoveryRequest {
            ignore_file_patterns: vec!["target".to_string()],
            file_extensions: vec![".rs".to_string()],
            ..DiscoveryRequest::new(vec![WorkspaceFolder::from_path(temp.path())])
        };
        let files = FileScanner::with_threads(1).discover(&request);

        assert_eq!(
            relative_names(temp.path(), &files),
            vec!["src/main.rs", "vendor/lib.rs"]
        );
    }

    #[test]
    fn pruned_directories_and_skipped_files_are_counted() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/main.rs", 1);
        write(temp.path(), "src/main.log.rs", 1);
        write(temp.path(), "target/debug/a.rs", 1);
        write(temp.path(), "target/debug/b.rs", 1);

        let request = DiscoveryRequest {
            ignore_file_patterns: vec!["target".to_string(), "*.log.rs".to_string()],
            ..DiscoveryRequest::new(vec![WorkspaceFolder::from_path(temp.path())])
        };
        let (files, stats) = FileScanner::with_threads(1).discover_with_stats(&request);

        assert_eq!(relative_names(temp.path(), &files), vec!["src/main.rs"]);
        // `target` once as a directory, `main.log.rs` once as a file.
        assert_eq!(stats.ignored, 2);
    }

    #[test]
    fn extension_filter_applies_to_files_only() {
        let temp = tempdir().unwrap();
        write(temp.path(), "pkg.js/index.ts", 1);
        write(temp.path(), "pkg.js/readme.md", 1);

        let request = DiscoveryRequest {
            file_extensions: vec![".ts".to_string()],
            ..DiscoveryRequest::new(vec![WorkspaceFolder::from_path(temp.path())])
        };
        let files = FileScanner::with_threads(1).discover(&request);

        assert_eq!(relative_names(temp.path(), &files), vec!["pkg.js/index.ts"]);
    }

    #[test]
    fn pre_cancelled_pass_returns_nothing() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.rs", 1);

        let cancel = CancellationFlag::new();
        cancel.cancel();
        let request = DiscoveryRequest::new(vec![WorkspaceFolder::from_path(temp.path())]);
        let (files, stats) = FileScanner::with_threads(1).discover_cancellable(&request, &cancel);

        assert!(files.is_empty());
        assert!(stats.cancelled);
    }

    #[test]
    fn missing_and_invalid_folders_are_skipped() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.rs", 1);

        let request = DiscoveryRequest::new(vec![
            WorkspaceFolder::from_path(temp.path().join("gone")),
            WorkspaceFolder::new("https://example.com/repo"),
            WorkspaceFolder::from_path(temp.path()),
        ]);
        let (files, stats) = FileScanner::with_threads(1).discover_with_stats(&request);

        assert_eq!(relative_names(temp.path(), &files), vec!["a.rs"]);
        assert_eq!(stats.roots, 1);
    }
}
