use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path};

/// Gitignore-style exclusion rules, matched against paths relative to a
/// workspace folder.
#[derive(Clone, Debug)]
pub struct IgnoreMatcher {
    rules: Gitignore,
}

impl IgnoreMatcher {
    /// Compile `patterns` in order. Patterns that fail to parse are logged and
    /// skipped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(".");
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Skipping invalid ignore pattern {pattern:?}: {e}");
            }
        }
        let rules = builder.build().unwrap_or_else(|e| {
            log::warn!("Failed to compile ignore patterns: {e}");
            Gitignore::empty()
        });
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `relative` (or any directory above it) is excluded.
    ///
    /// The empty path names the folder itself, which is never excluded, and
    /// paths escaping the folder (`..`, absolute) never match.
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        if self.rules.is_empty() || relative.as_os_str().is_empty() {
            return false;
        }
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return false;
        }
        self.rules
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}

/// File-extension filter built from `**/*<ext>` globs.
///
/// An empty extension list lets every file through.
#[derive(Clone, Debug)]
pub struct ExtensionFilter {
    globs: Option<GlobSet>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut count = 0usize;
        for ext in extensions {
            let ext = ext.as_ref().trim();
            if ext.is_empty() {
                continue;
            }
            let pattern = if ext.starts_with('.') {
                format!("**/*{ext}")
            } else {
                format!("**/*.{ext}")
            };
            match Glob::new(&pattern) {
                Ok(glob) => {
                    builder.add(glob);
                    count += 1;
                }
                Err(e) => log::warn!("Skipping invalid extension {ext:?}: {e}"),
            }
        }

        if count == 0 {
            return Self { globs: None };
        }
        match builder.build() {
            Ok(set) => Self { globs: Some(set) },
            Err(e) => {
                log::warn!("Failed to compile extension filter: {e}");
                Self { globs: None }
            }
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.globs.as_ref().map_or(true, |set| set.is_match(path))
    }
}
