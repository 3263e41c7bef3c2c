use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{IndexerConfig, INDEX_DIR};

/// Directories never walked, regardless of configuration
const ALWAYS_IGNORED: &[&str] = &[".git", ".hg", ".svn", INDEX_DIR];

/// A file selected for indexing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WalkedFile {
    /// Repository-relative path with `/` separators
    pub rel_path: String,
    pub path: PathBuf,
}

/// Walks a repository honoring ignore files and configured exclusions.
///
/// `.gitignore`, `.ignore` and git exclude files apply even when the root is
/// not inside a git checkout. Hidden entries are skipped unless configured
/// otherwise. Every regular file that survives is returned; deciding which
/// ones can be parsed is left to the caller.
pub struct Walker {
    root: PathBuf,
    ignore_names: Vec<String>,
    ignore_globs: Vec<Pattern>,
    filters: Vec<Pattern>,
    filter_prefixes: Vec<String>,
    include_hidden: bool,
}

impl Walker {
    pub fn new(root: PathBuf, config: &IndexerConfig) -> Self {
        let mut ignore_names = Vec::new();
        let mut ignore_globs = Vec::new();
        for pattern in &config.ignore_patterns {
            if pattern.contains(['*', '?', '[', '/']) {
                match Pattern::new(pattern) {
                    Ok(p) => ignore_globs.push(p),
                    Err(e) => warn!("Ignoring bad ignore pattern {:?}: {}", pattern, e),
                }
            } else {
                ignore_names.push(pattern.clone());
            }
        }

        let filters = config
            .filters
            .iter()
            .filter_map(|f| match Pattern::new(f) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring bad path filter {:?}: {}", f, e);
                    None
                }
            })
            .collect();
        let filter_prefixes = config
            .filters
            .iter()
            .map(|f| f.trim_end_matches('/').to_string())
            .collect();

        Self {
            root,
            ignore_names,
            ignore_globs,
            filters,
            filter_prefixes,
            include_hidden: config.include_hidden,
        }
    }

    /// Collect all walkable files, sorted by relative path.
    pub fn collect_files(&self) -> Vec<WalkedFile> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(!self.include_hidden)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .require_git(false)
            .follow_links(false);

        let root = self.root.clone();
        let names = self.ignore_names.clone();
        let globs = self.ignore_globs.clone();
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if ALWAYS_IGNORED.contains(&name.as_ref()) || names.iter().any(|n| n == name.as_ref()) {
                return false;
            }
            match relative_path(&root, entry.path()) {
                Some(rel) => !globs.iter().any(|g| g.matches_with(&rel, match_options())),
                None => true,
            }
        });

        let mut files: Vec<WalkedFile> = builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let rel_path = relative_path(&self.root, entry.path())?;
                Some(WalkedFile {
                    rel_path,
                    path: entry.into_path(),
                })
            })
            .filter(|file| self.passes_filters(&file.rel_path))
            .collect();

        files.sort();
        debug!(root = %self.root.display(), files = files.len(), "walked repository");
        files
    }

    /// With no filters every path passes; otherwise a path must match a
    /// filter glob or sit under a filter directory.
    fn passes_filters(&self, rel_path: &str) -> bool {
        if self.filter_prefixes.is_empty() {
            return true;
        }
        self.filters
            .iter()
            .any(|p| p.matches_with(rel_path, match_options()))
            || self.filter_prefixes.iter().any(|prefix| {
                rel_path == prefix
                    || rel_path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

/// `path` relative to `root` with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
