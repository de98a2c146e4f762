//! Font discovery helpers for sysfont-core (made by FontLab https://www.fontlab.com/)

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use crate::classify::{classify, FontKind};

/// Environment override for the platform font directory list.
pub const SYSTEM_FONT_DIRS_ENV: &str = "SYSFONT_SYSTEM_FONT_DIRS";

/// Directories with this name (any case) are never descended into.
const DELETED_DIR: &str = "deleted";

/// Path to a candidate font file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSourceRef {
    pub path: PathBuf,
    pub kind: FontKind,
    /// Found under a caller-supplied custom directory rather than an OS one.
    pub custom: bool,
}

/// Trait for enumerating fonts from some backing store.
pub trait FontDiscovery {
    fn discover(&self) -> Result<Vec<FontSourceRef>>;
}

/// Recursive filesystem walker that collects font files.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    roots: Vec<PathBuf>,
    custom_roots: HashSet<PathBuf>,
    follow_symlinks: bool,
}

impl PathDiscovery {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = roots.into_iter().map(Into::into).collect();
        Self {
            roots,
            custom_roots: HashSet::new(),
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Mark roots whose fonts should be reported as custom (non-system).
    pub fn custom_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.custom_roots = roots.into_iter().map(Into::into).collect();
        self
    }
}

impl FontDiscovery for PathDiscovery {
    fn discover(&self) -> Result<Vec<FontSourceRef>> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        for root in &self.roots {
            if !root.exists() {
                debug!("skipping missing font directory {}", root.display());
                continue;
            }
            let custom = self.custom_roots.contains(root);

            let walker = WalkDir::new(root)
                .follow_links(self.follow_symlinks)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !is_deleted_dir(entry));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        debug!("skipping unreadable entry under {}: {err}", root.display());
                        continue;
                    }
                };
                if !entry.file_type().is_file() && !is_symlinked_file(&entry) {
                    continue;
                }
                let Some(kind) = classify(entry.path()) else {
                    continue;
                };
                if seen.insert(entry.path().to_path_buf()) {
                    found.push(FontSourceRef {
                        path: entry.path().to_path_buf(),
                        kind,
                        custom,
                    });
                }
            }
        }

        Ok(found)
    }
}

/// Enumerate candidate font files beneath `directories`, in walk order.
pub fn list_candidate_font_files(directories: &[PathBuf]) -> Vec<PathBuf> {
    PathDiscovery::new(directories.iter().cloned())
        .discover()
        .map(|found| found.into_iter().map(|f| f.path).collect())
        .unwrap_or_default()
}

fn is_deleted_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().eq_ignore_ascii_case(DELETED_DIR)
}

// Unfollowed symlinks report their own type; accept links that point at files.
fn is_symlinked_file(entry: &DirEntry) -> bool {
    entry.path_is_symlink() && entry.path().is_file()
}

/// Platform font directories, honouring `SYSFONT_SYSTEM_FONT_DIRS`.
///
/// Directories are returned whether or not they exist; discovery skips the
/// missing ones.
pub fn system_font_dirs() -> Vec<PathBuf> {
    if let Ok(raw) = env::var(SYSTEM_FONT_DIRS_ENV) {
        let overrides: Vec<PathBuf> = raw
            .split([':', ';'])
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
        if !overrides.is_empty() {
            return overrides;
        }
    }

    platform_font_dirs()
}

#[cfg(target_os = "macos")]
fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = env::var_os("HOME").map(PathBuf::from) {
        dirs.push(home.join("Library/Fonts"));
    }
    dirs.push(PathBuf::from("/Library/Fonts"));
    dirs.push(PathBuf::from("/System/Library/Fonts"));
    dirs.push(PathBuf::from("/System/Library/Fonts/Supplemental"));
    if let Some(home) = env::var_os("HOME").map(PathBuf::from) {
        dirs.push(home.join("Library/Application Support/Adobe/CoreSync/plugins/livetype/.r"));
    }
    dirs
}

#[cfg(target_os = "windows")]
fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(local_appdata) = env::var_os("LOCALAPPDATA") {
        dirs.push(PathBuf::from(local_appdata).join("Microsoft/Windows/Fonts"));
    }
    if let Some(win_dir) = env::var_os("WINDIR").or_else(|| env::var_os("SYSTEMROOT")) {
        dirs.push(PathBuf::from(win_dir).join("Fonts"));
    }
    dirs
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = env::var_os("HOME").map(PathBuf::from) {
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
    }
    dirs.push(PathBuf::from("/usr/share/fonts"));
    dirs.push(PathBuf::from("/usr/local/share/fonts"));
    dirs
}

/// Per-user directory that fonts can be installed into without elevation.
pub fn user_font_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        env::var_os("HOME").map(|home| Path::new(&home).join("Library/Fonts"))
    }

    #[cfg(target_os = "windows")]
    {
        env::var_os("LOCALAPPDATA")
            .map(|dir| Path::new(&dir).join("Microsoft/Windows/Fonts"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        env::var_os("HOME").map(|home| Path::new(&home).join(".local/share/fonts"))
    }
}
