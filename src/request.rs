use crate::error::{Result, SearchError};
use crate::filters::SearchFilters;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Query prefix that widens the search to every mounted volume.
pub const ALL_DRIVES_PREFIX: &str = "alldrives:";

/// Validated, immutable description of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    roots: Vec<PathBuf>,
    term: String,
    filters: SearchFilters,
}

impl SearchRequest {
    pub fn new(roots: Vec<PathBuf>, term: &str, filters: SearchFilters) -> Result<Self> {
        if term.trim().is_empty() {
            return Err(SearchError::EmptyTerm);
        }
        if roots.is_empty() {
            return Err(SearchError::NoRoots);
        }
        Ok(Self {
            roots,
            term: term.trim().to_lowercase(),
            filters,
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lowercased term.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn matches_name(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.term)
    }
}

pub fn strip_all_drives_prefix(query: &str) -> Option<&str> {
    let head = query.get(..ALL_DRIVES_PREFIX.len())?;
    if head.eq_ignore_ascii_case(ALL_DRIVES_PREFIX) {
        Some(query[ALL_DRIVES_PREFIX.len()..].trim())
    } else {
        None
    }
}

/// Mount points of every volume that is currently reachable.
pub fn mounted_volumes() -> Vec<PathBuf> {
    let disks = Disks::new_with_refreshed_list();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for disk in disks.list() {
        let mount = disk.mount_point().to_path_buf();
        if mount.is_dir() && seen.insert(mount.clone()) {
            out.push(mount);
        }
    }
    out
}

/// Splits a raw query into search roots and the term to match.
///
/// An `AllDrives:` prefix selects every mounted volume; otherwise the
/// `current` location is searched.
pub fn resolve_scope(query: &str, current: &[PathBuf]) -> (Vec<PathBuf>, String) {
    resolve_scope_with(query, current, mounted_volumes)
}

fn resolve_scope_with(
    query: &str,
    current: &[PathBuf],
    volumes: impl FnOnce() -> Vec<PathBuf>,
) -> (Vec<PathBuf>, String) {
    match strip_all_drives_prefix(query) {
        Some(term) => (volumes(), term.to_string()),
        None => (current.to_vec(), query.to_string()),
    }
}

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

pub(crate) fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
