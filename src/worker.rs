use crate::events::Emitter;
use crate::filters;
use crate::record::MatchRecord;
use crate::request::{entry_name, is_hidden_name, SearchRequest};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
struct Child {
    name: String,
    path: PathBuf,
    descend: bool,
}

#[derive(Debug, Default)]
struct Listing {
    dirs: Vec<Child>,
    files: Vec<Child>,
}

impl Listing {
    fn len(&self) -> u64 {
        (self.dirs.len() + self.files.len()) as u64
    }
}

/// Immediate children of `dir`, split into directories and everything else.
/// Symlinked directories count as directories but are not descended into.
fn list_dir(dir: &Path) -> io::Result<Listing> {
    let mut listing = Listing::default();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let (is_dir, descend) = match entry.file_type() {
            Ok(ft) if ft.is_symlink() => (path.is_dir(), false),
            Ok(ft) => (ft.is_dir(), ft.is_dir()),
            Err(_) => {
                let is_dir = path.is_dir();
                (is_dir, is_dir)
            }
        };
        let child = Child {
            name,
            path,
            descend,
        };
        if is_dir {
            listing.dirs.push(child);
        } else {
            listing.files.push(child);
        }
    }
    Ok(listing)
}

/// Top-level subdirectories of a root, handed to the partitioner. Hidden
/// directories are left out like everywhere else in a recursive search.
pub(crate) fn list_subdirectories(root: &Path, skip_hidden: bool) -> io::Result<Vec<PathBuf>> {
    let listing = list_dir(root)?;
    Ok(listing
        .dirs
        .into_iter()
        .filter(|d| d.descend && !(skip_hidden && is_hidden_name(&d.name)))
        .map(|d| d.path)
        .collect())
}

/// Everything one worker needs; owned by the worker thread.
#[derive(Debug, Clone)]
pub(crate) struct ScanContext {
    emitter: Emitter,
    skip_hidden_dirs: bool,
}

impl ScanContext {
    pub(crate) fn new(emitter: Emitter, skip_hidden_dirs: bool) -> Self {
        Self {
            emitter,
            skip_hidden_dirs,
        }
    }

    fn request(&self) -> &SearchRequest {
        self.emitter.session().request()
    }

    fn aborted(&self) -> bool {
        self.emitter.session().is_aborted()
    }

    fn inaccessible(&self, dir: &Path, err: &io::Error) {
        debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
        self.emitter.status(format!("Cannot access: {}", dir.display()));
    }

    fn consider(&self, name: &str, path: &Path, parent: &Path, is_dir: bool) {
        let request = self.request();
        if !request.matches_name(name) {
            return;
        }
        if !filters::passes(path, is_dir, request.filters()) {
            return;
        }
        let record = MatchRecord::capture(name.to_string(), path.to_path_buf(), parent, is_dir);
        self.emitter.found(record);
    }

    /// Top-down, depth-first walk: per level the directories are tested first,
    /// then the files, then the surviving directories are descended in order.
    fn walk(&self, top: &Path) {
        let mut pending = vec![top.to_path_buf()];
        while let Some(dir) = pending.pop() {
            if self.aborted() {
                return;
            }
            let mut listing = match list_dir(&dir) {
                Ok(listing) => listing,
                Err(err) => {
                    self.inaccessible(&dir, &err);
                    continue;
                }
            };
            if self.skip_hidden_dirs {
                listing.dirs.retain(|d| !is_hidden_name(&d.name));
            }
            self.emitter.scanned(listing.len());

            for child in &listing.dirs {
                if self.aborted() {
                    return;
                }
                self.consider(&child.name, &child.path, &dir, true);
            }
            for child in &listing.files {
                if self.aborted() {
                    return;
                }
                self.consider(&child.name, &child.path, &dir, false);
            }

            pending.extend(
                listing
                    .dirs
                    .into_iter()
                    .rev()
                    .filter(|d| d.descend)
                    .map(|d| d.path),
            );
        }
    }

    /// Files directly inside `root`, plus the symlinked directories there;
    /// descendable subdirectories belong to subtree workers.
    pub(crate) fn scan_root_level(&self, root: &Path) {
        let listing = match list_dir(root) {
            Ok(listing) => listing,
            Err(err) => {
                self.inaccessible(root, &err);
                return;
            }
        };
        self.emitter.scanned_tick(listing.len(), None);

        let links = listing
            .dirs
            .iter()
            .filter(|d| !d.descend && !(self.skip_hidden_dirs && is_hidden_name(&d.name)));
        for child in links {
            if self.aborted() {
                return;
            }
            self.consider(&child.name, &child.path, root, true);
        }
        for child in &listing.files {
            if self.aborted() {
                return;
            }
            self.consider(&child.name, &child.path, root, false);
        }
    }

    /// Full recursive descent of each assigned directory, the directory
    /// itself included.
    pub(crate) fn scan_subtrees(&self, directories: &[PathBuf]) {
        for dir in directories {
            if self.aborted() {
                return;
            }
            if let Some(parent) = dir.parent() {
                self.consider(&entry_name(dir), dir, parent, true);
            }
            self.walk(dir);
        }
    }

    /// Whole-location search used for non-recursive searches and as the
    /// fallback when a root cannot be partitioned.
    pub(crate) fn scan_location(&self, root: &Path) {
        if self.request().filters().include_subfolders {
            self.walk(root);
            return;
        }

        let listing = match list_dir(root) {
            Ok(listing) => listing,
            Err(err) => {
                self.inaccessible(root, &err);
                return;
            }
        };
        let total = listing.len();
        self.emitter.scanned_tick(total, Some(total));

        for (child, is_dir) in listing
            .dirs
            .iter()
            .map(|c| (c, true))
            .chain(listing.files.iter().map(|c| (c, false)))
        {
            if self.aborted() {
                return;
            }
            self.consider(&child.name, &child.path, root, is_dir);
        }
    }
}
