//! Per-call memoization of filesystem queries.
//!
//! A [`StatCache`] lives for exactly one discovery call. Entries are keyed by
//! the normalized absolute path and are never invalidated: within a call the
//! same path always classifies the same way, and a new call starts from an
//! empty cache. Failed lookups are cached as absent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::trace;

use crate::fs::{FileKind, FileSystem, normalize};

/// What a path is, with symlinks classified by their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    SymlinkToFile,
    SymlinkToDir,
    /// A symlink whose target is missing, unreadable, or part of a cycle.
    BrokenSymlink,
    /// Sockets, fifos, devices, or a link to one of those.
    Other,
}

impl EntryKind {
    pub fn is_file(self) -> bool {
        matches!(self, EntryKind::File | EntryKind::SymlinkToFile)
    }

    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Dir | EntryKind::SymlinkToDir)
    }

    pub fn is_symlink(self) -> bool {
        matches!(
            self,
            EntryKind::SymlinkToFile | EntryKind::SymlinkToDir | EntryKind::BrokenSymlink
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub kind: EntryKind,
    /// Device of the entry (of the target, for a resolved symlink).
    pub dev: Option<u64>,
}

pub struct StatCache<'a> {
    fs: &'a dyn FileSystem,
    stats: RefCell<HashMap<PathBuf, Option<CacheEntry>>>,
    listings: RefCell<HashMap<PathBuf, Option<Rc<[OsString]>>>>,
    canonical: RefCell<HashMap<PathBuf, Option<PathBuf>>>,
}

impl<'a> StatCache<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            stats: RefCell::new(HashMap::new()),
            listings: RefCell::new(HashMap::new()),
            canonical: RefCell::new(HashMap::new()),
        }
    }

    /// Classify `path`, or `None` if it does not exist or cannot be stat'ed.
    pub fn stat(&self, path: &Path) -> Option<CacheEntry> {
        let key = normalize(path);
        if let Some(hit) = self.stats.borrow().get(&key) {
            return *hit;
        }
        let entry = self.classify(&key);
        self.stats.borrow_mut().insert(key, entry);
        entry
    }

    fn classify(&self, path: &Path) -> Option<CacheEntry> {
        let meta = match self.fs.symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                trace!(path = %path.display(), error = %e, "stat failed, treating as absent");
                return None;
            }
        };
        let entry = match meta.kind {
            FileKind::File => CacheEntry {
                kind: EntryKind::File,
                dev: meta.dev,
            },
            FileKind::Dir => CacheEntry {
                kind: EntryKind::Dir,
                dev: meta.dev,
            },
            FileKind::Other => CacheEntry {
                kind: EntryKind::Other,
                dev: meta.dev,
            },
            FileKind::Symlink => match self.fs.metadata(path) {
                Ok(target) => CacheEntry {
                    kind: match target.kind {
                        FileKind::File => EntryKind::SymlinkToFile,
                        FileKind::Dir => EntryKind::SymlinkToDir,
                        _ => EntryKind::Other,
                    },
                    dev: target.dev,
                },
                Err(e) => {
                    trace!(path = %path.display(), error = %e, "symlink target unresolved");
                    CacheEntry {
                        kind: EntryKind::BrokenSymlink,
                        dev: meta.dev,
                    }
                }
            },
        };
        Some(entry)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_some()
    }

    /// Entry names of the directory at `path`, sorted bytewise.
    pub fn list(&self, path: &Path) -> Option<Rc<[OsString]>> {
        let key = normalize(path);
        if let Some(hit) = self.listings.borrow().get(&key) {
            return hit.clone();
        }
        let listing = match self.fs.read_dir(&key) {
            Ok(mut names) => {
                names.sort();
                Some(Rc::from(names))
            }
            Err(e) => {
                trace!(path = %key.display(), error = %e, "read_dir failed, treating as empty");
                None
            }
        };
        self.listings.borrow_mut().insert(key, listing.clone());
        listing
    }

    /// Canonical path of `path`, or `None` when resolution fails (including
    /// symlink cycles).
    pub fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        let key = normalize(path);
        if let Some(hit) = self.canonical.borrow().get(&key) {
            return hit.clone();
        }
        let resolved = match self.fs.canonicalize(&key) {
            Ok(p) => Some(p),
            Err(e) => {
                trace!(path = %key.display(), error = %e, "canonicalize failed");
                None
            }
        };
        self.canonical.borrow_mut().insert(key, resolved.clone());
        resolved
    }
}
