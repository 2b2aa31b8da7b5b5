//! Probing one root for config files and config directories.
//!
//! Every candidate from [`patterns::expand`](crate::patterns::expand) is
//! joined with the root, looked up through the [`StatCache`], and kept if it
//! has the right type under the root's [`SymlinkBehavior`]:
//!
//! | Policy   | Symlink candidate                         | Reported path   |
//! |----------|-------------------------------------------|-----------------|
//! | `Follow` | classified after canonical resolution     | canonical path  |
//! | `AsIs`   | classified by its target                  | the link itself |
//! | `Skip`   | dropped                                   | (none)          |
//!
//! Output order follows candidate order. A path reached twice (two names
//! resolving to the same file) is reported once, at its first position.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::cache::{EntryKind, StatCache};
use crate::patterns::{Candidates, locate};
use crate::scope::{RootDescriptor, RootKind};
use crate::types::{ScopeResult, Select, SymlinkBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    File,
    Dir,
}

impl Want {
    fn accepts(self, kind: EntryKind) -> bool {
        match self {
            Want::File => kind.is_file(),
            Want::Dir => kind.is_dir(),
        }
    }
}

pub struct ScopeProbe<'c, 'a> {
    cache: &'c StatCache<'a>,
    candidates: &'c Candidates,
    files: bool,
    dirs: bool,
}

impl<'c, 'a> ScopeProbe<'c, 'a> {
    /// `fields` limits the work to what the caller selected; `boundaries` is
    /// filled by the caller, not here.
    pub fn new(cache: &'c StatCache<'a>, candidates: &'c Candidates, fields: &[Select]) -> Self {
        Self {
            cache,
            candidates,
            files: fields.contains(&Select::ConfigFiles),
            dirs: fields.contains(&Select::ConfigDirs),
        }
    }

    pub fn probe(&self, root: &RootDescriptor) -> ScopeResult {
        let mut result = ScopeResult::default();

        if root.kind == RootKind::File {
            if self.files
                && let Some(path) = self.qualify(&root.path, root.symlinks, Want::File)
            {
                result.config_files.push(path);
            }
            return result;
        }

        if root.kind == RootKind::ConfigDir
            && self.dirs
            && let Some(path) = self.qualify(&root.path, root.symlinks, Want::Dir)
        {
            result.config_dirs.push(path);
        }

        if self.files {
            for candidate in &self.candidates.config {
                for path in locate(self.cache, &root.path, candidate, root.case) {
                    if let Some(found) = self.qualify(&path, root.symlinks, Want::File) {
                        push_unique(&mut result.config_files, found);
                    }
                }
            }
        }

        if self.dirs {
            for candidate in &self.candidates.dirs {
                for path in locate(self.cache, &root.path, candidate, root.case) {
                    if let Some(found) = self.qualify(&path, root.symlinks, Want::Dir) {
                        push_unique(&mut result.config_dirs, found);
                    }
                }
            }
        }

        result
    }

    /// The first qualifying config file under `root`, stopping as soon as
    /// one is found.
    pub fn first_file(&self, root: &RootDescriptor) -> Option<PathBuf> {
        if root.kind == RootKind::File {
            return self.qualify(&root.path, root.symlinks, Want::File);
        }
        self.candidates.config.iter().find_map(|candidate| {
            locate(self.cache, &root.path, candidate, root.case)
                .into_iter()
                .find_map(|path| self.qualify(&path, root.symlinks, Want::File))
        })
    }

    /// The path to report for `path`, or `None` if it does not qualify.
    fn qualify(&self, path: &Path, policy: SymlinkBehavior, want: Want) -> Option<PathBuf> {
        let entry = self.cache.stat(path)?;
        let found = match policy {
            SymlinkBehavior::Skip if entry.kind.is_symlink() => None,
            SymlinkBehavior::Skip | SymlinkBehavior::AsIs => {
                want.accepts(entry.kind).then(|| path.to_path_buf())
            }
            SymlinkBehavior::Follow => {
                let real = self.cache.canonicalize(path)?;
                let target = self.cache.stat(&real)?;
                want.accepts(target.kind).then_some(real)
            }
        };
        if let Some(p) = &found {
            trace!(candidate = %path.display(), reported = %p.display(), ?want, "candidate qualifies");
        }
        found
    }
}

fn push_unique(into: &mut Vec<PathBuf>, path: PathBuf) {
    if !into.contains(&path) {
        into.push(path);
    }
}
