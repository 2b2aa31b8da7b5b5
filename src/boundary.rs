//! Upward directory walk that finds the workspace boundary.
//!
//! Starting at the working directory, each directory is tested against the
//! effective [`BoundaryMarker`]s in a fixed order:
//!
//! 1. **Env override**: the directory named by `{APP}_DIR`. When that
//!    directory is the start directory or any ancestor of it, it is the
//!    boundary, even if a closer directory carries another marker.
//! 2. **Named entries**: the directory contains e.g. `.git`.
//! 3. **Mountpoint**: the directory's device differs from its parent's.
//!    Never matches on Windows.
//! 4. **Root**: the filesystem root ends the walk but is not a workspace.
//!
//! The walk reports the boundary (if any) and every directory visited before
//! it: the start directory included, the boundary itself excluded. A directory
//! that cannot be inspected simply matches nothing and the walk moves on.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::StatCache;
use crate::fs::normalize;
use crate::scope::Platform;
use crate::types::BoundaryMarker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryWalk {
    /// The workspace directory, or `None` if the walk ran out at the root.
    pub boundary: Option<PathBuf>,
    /// Directories climbed, start first. Ends at the root when no boundary
    /// was found.
    pub visited: Vec<PathBuf>,
}

pub struct BoundaryDetector<'c, 'a> {
    cache: &'c StatCache<'a>,
    markers: Vec<BoundaryMarker>,
    env_dir: Option<PathBuf>,
    platform: Platform,
}

impl<'c, 'a> BoundaryDetector<'c, 'a> {
    /// `markers` is the effective set (empty when boundaries are disabled).
    /// `env_dir` is the resolved `{APP}_DIR` value, if any.
    pub fn new(
        cache: &'c StatCache<'a>,
        markers: Vec<BoundaryMarker>,
        env_dir: Option<PathBuf>,
        platform: Platform,
    ) -> Self {
        Self {
            cache,
            markers,
            env_dir,
            platform,
        }
    }

    pub fn find_boundary(&self, start: &Path) -> BoundaryWalk {
        let start = normalize(start);

        if let Some(dir) = self.env_override_for(&start) {
            debug!(boundary = %dir.display(), "workspace boundary from env override");
            let visited = start
                .ancestors()
                .take_while(|a| *a != dir.as_path())
                .map(Path::to_path_buf)
                .collect();
            return BoundaryWalk {
                boundary: Some(dir),
                visited,
            };
        }

        let mut visited = Vec::new();
        let mut current = start.as_path();
        loop {
            if let Some(kind) = self.matches(current) {
                debug!(boundary = %current.display(), kind, "workspace boundary found");
                return BoundaryWalk {
                    boundary: Some(current.to_path_buf()),
                    visited,
                };
            }
            visited.push(current.to_path_buf());
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        debug!(start = %start.display(), "no workspace boundary up to the filesystem root");
        BoundaryWalk {
            boundary: None,
            visited,
        }
    }

    fn env_override_for(&self, start: &Path) -> Option<PathBuf> {
        if !self.markers.contains(&BoundaryMarker::EnvOverride) {
            return None;
        }
        let dir = self.env_dir.as_ref()?;
        if start.starts_with(dir) && self.cache.stat(dir).is_some_and(|e| e.kind.is_dir()) {
            Some(dir.clone())
        } else {
            None
        }
    }

    /// The first marker matching `dir`, by kind name, in the fixed order
    /// named-entry > mountpoint. The root never matches here; it only ends
    /// the walk.
    fn matches(&self, dir: &Path) -> Option<&'static str> {
        let named = self.markers.iter().any(|m| match m {
            BoundaryMarker::Entry(name) => self.cache.exists(&dir.join(name)),
            _ => false,
        });
        if named {
            return Some("entry");
        }
        if self.markers.contains(&BoundaryMarker::Mountpoint) && self.is_mountpoint(dir) {
            return Some("mountpoint");
        }
        None
    }

    fn is_mountpoint(&self, dir: &Path) -> bool {
        if self.platform == Platform::Windows {
            return false;
        }
        let Some(parent) = dir.parent() else {
            return false;
        };
        let here = self.cache.stat(dir).and_then(|e| e.dev);
        let above = self.cache.stat(parent).and_then(|e| e.dev);
        matches!((here, above), (Some(a), Some(b)) if a != b)
    }

    /// Paths of the named marker entries present in `dir`, in marker order.
    /// These populate the `boundaries` field of project-scope results.
    pub fn markers_in(&self, dir: &Path) -> Vec<PathBuf> {
        self.markers
            .iter()
            .filter_map(|m| match m {
                BoundaryMarker::Entry(name) => Some(dir.join(name)),
                _ => None,
            })
            .filter(|p| self.cache.exists(p))
            .collect()
    }
}
