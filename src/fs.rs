//! Filesystem capability.
//!
//! Discovery never touches `std::fs` directly. Everything goes through a
//! [`FileSystem`] implementation so hosts can inject a sandboxed or simulated
//! tree. [`OsFileSystem`] is the real one.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// The type of a single directory entry, without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// The subset of metadata discovery cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsMeta {
    pub kind: FileKind,
    /// Device identifier, where the platform exposes one.
    pub dev: Option<u64>,
}

pub trait FileSystem: Send + Sync {
    /// Metadata of `path` itself; a symlink reports [`FileKind::Symlink`].
    fn symlink_metadata(&self, path: &Path) -> io::Result<FsMeta>;

    /// Metadata of whatever `path` ultimately points at.
    fn metadata(&self, path: &Path) -> io::Result<FsMeta>;

    /// Names of the entries directly inside `path`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Absolute path with every symlink resolved. Fails on cycles.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    fn convert(meta: std::fs::Metadata) -> FsMeta {
        let ft = meta.file_type();
        let kind = if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_dir() {
            FileKind::Dir
        } else if ft.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };
        FsMeta {
            kind,
            dev: device_id(&meta),
        }
    }
}

#[cfg(unix)]
fn device_id(meta: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.dev())
}

#[cfg(not(unix))]
fn device_id(_meta: &std::fs::Metadata) -> Option<u64> {
    None
}

impl FileSystem for OsFileSystem {
    fn symlink_metadata(&self, path: &Path) -> io::Result<FsMeta> {
        std::fs::symlink_metadata(path).map(Self::convert)
    }

    fn metadata(&self, path: &Path) -> io::Result<FsMeta> {
        std::fs::metadata(path).map(Self::convert)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// Lexically normalize `path`: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem, so `..` after a
/// symlink is folded textually.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve `path` against `base` when relative, then normalize.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/b/..")), PathBuf::from("/a"));
    }

    #[test]
    fn absolutize_joins_relative() {
        assert_eq!(
            absolutize(Path::new("cfg/../x.json"), Path::new("/work")),
            PathBuf::from("/work/x.json")
        );
        assert_eq!(
            absolutize(Path::new("/etc/x"), Path::new("/work")),
            PathBuf::from("/etc/x")
        );
    }

    #[test]
    fn os_fs_classifies_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f"), "").unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();

        let osfs = OsFileSystem;
        assert_eq!(
            osfs.symlink_metadata(&dir.path().join("f")).unwrap().kind,
            FileKind::File
        );
        assert_eq!(
            osfs.symlink_metadata(&dir.path().join("d")).unwrap().kind,
            FileKind::Dir
        );
        assert!(osfs.symlink_metadata(&dir.path().join("nope")).is_err());

        let mut names = osfs.read_dir(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("d"), OsString::from("f")]);
    }

    #[cfg(unix)]
    #[test]
    fn os_fs_reports_symlinks_and_devices() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("target"), "").unwrap();
        std::os::unix::fs::symlink(dir.path().join("target"), dir.path().join("link")).unwrap();

        let osfs = OsFileSystem;
        let link = osfs.symlink_metadata(&dir.path().join("link")).unwrap();
        assert_eq!(link.kind, FileKind::Symlink);
        assert!(link.dev.is_some());
        assert_eq!(
            osfs.metadata(&dir.path().join("link")).unwrap().kind,
            FileKind::File
        );
    }
}
