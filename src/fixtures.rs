#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;
    use std::ffi::OsString;
    use std::io;
    use std::path::{Component, Path, PathBuf};

    use crate::env::VarsEnvironment;
    use crate::fs::{FileKind, FileSystem, FsMeta, normalize};

    const MAX_LINK_HOPS: usize = 40;

    #[derive(Debug, Clone)]
    enum Node {
        File,
        Dir,
        Symlink(PathBuf),
    }

    /// In-memory Unix-style tree. Paths must be absolute and use `/`.
    ///
    /// Builder methods create missing parent directories. Device ids default
    /// to `1`; [`mount`](Self::mount) gives a subtree its own device.
    #[derive(Debug, Clone)]
    pub struct MemoryFs {
        nodes: BTreeMap<PathBuf, Node>,
        mounts: BTreeMap<PathBuf, u64>,
        denied: Vec<PathBuf>,
        case_insensitive: bool,
    }

    impl MemoryFs {
        pub fn new() -> Self {
            let mut nodes = BTreeMap::new();
            nodes.insert(PathBuf::from("/"), Node::Dir);
            Self {
                nodes,
                mounts: BTreeMap::new(),
                denied: Vec::new(),
                case_insensitive: false,
            }
        }

        /// Look names up case-insensitively, the way macOS and Windows do.
        pub fn case_insensitive(mut self) -> Self {
            self.case_insensitive = true;
            self
        }

        pub fn dir(self, path: &str) -> Self {
            self.insert(path, Node::Dir)
        }

        pub fn file(self, path: &str) -> Self {
            self.insert(path, Node::File)
        }

        pub fn symlink(self, path: &str, target: &str) -> Self {
            self.insert(path, Node::Symlink(PathBuf::from(target)))
        }

        /// Create `path` as a directory living on device `dev`.
        pub fn mount(mut self, path: &str, dev: u64) -> Self {
            self.mounts.insert(PathBuf::from(path), dev);
            self.dir(path)
        }

        /// Every operation on `path` or below fails with permission denied.
        pub fn deny(mut self, path: &str) -> Self {
            self.denied.push(PathBuf::from(path));
            self
        }

        fn insert(mut self, path: &str, node: Node) -> Self {
            let path = PathBuf::from(path);
            for ancestor in path.ancestors().skip(1) {
                self.nodes
                    .entry(ancestor.to_path_buf())
                    .or_insert(Node::Dir);
            }
            self.nodes.insert(path, node);
            self
        }

        fn lookup(&self, path: &Path) -> Option<(&PathBuf, &Node)> {
            if !self.case_insensitive {
                return self.nodes.get_key_value(path);
            }
            let wanted = path.to_string_lossy().to_lowercase();
            self.nodes
                .iter()
                .find(|(key, _)| key.to_string_lossy().to_lowercase() == wanted)
        }

        fn check_access(&self, path: &Path) -> io::Result<()> {
            if self.denied.iter().any(|d| path.starts_with(d)) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("permission denied: {}", path.display()),
                ));
            }
            Ok(())
        }

        /// Walk `path` component by component, expanding symlinks. The last
        /// component is only expanded when `follow_last` is set.
        fn resolve(&self, path: &Path, follow_last: bool) -> io::Result<PathBuf> {
            let mut pending: Vec<OsString> = Vec::new();
            push_components(&mut pending, &normalize(path));
            let mut current = PathBuf::from("/");
            let mut hops = 0;

            while let Some(name) = pending.pop() {
                if name == ".." {
                    current.pop();
                    continue;
                }
                let candidate = current.join(&name);
                let Some((key, node)) = self.lookup(&candidate) else {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("not found: {}", candidate.display()),
                    ));
                };
                self.check_access(key)?;
                match node {
                    Node::Symlink(target) if follow_last || !pending.is_empty() => {
                        hops += 1;
                        if hops > MAX_LINK_HOPS {
                            return Err(io::Error::other("too many levels of symbolic links"));
                        }
                        let target = if target.is_absolute() {
                            target.clone()
                        } else {
                            current.join(target)
                        };
                        current = PathBuf::from("/");
                        push_components(&mut pending, &target);
                    }
                    _ => current = key.clone(),
                }
            }
            Ok(current)
        }

        fn meta_of(&self, resolved: &Path) -> io::Result<FsMeta> {
            let (_, node) = self
                .lookup(resolved)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            let kind = match node {
                Node::File => FileKind::File,
                Node::Dir => FileKind::Dir,
                Node::Symlink(_) => FileKind::Symlink,
            };
            let dev = self
                .mounts
                .iter()
                .filter(|(mount, _)| resolved.starts_with(mount))
                .max_by_key(|(mount, _)| mount.components().count())
                .map(|(_, dev)| *dev)
                .unwrap_or(1);
            Ok(FsMeta {
                kind,
                dev: Some(dev),
            })
        }
    }

    /// Push the normal components of `path` onto `stack` so the first one is
    /// popped first.
    fn push_components(stack: &mut Vec<OsString>, path: &Path) {
        for component in path.components().rev() {
            match component {
                Component::Normal(name) => stack.push(name.to_os_string()),
                Component::ParentDir => stack.push(OsString::from("..")),
                _ => {}
            }
        }
    }

    impl FileSystem for MemoryFs {
        fn symlink_metadata(&self, path: &Path) -> io::Result<FsMeta> {
            let resolved = self.resolve(path, false)?;
            self.meta_of(&resolved)
        }

        fn metadata(&self, path: &Path) -> io::Result<FsMeta> {
            let resolved = self.resolve(path, true)?;
            self.meta_of(&resolved)
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
            let resolved = self.resolve(path, true)?;
            self.check_access(&resolved)?;
            match self.lookup(&resolved) {
                Some((_, Node::Dir)) => Ok(self
                    .nodes
                    .keys()
                    .filter(|key| key.parent() == Some(resolved.as_path()))
                    .filter_map(|key| key.file_name().map(|n| n.to_os_string()))
                    .collect()),
                _ => Err(io::Error::other(format!(
                    "not a directory: {}",
                    resolved.display()
                ))),
            }
        }

        fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
            self.resolve(path, true)
        }
    }

    /// A deterministic environment: working directory, `HOME`, and extra vars.
    pub fn vars_env(cwd: &str, vars: &[(&str, &str)]) -> VarsEnvironment {
        VarsEnvironment::new(
            std::iter::once(("HOME".to_string(), "/home/u".to_string()))
                .chain(vars.iter().map(|(k, v)| (k.to_string(), v.to_string()))),
        )
        .with_current_dir(cwd)
    }

    #[test]
    fn memory_fs_resolves_relative_links() {
        let fs = MemoryFs::new()
            .file("/real/cfg.yaml")
            .symlink("/proj/link.yaml", "../real/cfg.yaml");
        assert_eq!(
            fs.canonicalize(Path::new("/proj/link.yaml")).unwrap(),
            PathBuf::from("/real/cfg.yaml")
        );
        assert_eq!(
            fs.symlink_metadata(Path::new("/proj/link.yaml")).unwrap().kind,
            FileKind::Symlink
        );
    }

    #[test]
    fn memory_fs_mount_devices() {
        let fs = MemoryFs::new().mount("/mnt/disk", 7).dir("/mnt/disk/a");
        assert_eq!(fs.metadata(Path::new("/mnt/disk/a")).unwrap().dev, Some(7));
        assert_eq!(fs.metadata(Path::new("/mnt")).unwrap().dev, Some(1));
    }

    #[test]
    fn memory_fs_case_insensitive_lookup() {
        let fs = MemoryFs::new().file("/d/Config").case_insensitive();
        assert!(fs.metadata(Path::new("/d/config")).is_ok());
        assert_eq!(
            fs.read_dir(Path::new("/d")).unwrap(),
            vec![OsString::from("Config")]
        );
    }
}
