//! Maps each [`Scope`] to the concrete roots probed for it.
//!
//! | Scope       | Roots                                                          |
//! |-------------|----------------------------------------------------------------|
//! | `env`       | `{APP}_CONFIG` (a file) and `{APP}_DIR` (a directory)          |
//! | `project`   | working directory, then each directory climbed by the walk     |
//! | `workspace` | the boundary directory found by the walk                       |
//! | `user`      | home, then the per-user config directory                       |
//! | `system`    | machine-wide config directories                                |
//! | `registry`  | whatever the injected provider returns (files only)            |
//!
//! Per-user and system directories by platform:
//!
//! - **Linux / Unix**: `$XDG_CONFIG_HOME` (fallback `~/.config`); `/etc`, then
//!   `$XDG_CONFIG_DIRS` (fallback `/etc/xdg`).
//! - **macOS**: as Unix, plus `~/Library/Application Support` and
//!   `/Library/Application Support`.
//! - **Windows**: `%APPDATA%` and `%LOCALAPPDATA%` (fallbacks under
//!   `%USERPROFILE%\AppData`); `%ProgramData%` (fallback `C:\ProgramData`).
//!
//! [`Options::search_locations`] roots are appended to their scope and
//! [`Options::skip_locations`] paths are removed before anything is probed.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::boundary::BoundaryWalk;
use crate::env::{self, Environment};
use crate::fs::absolutize;
use crate::patterns::CaseMode;
use crate::registry::RegistryProvider;
use crate::types::{Options, Scope, SymlinkBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux and every other Unix-like system.
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Whether the platform's default filesystem distinguishes name case.
    pub fn case_sensitive(self) -> bool {
        matches!(self, Platform::Linux)
    }
}

/// How a root relates to the candidates probed under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// A directory searched for candidates.
    Directory,
    /// A directory that is itself a config directory and is also searched.
    ConfigDir,
    /// An already-named config file.
    File,
}

/// One root to probe, with the policies that apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDescriptor {
    pub path: PathBuf,
    pub kind: RootKind,
    pub symlinks: SymlinkBehavior,
    pub case: CaseMode,
}

pub struct ScopeResolver<'r> {
    env: &'r dyn Environment,
    registry: Option<&'r dyn RegistryProvider>,
    platform: Platform,
    app_name: &'r str,
    options: &'r Options,
    cwd: PathBuf,
    home: Option<PathBuf>,
}

impl<'r> ScopeResolver<'r> {
    pub fn new(
        env: &'r dyn Environment,
        registry: Option<&'r dyn RegistryProvider>,
        platform: Platform,
        app_name: &'r str,
        options: &'r Options,
        cwd: PathBuf,
    ) -> Self {
        let home = home_dir(env, platform);
        Self {
            env,
            registry,
            platform,
            app_name,
            options,
            cwd,
            home,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Resolved `{APP}_CONFIG` value.
    pub fn env_file(&self) -> Option<PathBuf> {
        let name = env::config_var_name(self.app_name, self.options.env_override.as_deref());
        env::override_path(self.env, &name, Some(&self.cwd), self.home())
    }

    /// Resolved `{APP}_DIR` value. Also feeds the boundary walk.
    pub fn env_dir(&self) -> Option<PathBuf> {
        let name = env::dir_var_name(self.app_name, self.options.env_dir_override.as_deref());
        env::override_path(self.env, &name, Some(&self.cwd), self.home())
    }

    /// Roots for `scope`. `walk` is needed by `project` and `workspace` and
    /// ignored by the others.
    pub fn resolve_roots(&self, scope: Scope, walk: Option<&BoundaryWalk>) -> Vec<RootDescriptor> {
        if self.options.skips_scope(scope) {
            trace!(%scope, "scope skipped");
            return Vec::new();
        }

        let mut roots: Vec<(PathBuf, RootKind)> = match scope {
            Scope::Env => {
                let mut roots = Vec::new();
                if let Some(file) = self.env_file() {
                    roots.push((file, RootKind::File));
                }
                if let Some(dir) = self.env_dir() {
                    roots.push((dir, RootKind::ConfigDir));
                }
                roots
            }
            Scope::Project => {
                let mut dirs = walk.map(|w| w.visited.clone()).unwrap_or_default();
                // The walk stops before the boundary, so a working directory
                // that is itself the boundary never shows up as visited.
                if dirs.is_empty() {
                    dirs.push(self.cwd.clone());
                }
                dirs.into_iter().map(|p| (p, RootKind::Directory)).collect()
            }
            Scope::Workspace => walk
                .and_then(|w| w.boundary.clone())
                .map(|p| (p, RootKind::Directory))
                .into_iter()
                .collect(),
            Scope::User => self.user_dirs().into_iter().map(|p| (p, RootKind::Directory)).collect(),
            Scope::System => self.system_dirs().into_iter().map(|p| (p, RootKind::Directory)).collect(),
            Scope::Registry => match self.registry {
                Some(provider) => provider
                    .lookup(self.app_name)
                    .into_iter()
                    .map(|p| (absolutize(&p, &self.cwd), RootKind::File))
                    .collect(),
                None => Vec::new(),
            },
        };

        let extra_kind = if scope == Scope::Registry {
            RootKind::File
        } else {
            RootKind::Directory
        };
        roots.extend(
            self.options
                .extra_roots(scope)
                .map(|p| (absolutize(p, &self.cwd), extra_kind)),
        );

        let case = CaseMode::new(self.options.case_sensitive, self.platform.case_sensitive());
        let mut out: Vec<RootDescriptor> = Vec::with_capacity(roots.len());
        for (path, kind) in roots {
            if self.options.skips_path(&path) {
                trace!(%scope, path = %path.display(), "root skipped");
                continue;
            }
            if out.iter().any(|r| r.path == path && r.kind == kind) {
                continue;
            }
            out.push(RootDescriptor {
                path,
                kind,
                symlinks: self.options.symlinks,
                case,
            });
        }
        out
    }

    fn user_dirs(&self) -> Vec<PathBuf> {
        let Some(home) = self.home.clone() else {
            return Vec::new();
        };
        let mut dirs = vec![home.clone()];
        match self.platform {
            Platform::Windows => {
                dirs.push(
                    self.abs_var("APPDATA")
                        .unwrap_or_else(|| home.join("AppData").join("Roaming")),
                );
                dirs.push(
                    self.abs_var("LOCALAPPDATA")
                        .unwrap_or_else(|| home.join("AppData").join("Local")),
                );
            }
            Platform::Linux | Platform::MacOs => {
                dirs.push(
                    self.abs_var("XDG_CONFIG_HOME")
                        .unwrap_or_else(|| home.join(".config")),
                );
                if self.platform == Platform::MacOs {
                    dirs.push(home.join("Library").join("Application Support"));
                }
            }
        }
        dirs
    }

    fn system_dirs(&self) -> Vec<PathBuf> {
        match self.platform {
            Platform::Windows => vec![
                self.abs_var("ProgramData")
                    .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData")),
            ],
            Platform::Linux | Platform::MacOs => {
                let mut dirs = vec![PathBuf::from("/etc")];
                let xdg: Vec<PathBuf> = self
                    .env
                    .var("XDG_CONFIG_DIRS")
                    .map(|v| {
                        v.split(':')
                            .filter(|s| !s.is_empty())
                            .map(PathBuf::from)
                            .filter(|p| p.is_absolute())
                            .collect()
                    })
                    .unwrap_or_default();
                if xdg.is_empty() {
                    dirs.push(PathBuf::from("/etc/xdg"));
                } else {
                    dirs.extend(xdg);
                }
                if self.platform == Platform::MacOs {
                    dirs.push(PathBuf::from("/Library/Application Support"));
                }
                dirs
            }
        }
    }

    /// A variable holding an absolute path; blank or relative values are
    /// treated as unset.
    fn abs_var(&self, name: &str) -> Option<PathBuf> {
        self.env
            .var(name)
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
    }
}

fn home_dir(env: &dyn Environment, platform: Platform) -> Option<PathBuf> {
    let var = if platform == Platform::Windows {
        "USERPROFILE"
    } else {
        "HOME"
    };
    env.var(var)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| env.home_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::VarsEnvironment;
    use crate::registry::StaticRegistry;
    use crate::types::{SearchLocation, SkipLocation};

    fn env(pairs: &[(&str, &str)]) -> VarsEnvironment {
        VarsEnvironment::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    fn paths(roots: &[RootDescriptor]) -> Vec<PathBuf> {
        roots.iter().map(|r| r.path.clone()).collect()
    }

    fn resolver<'r>(
        e: &'r VarsEnvironment,
        platform: Platform,
        options: &'r Options,
    ) -> ScopeResolver<'r> {
        ScopeResolver::new(e, None, platform, "myapp", options, PathBuf::from("/work"))
    }

    #[test]
    fn env_scope_reads_both_overrides() {
        let e = env(&[
            ("HOME", "/home/u"),
            ("MYAPP_CONFIG", "~/custom.json"),
            ("MYAPP_DIR", "conf"),
        ]);
        let opts = Options::default();
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::Env, None);
        assert_eq!(
            roots.iter().map(|r| (r.path.clone(), r.kind)).collect::<Vec<_>>(),
            vec![
                (PathBuf::from("/home/u/custom.json"), RootKind::File),
                (PathBuf::from("/work/conf"), RootKind::ConfigDir),
            ]
        );
    }

    #[test]
    fn env_scope_honors_custom_variable_names() {
        let e = env(&[("CFG", "/x.ini"), ("MYAPP_CONFIG", "/ignored")]);
        let opts = Options {
            env_override: Some("CFG".into()),
            ..Options::default()
        };
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::Env, None);
        assert_eq!(paths(&roots), vec![PathBuf::from("/x.ini")]);
    }

    #[test]
    fn user_scope_linux_xdg_fallback() {
        let e = env(&[("HOME", "/home/u")]);
        let opts = Options::default();
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::User, None);
        assert_eq!(
            paths(&roots),
            vec![PathBuf::from("/home/u"), PathBuf::from("/home/u/.config")]
        );
    }

    #[test]
    fn user_scope_linux_xdg_set() {
        let e = env(&[("HOME", "/home/u"), ("XDG_CONFIG_HOME", "/xdg")]);
        let opts = Options::default();
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::User, None);
        assert_eq!(paths(&roots), vec![PathBuf::from("/home/u"), PathBuf::from("/xdg")]);
    }

    #[test]
    fn user_scope_without_home_is_empty() {
        let e = env(&[]);
        let opts = Options::default();
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::User, None);
        assert!(roots.is_empty());
    }

    #[test]
    fn user_scope_falls_back_to_os_home() {
        let e = env(&[]).with_home_dir("/os/home");
        let opts = Options::default();
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::User, None);
        assert_eq!(roots[0].path, PathBuf::from("/os/home"));
    }

    #[test]
    fn user_scope_macos_adds_application_support() {
        let e = env(&[("HOME", "/Users/u")]);
        let opts = Options::default();
        let roots = resolver(&e, Platform::MacOs, &opts).resolve_roots(Scope::User, None);
        assert_eq!(
            roots.last().unwrap().path,
            PathBuf::from("/Users/u/Library/Application Support")
        );
    }

    #[test]
    fn system_scope_linux() {
        let e = env(&[("XDG_CONFIG_DIRS", "/opt/xdg::relative:/usr/etc/xdg")]);
        let opts = Options::default();
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::System, None);
        assert_eq!(
            paths(&roots),
            vec![
                PathBuf::from("/etc"),
                PathBuf::from("/opt/xdg"),
                PathBuf::from("/usr/etc/xdg")
            ]
        );

        let e = env(&[]);
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::System, None);
        assert_eq!(paths(&roots), vec![PathBuf::from("/etc"), PathBuf::from("/etc/xdg")]);
    }

    #[cfg(windows)]
    #[test]
    fn windows_mapping_uses_profile_variables() {
        let e = env(&[
            ("USERPROFILE", r"C:\Users\u"),
            ("APPDATA", r"C:\Users\u\AppData\Roaming"),
            ("ProgramData", r"D:\ProgramData"),
        ]);
        let opts = Options::default();
        let r = resolver(&e, Platform::Windows, &opts);
        let user = paths(&r.resolve_roots(Scope::User, None));
        assert_eq!(user[0], PathBuf::from(r"C:\Users\u"));
        assert_eq!(user[1], PathBuf::from(r"C:\Users\u\AppData\Roaming"));
        assert_eq!(user[2], PathBuf::from(r"C:\Users\u\AppData\Local"));
        let system = paths(&r.resolve_roots(Scope::System, None));
        assert_eq!(system, vec![PathBuf::from(r"D:\ProgramData")]);
    }

    #[test]
    fn windows_mapping_falls_back_without_variables() {
        // Unix-style absolute paths keep this runnable on every host.
        let e = env(&[("USERPROFILE", "/profile"), ("HOME", "/ignored")]);
        let opts = Options::default();
        let r = resolver(&e, Platform::Windows, &opts);
        assert_eq!(
            paths(&r.resolve_roots(Scope::User, None)),
            vec![
                PathBuf::from("/profile"),
                PathBuf::from("/profile").join("AppData").join("Roaming"),
                PathBuf::from("/profile").join("AppData").join("Local"),
            ]
        );
        assert_eq!(
            paths(&r.resolve_roots(Scope::System, None)),
            vec![PathBuf::from(r"C:\ProgramData")]
        );
    }

    #[test]
    fn project_and_workspace_follow_walk() {
        let e = env(&[]);
        let opts = Options::default();
        let walk = BoundaryWalk {
            boundary: Some("/repo".into()),
            visited: vec!["/repo/pkg/a".into(), "/repo/pkg".into()],
        };
        let r = resolver(&e, Platform::Linux, &opts);
        assert_eq!(
            paths(&r.resolve_roots(Scope::Project, Some(&walk))),
            vec![PathBuf::from("/repo/pkg/a"), PathBuf::from("/repo/pkg")]
        );
        assert_eq!(
            paths(&r.resolve_roots(Scope::Workspace, Some(&walk))),
            vec![PathBuf::from("/repo")]
        );
    }

    #[test]
    fn project_includes_cwd_that_is_the_boundary() {
        let e = env(&[]);
        let opts = Options::default();
        let walk = BoundaryWalk {
            boundary: Some("/work".into()),
            visited: Vec::new(),
        };
        let r = resolver(&e, Platform::Linux, &opts);
        assert_eq!(
            paths(&r.resolve_roots(Scope::Project, Some(&walk))),
            vec![PathBuf::from("/work")]
        );
    }

    #[test]
    fn search_and_skip_locations() {
        let e = env(&[("HOME", "/home/u")]);
        let opts = Options {
            search_locations: vec![SearchLocation::new(Scope::User, "extra")],
            skip_locations: vec![SkipLocation::Path("/home/u/.config".into())],
            ..Options::default()
        };
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::User, None);
        assert_eq!(
            paths(&roots),
            vec![PathBuf::from("/home/u"), PathBuf::from("/work/extra")]
        );
    }

    #[test]
    fn skipped_scope_has_no_roots() {
        let e = env(&[("HOME", "/home/u")]);
        let opts = Options {
            skip_locations: vec![SkipLocation::Scope(Scope::User)],
            ..Options::default()
        };
        let r = resolver(&e, Platform::Linux, &opts);
        assert!(r.resolve_roots(Scope::User, None).is_empty());
    }

    #[test]
    fn registry_roots_come_from_provider() {
        let e = env(&[]);
        let opts = Options::default();
        let provider = StaticRegistry::new(vec![PathBuf::from("/reg/app.json")]);
        let r = ScopeResolver::new(
            &e,
            Some(&provider),
            Platform::Linux,
            "myapp",
            &opts,
            PathBuf::from("/work"),
        );
        let roots = r.resolve_roots(Scope::Registry, None);
        assert_eq!(paths(&roots), vec![PathBuf::from("/reg/app.json")]);
        assert_eq!(roots[0].kind, RootKind::File);

        let none = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::Registry, None);
        assert!(none.is_empty());
    }

    #[test]
    fn descriptors_carry_policies() {
        let e = env(&[("HOME", "/home/u")]);
        let opts = Options {
            case_sensitive: Some(false),
            symlinks: SymlinkBehavior::Skip,
            ..Options::default()
        };
        let roots = resolver(&e, Platform::Linux, &opts).resolve_roots(Scope::User, None);
        assert!(roots.iter().all(|r| r.case == CaseMode::Folded && r.symlinks == SymlinkBehavior::Skip));
    }
}
