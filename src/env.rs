//! Environment capability and override-variable handling.
//!
//! Discovery reads variables, the working directory, and the home directory
//! through an [`Environment`] so callers can substitute a fixed set of values.
//! [`SystemEnvironment`] reads the real process state; [`VarsEnvironment`]
//! takes synthetic data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fs::absolutize;

pub trait Environment: Send + Sync {
    /// Value of the variable `name`, if set.
    fn var(&self, name: &str) -> Option<String>;

    fn current_dir(&self) -> Option<PathBuf>;

    /// Home directory as reported by the OS when no `HOME`/`USERPROFILE`
    /// variable is available.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }
}

/// An environment built from explicit values.
///
/// Takes an iterator so tests can pass synthetic pairs instead of
/// `std::env::vars()`.
#[derive(Debug, Clone, Default)]
pub struct VarsEnvironment {
    vars: HashMap<String, String>,
    current_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
}

impl VarsEnvironment {
    pub fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(dir.into());
        self
    }
}

impl Environment for VarsEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        self.current_dir.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}

/// Prefix for derived variable names: the app name uppercased, with every
/// character outside `[A-Za-z0-9_]` replaced by `_` (`my-app` → `MY_APP`).
pub fn env_prefix(app_name: &str) -> String {
    app_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Name of the variable pointing at a config file (`{APP}_CONFIG`).
pub fn config_var_name(app_name: &str, explicit: Option<&str>) -> String {
    match explicit {
        Some(name) => name.to_string(),
        None => format!("{}_CONFIG", env_prefix(app_name)),
    }
}

/// Name of the variable pointing at a config directory (`{APP}_DIR`).
pub fn dir_var_name(app_name: &str, explicit: Option<&str>) -> String {
    match explicit {
        Some(name) => name.to_string(),
        None => format!("{}_DIR", env_prefix(app_name)),
    }
}

/// Read `name` and turn its value into an absolute path.
///
/// An unset or blank variable yields `None`. A leading `~` is expanded to
/// `home`; a relative value is resolved against `cwd`. When expansion needs a
/// home or cwd that is unknown, the value is treated as unset.
pub fn override_path(
    env: &dyn Environment,
    name: &str,
    cwd: Option<&Path>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    let raw = env.var(name)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let expanded = expand_tilde(raw, home)?;
    if expanded.is_absolute() {
        return Some(absolutize(&expanded, Path::new("/")));
    }
    cwd.map(|cwd| absolutize(&expanded, cwd))
}

fn expand_tilde(raw: &str, home: Option<&Path>) -> Option<PathBuf> {
    if raw == "~" {
        return home.map(Path::to_path_buf);
    }
    match raw
        .strip_prefix("~/")
        .or_else(|| raw.strip_prefix("~\\"))
    {
        Some(rest) => home.map(|h| h.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}
