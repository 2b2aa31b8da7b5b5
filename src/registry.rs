//! Pluggable registry lookup.
//!
//! Some hosts keep configuration locations in a platform registry (the
//! Windows registry, a settings daemon, …). Discovery does not know how to
//! talk to any of them; the host injects a [`RegistryProvider`] instead. No
//! provider means the `registry` scope is empty, never an error.

use std::path::PathBuf;

pub trait RegistryProvider: Send + Sync {
    /// Config file paths registered for `app_name`, highest priority first.
    /// Failures inside the provider should be reported as an empty list.
    fn lookup(&self, app_name: &str) -> Vec<PathBuf>;
}

impl<F> RegistryProvider for F
where
    F: Fn(&str) -> Vec<PathBuf> + Send + Sync,
{
    fn lookup(&self, app_name: &str) -> Vec<PathBuf> {
        self(app_name)
    }
}

/// A provider that returns the same paths for every app.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    paths: Vec<PathBuf>,
}

impl StaticRegistry {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl RegistryProvider for StaticRegistry {
    fn lookup(&self, _app_name: &str) -> Vec<PathBuf> {
        self.paths.clone()
    }
}
