use std::path::PathBuf;
use std::sync::Arc;

use crate::discover::Context;
use crate::env::{Environment, SystemEnvironment};
use crate::error::FindfigError;
use crate::fs::{FileSystem, OsFileSystem};
use crate::registry::RegistryProvider;
use crate::scope::Platform;
use crate::types::{
    BoundaryMarker, DiscoveryResult, Found, Options, Scope, SearchLocation, Select, SkipLocation,
    SymlinkBehavior,
};

/// Entry point for building a discovery call.
pub struct Findfig;

impl Findfig {
    pub fn builder() -> FindfigBuilder {
        FindfigBuilder::new()
    }
}

/// Builder for configuring and running config discovery.
///
/// Collects three things:
///
/// - **What to look for**: [`app_name()`](Self::app_name),
///   [`file_name()`](Self::file_name), [`extensions()`](Self::extensions),
///   [`pattern()`](Self::pattern).
/// - **Where and in which order**: [`precedence()`](Self::precedence),
///   [`search_location()`](Self::search_location), boundary markers.
/// - **What it runs against**: [`filesystem()`](Self::filesystem),
///   [`environment()`](Self::environment), [`registry()`](Self::registry),
///   [`platform()`](Self::platform). Defaults are the real process state.
///
/// `precedence` and `select` can be given by name. Names are checked when a
/// terminal method runs, before anything is probed.
pub struct FindfigBuilder {
    app_name: Option<String>,
    options: Options,
    precedence_names: Option<Vec<String>>,
    select_names: Option<Vec<String>>,
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn Environment>,
    registry: Option<Arc<dyn RegistryProvider>>,
    platform: Platform,
}

impl FindfigBuilder {
    fn new() -> Self {
        Self {
            app_name: None,
            options: Options::default(),
            precedence_names: None,
            select_names: None,
            fs: Arc::new(OsFileSystem),
            env: Arc::new(SystemEnvironment),
            registry: None,
            platform: Platform::current(),
        }
    }

    /// Set the application name. Drives `.{app}` candidates, `{APP}_CONFIG`
    /// and `{APP}_DIR`, and the per-app directories under user and system
    /// roots.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Replace every option at once. Name-based `precedence`/`select` set
    /// earlier are discarded.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self.precedence_names = None;
        self.select_names = None;
        self
    }

    /// Override the base file name (default: `"config"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.options.file_name = name.to_string();
        self
    }

    /// Replace the extension list. `""` means "no extension"; a leading dot
    /// is tolerated.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extensions = exts.into_iter().map(Into::into).collect();
        self
    }

    /// Add a config file glob, tried after every literal candidate.
    pub fn pattern(mut self, glob: &str) -> Self {
        self.options.patterns.push(glob.to_string());
        self
    }

    /// Add a config directory glob.
    pub fn dir_pattern(mut self, glob: &str) -> Self {
        self.options.dir_patterns.push(glob.to_string());
        self
    }

    /// Name of the variable holding a config file path (default `{APP}_CONFIG`).
    pub fn env_override(mut self, var: &str) -> Self {
        self.options.env_override = Some(var.to_string());
        self
    }

    /// Name of the variable holding a config directory (default `{APP}_DIR`).
    pub fn env_dir_override(mut self, var: &str) -> Self {
        self.options.env_dir_override = Some(var.to_string());
        self
    }

    /// Append an extra root to `scope`.
    pub fn search_location(mut self, scope: Scope, path: impl Into<PathBuf>) -> Self {
        self.options
            .search_locations
            .push(SearchLocation::new(scope, path));
        self
    }

    /// Drop a whole scope, whatever `precedence` says.
    pub fn skip_scope(mut self, scope: Scope) -> Self {
        self.options.skip_locations.push(SkipLocation::Scope(scope));
        self
    }

    /// Drop one root by exact path.
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options
            .skip_locations
            .push(SkipLocation::Path(path.into()));
        self
    }

    /// Add a boundary marker on top of the defaults.
    pub fn boundary(mut self, marker: BoundaryMarker) -> Self {
        self.options.boundaries.push(marker);
        self
    }

    /// Remove a marker from the effective set (including defaults).
    pub fn skip_boundary(mut self, marker: BoundaryMarker) -> Self {
        self.options.skip_boundaries.push(marker);
        self
    }

    /// Walk all the way to the filesystem root.
    pub fn no_boundaries(mut self) -> Self {
        self.options.disable_boundaries = true;
        self
    }

    /// Force case-sensitive (`true`) or case-insensitive (`false`) name
    /// matching. Unset means whatever the platform does natively.
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.options.case_sensitive = Some(sensitive);
        self
    }

    pub fn symlinks(mut self, behavior: SymlinkBehavior) -> Self {
        self.options.symlinks = behavior;
        self
    }

    /// Switch to full mode and keep only `fields` in the result.
    pub fn select(mut self, fields: Vec<Select>) -> Self {
        self.options.select = Some(fields);
        self.select_names = None;
        self
    }

    /// Like [`select`](Self::select), by name (`"configFiles"`, `"configDirs"`,
    /// `"boundaries"`).
    pub fn select_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Scopes in priority order, highest first. Omitted scopes are not
    /// probed.
    pub fn precedence(mut self, scopes: Vec<Scope>) -> Self {
        self.options.precedence = scopes;
        self.precedence_names = None;
        self
    }

    /// Like [`precedence`](Self::precedence), by name.
    pub fn precedence_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precedence_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Include the `registry` scope. Without a provider it stays empty.
    pub fn check_registry(mut self, check: bool) -> Self {
        self.options.check_registry = check;
        self
    }

    pub fn filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn registry(mut self, provider: impl RegistryProvider + 'static) -> Self {
        self.registry = Some(Arc::new(provider));
        self
    }

    /// Override platform detection (root mapping, case defaults,
    /// mountpoints).
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Resolve the effective app name, or error if not set.
    fn effective_app_name(&self) -> Result<&str, FindfigError> {
        self.app_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(FindfigError::AppNameRequired)
    }

    /// Resolve the options, parsing any name-based `precedence`/`select`.
    fn effective_options(&self) -> Result<Options, FindfigError> {
        let mut options = self.options.clone();
        if let Some(names) = &self.precedence_names {
            options.precedence = names
                .iter()
                .map(|n| n.parse())
                .collect::<Result<_, _>>()?;
        }
        if let Some(names) = &self.select_names {
            options.select = Some(
                names
                    .iter()
                    .map(|n| n.parse())
                    .collect::<Result<_, _>>()?,
            );
        }
        Ok(options)
    }

    fn context(&self) -> Context<'_> {
        Context {
            fs: self.fs.as_ref(),
            env: self.env.as_ref(),
            registry: self.registry.as_deref(),
            platform: self.platform,
        }
    }

    /// Run discovery. First-match mode (no `select`) yields
    /// [`Found::Path`] or `None`; full mode yields [`Found::All`].
    pub fn find_app_config(&self) -> Result<Option<Found>, FindfigError> {
        let app = self.effective_app_name()?;
        let options = self.effective_options()?;
        self.context().find_app_config(app, &options)
    }

    /// Always full mode, whatever `select` says about the mode.
    pub fn discover(&self) -> Result<DiscoveryResult, FindfigError> {
        let app = self.effective_app_name()?;
        let options = self.effective_options()?;
        self.context().discover(app, &options)
    }

    pub fn find_workspace_boundary(&self) -> Result<Option<PathBuf>, FindfigError> {
        let app = self.effective_app_name()?;
        let options = self.effective_options()?;
        self.context().find_workspace_boundary(app, &options)
    }

    pub fn find_app_config_dirs(&self) -> Result<Vec<PathBuf>, FindfigError> {
        let app = self.effective_app_name()?;
        let options = self.effective_options()?;
        self.context().find_app_config_dirs(app, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{MemoryFs, vars_env};
    use crate::registry::StaticRegistry;

    fn repo() -> FindfigBuilder {
        Findfig::builder()
            .app_name("myapp")
            .filesystem(
                MemoryFs::new()
                    .dir("/repo/.git")
                    .file("/repo/pkg/.myapp.yaml")
                    .file("/repo/pkg/tool.toml")
                    .dir("/repo/pkg/.myapp"),
            )
            .environment(vars_env("/repo/pkg", &[]))
            .platform(Platform::Linux)
    }

    #[test]
    fn defaults() {
        let builder = Findfig::builder().app_name("myapp");
        let options = builder.effective_options().unwrap();
        assert_eq!(options.file_name, "config");
        assert_eq!(options.precedence, Scope::ALL.to_vec());
        assert!(options.is_first_match());
        assert_eq!(builder.effective_app_name().unwrap(), "myapp");
    }

    #[test]
    fn missing_app_name_errors() {
        let result = Findfig::builder().find_app_config();
        assert!(matches!(result, Err(FindfigError::AppNameRequired)));
    }

    #[test]
    fn blank_app_name_errors() {
        let result = Findfig::builder().app_name("  ").discover();
        assert!(matches!(result, Err(FindfigError::AppNameRequired)));
    }

    #[test]
    fn fluent_setters_fill_options() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .file_name("settings")
            .extensions(["", ".toml"])
            .pattern("*.conf")
            .dir_pattern("conf.d")
            .env_override("MY_CFG")
            .env_dir_override("MY_CFG_DIR")
            .search_location(Scope::User, "/opt/u")
            .skip_scope(Scope::System)
            .skip_path("/tmp")
            .boundary(BoundaryMarker::entry("Cargo.toml"))
            .skip_boundary(BoundaryMarker::Mountpoint)
            .case_sensitive(false)
            .symlinks(SymlinkBehavior::Skip)
            .check_registry(true);
        let o = builder.effective_options().unwrap();
        assert_eq!(o.file_name, "settings");
        assert_eq!(o.extensions, vec!["".to_string(), ".toml".to_string()]);
        assert_eq!(o.patterns, vec!["*.conf".to_string()]);
        assert_eq!(o.dir_patterns, vec!["conf.d".to_string()]);
        assert_eq!(o.env_override.as_deref(), Some("MY_CFG"));
        assert_eq!(o.env_dir_override.as_deref(), Some("MY_CFG_DIR"));
        assert_eq!(o.search_locations, vec![SearchLocation::new(Scope::User, "/opt/u")]);
        assert_eq!(
            o.skip_locations,
            vec![SkipLocation::Scope(Scope::System), SkipLocation::Path("/tmp".into())]
        );
        assert_eq!(o.boundaries, vec![BoundaryMarker::entry("Cargo.toml")]);
        assert_eq!(o.skip_boundaries, vec![BoundaryMarker::Mountpoint]);
        assert_eq!(o.case_sensitive, Some(false));
        assert_eq!(o.symlinks, SymlinkBehavior::Skip);
        assert!(o.check_registry);
    }

    #[test]
    fn precedence_names_parse() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .precedence_names(["user", "Project"]);
        assert_eq!(
            builder.effective_options().unwrap().precedence,
            vec![Scope::User, Scope::Project]
        );
    }

    #[test]
    fn unknown_precedence_name_errors_before_probing() {
        let result = repo().precedence_names(["env", "cloud"]).find_app_config();
        assert!(matches!(result, Err(FindfigError::UnknownScope(s)) if s == "cloud"));
    }

    #[test]
    fn unknown_select_name_errors() {
        let result = repo().select_names(["configFiles", "everything"]).discover();
        assert!(matches!(result, Err(FindfigError::UnknownSelect(s)) if s == "everything"));
    }

    #[test]
    fn typed_precedence_replaces_names() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .precedence_names(["cloud"])
            .precedence(vec![Scope::Env]);
        assert_eq!(builder.effective_options().unwrap().precedence, vec![Scope::Env]);
    }

    #[test]
    fn options_replaces_everything() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .select_names(["configDirs"])
            .options(Options {
                file_name: "x".into(),
                ..Options::default()
            });
        let o = builder.effective_options().unwrap();
        assert_eq!(o.file_name, "x");
        assert_eq!(o.select, None);
    }

    #[test]
    fn first_match_through_builder() {
        let found = repo().find_app_config().unwrap();
        assert_eq!(found, Some(Found::Path("/repo/pkg/.myapp.yaml".into())));
    }

    #[test]
    fn select_by_name_switches_to_full_mode() {
        let found = repo().select_names(["config-dirs"]).find_app_config().unwrap();
        let Some(Found::All(result)) = found else {
            panic!("expected full result");
        };
        assert_eq!(result.pwd.config_dirs, vec![PathBuf::from("/repo/pkg/.myapp")]);
        assert!(result.pwd.config_files.is_empty());
    }

    #[test]
    fn user_pattern_through_builder() {
        let result = repo().pattern("*.toml").discover().unwrap();
        assert_eq!(
            result.pwd.config_files,
            vec![
                PathBuf::from("/repo/pkg/.myapp.yaml"),
                PathBuf::from("/repo/pkg/tool.toml")
            ]
        );
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = repo().pattern("[oops").find_app_config();
        assert!(matches!(
            result,
            Err(FindfigError::InvalidPattern { pattern, .. }) if pattern == "[oops"
        ));
    }

    #[test]
    fn workspace_boundary_through_builder() {
        assert_eq!(
            repo().find_workspace_boundary().unwrap(),
            Some(PathBuf::from("/repo"))
        );
        assert_eq!(repo().no_boundaries().find_workspace_boundary().unwrap(), None);
    }

    #[test]
    fn config_dirs_through_builder() {
        assert_eq!(
            repo().find_app_config_dirs().unwrap(),
            vec![PathBuf::from("/repo/pkg/.myapp")]
        );
    }

    #[test]
    fn registry_provider_through_builder() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .filesystem(MemoryFs::new().dir("/w").file("/reg/app.ini"))
            .environment(vars_env("/w", &[]))
            .platform(Platform::Linux)
            .registry(StaticRegistry::new(vec!["/reg/app.ini".into()]))
            .check_registry(true)
            .precedence(vec![Scope::Registry]);
        let result = builder.discover().unwrap();
        assert_eq!(
            result.registry.map(|r| r.config_files),
            Some(vec![PathBuf::from("/reg/app.ini")])
        );
    }

    #[test]
    fn closure_registry_through_builder() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .filesystem(MemoryFs::new().dir("/w").file("/reg/myapp.json"))
            .environment(vars_env("/w", &[]))
            .platform(Platform::Linux)
            .registry(|app: &str| vec![PathBuf::from(format!("/reg/{app}.json"))])
            .check_registry(true);
        assert_eq!(
            builder.find_app_config().unwrap(),
            Some(Found::Path("/reg/myapp.json".into()))
        );
    }

    #[test]
    fn windows_platform_override() {
        let builder = Findfig::builder()
            .app_name("myapp")
            .filesystem(
                MemoryFs::new()
                    .dir("/w")
                    .file("/profile/AppData/Roaming/myapp/config.json"),
            )
            .environment(vars_env("/w", &[("USERPROFILE", "/profile")]))
            .platform(Platform::Windows)
            .precedence(vec![Scope::User]);
        assert_eq!(
            builder.find_app_config().unwrap(),
            Some(Found::Path("/profile/AppData/Roaming/myapp/config.json".into()))
        );
    }

    #[test]
    fn builder_is_reusable() {
        let builder = repo();
        let a = builder.discover().unwrap();
        let b = builder.discover().unwrap();
        assert_eq!(a, b);
    }
}
