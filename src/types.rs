//! Vocabulary types: scopes, boundary markers, options, and the result pentad.
//!
//! # Scopes and precedence
//!
//! Discovery visits up to six [`Scope`]s. [`Options::precedence`] lists them
//! highest priority first; the default order is
//!
//! ```text
//! env > project > workspace > user > system > registry
//! ```
//!
//! A scope left out of `precedence` is never probed and stays empty in the
//! result. The `registry` scope additionally requires
//! [`Options::check_registry`].
//!
//! # Result shape
//!
//! [`DiscoveryResult`] is the "pentad": `pwd`, `parents`, `workspace`, `user`,
//! `system`, and the optional `registry`, plus `env` for the override
//! variables. `parents` never contains the working directory itself nor the
//! workspace directory; both are reported in their own fields.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FindfigError;

/// One of the fixed search contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `{APP}_CONFIG` / `{APP}_DIR` override variables.
    Env,
    /// The working directory and every directory climbed toward the workspace.
    Project,
    /// The detected workspace boundary directory.
    Workspace,
    /// Home directory and the per-user config directory.
    User,
    /// Machine-wide config directories.
    System,
    /// Paths returned by an injected [`RegistryProvider`](crate::RegistryProvider).
    Registry,
}

impl Scope {
    pub const ALL: [Scope; 6] = [
        Scope::Env,
        Scope::Project,
        Scope::Workspace,
        Scope::User,
        Scope::System,
        Scope::Registry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Env => "env",
            Scope::Project => "project",
            Scope::Workspace => "workspace",
            Scope::User => "user",
            Scope::System => "system",
            Scope::Registry => "registry",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = FindfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FindfigError::UnknownScope(s.to_string()))
    }
}

/// A field of [`ScopeResult`] that a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Select {
    ConfigFiles,
    ConfigDirs,
    Boundaries,
}

impl Select {
    pub const ALL: [Select; 3] = [Select::ConfigFiles, Select::ConfigDirs, Select::Boundaries];

    pub fn as_str(self) -> &'static str {
        match self {
            Select::ConfigFiles => "configFiles",
            Select::ConfigDirs => "configDirs",
            Select::Boundaries => "boundaries",
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Select {
    type Err = FindfigError;

    /// Accepts the camelCase names (`configDirs`) as well as snake_case and
    /// kebab-case spellings (`config_dirs`, `config-dirs`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Select::ALL
            .into_iter()
            .find(|sel| sel.as_str().to_ascii_lowercase() == folded)
            .ok_or_else(|| FindfigError::UnknownSelect(s.to_string()))
    }
}

/// How candidates that are symbolic links are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymlinkBehavior {
    /// Resolve every candidate to its canonical path and report that path.
    /// Candidates whose resolution fails (dangling links, cycles) are dropped.
    #[default]
    Follow,
    /// Classify a link by its target but report the link's own path.
    AsIs,
    /// Drop any candidate that is itself a symlink.
    Skip,
}

impl FromStr for SymlinkBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "follow" => Ok(SymlinkBehavior::Follow),
            "as-is" | "asis" | "as_is" => Ok(SymlinkBehavior::AsIs),
            "skip" => Ok(SymlinkBehavior::Skip),
            other => Err(format!("unknown symlink behavior '{other}'")),
        }
    }
}

/// A predicate that stops the upward walk from the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundaryMarker {
    /// The directory contains an entry (file or directory) with this name.
    Entry(String),
    /// The directory is the one named by the `{APP}_DIR` override variable.
    EnvOverride,
    /// The directory sits on a different device than its parent (Unix only).
    Mountpoint,
    /// The filesystem root. Always terminates the walk, even when boundaries
    /// are disabled or this marker is skipped, but never becomes a workspace.
    Root,
}

impl BoundaryMarker {
    pub fn entry(name: impl Into<String>) -> Self {
        BoundaryMarker::Entry(name.into())
    }

    /// The marker set used when the caller configures nothing.
    pub fn defaults() -> Vec<BoundaryMarker> {
        vec![
            BoundaryMarker::EnvOverride,
            BoundaryMarker::entry(".git"),
            BoundaryMarker::Mountpoint,
            BoundaryMarker::Root,
        ]
    }
}

impl FromStr for BoundaryMarker {
    type Err = std::convert::Infallible;

    /// `env`, `mountpoint`, and `root` name the built-in predicates; anything
    /// else is an entry name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "env" => BoundaryMarker::EnvOverride,
            "mountpoint" => BoundaryMarker::Mountpoint,
            "root" => BoundaryMarker::Root,
            name => BoundaryMarker::entry(name),
        })
    }
}

/// An extra root appended to a scope before probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    pub scope: Scope,
    pub path: PathBuf,
}

impl SearchLocation {
    pub fn new(scope: Scope, path: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            path: path.into(),
        }
    }
}

/// Removes roots before probing: a whole scope, or one exact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipLocation {
    Scope(Scope),
    Path(PathBuf),
}

/// Discovery options. Constructed once per call and read-only afterwards.
///
/// ```ignore
/// let opts = Options {
///     extensions: vec!["".into(), "toml".into()],
///     disable_boundaries: true,
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Base file name for the bare and nested candidate forms.
    pub file_name: String,
    /// Extensions tried in order. `""` means "no extension".
    pub extensions: Vec<String>,
    /// Extra config-file globs, matched relative to each root. A `**` pattern
    /// descends up to 16 levels below every root it is tried at, home and `/`
    /// included, so prefer anchored patterns like `conf.d/*.toml`.
    pub patterns: Vec<String>,
    /// Extra config-directory globs, matched relative to each root.
    pub dir_patterns: Vec<String>,
    /// Variable naming a config file. `None` derives `{APP}_CONFIG`.
    pub env_override: Option<String>,
    /// Variable naming a config directory. `None` derives `{APP}_DIR`.
    pub env_dir_override: Option<String>,
    /// Extra roots, probed after the built-in roots of their scope.
    pub search_locations: Vec<SearchLocation>,
    /// Whole scopes or exact root directories to leave out.
    pub skip_locations: Vec<SkipLocation>,
    /// Markers added to [`BoundaryMarker::defaults`].
    pub boundaries: Vec<BoundaryMarker>,
    /// Markers removed from the effective set.
    pub skip_boundaries: Vec<BoundaryMarker>,
    /// Walk to the filesystem root without ever reporting a boundary.
    pub disable_boundaries: bool,
    /// `None` follows the platform's native behavior.
    pub case_sensitive: Option<bool>,
    /// How symlinked candidates and roots are treated.
    pub symlinks: SymlinkBehavior,
    /// `None` selects first-match mode; `Some` selects full mode with the
    /// result projected onto the listed fields.
    pub select: Option<Vec<Select>>,
    /// Scopes in priority order, highest first.
    pub precedence: Vec<Scope>,
    /// Probe the registry scope. Off by default.
    pub check_registry: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            file_name: "config".into(),
            extensions: ["", "yaml", "yml", "json", "ini"]
                .into_iter()
                .map(String::from)
                .collect(),
            patterns: Vec::new(),
            dir_patterns: Vec::new(),
            env_override: None,
            env_dir_override: None,
            search_locations: Vec::new(),
            skip_locations: Vec::new(),
            boundaries: Vec::new(),
            skip_boundaries: Vec::new(),
            disable_boundaries: false,
            case_sensitive: None,
            symlinks: SymlinkBehavior::default(),
            select: None,
            precedence: Scope::ALL.to_vec(),
            check_registry: false,
        }
    }
}

impl Options {
    /// Whether the caller wants the single highest-precedence config file.
    pub fn is_first_match(&self) -> bool {
        self.select.is_none()
    }

    /// The boundary markers in effect: defaults plus `boundaries`, minus
    /// `skip_boundaries`. Empty when boundaries are disabled.
    pub fn effective_boundaries(&self) -> Vec<BoundaryMarker> {
        if self.disable_boundaries {
            return Vec::new();
        }
        let mut markers = BoundaryMarker::defaults();
        for marker in &self.boundaries {
            if !markers.contains(marker) {
                markers.push(marker.clone());
            }
        }
        markers.retain(|m| !self.skip_boundaries.contains(m));
        markers
    }

    /// Whether `scope` was removed wholesale via `skip_locations`.
    pub fn skips_scope(&self, scope: Scope) -> bool {
        self.skip_locations
            .iter()
            .any(|s| matches!(s, SkipLocation::Scope(skipped) if *skipped == scope))
    }

    /// Whether `path` was removed via `skip_locations`.
    pub fn skips_path(&self, path: &std::path::Path) -> bool {
        self.skip_locations
            .iter()
            .any(|s| matches!(s, SkipLocation::Path(skipped) if skipped == path))
    }

    /// Extra roots configured for `scope`, in insertion order.
    pub fn extra_roots(&self, scope: Scope) -> impl Iterator<Item = &PathBuf> {
        self.search_locations
            .iter()
            .filter(move |loc| loc.scope == scope)
            .map(|loc| &loc.path)
    }
}

/// Matches found under one scope root (or the union of a scope's roots).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeResult {
    pub config_files: Vec<PathBuf>,
    pub config_dirs: Vec<PathBuf>,
    pub boundaries: Vec<PathBuf>,
}

impl ScopeResult {
    pub fn is_empty(&self) -> bool {
        self.config_files.is_empty() && self.config_dirs.is_empty() && self.boundaries.is_empty()
    }

    /// Append `other`'s paths, keeping the first occurrence of duplicates.
    pub fn extend(&mut self, other: ScopeResult) {
        push_unique(&mut self.config_files, other.config_files);
        push_unique(&mut self.config_dirs, other.config_dirs);
        push_unique(&mut self.boundaries, other.boundaries);
    }

    /// Clear every field not listed in `fields`.
    pub fn project(&mut self, fields: &[Select]) {
        if !fields.contains(&Select::ConfigFiles) {
            self.config_files.clear();
        }
        if !fields.contains(&Select::ConfigDirs) {
            self.config_dirs.clear();
        }
        if !fields.contains(&Select::Boundaries) {
            self.boundaries.clear();
        }
    }
}

fn push_unique(into: &mut Vec<PathBuf>, from: Vec<PathBuf>) {
    for path in from {
        if !into.contains(&path) {
            into.push(path);
        }
    }
}

/// Matches for one directory climbed between the working directory and the
/// workspace boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: ScopeResult,
}

/// Matches for the workspace boundary directory. `path` is `None` when the
/// walk reached the filesystem root without meeting a boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceResult {
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub result: ScopeResult,
}

/// The aggregate result of a full discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    pub env: ScopeResult,
    pub pwd: ScopeResult,
    pub parents: Vec<ParentResult>,
    pub workspace: WorkspaceResult,
    pub user: ScopeResult,
    pub system: ScopeResult,
    /// Present only when the registry was asked for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<ScopeResult>,
}

impl DiscoveryResult {
    /// The results belonging to `scope`, in their natural order (`project`
    /// yields `pwd` then each parent in walk order).
    pub fn scope_results(&self, scope: Scope) -> Vec<&ScopeResult> {
        match scope {
            Scope::Env => vec![&self.env],
            Scope::Project => std::iter::once(&self.pwd)
                .chain(self.parents.iter().map(|p| &p.result))
                .collect(),
            Scope::Workspace => vec![&self.workspace.result],
            Scope::User => vec![&self.user],
            Scope::System => vec![&self.system],
            Scope::Registry => self.registry.iter().collect(),
        }
    }

    /// Clear every field not listed in `fields`, across all scopes.
    pub fn project(&mut self, fields: &[Select]) {
        self.env.project(fields);
        self.pwd.project(fields);
        for parent in &mut self.parents {
            parent.result.project(fields);
        }
        self.workspace.result.project(fields);
        self.user.project(fields);
        self.system.project(fields);
        if let Some(registry) = &mut self.registry {
            registry.project(fields);
        }
    }
}

/// What [`find_app_config`](crate::find_app_config) hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    /// First-match mode: the single highest-precedence config file.
    Path(PathBuf),
    /// Full mode: the whole (projected) result.
    All(DiscoveryResult),
}
