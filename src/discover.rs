//! The discovery pipeline: validate options, resolve scopes, walk, probe,
//! assemble.
//!
//! One call owns one [`Session`]: a fresh [`StatCache`], the expanded
//! candidates, and the boundary walk (computed at most once, and only when
//! `project` or `workspace` needs it). Scopes are visited in
//! [`Options::precedence`] order on the calling thread.
//!
//! # Modes
//!
//! - **First match** (`select` unset): scopes are probed in precedence order
//!   and within `project` from the working directory upward. The first
//!   qualifying config file ends the call; later scopes are never touched.
//! - **Full** (`select` set, or [`discover`](Context::discover)): every scope
//!   in `precedence` is probed and the result is projected onto the selected
//!   fields.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::boundary::{BoundaryDetector, BoundaryWalk};
use crate::cache::StatCache;
use crate::env::{Environment, SystemEnvironment};
use crate::error::FindfigError;
use crate::fs::{FileSystem, OsFileSystem, absolutize};
use crate::patterns::{Candidate, Candidates, expand};
use crate::probe::ScopeProbe;
use crate::registry::RegistryProvider;
use crate::scope::{Platform, RootDescriptor, ScopeResolver};
use crate::types::{
    DiscoveryResult, Found, Options, ParentResult, Scope, ScopeResult, Select,
};

/// The injected capabilities a discovery call runs against.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub fs: &'a dyn FileSystem,
    pub env: &'a dyn Environment,
    pub registry: Option<&'a dyn RegistryProvider>,
    pub platform: Platform,
}

impl Context<'static> {
    /// The real filesystem and process environment, no registry.
    pub fn system() -> Self {
        Context {
            fs: &OsFileSystem,
            env: &SystemEnvironment,
            registry: None,
            platform: Platform::current(),
        }
    }
}

impl<'a> Context<'a> {
    /// First-match mode returns [`Found::Path`]; full mode returns
    /// [`Found::All`]. `Ok(None)` only in first-match mode.
    pub fn find_app_config(
        &self,
        app_name: &str,
        options: &Options,
    ) -> Result<Option<Found>, FindfigError> {
        let session = Session::open(self, app_name, options)?;
        if options.is_first_match() {
            Ok(session.first_match().map(Found::Path))
        } else {
            Ok(Some(Found::All(session.full())))
        }
    }

    /// Full discovery regardless of `select` being set.
    pub fn discover(&self, app_name: &str, options: &Options) -> Result<DiscoveryResult, FindfigError> {
        Ok(Session::open(self, app_name, options)?.full())
    }

    pub fn find_workspace_boundary(
        &self,
        app_name: &str,
        options: &Options,
    ) -> Result<Option<PathBuf>, FindfigError> {
        let session = Session::open(self, app_name, options)?;
        Ok(session.walk().boundary.clone())
    }

    /// Every config directory across all scopes, in precedence order.
    pub fn find_app_config_dirs(
        &self,
        app_name: &str,
        options: &Options,
    ) -> Result<Vec<PathBuf>, FindfigError> {
        let options = Options {
            select: Some(vec![Select::ConfigDirs]),
            ..options.clone()
        };
        let session = Session::open(self, app_name, &options)?;
        let result = session.full();

        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        for scope in &options.precedence {
            for scoped in result.scope_results(*scope) {
                for dir in &scoped.config_dirs {
                    if seen.insert(dir.clone()) {
                        dirs.push(dir.clone());
                    }
                }
            }
        }
        Ok(dirs)
    }
}

/// Reject configuration mistakes before any filesystem access.
pub(crate) fn validate(app_name: &str, options: &Options) -> Result<(), FindfigError> {
    if app_name.trim().is_empty() {
        return Err(FindfigError::AppNameRequired);
    }
    let mut seen = HashSet::new();
    for scope in &options.precedence {
        if !seen.insert(*scope) {
            return Err(FindfigError::DuplicateScope(*scope));
        }
    }
    if let Some(fields) = &options.select
        && fields.is_empty()
    {
        return Err(FindfigError::EmptySelect);
    }
    Ok(())
}

struct Session<'s> {
    options: &'s Options,
    platform: Platform,
    cache: StatCache<'s>,
    resolver: ScopeResolver<'s>,
    candidates: Candidates,
    walk: OnceCell<BoundaryWalk>,
}

impl<'s> Session<'s> {
    fn open(ctx: &Context<'s>, app_name: &'s str, options: &'s Options) -> Result<Self, FindfigError> {
        validate(app_name, options)?;
        let cwd = ctx
            .env
            .current_dir()
            .ok_or(FindfigError::NoWorkingDirectory)?;
        let cwd = absolutize(&cwd, Path::new("/"));
        let case_sensitive = options
            .case_sensitive
            .unwrap_or(ctx.platform.case_sensitive());
        let candidates = expand(app_name, options, case_sensitive)?;

        debug!(
            app = app_name,
            cwd = %cwd.display(),
            first_match = options.is_first_match(),
            precedence = ?options.precedence,
            "starting config discovery"
        );

        trace!(
            config = ?candidates.config.iter().map(Candidate::as_str).collect::<Vec<_>>(),
            dirs = ?candidates.dirs.iter().map(Candidate::as_str).collect::<Vec<_>>(),
            "expanded candidates"
        );

        Ok(Self {
            options,
            platform: ctx.platform,
            cache: StatCache::new(ctx.fs),
            resolver: ScopeResolver::new(
                ctx.env,
                ctx.registry,
                ctx.platform,
                app_name,
                options,
                cwd,
            ),
            candidates,
            walk: OnceCell::new(),
        })
    }

    fn detector(&self) -> BoundaryDetector<'_, 's> {
        BoundaryDetector::new(
            &self.cache,
            self.options.effective_boundaries(),
            self.resolver.env_dir(),
            self.platform,
        )
    }

    fn walk(&self) -> &BoundaryWalk {
        self.walk
            .get_or_init(|| self.detector().find_boundary(self.resolver.cwd()))
    }

    fn roots(&self, scope: Scope) -> Vec<RootDescriptor> {
        let walk = matches!(scope, Scope::Project | Scope::Workspace).then(|| self.walk());
        self.resolver.resolve_roots(scope, walk)
    }

    fn in_scope(&self, scope: Scope) -> bool {
        scope != Scope::Registry || self.options.check_registry
    }

    fn first_match(&self) -> Option<PathBuf> {
        let probe = ScopeProbe::new(&self.cache, &self.candidates, &[Select::ConfigFiles]);
        for scope in self.options.precedence.iter().copied().filter(|s| self.in_scope(*s)) {
            for root in self.roots(scope) {
                if let Some(found) = probe.first_file(&root) {
                    debug!(%scope, path = %found.display(), "first match");
                    return Some(found);
                }
            }
        }
        debug!("no config file found in any scope");
        None
    }

    fn full(&self) -> DiscoveryResult {
        let fields: Vec<Select> = self
            .options
            .select
            .clone()
            .unwrap_or_else(|| Select::ALL.to_vec());
        let probe = ScopeProbe::new(&self.cache, &self.candidates, &fields);
        let with_boundaries = fields.contains(&Select::Boundaries);

        let mut result = DiscoveryResult {
            registry: self.options.check_registry.then(ScopeResult::default),
            ..DiscoveryResult::default()
        };

        for scope in self.options.precedence.iter().copied().filter(|s| self.in_scope(*s)) {
            let roots = self.roots(scope);
            match scope {
                Scope::Project => {
                    let detector = self.detector();
                    for root in roots {
                        let mut scoped = probe.probe(&root);
                        if with_boundaries {
                            scoped.boundaries = detector.markers_in(&root.path);
                        }
                        if root.path == self.resolver.cwd() {
                            result.pwd = scoped;
                        } else {
                            result.parents.push(ParentResult {
                                path: root.path,
                                result: scoped,
                            });
                        }
                    }
                }
                Scope::Workspace => {
                    let detector = self.detector();
                    for root in roots {
                        let mut scoped = probe.probe(&root);
                        if with_boundaries {
                            scoped.boundaries = detector.markers_in(&root.path);
                        }
                        result.workspace.result.extend(scoped);
                    }
                }
                _ => {
                    let merged = merge(roots.iter().map(|root| probe.probe(root)));
                    match scope {
                        Scope::Env => result.env = merged,
                        Scope::User => result.user = merged,
                        Scope::System => result.system = merged,
                        Scope::Registry => result.registry = Some(merged),
                        Scope::Project | Scope::Workspace => {}
                    }
                }
            }
        }

        if let Some(walk) = self.walk.get() {
            result.workspace.path = walk.boundary.clone();
        }
        result.project(&fields);
        result
    }
}

fn merge(results: impl Iterator<Item = ScopeResult>) -> ScopeResult {
    results.fold(ScopeResult::default(), |mut acc, r| {
        acc.extend(r);
        acc
    })
}

/// Find the single highest-precedence config file for `app_name`, or the
/// full result when `options.select` is set. Runs against the real
/// filesystem and process environment.
pub fn find_app_config(app_name: &str, options: &Options) -> Result<Option<Found>, FindfigError> {
    Context::system().find_app_config(app_name, options)
}

/// The workspace boundary directory above the working directory, if any.
pub fn find_workspace_boundary(
    app_name: &str,
    options: &Options,
) -> Result<Option<PathBuf>, FindfigError> {
    Context::system().find_workspace_boundary(app_name, options)
}

/// Every config directory for `app_name` across all scopes.
pub fn find_app_config_dirs(app_name: &str, options: &Options) -> Result<Vec<PathBuf>, FindfigError> {
    Context::system().find_app_config_dirs(app_name, options)
}
