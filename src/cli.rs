//! Clap adapter for findfig.
//!
//! This module is the **optional integration layer** between findfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! [`DiscoverArgs`] is a clap `Args` struct you can flatten into your own
//! `#[derive(Parser)]` struct to expose discovery knobs on the command line.
//! The only bridge to the core is [`DiscoverArgs::apply()`], which threads the
//! parsed values into a [`FindfigBuilder`]. From there everything runs through
//! the clap-free builder API.

use std::path::PathBuf;

use clap::Args;

use crate::builder::FindfigBuilder;
use crate::error::FindfigError;
use crate::types::{BoundaryMarker, Scope, SearchLocation, Select, SkipLocation, SymlinkBehavior};

/// Clap-derived discovery options.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     app: String,
///     #[command(flatten)]
///     discover: DiscoverArgs,
/// }
/// ```
#[derive(Debug, Default, Args)]
pub struct DiscoverArgs {
    /// Base config file name (default: "config").
    #[arg(long, value_name = "NAME")]
    pub file_name: Option<String>,

    /// Extension to try, repeatable. Replaces the default list; use '' for
    /// "no extension".
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Extra config file glob, repeatable (e.g. "conf.d/*.toml").
    #[arg(long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Extra boundary marker: an entry name, or "env" / "mountpoint" / "root".
    #[arg(long = "boundary", value_name = "MARKER")]
    pub boundaries: Vec<BoundaryMarker>,

    /// Walk all the way up to the filesystem root.
    #[arg(long)]
    pub no_boundaries: bool,

    /// Force case-sensitive (true) or case-insensitive (false) matching.
    #[arg(long, value_name = "BOOL")]
    pub case_sensitive: Option<bool>,

    /// Symlink handling: follow, as-is, or skip.
    #[arg(long, value_name = "MODE")]
    pub symlinks: Option<SymlinkBehavior>,

    /// Return the full result, keeping only these fields
    /// (configFiles, configDirs, boundaries).
    #[arg(long, value_name = "FIELD", value_delimiter = ',')]
    pub select: Vec<Select>,

    /// Scope order, highest priority first
    /// (env, project, workspace, user, system, registry).
    #[arg(long, value_name = "SCOPE", value_delimiter = ',')]
    pub precedence: Vec<Scope>,

    /// Include the registry scope.
    #[arg(long)]
    pub registry: bool,

    /// Extra root for a scope, as SCOPE=PATH. Repeatable.
    #[arg(long, value_name = "SCOPE=PATH", value_parser = parse_search)]
    pub search: Vec<SearchLocation>,

    /// Scope name or exact directory to leave out. Repeatable.
    #[arg(long, value_name = "SCOPE|PATH", value_parser = parse_skip)]
    pub skip: Vec<SkipLocation>,
}

impl DiscoverArgs {
    /// Apply every flag that was given on top of `builder`. Flags left unset
    /// keep whatever the builder already has.
    pub fn apply(self, mut builder: FindfigBuilder) -> FindfigBuilder {
        if let Some(name) = &self.file_name {
            builder = builder.file_name(name);
        }
        if !self.extensions.is_empty() {
            builder = builder.extensions(self.extensions);
        }
        for glob in &self.patterns {
            builder = builder.pattern(glob);
        }
        for marker in self.boundaries {
            builder = builder.boundary(marker);
        }
        if self.no_boundaries {
            builder = builder.no_boundaries();
        }
        if let Some(sensitive) = self.case_sensitive {
            builder = builder.case_sensitive(sensitive);
        }
        if let Some(behavior) = self.symlinks {
            builder = builder.symlinks(behavior);
        }
        if !self.select.is_empty() {
            builder = builder.select(self.select);
        }
        if !self.precedence.is_empty() {
            builder = builder.precedence(self.precedence);
        }
        if self.registry {
            builder = builder.check_registry(true);
        }
        for loc in self.search {
            builder = builder.search_location(loc.scope, loc.path);
        }
        for skip in self.skip {
            builder = match skip {
                SkipLocation::Scope(scope) => builder.skip_scope(scope),
                SkipLocation::Path(path) => builder.skip_path(path),
            };
        }
        builder
    }
}

fn parse_search(raw: &str) -> Result<SearchLocation, String> {
    let (scope, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SCOPE=PATH, got '{raw}'"))?;
    let scope: Scope = scope.parse().map_err(|e: FindfigError| e.to_string())?;
    if path.is_empty() {
        return Err(format!("missing path in '{raw}'"));
    }
    Ok(SearchLocation::new(scope, PathBuf::from(path)))
}

/// A known scope name skips the scope; anything else is a path.
fn parse_skip(raw: &str) -> Result<SkipLocation, String> {
    if raw.is_empty() {
        return Err("empty skip location".to_string());
    }
    Ok(match raw.parse::<Scope>() {
        Ok(scope) => SkipLocation::Scope(scope),
        Err(_) => SkipLocation::Path(PathBuf::from(raw)),
    })
}
