//! Scope-ordered discovery of application config files, config directories,
//! and workspace boundaries.
//!
//! Findfig answers "which config file should `myapp` read?" the way most
//! command-line tools expect: an environment override first, then the working
//! directory and its parents up to the repository root, then the user's
//! config directory, then the system-wide one. It only *finds* files. Parsing
//! and merging them is the caller's business.
//!
//! ```ignore
//! let found = Findfig::builder()
//!     .app_name("myapp")
//!     .find_app_config()?;
//! ```
//!
//! That call returns the first existing regular file among, in order,
//! `$MYAPP_CONFIG`, `./config`, `./.config`, `./.myapp`, `./.myapp.yaml`, …,
//! `./config.yaml`, …, `./myapp/config.yaml`, the same names in every parent up
//! to the nearest `.git`, then `~/.myapp.yaml`, `~/.config/myapp/config.yaml`,
//! `/etc/myapp/config.yaml`, and so on.
//!
//! # Scopes
//!
//! Every root belongs to one [`Scope`]:
//!
//! | Scope       | Roots                                                      |
//! |-------------|------------------------------------------------------------|
//! | `env`       | `{APP}_CONFIG` (a file), `{APP}_DIR` (a config directory)  |
//! | `project`   | the working directory, then each parent below the boundary |
//! | `workspace` | the boundary directory                                     |
//! | `user`      | home, then the per-user config directory                   |
//! | `system`    | `/etc` and the XDG system dirs, or `%ProgramData%`         |
//! | `registry`  | whatever an injected [`RegistryProvider`] returns          |
//!
//! [`Options::precedence`] lists scopes highest priority first (the default is
//! the order above). Scopes left out are never probed.
//!
//! # Two modes
//!
//! - **First match** (the default): scopes are probed in precedence order and
//!   discovery stops at the first qualifying config file. Later scopes are not
//!   touched at all.
//! - **Full**: setting [`select`](FindfigBuilder::select) (or calling
//!   [`discover()`](FindfigBuilder::discover)) probes every scope and returns
//!   a [`DiscoveryResult`] with `pwd`, `parents`, `workspace`, `user`,
//!   `system`, and optionally `registry`, each listing `configFiles`,
//!   `configDirs`, and `boundaries`. `select` clears the fields you did not
//!   ask for.
//!
//! The result serializes with serde in camelCase, so it can be handed to
//! other tools as JSON unchanged.
//!
//! # Workspace boundary
//!
//! The upward walk from the working directory stops at the first directory
//! that carries a [`BoundaryMarker`]: the `{APP}_DIR` override when it names
//! an ancestor, a `.git` entry (or any name you add), or a filesystem
//! mountpoint. The filesystem root ends the walk but is never a workspace.
//! Markers can be added, removed, or disabled altogether.
//!
//! # Access problems are not errors
//!
//! Missing directories, permission failures, dangling symlinks, and symlink
//! cycles only mean "nothing here". [`FindfigError`] is reserved for
//! configuration mistakes (unknown scope names, duplicate scopes, invalid
//! globs, a missing app name) and is raised before anything is probed.
//!
//! # Injected capabilities
//!
//! The builder runs against the real filesystem and process environment by
//! default. Tests and sandboxed hosts can swap in their own [`FileSystem`],
//! [`Environment`], [`RegistryProvider`], and [`Platform`].
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), [`DiscoverArgs`] exposes the
//! discovery options as command-line flags and
//! [`apply()`](DiscoverArgs::apply) threads them into a builder. To use
//! findfig without clap:
//!
//! ```toml
//! findfig = { version = "...", default-features = false }
//! ```
//!
//! # Logging
//!
//! Decisions are reported through [`tracing`](https://docs.rs/tracing) at
//! `debug` level (boundary found, first match) and per-path outcomes at
//! `trace` level. Install any subscriber to see them.

pub mod error;
pub mod types;

mod boundary;
mod builder;
mod cache;
#[cfg(feature = "clap")]
mod cli;
mod discover;
mod env;
mod fs;
mod patterns;
mod probe;
mod registry;
mod scope;

#[cfg(test)]
mod fixtures;

pub use builder::{Findfig, FindfigBuilder};
#[cfg(feature = "clap")]
pub use cli::DiscoverArgs;
pub use discover::{find_app_config, find_app_config_dirs, find_workspace_boundary};
pub use env::{Environment, SystemEnvironment, VarsEnvironment};
pub use error::FindfigError;
pub use fs::{FileKind, FileSystem, FsMeta, OsFileSystem};
pub use registry::{RegistryProvider, StaticRegistry};
pub use scope::Platform;
pub use types::{
    BoundaryMarker, DiscoveryResult, Found, Options, ParentResult, Scope, ScopeResult,
    SearchLocation, Select, SkipLocation, SymlinkBehavior, WorkspaceResult,
};
