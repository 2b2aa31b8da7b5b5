use thiserror::Error;

use crate::types::Scope;

/// Configuration errors. Every variant is raised before any probing starts;
/// filesystem and registry access problems never surface here.
#[derive(Debug, Error)]
pub enum FindfigError {
    #[error("App name is required: call .app_name() on the builder")]
    AppNameRequired,

    #[error("Unknown scope '{0}' in precedence (expected one of: env, project, workspace, user, system, registry)")]
    UnknownScope(String),

    #[error("Scope '{0}' is listed more than once in precedence")]
    DuplicateScope(Scope),

    #[error("Unknown select value '{0}' (expected one of: configFiles, configDirs, boundaries)")]
    UnknownSelect(String),

    #[error("Select must name at least one field")]
    EmptySelect,

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("Cannot determine the working directory to start discovery from")]
    NoWorkingDirectory,
}
