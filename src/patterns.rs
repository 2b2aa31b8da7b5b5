//! Candidate name expansion and lookup.
//!
//! [`expand`] turns an app name and [`Options`] into ordered candidate lists.
//! Config candidates come in five groups, earlier groups winning ties:
//!
//! 1. `config`, `.config`
//! 2. `.myapp`, `.myapp.yaml`, `.myapp.yml`, …
//! 3. `config.yaml`, `.config.yaml`, … (the file name with each extension)
//! 4. `myapp/config`, `.myapp/config` (and with each extension)
//! 5. user globs from [`Options::patterns`]
//!
//! Directory candidates are `myapp`, `.myapp`, then [`Options::dir_patterns`].
//!
//! [`locate`] maps one candidate onto concrete paths under a root, honoring
//! the requested case sensitivity.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::cache::{EntryKind, StatCache};
use crate::error::FindfigError;
use crate::types::Options;

/// Upper bound on how deep a `**` glob descends below a root.
const MAX_GLOB_DEPTH: usize = 16;

/// A relative name to look for under a scope root.
#[derive(Debug, Clone)]
pub enum Candidate {
    /// A fixed relative path, `/`-separated.
    Literal(String),
    Glob(GlobPattern),
}

impl Candidate {
    pub fn as_str(&self) -> &str {
        match self {
            Candidate::Literal(name) => name,
            Candidate::Glob(glob) => &glob.pattern,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobPattern {
    pub pattern: String,
    matcher: GlobMatcher,
    /// `None` when the pattern contains `**`.
    depth: Option<usize>,
}

impl GlobPattern {
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self, FindfigError> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| FindfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();
        let depth = if pattern.contains("**") {
            None
        } else {
            Some(pattern.split('/').filter(|s| !s.is_empty()).count())
        };
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            depth,
        })
    }

    pub fn is_match(&self, relative: &str) -> bool {
        self.matcher.is_match(relative)
    }

    /// Every path under `root` matching the pattern, sorted. Only real
    /// directories are descended into, so symlink loops cannot trap the walk.
    pub fn walk(&self, cache: &StatCache<'_>, root: &Path) -> Vec<PathBuf> {
        let max_depth = self.depth.unwrap_or(MAX_GLOB_DEPTH);
        let mut found = Vec::new();
        self.walk_into(cache, root, "", 1, max_depth, &mut found);
        found
    }

    fn walk_into(
        &self,
        cache: &StatCache<'_>,
        dir: &Path,
        prefix: &str,
        depth: usize,
        max_depth: usize,
        found: &mut Vec<PathBuf>,
    ) {
        let Some(names) = cache.list(dir) else {
            return;
        };
        for name in names.iter() {
            let Some(name) = name.to_str() else {
                continue;
            };
            let relative = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            };
            let path = dir.join(name);
            if self.is_match(&relative) {
                found.push(path.clone());
            }
            if depth < max_depth
                && cache
                    .stat(&path)
                    .is_some_and(|entry| entry.kind == EntryKind::Dir)
            {
                self.walk_into(cache, &path, &relative, depth + 1, max_depth, found);
            }
        }
    }
}

/// Ordered candidate names for one discovery call.
#[derive(Debug, Clone)]
pub struct Candidates {
    pub config: Vec<Candidate>,
    pub dirs: Vec<Candidate>,
}

/// Expand the app name and options into config and directory candidates.
///
/// `case_sensitive` is the effective sensitivity; it only affects how user
/// globs are compiled.
pub fn expand(
    app_name: &str,
    options: &Options,
    case_sensitive: bool,
) -> Result<Candidates, FindfigError> {
    let extensions: Vec<&str> = options
        .extensions
        .iter()
        .map(|e| e.trim_start_matches('.'))
        .collect();
    let file_name = options.file_name.as_str();
    let dotted_file = if file_name.starts_with('.') {
        None
    } else {
        Some(format!(".{file_name}"))
    };

    let mut config = Literals::default();

    config.push(file_name.to_string());
    if let Some(dotted) = &dotted_file {
        config.push(dotted.clone());
    }

    config.push(format!(".{app_name}"));
    for ext in extensions.iter().filter(|e| !e.is_empty()) {
        config.push(format!(".{app_name}.{ext}"));
    }

    // Extension variants of the plain file name rank below the app's own
    // dotfiles so another tool's `config.json` never shadows `.myapp.json`.
    for ext in extensions.iter().filter(|e| !e.is_empty()) {
        config.push(with_ext(file_name, ext));
        if let Some(dotted) = &dotted_file {
            config.push(with_ext(dotted, ext));
        }
    }

    for ext in &extensions {
        let nested = with_ext(file_name, ext);
        config.push(format!("{app_name}/{nested}"));
        config.push(format!(".{app_name}/{nested}"));
    }

    let mut dirs = Literals::default();
    dirs.push(app_name.to_string());
    dirs.push(format!(".{app_name}"));

    Ok(Candidates {
        config: config.finish(&options.patterns, case_sensitive)?,
        dirs: dirs.finish(&options.dir_patterns, case_sensitive)?,
    })
}

fn with_ext(base: &str, ext: &str) -> String {
    if ext.is_empty() {
        base.to_string()
    } else {
        format!("{base}.{ext}")
    }
}

/// Insertion-ordered, deduplicated literal names.
#[derive(Default)]
struct Literals {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl Literals {
    fn push(&mut self, name: String) {
        if self.seen.insert(name.clone()) {
            self.names.push(name);
        }
    }

    fn finish(
        self,
        globs: &[String],
        case_sensitive: bool,
    ) -> Result<Vec<Candidate>, FindfigError> {
        let mut out: Vec<Candidate> = self.names.into_iter().map(Candidate::Literal).collect();
        let mut seen = HashSet::new();
        for pattern in globs {
            if seen.insert(pattern.as_str()) {
                out.push(Candidate::Glob(GlobPattern::new(pattern, case_sensitive)?));
            }
        }
        Ok(out)
    }
}

/// How literal candidate names are compared against directory entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    /// Ask the filesystem directly and accept whatever it answers.
    Native,
    /// Enumerate and compare names byte for byte. Used when case sensitivity
    /// is requested on a filesystem that folds case.
    Exact,
    /// Enumerate and compare names ignoring case. Used when insensitivity is
    /// requested on a filesystem that distinguishes case.
    Folded,
}

impl CaseMode {
    pub fn new(requested: Option<bool>, native_sensitive: bool) -> Self {
        match requested {
            Some(true) if !native_sensitive => CaseMode::Exact,
            Some(false) if native_sensitive => CaseMode::Folded,
            _ => CaseMode::Native,
        }
    }
}

/// Concrete paths under `root` that `candidate` may name. Existence and type
/// are checked later by the probe; this only resolves names.
pub fn locate(
    cache: &StatCache<'_>,
    root: &Path,
    candidate: &Candidate,
    mode: CaseMode,
) -> Vec<PathBuf> {
    match candidate {
        Candidate::Glob(glob) => glob.walk(cache, root),
        Candidate::Literal(name) => match mode {
            CaseMode::Native => vec![join_relative(root, name)],
            CaseMode::Exact | CaseMode::Folded => {
                locate_by_listing(cache, root, name, mode).into_iter().collect()
            }
        },
    }
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Resolve `relative` one component at a time by listing each directory.
/// Under [`CaseMode::Folded`] an exact-case entry is preferred over a
/// case-folded one.
fn locate_by_listing(
    cache: &StatCache<'_>,
    root: &Path,
    relative: &str,
    mode: CaseMode,
) -> Option<PathBuf> {
    let mut current = root.to_path_buf();
    for part in relative.split('/').filter(|s| !s.is_empty()) {
        let names = cache.list(&current)?;
        let exact = names.iter().find(|n| n.as_encoded_bytes() == part.as_bytes());
        let chosen = match (exact, mode) {
            (Some(name), _) => name,
            (None, CaseMode::Folded) => names.iter().find(|n| {
                n.to_str()
                    .is_some_and(|s| s.to_lowercase() == part.to_lowercase())
            })?,
            (None, _) => return None,
        };
        current.push(chosen);
    }
    Some(current)
}
