//! Repository credential files.
//!
//! Each repository is described by a small file named after it inside the
//! repository directory:
//!
//! ```text
//! # offsite bucket
//! RESTIC_REPOSITORY: b2:bucket/path
//! RESTIC_PASSWORD: "secret"
//! B2_ACCOUNT_ID: 0012ab
//! ```
//!
//! Keys are passed through untouched as environment variable names, since
//! every restic backend reads different variables.

use crate::fs::FileSystem;
use crate::utils::{BackupError, Result};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::debug;

/// Environment overlay for one restic invocation.
///
/// Applied on top of the inherited environment of the child process only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryEnv {
    vars: BTreeMap<String, String>,
}

impl RepositoryEnv {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RepositoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Load the credentials of `repository` from `repo_dir`.
///
/// The identifier is joined to `repo_dir` as-is and must come from trusted
/// configuration.
pub fn load_repository_env(
    fs: &dyn FileSystem,
    repo_dir: &Path,
    repository: &str,
) -> Result<RepositoryEnv> {
    let path = repo_dir.join(repository);
    if !fs.exists(&path) {
        return Err(BackupError::RepositoryNotFound {
            repository: repository.to_string(),
            path,
        });
    }

    let data = fs.read(&path).map_err(|source| BackupError::Read {
        path: path.clone(),
        source,
    })?;

    let content = String::from_utf8(data).map_err(|e| BackupError::Read {
        path: path.clone(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    let env = parse_repository_env(&content);
    debug!(
        repository,
        keys = ?env.keys().collect::<Vec<_>>(),
        "Loaded repository environment"
    );
    Ok(env)
}

/// Parse `key: value` lines. Later duplicates replace earlier ones.
pub fn parse_repository_env(content: &str) -> RepositoryEnv {
    let mut vars = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        vars.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }

    RepositoryEnv { vars }
}

/// Strip one layer of matching single or double quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
