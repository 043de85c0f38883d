use std::path::{Path, PathBuf};

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional environment variable; unset and empty both map to `None`.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    get_env_var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Expands a leading `~` or `~/` against `HOME`.
///
/// Paths without a leading tilde are returned unchanged and never touch the
/// environment.
pub fn expand_home(path: &Path) -> Result<PathBuf, MissingEnvVarError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = get_env_var("HOME")?;
    Ok(Path::new(&home).join(rest))
}
