use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Errors for resolving the host home directory
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("no user home directory available (HOME / USERPROFILE are unset)")]
    HomeMissing,
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The user's home directory as reported by the environment.
fn user_home() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` against `home`. Paths without `~` are returned unchanged.
fn expand_tilde(raw: &str, home: Option<&Path>) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return home.map(Path::to_path_buf).ok_or(HomeDirError::HomeMissing);
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        let home = home.ok_or(HomeDirError::HomeMissing)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Resolve the pure form of the host home directory against an explicit user home.
///
/// - `configured` present: `~` is expanded and the result must be absolute.
/// - `configured` absent: `<home>/<default_subdir>`.
pub fn resolve_home_dir_with(
    configured: Option<&str>,
    home: Option<&Path>,
    default_subdir: &str,
) -> Result<PathBuf, HomeDirError> {
    match configured {
        Some(raw) => {
            let expanded = expand_tilde(raw, home)?;
            if !expanded.is_absolute() {
                return Err(HomeDirError::AbsoluteRequired(
                    expanded.to_string_lossy().into(),
                ));
            }
            Ok(expanded)
        }
        None => {
            let home = home.ok_or(HomeDirError::HomeMissing)?;
            Ok(home.join(default_subdir))
        }
    }
}

/// Normalize and resolve the host home directory from the process environment.
///
/// If `create` is true, the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let home = user_home();
    let path = resolve_home_dir_with(configured.as_deref(), home.as_deref(), default_subdir)?;
    if create {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}
