use crate::error::TokenError;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Resolve the directory holding key files.
///
/// The configured directory is used as-is when it exists. Otherwise it is
/// resolved against `install_root`, or the directory of the running executable
/// when no root is configured.
pub fn resolve(configured: &Path, install_root: Option<&Path>) -> Result<PathBuf, TokenError> {
    if configured.is_dir() {
        return Ok(configured.to_path_buf());
    }

    warn!(
        directory = %configured.display(),
        "the configured keys directory does not exist"
    );

    let root = match install_root {
        Some(root) => root.to_path_buf(),
        None => executable_dir()?,
    };

    let relative = configured.strip_prefix("/").unwrap_or(configured);
    let fallback = root.join(relative);
    if !fallback.is_dir() {
        return Err(TokenError::resolution(format!(
            "invalid keys directory: neither {} nor {} exists",
            configured.display(),
            fallback.display()
        )));
    }

    warn!(directory = %fallback.display(), "using fallback keys directory");
    Ok(fallback)
}

fn executable_dir() -> Result<PathBuf, TokenError> {
    let exe = std::env::current_exe().map_err(|e| {
        TokenError::resolution(format!("failed to locate the running executable: {}", e))
    })?;

    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| TokenError::resolution("executable path has no parent directory"))
}
