//! Path utilities for cross-platform home directory resolution.

use std::env;
use std::path::PathBuf;

/// Gets the user's home directory.
///
/// On Unix-like systems (macOS, Linux), uses the `HOME` environment variable.
/// On Windows, tries `HOME` first (available on Windows 10+), then falls back to `USERPROFILE`.
///
/// # Returns
/// `Ok(PathBuf)` with the home directory path, or `Err(String)` if neither variable is set.
pub fn get_home_dir() -> Result<PathBuf, String> {
    // Try HOME first (works on all modern platforms including Windows 10+)
    if let Ok(home) = env::var("HOME") {
        return Ok(PathBuf::from(home));
    }

    // Windows fallback
    #[cfg(target_os = "windows")]
    {
        if let Ok(profile) = env::var("USERPROFILE") {
            return Ok(PathBuf::from(profile));
        }
    }

    Err("Could not determine home directory: HOME and USERPROFILE are not set".to_string())
}

/// Gets the base application data directory: `${HOME}/.caseclip`
pub fn get_app_data_dir() -> Result<PathBuf, String> {
    Ok(get_home_dir()?.join(".caseclip"))
}

/// Gets the records file holding both persisted collections: `${HOME}/.caseclip/records.json`
pub fn get_records_path() -> Result<PathBuf, String> {
    Ok(get_app_data_dir()?.join("records.json"))
}

/// Gets the directory exported text files are written to: `${HOME}/.caseclip/exports`
pub fn get_exports_dir() -> Result<PathBuf, String> {
    Ok(get_app_data_dir()?.join("exports"))
}
