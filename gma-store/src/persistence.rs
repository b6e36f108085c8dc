//! JSON files under the GMA config directory.
//!
//! Writes go through a sibling `*.json.tmp` file that is renamed over the
//! target, so a crash never leaves a half-written profile list. On Unix the
//! file is owner-only (0600) and directories created inside the config
//! directory are 0700.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

const FILE_MODE: u32 = 0o600;
const DIR_MODE: u32 = 0o700;

// ============================================================================
// Locations
// ============================================================================

/// Per-user config directory of the client.
///
/// `GMA` under Application Support on macOS, `gma` under the platform
/// config dir elsewhere. Falls back to the working directory when the home
/// directory is unknown.
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    let dir = dirs::home_dir().map(|h| h.join("Library/Application Support/GMA"));

    #[cfg(not(target_os = "macos"))]
    let dir = dirs::config_dir().map(|c| c.join("gma"));

    dir.unwrap_or_else(|| PathBuf::from("."))
}

/// `profiles.json` inside [`default_config_dir`].
pub fn default_profiles_path() -> PathBuf {
    default_config_dir().join("profiles.json")
}

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Permissions restricted");
    Ok(())
}

#[cfg(not(unix))]
async fn restrict(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

/// Creates the missing ancestors of `path`.
///
/// Only directories inside the config directory are locked down; a custom
/// location elsewhere keeps the umask's permissions.
async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::try_exists(parent).await? {
        return Ok(());
    }

    tokio::fs::create_dir_all(parent).await?;
    debug!(path = %parent.display(), "Directory created");

    let config_dir = default_config_dir();
    for dir in parent.ancestors().take_while(|d| d.starts_with(&config_dir)) {
        restrict(dir, DIR_MODE).await?;
    }
    Ok(())
}

// ============================================================================
// Read / Write
// ============================================================================

/// Writes `data` as pretty JSON, replacing the file atomically.
///
/// # Errors
///
/// `Serialization` if `data` does not serialize, `Io` for any file failure.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    ensure_parent(path).await?;

    let temp = temp_path_for(path);
    tokio::fs::write(&temp, json).await?;
    restrict(&temp, FILE_MODE).await?;
    tokio::fs::rename(&temp, path).await?;

    debug!(path = %path.display(), "Saved");
    Ok(())
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// `Io` if the file cannot be read, `Serialization` if it does not parse.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Like [`load_json`], but a missing or unreadable file yields `T::default()`.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No file yet, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable file");
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
