//! File persistence helpers.
//!
//! Every write goes through a temp file in the target directory that is
//! synced before being renamed over the live file, so readers see either the
//! old or the new content.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Directory name used below the platform config and cache dirs.
const APP_DIR: &str = "meterfeed";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - Linux: `~/.config/meterfeed`
/// - macOS: `~/Library/Application Support/meterfeed`
/// - Windows: `%APPDATA%\meterfeed`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default cache directory.
///
/// - Linux: `~/.cache/meterfeed`
/// - macOS: `~/Library/Caches/meterfeed`
/// - Windows: `%LOCALAPPDATA%\meterfeed`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the default API cache file path.
pub fn default_cache_path() -> PathBuf {
    default_cache_dir().join("api_cache.json")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Temp file next to `path`, unique per process.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "data".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Writes `bytes` to `path` atomically.
///
/// Creates the parent directory if needed. The data is flushed and synced to
/// disk before the rename; the result has 0600 permissions on Unix.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(path);
    let result = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        set_restrictive_permissions(&temp_path).await?;
        tokio::fs::rename(&temp_path, path).await?;
        Ok::<(), StoreError>(())
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            debug!(path = %temp_path.display(), error = %e, "Temp file cleanup failed");
        }
    }

    result
}

/// Saves data to a pretty-printed JSON file.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    let json = serde_json::to_vec_pretty(data)?;
    write_atomic(path, &json).await?;

    debug!(path = %path.display(), "JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    Ok(data)
}

/// Loads data from a JSON file, returning the default if it is missing or
/// unreadable. Anything but a missing file is logged.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if e.is_not_found() {
                debug!(path = %path.display(), "File not found, using defaults");
            } else {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_default_paths() {
        assert!(default_settings_path().ends_with("meterfeed/settings.json"));
        assert!(default_cache_path().ends_with("meterfeed/api_cache.json"));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/var/cache/meterfeed/api_cache.json");
        let temp = temp_path_for(path);
        assert_eq!(temp.parent(), path.parent());
        assert_ne!(temp, path);
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");

        let mut entries = tokio::fs::read_dir(path.parent().unwrap()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name());
        }
        assert_eq!(names.len(), 1, "temp file left behind: {names:?}");
    }

    #[tokio::test]
    async fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        save_json(&path, &json!({ "a": 1 })).await.unwrap();
        let loaded: Value = load_json(&path).await.unwrap();

        assert_eq!(loaded, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn test_load_json_or_default_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let corrupt = dir.path().join("corrupt.json");
        tokio::fs::write(&corrupt, "{not json").await.unwrap();

        let a: Vec<u32> = load_json_or_default(&missing).await;
        let b: Vec<u32> = load_json_or_default(&corrupt).await;

        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_atomic_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        write_atomic(&path, b"{}").await.unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "File should have 0600 permissions");
    }
}
