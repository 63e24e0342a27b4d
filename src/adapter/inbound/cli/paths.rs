//! Path utilities for clusterup.
//!
//! User-level files live under `~/.clusterup/`:
//! - `~/.clusterup/settings.toml` - tool settings

use std::path::{Component, Path, PathBuf};

/// Returns the clusterup home directory (`~/.clusterup/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clusterup")
}

/// Returns the default settings file path (`~/.clusterup/settings.toml`).
pub fn default_settings() -> PathBuf {
    home_dir().join("settings.toml")
}

/// Makes `path` absolute against the current directory and drops `.` and
/// `..` components lexically. Symlinks are left alone.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
