//! Configuration loading and root folder resolution

use std::path::{Path, PathBuf};

/// Root folder resolution priority order:
/// 1. Explicit argument (highest priority)
/// 2. AERIAL_ROOT environment variable
/// 3. `root_folder` key in the config file
/// 4. OS-dependent default (fallback)
pub fn resolve_root_folder(explicit: Option<&Path>) -> PathBuf {
    // Priority 1: explicit argument
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var("AERIAL_ROOT") {
        return PathBuf::from(path);
    }

    // Priority 3: config file
    if let Ok(text) = std::fs::read_to_string(config_file_path()) {
        if let Ok(value) = toml::from_str::<toml::Value>(&text) {
            if let Some(root) = value.get("root_folder").and_then(|v| v.as_str()) {
                return PathBuf::from(root);
            }
        }
    }

    // Priority 4: OS-dependent default
    default_root_folder()
}

/// Path of the user config file (`<config dir>/aerial/config.toml`)
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aerial")
        .join("config.toml")
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/aerial
        dirs::data_local_dir()
            .map(|d| d.join("aerial"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/aerial"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/aerial
        dirs::data_dir()
            .map(|d| d.join("aerial"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/aerial"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\aerial
        dirs::data_local_dir()
            .map(|d| d.join("aerial"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\aerial"))
    } else {
        PathBuf::from("./aerial_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_argument_wins() {
        let resolved = resolve_root_folder(Some(Path::new("/tmp/aerial-explicit")));
        assert_eq!(resolved, PathBuf::from("/tmp/aerial-explicit"));
    }

    #[test]
    fn default_root_folder_is_nonempty() {
        assert!(!default_root_folder().as_os_str().is_empty());
    }
}
