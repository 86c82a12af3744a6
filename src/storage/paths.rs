//! Application paths for config and data.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths.
pub struct AppPaths {
    /// Data directory (state file lives here).
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the cloudsight application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("io", "cloudsight", "cloudsight") {
            Self {
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
            Self {
                data: home.join(".local/share/cloudsight"),
            }
        }
    }

    /// Path to the single persisted state file.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.data.join("state.json")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_file_lives_under_data_dir() {
        let paths = AppPaths::new();
        assert!(paths.state_file().starts_with(&paths.data));
        assert_eq!(paths.state_file().file_name().unwrap(), "state.json");
    }
}
