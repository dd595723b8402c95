use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// State database, preferring `~/.local/state` like other terminal tools
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("lockbuster");
            Some(state_dir.join("records.db"))
        } else {
            ProjectDirs::from("", "", "lockbuster")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("records.db"))
        }
    }

    /// `<config dir>/lockbuster/config.json`, if the platform has one
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lockbuster").map(|pd| pd.config_dir().join("config.json"))
    }
}
