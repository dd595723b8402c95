use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::gesture::CATALOG;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Seconds between breaking a lock and the next one going live
    pub settle_delay_secs: f64,
    /// Reject gestures that arrive during the settle window instead of settling early
    pub strict_input_gate: bool,
    /// Draw only from the first N catalog gestures
    pub catalog_size: usize,
    pub seed: Option<u64>,
    pub countdown_freeze_chance: f64,
    pub countdown_freeze_secs: f64,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_delay_secs: 0.5,
            strict_input_gate: false,
            catalog_size: CATALOG.len(),
            seed: None,
            countdown_freeze_chance: 0.0,
            countdown_freeze_secs: 3.0,
            tick_rate_ms: crate::TICK_RATE_MS,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path =
            AppDirs::config_path().unwrap_or_else(|| PathBuf::from("lockbuster_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring unreadable config {}: {}", self.path.display(), e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_save_writes_pretty_json() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        store.save(&Config::default()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"settle_delay_secs\": 0.5"));
        assert!(text.contains("\"seed\": null"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            settle_delay_secs: 0.4,
            strict_input_gate: true,
            catalog_size: 2,
            seed: Some(1234),
            countdown_freeze_chance: 0.25,
            countdown_freeze_secs: 2.0,
            tick_rate_ms: 16,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "seed": 99, "strict_input_gate": true }"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.seed, Some(99));
        assert!(loaded.strict_input_gate);
        assert_eq!(loaded.catalog_size, 23);
        assert_eq!(loaded.settle_delay_secs, 0.5);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }
}
