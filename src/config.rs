// Configuration file handling

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "tasklist.yml";

/// Which blob store holds the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the blob store lives in
    pub store_path: PathBuf,
    pub backend: Backend,
    /// Presentation only
    pub dark_mode: bool,
    /// Tracing filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            backend: Backend::default(),
            dark_mode: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).context(format!("Failed to read config file {:?}", path))?;
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {:?}", path))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context(format!("Failed to write config file {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            return Err(eyre!("store_path cannot be empty"));
        }
        if self.log_level.trim().is_empty() {
            return Err(eyre!("log_level cannot be empty"));
        }
        Ok(())
    }
}

/// `<config_dir>/tasklist/tasklist.yml`, or `./tasklist.yml` without a config dir
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("tasklist").join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    }
}

fn default_store_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("tasklist"),
        None => PathBuf::from(".tasklist"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();

        let config = Config::load(&temp.path().join("absent.yml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::Sqlite);
        assert!(!config.dark_mode);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasklist.yml");
        fs::write(&path, "backend: file\ndark_mode: true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert!(config.dark_mode);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/tasklist.yml");
        let config = Config {
            store_path: temp.path().join("store"),
            backend: Backend::File,
            dark_mode: true,
            log_level: "debug".to_string(),
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasklist.yml");

        fs::write(&path, "backend: postgres\n").unwrap();
        assert!(Config::load(&path).is_err());

        fs::write(&path, "log_level: ''\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
