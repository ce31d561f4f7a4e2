use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid autosave_interval_secs in {config_path}: must be at least 1")]
    InvalidAutosaveInterval { config_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one JSON file per stored document
    pub storage_path: PathBuf,
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    /// Document to open on start; the current document when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

fn default_autosave_interval_secs() -> u64 {
    DEFAULT_AUTOSAVE_INTERVAL_SECS
}

impl Config {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            document_id: None,
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if config.autosave_interval_secs == 0 {
            return Err(ConfigError::InvalidAutosaveInterval {
                config_path: config_path.to_path_buf(),
            });
        }

        // Expand shell variables and tilde in the loaded storage path
        config.storage_path =
            Self::expand_path(&config.storage_path).unwrap_or(config.storage_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The saved config, or defaults when there is no config file
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_else(|| Self::new(Self::default_storage_path())))
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/pile-hive");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_storage_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.local/share/pile-hive").as_ref())
    }

    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/pile-hive/config.toml"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            storage_path: PathBuf::from("/tmp/test-piles"),
            autosave_interval_secs: 5,
            document_id: Some("abc".to_string()),
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let config: Config = toml::from_str(r#"storage_path = "/data""#).unwrap();

        assert_eq!(config.autosave_interval_secs, 30);
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.document_id, None);
    }

    #[test]
    fn test_document_id_omitted_when_none() {
        let toml_str = toml::to_string(&Config::new("/data")).unwrap();
        assert!(!toml_str.contains("document_id"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("PILE_HIVE_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$PILE_HIVE_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("PILE_HIVE_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_written_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        let test_config = Config {
            storage_path: PathBuf::from("/tmp/test-piles"),
            autosave_interval_secs: 10,
            document_id: None,
        };

        std::fs::write(&config_file, toml::to_string_pretty(&test_config).unwrap()).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_load_expands_storage_path() {
        unsafe {
            env::set_var("PILE_HIVE_ROOT", "/custom/piles");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "storage_path = \"$PILE_HIVE_ROOT/docs\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.storage_path, PathBuf::from("/custom/piles/docs"));
        unsafe {
            env::remove_var("PILE_HIVE_ROOT");
        }
    }

    #[test]
    fn test_load_rejects_zero_interval() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "storage_path = \"/data\"\nautosave_interval_secs = 0\n",
        )
        .unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidAutosaveInterval { .. })
        ));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "storage_path = [").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }
}
