//! YAML configuration for the data service.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::storage::StorageConfig;

pub const DEFAULT_BUCKET: &str = "telemetry";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store bucket every read is issued against.
    pub bucket: String,
    pub features: FeatureSet,
    /// Shared secret given inline. Takes precedence over `api_secret_file`.
    pub api_secret: Option<String>,
    /// File holding the shared secret, e.g. a mounted container secret.
    pub api_secret_file: Option<PathBuf>,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            features: FeatureSet::default(),
            api_secret: None,
            api_secret_file: None,
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureSet {
    /// Serves the data endpoints.
    pub data: bool,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self { data: true }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The configured secret, with surrounding whitespace removed.
    /// Blank secrets count as unset.
    pub fn resolve_secret(&self) -> Result<Option<String>, ConfigError> {
        let raw = match (&self.api_secret, &self.api_secret_file) {
            (Some(secret), _) => secret.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => return Ok(None),
        };
        let secret = raw.trim();
        Ok((!secret.is_empty()).then(|| secret.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PartitionGranularity;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.bucket, "telemetry");
        assert!(config.features.data);
        assert!(config.api_secret.is_none());
        assert!(matches!(config.storage.partition_granularity, PartitionGranularity::Hour));
        assert_eq!(config.resolve_secret().unwrap(), None);
    }

    #[test]
    fn test_config_parse_all_fields() {
        let yaml = r#"
bucket: "sensors"
features:
  data: false
api_secret: " s3cret "
storage:
  partition_granularity: day
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.bucket, "sensors");
        assert!(!config.features.data);
        assert!(matches!(config.storage.partition_granularity, PartitionGranularity::Day));
        assert_eq!(config.resolve_secret().unwrap().as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_config_rejects_bad_granularity() {
        let result = Config::from_yaml("storage:\n  partition_granularity: fortnight\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_secret_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_secret");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "from-file").unwrap();

        let config = Config {
            api_secret_file: Some(path),
            ..Config::default()
        };
        assert_eq!(config.resolve_secret().unwrap().as_deref(), Some("from-file"));

        let inline = Config {
            api_secret: Some("inline".to_string()),
            ..config
        };
        assert_eq!(inline.resolve_secret().unwrap().as_deref(), Some("inline"));
    }

    #[test]
    fn test_missing_secret_file() {
        let config = Config {
            api_secret_file: Some(PathBuf::from("/nonexistent/api_secret")),
            ..Config::default()
        };
        assert!(matches!(config.resolve_secret(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"bucket: from-disk\n").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.bucket, "from-disk");
    }
}
