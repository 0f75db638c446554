//! Configuration loading and typed config structures for the migration.
//!
//! The configuration lives in `decide-migrate.yaml` in the working
//! directory, or at the path named by `DECIDE_MIGRATE_CONFIG`. Every field
//! has a default, so a missing file or a partial file is valid.

use std::path::Path;
use std::time::Duration;

use decide_db::MongoConfig;
use decide_types::UuidEncoding;
use serde::Deserialize;

use crate::collection::TargetCollection;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "decide-migrate.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "DECIDE_MIGRATE_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level migration configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MigrateConfig {
    /// Database connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// What to migrate and how.
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MigrateConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the connection:
    /// - `MONGODB_URI` overrides `store.uri`
    /// - `DECIDE_DATABASE` overrides `store.database`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.store.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `DECIDE_MIGRATE_CONFIG` or the default file, falling back
    /// to defaults when neither exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok();
        let path = Path::new(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));
        if explicit.is_some() || path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.store.apply_env_overrides();
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.batch_size == 0 {
            return Err(ConfigError::Invalid("store.batch_size must be positive".to_owned()));
        }
        if self.migration.collections.is_empty() {
            return Err(ConfigError::Invalid(
                "migration.collections must name at least one collection".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// `MongoDB` connection string.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding the collections.
    #[serde(default = "default_database")]
    pub database: String,

    /// Application name reported to the server.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Documents per cursor batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl StoreConfig {
    /// Override connection settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MONGODB_URI") {
            self.uri = val;
        }
        if let Ok(val) = std::env::var("DECIDE_DATABASE") {
            self.database = val;
        }
    }

    /// Client configuration for [`decide_db::DocumentStore::connect`].
    pub fn mongo_config(&self) -> MongoConfig {
        MongoConfig {
            uri: self.uri.clone(),
            database: self.database.clone(),
            app_name: self.app_name.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            batch_size: self.batch_size,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            app_name: default_app_name(),
            connect_timeout_ms: default_connect_timeout_ms(),
            batch_size: default_batch_size(),
        }
    }
}

/// What to migrate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigrationConfig {
    /// Binary layout for converted UUIDs.
    #[serde(default)]
    pub uuid_encoding: UuidEncoding,

    /// Collections to migrate, in order.
    #[serde(default = "default_collections")]
    pub collections: Vec<TargetCollection>,

    /// Drive the collection passes concurrently.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            uuid_encoding: UuidEncoding::default(),
            collections: default_collections(),
            parallel: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_owned()
}

fn default_database() -> String {
    "decide".to_owned()
}

fn default_app_name() -> String {
    "decide-migrate".to_owned()
}

const fn default_connect_timeout_ms() -> u64 {
    5000
}

const fn default_batch_size() -> u32 {
    500
}

fn default_collections() -> Vec<TargetCollection> {
    TargetCollection::ALL.to_vec()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MigrateConfig::default();
        assert_eq!(config.store.database, "decide");
        assert_eq!(config.store.batch_size, 500);
        assert_eq!(config.migration.uuid_encoding, UuidEncoding::Legacy);
        assert_eq!(
            config.migration.collections,
            vec![TargetCollection::Events, TargetCollection::Trials]
        );
        assert!(!config.migration.parallel);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
store:
  database: decide_staging
  app_name: migrate-test
  connect_timeout_ms: 1500
  batch_size: 50
migration:
  uuid_encoding: standard
  collections: [trials]
  parallel: true
logging:
  level: debug
  json: true
";
        let config = MigrateConfig::parse(yaml).unwrap();
        assert_eq!(config.store.app_name, "migrate-test");
        assert_eq!(config.store.connect_timeout_ms, 1500);
        assert_eq!(config.store.batch_size, 50);
        assert_eq!(config.migration.uuid_encoding, UuidEncoding::Standard);
        assert_eq!(config.migration.collections, vec![TargetCollection::Trials]);
        assert!(config.migration.parallel);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);

        let mongo = config.store.mongo_config();
        assert_eq!(mongo.connect_timeout, Duration::from_millis(1500));
        assert_eq!(mongo.batch_size, 50);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = MigrateConfig::parse("migration:\n  parallel: true\n").unwrap();
        assert!(config.migration.parallel);
        assert_eq!(config.migration.collections.len(), 2);
        assert_eq!(config.store.batch_size, 500);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let result = MigrateConfig::parse("migration:\n  uuid_encoding: python\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let result = MigrateConfig::parse("store:\n  batch_size: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_collection_list() {
        let result = MigrateConfig::parse("migration:\n  collections: []\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
