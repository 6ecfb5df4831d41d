//! Configuration source abstraction.
//!
//! Generation reads naming, path, and module-identity values through the
//! [`ConfigSource`] trait. Sources are read-only and asynchronous; each read is
//! a suspension point. [`YamlConfig`] is the mapping-backed source used by
//! embedders and tests.

use std::future::Future;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::{Checkpoint, GenerationError};

/// Errors raised while building a configuration source.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration root must be a mapping")]
    NotAMapping,
}

/// Read-only key/value configuration.
///
/// Implementors supply [`raw_value`](ConfigSource::raw_value); typed access is
/// provided on top of it. A key whose value is YAML `null` counts as absent.
pub trait ConfigSource {
    /// Returns the raw value stored under `key`, if any.
    fn raw_value(&self, key: &str) -> impl Future<Output = Option<serde_yaml::Value>>;

    /// Reads a required value.
    ///
    /// # Errors
    ///
    /// [`GenerationError::MissingConfiguration`] when the key is absent, and
    /// [`GenerationError::InvalidConfiguration`] when the value does not
    /// deserialize into `T`.
    fn get_value<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<T, GenerationError>> {
        async move {
            match self.raw_value(key).await {
                Some(value) => decode(key, value),
                None => Err(GenerationError::MissingConfiguration {
                    key: key.to_string(),
                }),
            }
        }
    }

    /// Reads a value, falling back to `default` when the key is absent.
    ///
    /// # Errors
    ///
    /// [`GenerationError::InvalidConfiguration`] when a value is present but
    /// does not deserialize into `T`.
    fn get_value_or<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> impl Future<Output = Result<T, GenerationError>> {
        async move {
            match self.raw_value(key).await {
                Some(value) => decode(key, value),
                None => Ok(default),
            }
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: serde_yaml::Value) -> Result<T, GenerationError> {
    serde_yaml::from_value(value).map_err(|e| GenerationError::InvalidConfiguration {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// A configuration source backed by a YAML mapping.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::{ConfigSource, YamlConfig};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let config = YamlConfig::from_yaml_str("module-name: Contoso\nazure: true\n").unwrap();
///
/// let name: String = config.get_value("module-name").await.unwrap();
/// let azure: bool = config.get_value_or("azure", false).await.unwrap();
/// let prefix: String = config.get_value_or("prefix", String::new()).await.unwrap();
///
/// assert_eq!(name, "Contoso");
/// assert!(azure);
/// assert_eq!(prefix, "");
/// assert!(config.get_value::<String>("module-version").await.is_err());
/// # });
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlConfig {
    values: serde_yaml::Mapping,
}

impl YamlConfig {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML document whose root is a mapping. An empty document is an
    /// empty source.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        match serde_yaml::from_str(text)? {
            serde_yaml::Value::Mapping(values) => Ok(Self { values }),
            serde_yaml::Value::Null => Ok(Self::default()),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    /// Reads and parses a YAML configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration file");
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&text)
    }

    /// Sets `key`, replacing any previous value.
    pub fn with_value(mut self, key: &str, value: impl Into<serde_yaml::Value>) -> Self {
        self.values.insert(serde_yaml::Value::from(key), value.into());
        self
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no key is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for YamlConfig {
    async fn raw_value(&self, key: &str) -> Option<serde_yaml::Value> {
        self.values.get(key).filter(|v| !v.is_null()).cloned()
    }
}

/// Reads configuration values, recording failures instead of returning them.
///
/// Each failed read records one error on the checkpoint and yields a neutral
/// value so loading can continue and a single run reports every bad key.
pub struct ConfigLoader<'a, C> {
    config: &'a C,
    checkpoint: &'a mut Checkpoint,
}

impl<'a, C: ConfigSource> ConfigLoader<'a, C> {
    pub fn new(config: &'a C, checkpoint: &'a mut Checkpoint) -> Self {
        Self { config, checkpoint }
    }

    /// Reads a required value; records the error and yields `T::default()`
    /// on failure.
    pub async fn required<T: DeserializeOwned + Default>(&mut self, key: &str) -> T {
        match self.config.get_value(key).await {
            Ok(value) => {
                debug!(key, "configuration value loaded");
                value
            }
            Err(e) => {
                self.checkpoint.record(e);
                T::default()
            }
        }
    }

    /// Reads an optional value; records the error and yields `default` when
    /// the stored value is malformed.
    pub async fn value_or<T: DeserializeOwned + Clone>(&mut self, key: &str, default: T) -> T {
        match self.config.get_value_or(key, default.clone()).await {
            Ok(value) => {
                debug!(key, "configuration value loaded");
                value
            }
            Err(e) => {
                self.checkpoint.record(e);
                default
            }
        }
    }
}

/// Packaging metadata supplied under the `metadata` key.
///
/// Every field is optional in the source; absent fields are empty strings or
/// `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub authors: String,
    pub owners: String,
    pub require_license_acceptance: bool,
    pub description: String,
    pub copyright: String,
    pub tags: String,
    pub company_name: String,
    pub license_url: String,
    pub project_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_counts_as_absent() {
        let config = YamlConfig::from_yaml_str("prefix: ~\n").unwrap();
        assert_eq!(config.raw_value("prefix").await, None);
        assert_eq!(
            config.get_value::<String>("prefix").await,
            Err(GenerationError::MissingConfiguration {
                key: "prefix".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_wrong_shape_is_invalid() {
        let config = YamlConfig::from_yaml_str("azure: [1, 2]\n").unwrap();
        let err = config.get_value_or("azure", false).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidConfiguration { ref key, .. } if key == "azure"));
    }

    #[test]
    fn test_root_must_be_mapping() {
        assert!(matches!(
            YamlConfig::from_yaml_str("- a\n- b\n"),
            Err(ConfigError::NotAMapping)
        ));
        assert!(YamlConfig::from_yaml_str("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_defaults_missing_fields() {
        let config = YamlConfig::from_yaml_str(
            "metadata:\n  authors: Contoso\n  requireLicenseAcceptance: true\n",
        )
        .unwrap();
        let metadata: Metadata = config.get_value("metadata").await.unwrap();

        assert_eq!(metadata.authors, "Contoso");
        assert!(metadata.require_license_acceptance);
        assert_eq!(metadata.owners, "");
        assert_eq!(metadata.project_url, "");
    }

    #[tokio::test]
    async fn test_loader_records_and_continues() {
        let config = YamlConfig::new().with_value("azure", "not-a-bool");
        let mut checkpoint = Checkpoint::new();
        let mut loader = ConfigLoader::new(&config, &mut checkpoint);

        let name: String = loader.required("module-name").await;
        let version: String = loader.required("module-version").await;
        let azure = loader.value_or("azure", false).await;
        let prefix = loader.value_or("prefix", "Az".to_string()).await;

        assert_eq!(name, "");
        assert_eq!(version, "");
        assert!(!azure);
        assert_eq!(prefix, "Az");
        assert_eq!(checkpoint.errors().len(), 3);
    }
}
