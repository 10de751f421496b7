//! Configuration for the world and for logging

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ecs::EntityId;

/// Settings a [`World`](crate::ecs::World) is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Id given to the first entity; later ids count up from here.
    #[serde(default)]
    pub first_entity_id: EntityId,
    /// Category used by `World::add_system`.
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_category() -> String {
    "default".to_string()
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            first_entity_id: 0,
            default_category: default_category(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
    /// `cecs=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl WorldConfig {
    /// Load configuration from YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read world config {}", path.display()))?;
        serde_yaml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save configuration to YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_mapping() {
        let config: WorldConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.first_entity_id, 0);
        assert_eq!(config.default_category, "default");
    }

    #[test]
    fn test_partial_yaml() {
        let config: WorldConfig = serde_yaml::from_str("first_entity_id: 1\n").unwrap();
        assert_eq!(config.first_entity_id, 1);
        assert_eq!(config.default_category, "default");

        let logging: LoggingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(logging.level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = WorldConfig {
            first_entity_id: 10,
            default_category: "update".to_string(),
        };

        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("world.yaml");
        config.to_yaml(&path).unwrap();

        let loaded = WorldConfig::from_yaml(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = WorldConfig::from_yaml("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
