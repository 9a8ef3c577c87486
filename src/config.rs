use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};

/// toolkit configuration stored in config.toml
///
/// all paths are interpreted relative to the toolkit root.
/// the configuration is passed into the reconciler explicitly;
/// nothing in the crate reads ambient global state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// base directory of the blob files swept by remove-orphaned-blobs
    pub resources_path: PathBuf,
    /// metadata database file
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
    /// collection definitions
    #[serde(default, rename = "collection", skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionDef>,
    /// storage backend definitions
    #[serde(default, rename = "storage", skip_serializing_if = "Vec::is_empty")]
    pub storages: Vec<StorageDef>,
    /// publish target definitions
    #[serde(default, rename = "target", skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetDef>,
    /// usage strategy wiring
    #[serde(default)]
    pub usage: UsageConfig,
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("metadata.db")
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// get a collection definition by name
    pub fn collection(&self, name: &str) -> Option<&CollectionDef> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// get a storage definition by name
    pub fn storage(&self, name: &str) -> Option<&StorageDef> {
        self.storages.iter().find(|s| s.name == name)
    }

    /// get a target definition by name
    pub fn target(&self, name: &str) -> Option<&TargetDef> {
        self.targets.iter().find(|t| t.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources_path: PathBuf::from("resources"),
            metadata_path: default_metadata_path(),
            collections: vec![],
            storages: vec![],
            targets: vec![],
            usage: UsageConfig::default(),
        }
    }
}

/// a named pairing of a storage backend and a publish target
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDef {
    pub name: String,
    pub storage: String,
    pub target: String,
}

/// a storage backend definition
///
/// `kind` selects from a closed set ("filesystem", "suppressing");
/// which of the optional fields are required depends on the kind,
/// validated by the storage factory at construction time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDef {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// name of the wrapped storage definition (kind = "suppressing")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

/// a publish target definition ("null" or "filesystem")
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDef {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// usage strategy wiring assembled at startup
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsageConfig {
    /// reference list files, one strategy each
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_lists: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config {
            resources_path: PathBuf::from("resources"),
            metadata_path: PathBuf::from("metadata.db"),
            collections: vec![CollectionDef {
                name: "persistent".to_string(),
                storage: "local".to_string(),
                target: "cdn".to_string(),
            }],
            storages: vec![
                StorageDef {
                    name: "local".to_string(),
                    kind: "filesystem".to_string(),
                    path: Some(PathBuf::from("resources")),
                    backend: None,
                },
                StorageDef {
                    name: "staging".to_string(),
                    kind: "suppressing".to_string(),
                    path: None,
                    backend: Some("local".to_string()),
                },
            ],
            targets: vec![TargetDef {
                name: "cdn".to_string(),
                kind: "null".to_string(),
                path: None,
                base_url: None,
            }],
            usage: UsageConfig::default(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.collections, parsed.collections);
        assert_eq!(config.storages, parsed.storages);
        assert_eq!(config.targets, parsed.targets);
    }

    #[test]
    fn test_config_minimal_toml() {
        let toml_str = r#"
resources_path = "resources"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.metadata_path, PathBuf::from("metadata.db"));
        assert!(config.collections.is_empty());
        assert!(config.usage.reference_lists.is_empty());
    }

    #[test]
    fn test_config_lookups() {
        let toml_str = r#"
resources_path = "resources"

[[collection]]
name = "persistent"
storage = "local"
target = "none"

[[storage]]
name = "local"
kind = "filesystem"
path = "resources"

[[target]]
name = "none"
kind = "null"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.collection("persistent").unwrap().storage, "local");
        assert_eq!(config.storage("local").unwrap().kind, "filesystem");
        assert_eq!(config.target("none").unwrap().kind, "null");
        assert!(config.collection("static").is_none());
    }
}
