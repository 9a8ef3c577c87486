use std::path::{Path, PathBuf};

use crate::collection::Collection;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::{FileMetadataStore, MetadataStore};
use crate::store::build_store;
use crate::target::build_target;
use crate::usage::{ReferenceListStrategy, UsageRegistry};

/// reconciliation context: root directory, configuration, metadata
/// store and usage strategy registry
///
/// operations assume exclusive access to the store for the duration
/// of a run; that contract is operational, not enforced in-process.
pub struct Reconciler {
    root: PathBuf,
    config: Config,
    meta: Box<dyn MetadataStore>,
    usage: UsageRegistry,
}

impl Reconciler {
    /// open a toolkit root containing config.toml
    ///
    /// wires the file-backed metadata store and the configured
    /// reference-list usage strategies.
    pub fn open(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");
        if !config_path.exists() {
            return Err(Error::NoConfig(root.to_path_buf()));
        }
        let config = Config::load(&config_path)?;

        let meta = FileMetadataStore::open(&root.join(&config.metadata_path))?;

        let mut usage = UsageRegistry::new();
        for list in &config.usage.reference_lists {
            usage.register(Box::new(ReferenceListStrategy::from_file(&root.join(list))?));
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
            meta: Box::new(meta),
            usage,
        })
    }

    /// build a reconciler from explicitly injected parts
    pub fn new(
        root: PathBuf,
        config: Config,
        meta: Box<dyn MetadataStore>,
        usage: UsageRegistry,
    ) -> Self {
        Self {
            root,
            config,
            meta,
            usage,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn meta(&self) -> &dyn MetadataStore {
        self.meta.as_ref()
    }

    pub fn usage(&self) -> &UsageRegistry {
        &self.usage
    }

    pub fn usage_mut(&mut self) -> &mut UsageRegistry {
        &mut self.usage
    }

    /// base directory swept by remove-orphaned-blobs
    pub fn resources_path(&self) -> PathBuf {
        self.root.join(&self.config.resources_path)
    }

    /// resolve a named collection, building its store and target
    pub fn resolve_collection(&self, name: &str) -> Result<Collection> {
        let def = self
            .config
            .collection(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;

        let store = build_store(&self.root, &self.config, &def.storage)?;
        let target = build_target(&self.root, &self.config, &def.target)?;

        Ok(Collection::new(&def.name, store, target))
    }
}
