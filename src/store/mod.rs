//! blob storage backends

mod filesystem;
mod suppressing;

pub use filesystem::FsBlobStore;
pub use suppressing::SuppressingProxy;

use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::ContentAddress;
use crate::records::BlobRecord;

/// storage backend holding blob content addressed by hash
pub trait BlobStore {
    fn name(&self) -> &str;

    /// open the content stream for a hash
    ///
    /// absent content is `Error::BlobNotFound`; callers must
    /// distinguish it from I/O failure.
    fn open(&self, hash: &ContentAddress) -> Result<Box<dyn Read>>;

    /// consume a stream, persist the bytes under their content hash
    /// and return the metadata record for the new (or reused) blob
    fn import(&self, source: &mut dyn Read, collection: &str) -> Result<BlobRecord>;

    /// delete stored content; `Error::BlobNotFound` if absent
    fn delete(&self, hash: &ContentAddress) -> Result<()>;
}

/// build a storage backend from its configuration definition
///
/// the kind set is closed: "filesystem" and "suppressing". missing
/// required options and cyclic backend chains fail with
/// `Error::Construction` before any operation begins.
pub fn build_store(root: &Path, config: &Config, storage_name: &str) -> Result<Box<dyn BlobStore>> {
    build_store_checked(root, config, storage_name, &mut Vec::new())
}

fn build_store_checked(
    root: &Path,
    config: &Config,
    storage_name: &str,
    resolving: &mut Vec<String>,
) -> Result<Box<dyn BlobStore>> {
    if resolving.iter().any(|name| name == storage_name) {
        return Err(Error::Construction(format!(
            "storage '{}' is part of a backend cycle",
            storage_name
        )));
    }

    let def = config
        .storage(storage_name)
        .ok_or_else(|| Error::StorageNotFound(storage_name.to_string()))?;

    match def.kind.as_str() {
        "filesystem" => {
            let path = def.path.as_ref().ok_or_else(|| {
                Error::Construction(format!("storage '{}' needs a path", def.name))
            })?;
            let store = FsBlobStore::new(&def.name, root.join(path))?;
            Ok(Box::new(store))
        }
        "suppressing" => {
            let backend = def.backend.as_ref().ok_or_else(|| {
                Error::Construction(format!(
                    "storage '{}' needs a backend storage to wrap",
                    def.name
                ))
            })?;
            if config.storage(backend).is_none() {
                return Err(Error::Construction(format!(
                    "storage '{}' wraps unknown backend '{}'",
                    def.name, backend
                )));
            }
            resolving.push(def.name.clone());
            let inner = build_store_checked(root, config, backend, resolving)?;
            Ok(Box::new(SuppressingProxy::new(&def.name, inner)))
        }
        other => Err(Error::Construction(format!(
            "storage '{}' has unknown kind '{}'",
            def.name, other
        ))),
    }
}
