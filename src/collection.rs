use std::io::Read;

use crate::error::Result;
use crate::meta::MetadataStore;
use crate::records::BlobRecord;
use crate::store::BlobStore;
use crate::target::PublishTarget;

/// named pairing of a blob store and a publish target
///
/// a resolved collection is immutable for the duration of an
/// operation; resolving again re-reads the configuration.
pub struct Collection {
    name: String,
    store: Box<dyn BlobStore>,
    target: Box<dyn PublishTarget>,
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        store: Box<dyn BlobStore>,
        target: Box<dyn PublishTarget>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    pub fn target(&self) -> &dyn PublishTarget {
        self.target.as_ref()
    }

    /// lazily enumerate the blob metadata records of this collection
    ///
    /// one flat record per item; a fresh call re-enumerates from the
    /// metadata store.
    pub fn enumerate_blobs<'m>(
        &self,
        meta: &'m dyn MetadataStore,
    ) -> Result<Box<dyn Iterator<Item = BlobRecord> + 'm>> {
        meta.collection_blobs(&self.name)
    }

    /// import a stream into this collection
    ///
    /// delegates to the blob store, creates the metadata record unless
    /// one with that content hash already exists, then publishes to
    /// the target unless the store suppressed it.
    pub fn import_resource(
        &self,
        meta: &dyn MetadataStore,
        source: &mut dyn Read,
    ) -> Result<BlobRecord> {
        let record = self.store.import(source, &self.name)?;

        if meta.blob_by_hash(&record.content_hash)?.is_none() {
            meta.record_blob(&record)?;
        }

        if record.publish_on_import {
            self.target.publish(&record, self.store.as_ref())?;
        }

        Ok(record)
    }

    /// publish every blob of this collection to its target
    pub fn publish(&self, meta: &dyn MetadataStore) -> Result<()> {
        let mut records = self.enumerate_blobs(meta)?;
        self.target.publish_collection(&mut records, self.store.as_ref())
    }
}
