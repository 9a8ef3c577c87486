use std::io::Read;

use crate::error::Result;
use crate::hash::ContentAddress;
use crate::records::BlobRecord;
use crate::store::BlobStore;

/// pass-through storage decorator that suppresses publish-on-import
///
/// records imported through this proxy are not automatically pushed
/// to the collection's publish target; the application has to publish
/// them itself. everything else delegates to the wrapped backend.
pub struct SuppressingProxy {
    name: String,
    inner: Box<dyn BlobStore>,
}

impl SuppressingProxy {
    pub fn new(name: impl Into<String>, inner: Box<dyn BlobStore>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

impl BlobStore for SuppressingProxy {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, hash: &ContentAddress) -> Result<Box<dyn Read>> {
        self.inner.open(hash)
    }

    fn import(&self, source: &mut dyn Read, collection: &str) -> Result<BlobRecord> {
        let mut record = self.inner.import(source, collection)?;
        record.publish_on_import = false;
        Ok(record)
    }

    fn delete(&self, hash: &ContentAddress) -> Result<()> {
        self.inner.delete(hash)
    }
}
