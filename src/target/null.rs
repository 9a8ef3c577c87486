use crate::error::Result;
use crate::records::BlobRecord;
use crate::store::BlobStore;
use crate::target::PublishTarget;

/// publish target that publishes nothing
///
/// used for collections whose content must never be externally
/// reachable. all calls are no-ops; the public url is always empty.
pub struct NullPublishTarget {
    name: String,
}

impl NullPublishTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl PublishTarget for NullPublishTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, _record: &BlobRecord, _store: &dyn BlobStore) -> Result<()> {
        Ok(())
    }

    fn unpublish(&self, _record: &BlobRecord) -> Result<()> {
        Ok(())
    }

    fn public_url(&self, _record: &BlobRecord) -> String {
        String::new()
    }
}
