use serde::{Deserialize, Serialize};

use crate::hash::ContentAddress;

/// metadata record for one stored blob
///
/// the content hash is the addressing key; the filename is advisory
/// and never used for lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub content_hash: ContentAddress,
    #[serde(default)]
    pub filename: String,
    pub collection: String,
    /// cleared by the suppressing storage proxy so imports skip
    /// the automatic publish step
    #[serde(default = "default_true")]
    pub publish_on_import: bool,
}

fn default_true() -> bool {
    true
}

impl BlobRecord {
    pub fn new(content_hash: ContentAddress, collection: impl Into<String>) -> Self {
        Self {
            content_hash,
            filename: String::new(),
            collection: collection.into(),
            publish_on_import: true,
        }
    }
}

/// a higher-level domain record owning one blob
///
/// created and mutated by the surrounding application; this crate
/// only enumerates and deletes them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    pub resource: ContentAddress,
}

impl AssetRecord {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        resource: ContentAddress,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            resource,
        }
    }
}
