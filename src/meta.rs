use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ContentAddress;
use crate::records::{AssetRecord, BlobRecord};

/// number of records fetched per iterator page
const PAGE_SIZE: usize = 256;

/// persistent metadata store consumed by the reconciliation core
///
/// iteration methods return lazy, forward-only sequences; a fresh
/// call re-enumerates from the store. deleting records while an
/// iterator is live is supported.
pub trait MetadataStore {
    fn blob_by_hash(&self, hash: &ContentAddress) -> Result<Option<BlobRecord>>;
    fn record_blob(&self, record: &BlobRecord) -> Result<()>;
    fn update_blob_filename(&self, hash: &ContentAddress, filename: &str) -> Result<()>;
    fn delete_blob(&self, hash: &ContentAddress) -> Result<()>;
    fn collection_blobs(&self, collection: &str) -> Result<Box<dyn Iterator<Item = BlobRecord> + '_>>;
    fn assets(&self) -> Result<Box<dyn Iterator<Item = AssetRecord> + '_>>;
    fn delete_asset(&self, identifier: &str) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    blobs: BTreeMap<ContentAddress, BlobRecord>,
    assets: BTreeMap<String, AssetRecord>,
}

/// file-backed metadata store: one zstd-compressed CBOR database
///
/// mutations are written through immediately (temp file + rename).
/// interior mutability is single-threaded by design; operations run
/// sequentially with exclusive access to the store.
pub struct FileMetadataStore {
    path: PathBuf,
    state: RefCell<State>,
}

impl FileMetadataStore {
    /// open the database file, creating an empty store if absent
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let compressed = fs::read(path).with_path(path)?;
            let cbor = zstd::decode_all(&compressed[..]).with_path(path)?;
            ciborium::from_reader(&cbor[..])?
        } else {
            State::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: RefCell::new(state),
        })
    }

    /// insert an asset record (normally the surrounding application's job)
    pub fn record_asset(&self, asset: &AssetRecord) -> Result<()> {
        self.state
            .borrow_mut()
            .assets
            .insert(asset.identifier.clone(), asset.clone());
        self.save()
    }

    pub fn asset_by_identifier(&self, identifier: &str) -> Option<AssetRecord> {
        self.state.borrow().assets.get(identifier).cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.state.borrow().blobs.len()
    }

    pub fn asset_count(&self) -> usize {
        self.state.borrow().assets.len()
    }

    fn save(&self) -> Result<()> {
        let mut cbor = Vec::new();
        ciborium::into_writer(&*self.state.borrow(), &mut cbor)?;

        let compressed = zstd::encode_all(&cbor[..], 3).with_path(&self.path)?;

        // atomic write: temp sibling -> fsync -> rename
        let tmp_path = self
            .path
            .with_file_name(format!(".{}", uuid::Uuid::new_v4()));
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(&compressed).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, &self.path).with_path(&self.path)?;

        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent).with_path(parent)?;
            dir.sync_all().with_path(parent)?;
        }

        Ok(())
    }
}

impl MetadataStore for FileMetadataStore {
    fn blob_by_hash(&self, hash: &ContentAddress) -> Result<Option<BlobRecord>> {
        Ok(self.state.borrow().blobs.get(hash).cloned())
    }

    fn record_blob(&self, record: &BlobRecord) -> Result<()> {
        self.state
            .borrow_mut()
            .blobs
            .insert(record.content_hash, record.clone());
        self.save()
    }

    fn update_blob_filename(&self, hash: &ContentAddress, filename: &str) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            let record = state
                .blobs
                .get_mut(hash)
                .ok_or(Error::BlobNotFound(*hash))?;
            record.filename = filename.to_string();
        }
        self.save()
    }

    fn delete_blob(&self, hash: &ContentAddress) -> Result<()> {
        if self.state.borrow_mut().blobs.remove(hash).is_none() {
            return Err(Error::BlobNotFound(*hash));
        }
        self.save()
    }

    fn collection_blobs(&self, collection: &str) -> Result<Box<dyn Iterator<Item = BlobRecord> + '_>> {
        // snapshot the key set so records may be added or removed
        // while the iterator is live
        let keys: VecDeque<ContentAddress> = self
            .state
            .borrow()
            .blobs
            .values()
            .filter(|r| r.collection == collection)
            .map(|r| r.content_hash)
            .collect();

        Ok(Box::new(PagedBlobs {
            store: self,
            keys,
            page: VecDeque::new(),
        }))
    }

    fn assets(&self) -> Result<Box<dyn Iterator<Item = AssetRecord> + '_>> {
        let keys: VecDeque<String> = self.state.borrow().assets.keys().cloned().collect();

        Ok(Box::new(PagedAssets {
            store: self,
            keys,
            page: VecDeque::new(),
        }))
    }

    fn delete_asset(&self, identifier: &str) -> Result<()> {
        if self.state.borrow_mut().assets.remove(identifier).is_none() {
            return Err(Error::AssetNotFound(identifier.to_string()));
        }
        self.save()
    }
}

/// forward-only blob iterator fetching one page of records at a time
struct PagedBlobs<'a> {
    store: &'a FileMetadataStore,
    keys: VecDeque<ContentAddress>,
    page: VecDeque<BlobRecord>,
}

impl Iterator for PagedBlobs<'_> {
    type Item = BlobRecord;

    fn next(&mut self) -> Option<BlobRecord> {
        while self.page.is_empty() && !self.keys.is_empty() {
            let state = self.store.state.borrow();
            for _ in 0..PAGE_SIZE {
                match self.keys.pop_front() {
                    // keys deleted since the snapshot are skipped
                    Some(key) => {
                        if let Some(record) = state.blobs.get(&key) {
                            self.page.push_back(record.clone());
                        }
                    }
                    None => break,
                }
            }
        }
        self.page.pop_front()
    }
}

/// forward-only asset iterator; stable under mid-iteration deletes
struct PagedAssets<'a> {
    store: &'a FileMetadataStore,
    keys: VecDeque<String>,
    page: VecDeque<AssetRecord>,
}

impl Iterator for PagedAssets<'_> {
    type Item = AssetRecord;

    fn next(&mut self) -> Option<AssetRecord> {
        while self.page.is_empty() && !self.keys.is_empty() {
            let state = self.store.state.borrow();
            for _ in 0..PAGE_SIZE {
                match self.keys.pop_front() {
                    Some(key) => {
                        if let Some(record) = state.assets.get(&key) {
                            self.page.push_back(record.clone());
                        }
                    }
                    None => break,
                }
            }
        }
        self.page.pop_front()
    }
}
