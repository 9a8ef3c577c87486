use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::error::{Error, IoResultExt, Result};
use crate::fsutil;
use crate::hash::{ContentAddress, ContentHasher};
use crate::records::BlobRecord;
use crate::store::BlobStore;

/// filesystem blob storage
///
/// blobs live under `<root>/<h0..2>/<h2..4>/<full-hex>`; the basename
/// of every stored file is its full content hash.
pub struct FsBlobStore {
    name: String,
    root: PathBuf,
}

impl FsBlobStore {
    /// create a store rooted at the given directory, creating it if needed
    pub fn new(name: impl Into<String>, root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).with_path(&root)?;
        fs::create_dir_all(root.join("tmp")).with_path(&root)?;
        Ok(Self {
            name: name.into(),
            root,
        })
    }

    /// storage root directory
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// filesystem path a blob is stored at
    pub fn blob_path(&self, hash: &ContentAddress) -> PathBuf {
        let (d1, d2, name) = hash.to_path_components();
        self.root.join(d1).join(d2).join(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.root.join("tmp").join(uuid::Uuid::new_v4().to_string())
    }
}

impl BlobStore for FsBlobStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, hash: &ContentAddress) -> Result<Box<dyn Read>> {
        let path = self.blob_path(hash);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::BlobNotFound(*hash)
            } else {
                Error::Io { path, source: e }
            }
        })?;
        Ok(Box::new(file))
    }

    fn import(&self, source: &mut dyn Read, collection: &str) -> Result<BlobRecord> {
        // stream to a temp file while hashing, then rename into place
        let tmp_path = self.tmp_path();

        let mut hasher = ContentHasher::new();
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = source.read(&mut buf).with_path(&tmp_path)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                tmp_file.write_all(&buf[..n]).with_path(&tmp_path)?;
            }
            tmp_file.sync_all().with_path(&tmp_path)?;
        }

        let hash = hasher.finalize();
        let blob_path = self.blob_path(&hash);

        // dedup: content already stored
        if blob_path.exists() {
            fs::remove_file(&tmp_path).with_path(&tmp_path)?;
            return Ok(BlobRecord::new(hash, collection));
        }

        let blob_dir = blob_path
            .parent()
            .ok_or_else(|| Error::Import(format!("blob path {} has no parent", blob_path.display())))?
            .to_path_buf();
        fs::create_dir_all(&blob_dir).with_path(&blob_dir)?;

        fs::rename(&tmp_path, &blob_path).with_path(&blob_path)?;

        // fsync parent directory
        let dir = File::open(&blob_dir).with_path(&blob_dir)?;
        dir.sync_all().with_path(&blob_dir)?;

        Ok(BlobRecord::new(hash, collection))
    }

    fn delete(&self, hash: &ContentAddress) -> Result<()> {
        let path = self.blob_path(hash);
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::BlobNotFound(*hash)
            } else {
                Error::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        // drop emptied shard directories
        if let Some(parent) = path.parent() {
            fsutil::prune_empty_dirs(parent, &self.root)?;
        }
        Ok(())
    }
}
