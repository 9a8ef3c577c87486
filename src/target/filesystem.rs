use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use crate::error::{IoResultExt, Result};
use crate::records::BlobRecord;
use crate::store::BlobStore;
use crate::target::PublishTarget;

/// publish target copying blob content into a public directory
///
/// published files are flat, named by their content hash; the public
/// url is the configured base url followed by the hash.
pub struct FsPublishTarget {
    name: String,
    path: PathBuf,
    base_url: String,
}

impl FsPublishTarget {
    pub fn new(name: impl Into<String>, path: PathBuf, base_url: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&path).with_path(&path)?;
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            name: name.into(),
            path,
            base_url,
        })
    }

    fn published_path(&self, record: &BlobRecord) -> PathBuf {
        self.path.join(record.content_hash.to_hex())
    }
}

impl PublishTarget for FsPublishTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, record: &BlobRecord, store: &dyn BlobStore) -> Result<()> {
        let dest = self.published_path(record);
        let mut stream = store.open(&record.content_hash)?;
        let mut file = File::create(&dest).with_path(&dest)?;
        io::copy(&mut stream, &mut file).with_path(&dest)?;
        Ok(())
    }

    fn unpublish(&self, record: &BlobRecord) -> Result<()> {
        let dest = self.published_path(record);
        match fs::remove_file(&dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::Error::Io {
                path: dest,
                source: e,
            }),
        }
    }

    fn public_url(&self, record: &BlobRecord) -> String {
        format!("{}{}", self.base_url, record.content_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsBlobStore;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, FsBlobStore, FsPublishTarget) {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new("local", dir.path().join("resources")).unwrap();
        let target = FsPublishTarget::new(
            "web",
            dir.path().join("public"),
            "https://assets.example.org",
        )
        .unwrap();
        (dir, store, target)
    }

    #[test]
    fn test_publish_copies_content() {
        let (dir, store, target) = fixture();

        let record = store
            .import(&mut std::io::Cursor::new(b"published".to_vec()), "persistent")
            .unwrap();
        target.publish(&record, &store).unwrap();

        let published = dir.path().join("public").join(record.content_hash.to_hex());
        assert_eq!(fs::read(published).unwrap(), b"published");
    }

    #[test]
    fn test_unpublish_tolerates_absent_file() {
        let (_dir, store, target) = fixture();

        let record = store
            .import(&mut std::io::Cursor::new(b"gone".to_vec()), "persistent")
            .unwrap();

        target.publish(&record, &store).unwrap();
        target.unpublish(&record).unwrap();
        // second unpublish is a no-op
        target.unpublish(&record).unwrap();
    }

    #[test]
    fn test_public_url() {
        let (_dir, store, target) = fixture();

        let record = store
            .import(&mut std::io::Cursor::new(b"addressed".to_vec()), "persistent")
            .unwrap();

        assert_eq!(
            target.public_url(&record),
            format!("https://assets.example.org/{}", record.content_hash)
        );
    }
}
