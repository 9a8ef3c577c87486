use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::records::AssetRecord;

/// per-asset sweep outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    Deleted,
    Kept,
    Failed(String),
}

/// one status line of an asset sweep
#[derive(Clone, Debug)]
pub struct AssetEvent {
    pub status: AssetStatus,
    pub identifier: String,
    /// title, falling back to the owning blob's filename
    pub label: String,
}

/// asset sweep counters, reported as a summary after the full pass
#[derive(Debug, Default)]
pub struct SweepAssetsStats {
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
}

/// delete assets no registered usage strategy still references
///
/// an asset is deleted exactly when every strategy agrees it is
/// unused; with no strategies registered every asset qualifies.
/// one asset's lookup or deletion failure is reported and the sweep
/// moves on. cascading the deletion to the asset's blob record is the
/// metadata store's concern, not handled here.
pub fn sweep_unused_assets(
    rec: &Reconciler,
    dry_run: bool,
    report: &mut dyn FnMut(&AssetEvent),
) -> Result<SweepAssetsStats> {
    let mut stats = SweepAssetsStats::default();

    for asset in rec.meta().assets()? {
        let label = match display_label(rec, &asset) {
            Ok(label) => label,
            Err(e) => {
                stats.failed += 1;
                report(&AssetEvent {
                    status: AssetStatus::Failed(e.to_string()),
                    identifier: asset.identifier,
                    label: String::new(),
                });
                continue;
            }
        };

        if rec.usage().is_in_use(&asset) {
            stats.kept += 1;
            report(&AssetEvent {
                status: AssetStatus::Kept,
                identifier: asset.identifier,
                label,
            });
        } else {
            if !dry_run {
                if let Err(e) = rec.meta().delete_asset(&asset.identifier) {
                    stats.failed += 1;
                    report(&AssetEvent {
                        status: AssetStatus::Failed(e.to_string()),
                        identifier: asset.identifier,
                        label,
                    });
                    continue;
                }
            }
            stats.deleted += 1;
            report(&AssetEvent {
                status: AssetStatus::Deleted,
                identifier: asset.identifier,
                label,
            });
        }
    }

    Ok(stats)
}

fn display_label(rec: &Reconciler, asset: &AssetRecord) -> Result<String> {
    if !asset.title.is_empty() {
        return Ok(asset.title.clone());
    }
    Ok(rec
        .meta()
        .blob_by_hash(&asset.resource)?
        .map(|record| record.filename)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Error;
    use crate::hash::ContentAddress;
    use crate::meta::{FileMetadataStore, MetadataStore};
    use crate::records::BlobRecord;
    use crate::usage::{UsageRegistry, UsageStrategy};
    use tempfile::tempdir;

    struct ReferencedTitles(Vec<String>);

    impl UsageStrategy for ReferencedTitles {
        fn name(&self) -> &str {
            "referenced-titles"
        }
        fn is_in_use(&self, asset: &AssetRecord) -> bool {
            self.0.contains(&asset.title)
        }
    }

    fn fixture(usage: UsageRegistry) -> (tempfile::TempDir, Reconciler) {
        let dir = tempdir().unwrap();
        let meta = FileMetadataStore::open(&dir.path().join("metadata.db")).unwrap();
        meta.record_asset(&AssetRecord::new(
            "a-keep",
            "Keep me",
            ContentAddress::of_bytes(b"keep"),
        ))
        .unwrap();
        meta.record_asset(&AssetRecord::new(
            "a-drop",
            "Drop me",
            ContentAddress::of_bytes(b"drop"),
        ))
        .unwrap();
        let rec = Reconciler::new(
            dir.path().to_path_buf(),
            Config::default(),
            Box::new(meta),
            usage,
        );
        (dir, rec)
    }

    fn remaining_assets(rec: &Reconciler) -> usize {
        FileMetadataStore::open(&rec.root().join("metadata.db"))
            .unwrap()
            .asset_count()
    }

    #[test]
    fn test_zero_strategies_deletes_everything() {
        let (_dir, rec) = fixture(UsageRegistry::new());

        let mut events = Vec::new();
        let stats =
            sweep_unused_assets(&rec, false, &mut |e| events.push(e.clone())).unwrap();

        assert_eq!(stats.deleted, 2);
        assert_eq!(stats.kept, 0);
        assert!(events.iter().all(|e| e.status == AssetStatus::Deleted));
        assert_eq!(remaining_assets(&rec), 0);
    }

    #[test]
    fn test_referenced_assets_are_kept() {
        let mut usage = UsageRegistry::new();
        usage.register(Box::new(ReferencedTitles(vec!["Keep me".to_string()])));
        let (_dir, rec) = fixture(usage);

        let mut events = Vec::new();
        let stats =
            sweep_unused_assets(&rec, false, &mut |e| events.push(e.clone())).unwrap();

        assert_eq!(stats.kept, 1);
        assert_eq!(stats.deleted, 1);

        let kept = events
            .iter()
            .find(|e| e.status == AssetStatus::Kept)
            .unwrap();
        assert_eq!(kept.identifier, "a-keep");
        assert_eq!(kept.label, "Keep me");
        assert_eq!(remaining_assets(&rec), 1);
    }

    #[test]
    fn test_dry_run_reports_but_keeps_records() {
        let (_dir, rec) = fixture(UsageRegistry::new());

        let stats = sweep_unused_assets(&rec, true, &mut |_| {}).unwrap();

        assert_eq!(stats.deleted, 2);
        assert_eq!(remaining_assets(&rec), 2);
    }

    /// wraps a real store but refuses to delete one identifier
    struct RefusingDeletes {
        inner: FileMetadataStore,
        refuse: String,
    }

    impl MetadataStore for RefusingDeletes {
        fn blob_by_hash(&self, hash: &ContentAddress) -> crate::Result<Option<BlobRecord>> {
            self.inner.blob_by_hash(hash)
        }
        fn record_blob(&self, record: &BlobRecord) -> crate::Result<()> {
            self.inner.record_blob(record)
        }
        fn update_blob_filename(&self, hash: &ContentAddress, filename: &str) -> crate::Result<()> {
            self.inner.update_blob_filename(hash, filename)
        }
        fn delete_blob(&self, hash: &ContentAddress) -> crate::Result<()> {
            self.inner.delete_blob(hash)
        }
        fn collection_blobs(
            &self,
            collection: &str,
        ) -> crate::Result<Box<dyn Iterator<Item = BlobRecord> + '_>> {
            self.inner.collection_blobs(collection)
        }
        fn assets(&self) -> crate::Result<Box<dyn Iterator<Item = AssetRecord> + '_>> {
            self.inner.assets()
        }
        fn delete_asset(&self, identifier: &str) -> crate::Result<()> {
            if identifier == self.refuse {
                return Err(Error::Io {
                    path: "metadata.db".into(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "database locked",
                    ),
                });
            }
            self.inner.delete_asset(identifier)
        }
    }

    #[test]
    fn test_delete_failure_is_reported_and_sweep_continues() {
        let dir = tempdir().unwrap();
        let meta = FileMetadataStore::open(&dir.path().join("metadata.db")).unwrap();
        meta.record_asset(&AssetRecord::new("a-1", "First", ContentAddress::of_bytes(b"1")))
            .unwrap();
        meta.record_asset(&AssetRecord::new("a-2", "Second", ContentAddress::of_bytes(b"2")))
            .unwrap();

        let rec = Reconciler::new(
            dir.path().to_path_buf(),
            Config::default(),
            Box::new(RefusingDeletes {
                inner: meta,
                refuse: "a-1".to_string(),
            }),
            UsageRegistry::new(),
        );

        let mut events = Vec::new();
        let stats =
            sweep_unused_assets(&rec, false, &mut |e| events.push(e.clone())).unwrap();

        // the refused deletion is a reported failure, the other asset
        // is still swept
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(events.len(), 2);

        let failed = events
            .iter()
            .find(|e| matches!(e.status, AssetStatus::Failed(_)))
            .unwrap();
        assert_eq!(failed.identifier, "a-1");
        assert!(events
            .iter()
            .any(|e| e.status == AssetStatus::Deleted && e.identifier == "a-2"));
        assert_eq!(remaining_assets(&rec), 1);
    }

    #[test]
    fn test_label_falls_back_to_blob_filename() {
        let dir = tempdir().unwrap();
        let meta = FileMetadataStore::open(&dir.path().join("metadata.db")).unwrap();

        let hash = ContentAddress::of_bytes(b"picture");
        let mut blob = BlobRecord::new(hash, "persistent");
        blob.filename = "picture.png".to_string();
        meta.record_blob(&blob).unwrap();
        meta.record_asset(&AssetRecord::new("a-1", "", hash)).unwrap();

        let rec = Reconciler::new(
            dir.path().to_path_buf(),
            Config::default(),
            Box::new(meta),
            UsageRegistry::new(),
        );

        let mut events = Vec::new();
        sweep_unused_assets(&rec, true, &mut |e| events.push(e.clone())).unwrap();

        assert_eq!(events[0].label, "picture.png");
    }
}
