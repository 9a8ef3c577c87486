use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::fsutil;
use crate::hash::ContentAddress;
use crate::reconciler::Reconciler;

/// options controlling the orphaned blob sweep
#[derive(Clone)]
pub struct SweepBlobsOptions {
    /// compute and report eligibility without deleting anything
    pub dry_run: bool,
    /// leave files younger than this alone
    pub minimum_age: Duration,
}

impl Default for SweepBlobsOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            minimum_age: Duration::from_secs(3600),
        }
    }
}

/// per-item sweep outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepBlobStatus {
    Deleted,
    Failed(String),
}

/// one status line of a blob sweep
#[derive(Clone, Debug)]
pub struct SweepBlobEvent {
    pub status: SweepBlobStatus,
    /// path relative to the toolkit root
    pub path: String,
}

/// blob sweep counters
#[derive(Debug, Default)]
pub struct SweepBlobsStats {
    pub deleted: usize,
    pub failed: usize,
}

/// delete stored files no metadata record points at
///
/// every regular file under `base_path` whose basename parses as a
/// well-formed content hash is a candidate; malformed basenames are
/// skipped, never deleted. a candidate is an orphan when it is old
/// enough and no metadata record carries its hash. an entry that
/// cannot be read or statted is reported as failed and the sweep
/// moves on. after a deletion,
/// directories left empty are pruned upward to (but excluding)
/// `base_path`. a dry run computes and reports the same eligibility
/// without touching the filesystem.
pub fn sweep_orphaned_blobs(
    rec: &Reconciler,
    base_path: &Path,
    opts: &SweepBlobsOptions,
    report: &mut dyn FnMut(&SweepBlobEvent),
) -> Result<SweepBlobsStats> {
    if !base_path.is_dir() {
        return Err(Error::NotADirectory(base_path.to_path_buf()));
    }

    let cutoff = SystemTime::now()
        .checked_sub(opts.minimum_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut stats = SweepBlobsStats::default();
    // directories are pruned after the walk so the walker never
    // descends into a directory deleted under it
    let mut prune = Vec::new();

    for entry in WalkDir::new(base_path) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let at = e.path().unwrap_or(base_path);
                stats.failed += 1;
                report(&SweepBlobEvent {
                    status: SweepBlobStatus::Failed(e.to_string()),
                    path: fsutil::path_relative_to(rec.root(), at),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // the basename is trusted as the content hash; anything that
        // does not parse as one is not a candidate
        let Ok(hash) = ContentAddress::from_hex(basename) else {
            continue;
        };

        let modified = entry
            .metadata()
            .map_err(|e| e.to_string())
            .and_then(|meta| meta.modified().map_err(|e| e.to_string()));
        let modified = match modified {
            Ok(modified) => modified,
            Err(message) => {
                stats.failed += 1;
                report(&SweepBlobEvent {
                    status: SweepBlobStatus::Failed(message),
                    path: fsutil::path_relative_to(rec.root(), path),
                });
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }

        if rec.meta().blob_by_hash(&hash)?.is_some() {
            continue;
        }

        let rel = fsutil::path_relative_to(rec.root(), path);

        if opts.dry_run {
            stats.deleted += 1;
            report(&SweepBlobEvent {
                status: SweepBlobStatus::Deleted,
                path: rel,
            });
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                if let Some(parent) = path.parent() {
                    prune.push(parent.to_path_buf());
                }
                stats.deleted += 1;
                report(&SweepBlobEvent {
                    status: SweepBlobStatus::Deleted,
                    path: rel,
                });
            }
            Err(e) => {
                stats.failed += 1;
                report(&SweepBlobEvent {
                    status: SweepBlobStatus::Failed(e.to_string()),
                    path: rel,
                });
            }
        }
    }

    for dir in prune {
        if dir.exists() {
            fsutil::prune_empty_dirs(&dir, base_path)?;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::meta::FileMetadataStore;
    use crate::records::BlobRecord;
    use crate::usage::UsageRegistry;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, Reconciler) {
        let dir = tempdir().unwrap();
        let meta = FileMetadataStore::open(&dir.path().join("metadata.db")).unwrap();
        let rec = Reconciler::new(
            dir.path().to_path_buf(),
            Config::default(),
            Box::new(meta),
            UsageRegistry::new(),
        );
        (dir, rec)
    }

    fn immediate() -> SweepBlobsOptions {
        SweepBlobsOptions {
            dry_run: false,
            minimum_age: Duration::ZERO,
        }
    }

    fn orphan_file(base: &Path, content: &[u8]) -> std::path::PathBuf {
        let hash = ContentAddress::of_bytes(content);
        let (d1, d2, name) = hash.to_path_components();
        let dir = base.join(d1).join(d2);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_deletes_orphan_and_prunes_dirs() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        let orphan = orphan_file(&base, b"unreferenced");

        let mut events = Vec::new();
        let stats = sweep_orphaned_blobs(&rec, &base, &immediate(), &mut |e| {
            events.push(e.clone())
        })
        .unwrap();

        assert_eq!(stats.deleted, 1);
        assert!(!orphan.exists());
        // shard directories pruned, base kept
        assert!(!orphan.parent().unwrap().exists());
        assert!(base.exists());
        assert_eq!(events[0].status, SweepBlobStatus::Deleted);
    }

    #[test]
    fn test_referenced_file_is_kept() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        let referenced = orphan_file(&base, b"still needed");

        rec.meta()
            .record_blob(&BlobRecord::new(
                ContentAddress::of_bytes(b"still needed"),
                "persistent",
            ))
            .unwrap();

        let stats = sweep_orphaned_blobs(&rec, &base, &immediate(), &mut |_| {}).unwrap();

        assert_eq!(stats.deleted, 0);
        assert!(referenced.exists());
    }

    #[test]
    fn test_dry_run_never_mutates() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        let orphan = orphan_file(&base, b"unreferenced");

        let opts = SweepBlobsOptions {
            dry_run: true,
            minimum_age: Duration::ZERO,
        };
        let mut events = Vec::new();
        let stats =
            sweep_orphaned_blobs(&rec, &base, &opts, &mut |e| events.push(e.clone())).unwrap();

        // eligibility computed and reported, nothing touched
        assert_eq!(stats.deleted, 1);
        assert_eq!(events.len(), 1);
        assert!(orphan.exists());
    }

    #[test]
    fn test_young_file_is_kept() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        let young = orphan_file(&base, b"just written");

        let opts = SweepBlobsOptions {
            dry_run: false,
            minimum_age: Duration::from_secs(3600),
        };
        let stats = sweep_orphaned_blobs(&rec, &base, &opts, &mut |_| {}).unwrap();

        assert_eq!(stats.deleted, 0);
        assert!(young.exists());
    }

    #[test]
    fn test_malformed_basename_is_skipped() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        fs::write(base.join("notes.txt"), "not a hash").unwrap();
        fs::write(base.join("deadbeef"), "too short").unwrap();

        let stats = sweep_orphaned_blobs(&rec, &base, &immediate(), &mut |_| {}).unwrap();

        assert_eq!(stats.deleted, 0);
        assert!(base.join("notes.txt").exists());
        assert!(base.join("deadbeef").exists());
    }

    #[test]
    fn test_stat_failure_is_reported_and_sweep_continues() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        let orphan = orphan_file(&base, b"one");
        // second candidate in the same shard directory
        let sibling = orphan
            .parent()
            .unwrap()
            .join("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef");
        fs::write(&sibling, b"x").unwrap();

        let mut events = Vec::new();
        let stats = sweep_orphaned_blobs(&rec, &base, &immediate(), &mut |e| {
            // pull the remaining candidate out from under the walker;
            // its already-listed entry then fails to stat
            let _ = fs::remove_file(&orphan);
            let _ = fs::remove_file(&sibling);
            events.push(e.clone());
        })
        .unwrap();

        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .any(|e| matches!(e.status, SweepBlobStatus::Failed(_))));
    }

    #[test]
    fn test_requires_directory() {
        let (dir, rec) = fixture();
        let result = sweep_orphaned_blobs(
            &rec,
            &dir.path().join("missing"),
            &immediate(),
            &mut |_| {},
        );
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_reports_path_relative_to_root() {
        let (dir, rec) = fixture();
        let base = dir.path().join("resources");
        fs::create_dir(&base).unwrap();
        orphan_file(&base, b"unreferenced");

        let mut events = Vec::new();
        sweep_orphaned_blobs(&rec, &base, &immediate(), &mut |e| {
            events.push(e.clone())
        })
        .unwrap();

        assert!(events[0].path.starts_with("resources/"));
    }
}
