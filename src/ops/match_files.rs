use std::fs::File;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ContentAddress;
use crate::reconciler::Reconciler;

/// per-item match outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    /// metadata already has content, nothing to do
    Exists,
    /// content was re-imported from the source directory
    Imported,
    /// no stored content and no matching file on disk
    Missing,
    Failed(String),
}

/// one status line of a match run
#[derive(Clone, Debug)]
pub struct MatchEvent {
    pub status: MatchStatus,
    pub hash: ContentAddress,
    pub filename: String,
}

/// match run counters
#[derive(Debug, Default)]
pub struct MatchStats {
    pub exists: usize,
    pub imported: usize,
    pub missing: usize,
    pub failed: usize,
}

/// re-import orphaned files into a collection's storage
///
/// walks the collection's blob metadata records; for every record
/// whose content is absent from the store, a file named by the
/// content hash is looked up under `source_path` and imported. the
/// hash the import computes internally is authoritative. one item's
/// failure never aborts the run.
pub fn match_files(
    rec: &Reconciler,
    collection_name: &str,
    source_path: &Path,
    report: &mut dyn FnMut(&MatchEvent),
) -> Result<MatchStats> {
    if !source_path.is_dir() {
        return Err(Error::NotADirectory(source_path.to_path_buf()));
    }

    let collection = rec.resolve_collection(collection_name)?;
    let mut stats = MatchStats::default();

    for record in collection.enumerate_blobs(rec.meta())? {
        let status = match collection.store().open(&record.content_hash) {
            Ok(_stream) => MatchStatus::Exists,
            Err(Error::BlobNotFound(_)) => {
                let candidate = source_path.join(record.content_hash.to_hex());
                if candidate.is_file() {
                    match import_candidate(rec, &collection, &candidate) {
                        Ok(()) => MatchStatus::Imported,
                        Err(e) => MatchStatus::Failed(e.to_string()),
                    }
                } else {
                    MatchStatus::Missing
                }
            }
            Err(e) => MatchStatus::Failed(e.to_string()),
        };

        match status {
            MatchStatus::Exists => stats.exists += 1,
            MatchStatus::Imported => stats.imported += 1,
            MatchStatus::Missing => stats.missing += 1,
            MatchStatus::Failed(_) => stats.failed += 1,
        }

        report(&MatchEvent {
            status,
            hash: record.content_hash,
            filename: record.filename.clone(),
        });
    }

    Ok(stats)
}

fn import_candidate(
    rec: &Reconciler,
    collection: &crate::collection::Collection,
    candidate: &Path,
) -> Result<()> {
    let mut file = File::open(candidate).with_path(candidate)?;
    collection.import_resource(rec.meta(), &mut file)?;
    Ok(())
}
