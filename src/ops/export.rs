use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::fsutil;
use crate::hash::ContentAddress;
use crate::reconciler::Reconciler;

/// options controlling an export run
#[derive(Clone, Default)]
pub struct ExportOptions {
    /// empty the target directory before exporting (after confirmation)
    pub empty_target_first: bool,
}

/// per-item export outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportStatus {
    Exported,
    Missing,
    Failed(String),
}

/// one status line of an export run
#[derive(Clone, Debug)]
pub struct ExportEvent {
    pub status: ExportStatus,
    pub hash: ContentAddress,
    pub filename: String,
}

/// export run counters
#[derive(Debug, Default)]
pub struct ExportStats {
    pub exported: usize,
    pub missing: usize,
    pub failed: usize,
}

/// export every blob of a collection into a flat directory
///
/// files are written as `<target>/<40-char hex hash>`, extension
/// dropped. blobs whose content is absent from the store are reported
/// missing and skipped; nothing aborts the loop.
///
/// with `empty_target_first` the target is recursively emptied first,
/// but only after `confirm` approves it; a declined confirmation
/// skips the emptying and the export proceeds.
pub fn export(
    rec: &Reconciler,
    collection_name: &str,
    target_path: &Path,
    opts: &ExportOptions,
    confirm: &mut dyn FnMut(usize, &Path) -> bool,
    report: &mut dyn FnMut(&ExportEvent),
) -> Result<ExportStats> {
    if !target_path.is_dir() {
        return Err(Error::NotADirectory(target_path.to_path_buf()));
    }
    let target_path = fs::canonicalize(target_path).with_path(target_path)?;

    let collection = rec.resolve_collection(collection_name)?;

    if opts.empty_target_first {
        let count = fsutil::count_files(&target_path)?;
        if count > 0 && confirm(count, &target_path) {
            fsutil::empty_directory(&target_path)?;
        }
    }

    let mut stats = ExportStats::default();

    for record in collection.enumerate_blobs(rec.meta())? {
        let status = match collection.store().open(&record.content_hash) {
            Ok(mut stream) => {
                let dest = target_path.join(record.content_hash.to_hex());
                match write_stream(&mut stream, &dest) {
                    Ok(()) => ExportStatus::Exported,
                    Err(e) => {
                        // drop a partial file rather than leaving a
                        // wrong-content blob behind
                        let _ = fs::remove_file(&dest);
                        ExportStatus::Failed(e.to_string())
                    }
                }
            }
            Err(Error::BlobNotFound(_)) => ExportStatus::Missing,
            Err(e) => ExportStatus::Failed(e.to_string()),
        };

        match status {
            ExportStatus::Exported => stats.exported += 1,
            ExportStatus::Missing => stats.missing += 1,
            ExportStatus::Failed(_) => stats.failed += 1,
        }

        report(&ExportEvent {
            status,
            hash: record.content_hash,
            filename: record.filename.clone(),
        });
    }

    Ok(stats)
}

fn write_stream(stream: &mut dyn io::Read, dest: &Path) -> Result<()> {
    let mut file = File::create(dest).with_path(dest)?;
    io::copy(stream, &mut file).with_path(dest)?;
    Ok(())
}
