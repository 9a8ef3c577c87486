use std::io::Read;

use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::records::BlobRecord;

/// import a single byte stream into a collection
///
/// a non-empty filename is written onto the stored record after the
/// import. errors propagate to the caller; the cli turns them into a
/// non-zero exit.
pub fn import_file(
    rec: &Reconciler,
    collection_name: &str,
    source: &mut dyn Read,
    filename: &str,
) -> Result<BlobRecord> {
    let collection = rec.resolve_collection(collection_name)?;
    let mut record = collection.import_resource(rec.meta(), source)?;

    if !filename.is_empty() {
        rec.meta()
            .update_blob_filename(&record.content_hash, filename)?;
        record.filename = filename.to_string();
    }

    Ok(record)
}
