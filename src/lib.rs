//! restools - maintenance toolkit for content-addressed blob storage
//!
//! reconciles a filesystem blob store against its metadata database:
//! bulk export, re-matching of orphaned files, single-file import and
//! garbage collection of orphaned blobs and unused assets.
//!
//! # Core concepts
//!
//! - **ContentAddress**: SHA-1 hex digest, the sole addressing key for blob content
//! - **Collection**: named pairing of a blob store and a publish target
//! - **BlobRecord / AssetRecord**: metadata tracked independently of the stored bytes
//! - **UsageStrategy**: predicate deciding whether some subsystem still references an asset
//!
//! # Example usage
//!
//! ```no_run
//! use restools::{ops, Reconciler};
//! use std::path::Path;
//!
//! let rec = Reconciler::open(Path::new("/srv/assets")).unwrap();
//!
//! // export all blobs of the "persistent" collection
//! let mut confirm = |_count: usize, _path: &Path| true;
//! let stats = ops::export(
//!     &rec,
//!     "persistent",
//!     Path::new("/tmp/out"),
//!     &ops::ExportOptions::default(),
//!     &mut confirm,
//!     &mut |event| println!("{:?}", event),
//! )
//! .unwrap();
//! println!("{} exported, {} missing", stats.exported, stats.missing);
//! ```

mod collection;
mod config;
mod error;
mod fsutil;
mod hash;
mod meta;
mod reconciler;
mod records;
mod usage;

pub mod ops;
pub mod store;
pub mod target;

pub use collection::Collection;
pub use config::{CollectionDef, Config, StorageDef, TargetDef, UsageConfig};
pub use error::{Error, IoResultExt, Result};
pub use hash::{hash_reader, ContentAddress, ContentHasher};
pub use meta::{FileMetadataStore, MetadataStore};
pub use reconciler::Reconciler;
pub use records::{AssetRecord, BlobRecord};
pub use usage::{ReferenceListStrategy, UsageRegistry, UsageStrategy};
