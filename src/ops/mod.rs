//! the reconciliation operations
//!
//! each operation runs to completion, reporting one status line per
//! item through a callback; per-item failures never abort the loop.

mod export;
mod import;
mod match_files;
mod sweep_assets;
mod sweep_blobs;

pub use export::{export, ExportEvent, ExportOptions, ExportStats, ExportStatus};
pub use import::import_file;
pub use match_files::{match_files, MatchEvent, MatchStats, MatchStatus};
pub use sweep_assets::{sweep_unused_assets, AssetEvent, AssetStatus, SweepAssetsStats};
pub use sweep_blobs::{
    sweep_orphaned_blobs, SweepBlobEvent, SweepBlobStatus, SweepBlobsOptions, SweepBlobsStats,
};
