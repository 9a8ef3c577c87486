use std::path::PathBuf;

use crate::ContentAddress;

/// error type for restools operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no configuration found at {0}")]
    NoConfig(PathBuf),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("storage not defined: {0}")]
    StorageNotFound(String),

    #[error("target not defined: {0}")]
    TargetNotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("blob not found: {0}")]
    BlobNotFound(ContentAddress),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("import failed: {0}")]
    Import(String),

    #[error("adapter construction failed: {0}")]
    Construction(String),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cbor serialization error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("cbor deserialization error: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
