use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::{Error, IoResultExt};

/// SHA-1 digest used as the sole addressing key for blob content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentAddress([u8; 20]);

impl ContentAddress {
    /// create from raw digest bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// parse from a 40-character hex string
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidHashHex(s.to_string()))?;
        if bytes.len() != 20 {
            return Err(Error::InvalidHashHex(s.to_string()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// get raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// split into storage path components
    /// returns (hex[0..2], hex[2..4], full 40-char hex)
    ///
    /// the last component is the FULL digest so that a stored file's
    /// basename can always be read back as its content hash.
    pub fn to_path_components(&self) -> (String, String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..4].to_string(), hex)
    }

    /// hash the full content of a byte sequence
    pub fn of_bytes(content: &[u8]) -> Self {
        Self(Sha1::digest(content).into())
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentAddress({})", &self.to_hex()[..12])
    }
}

impl Serialize for ContentAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// streaming hasher for computing a content address while copying
pub struct ContentHasher {
    hasher: Sha1,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self { hasher: Sha1::new() }
    }

    /// feed content bytes
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// finalize and return the address
    pub fn finalize(self) -> ContentAddress {
        ContentAddress(self.hasher.finalize().into())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// hash an entire reader, returning the address and the byte count
pub fn hash_reader<R: Read>(reader: &mut R) -> crate::Result<(ContentAddress, u64)> {
    let mut hasher = ContentHasher::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).with_path("<reader>")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hasher.finalize(), total))
}
