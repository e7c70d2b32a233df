//! Blob storage for uploaded spreadsheet files
//!
//! The pipeline treats storage as "store bytes under a key, get a
//! retrievable reference back" and never inspects storage internals.
//! Keys are content-addressed (SHA-256 of the bytes) with the original
//! extension preserved as a format hint.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};

/// Pluggable storage destination for uploaded file bytes
pub trait BlobStore: Send + Sync {
    /// Store bytes, returning the storage key
    fn put(&self, filename: &str, bytes: &[u8]) -> Result<String>;

    /// Fetch the bytes stored under a key
    fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Derive a content-addressed storage key from file bytes.
///
/// Identical uploads map to the same key, which makes `put` idempotent.
pub fn storage_key(filename: &str, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hex::encode(hasher.finalize());

    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", digest, ext.to_lowercase()),
        None => digest,
    }
}

/// Stores blobs as flat files in a local directory
#[derive(Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are hex digests plus an extension; anything else is rejected
    /// before it can reach the filesystem
    fn validate_key(key: &str) -> Result<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
            && !key.contains("..");
        if valid {
            Ok(())
        } else {
            Err(Error::Storage(format!("Invalid storage key: {}", key)))
        }
    }
}

impl BlobStore for LocalStore {
    fn put(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let key = storage_key(filename, bytes);
        std::fs::create_dir_all(&self.root)?;

        let path = self.root.join(&key);
        std::fs::write(&path, bytes)?;

        debug!("Stored {} ({} bytes) as {}", filename, bytes.len(), key);
        Ok(key)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        Self::validate_key(key)?;

        let path = self.root.join(key);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("Blob {} not found", key))
            } else {
                Error::Io(e)
            }
        })
    }
}
