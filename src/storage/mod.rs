//! Key-value persistence behind the history store.
//!
//! The history store never touches the filesystem directly; it goes
//! through [`KeyValueStore`], so tests can swap in an in-memory medium.

pub mod file;
#[cfg(test)]
pub mod memory;

pub use file::FileStore;
#[cfg(test)]
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by a persistence medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A process-local persistent key-value medium.
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}
