//! Directory-backed key-value store.
//!
//! Each key is one `<key>.json` file inside the data directory. Writes go
//! to a temporary file in the same directory and are renamed into place,
//! so a reader sees either the old blob or the new one.

use super::{KeyValueStore, StorageError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

/// Key-value store persisted as files under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if self.root.exists() && !self.root.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        fs::create_dir_all(&self.root)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        assert_eq!(store.read("plant-disease-history").unwrap(), None);
    }

    #[test]
    fn test_write_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        let store = FileStore::new(&root);

        store.write("plant-disease-history", "[]").unwrap();
        assert!(root.join("plant-disease-history.json").exists());
        assert_eq!(
            store.read("plant-disease-history").unwrap().as_deref(),
            Some("[]")
        );

        store.write("plant-disease-history", "[1]").unwrap();
        assert_eq!(
            store.read("plant-disease-history").unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write("k", "v").unwrap();
        store.delete("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
        store.delete("k").unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let store = FileStore::new("/tmp/unused");
        for key in ["", "../escape", "a/b", ".hidden", "with space"] {
            assert!(
                matches!(store.read(key), Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_root_that_is_a_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        fs::write(&root, "not a directory").unwrap();

        let store = FileStore::new(&root);
        assert!(matches!(
            store.write("k", "v"),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(fs::read_to_string(&root).unwrap(), "not a directory");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write("k", "v").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("k.json")]);
    }
}
