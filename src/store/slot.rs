//! Single key-value slot persistence
//!
//! Each key maps to one file under the store root holding the entire
//! serialized value. A missing file reads as no value.

use std::path::PathBuf;

use super::StoreError;

/// File-backed key-value slot store
#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    /// Create a slot store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read the full value stored under `key`, if any
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.slot_path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the full value stored under `key`
    ///
    /// The value is rewritten in place. Durability across an interrupted
    /// write is whatever the underlying filesystem provides.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.slot_path(key), value).await?;
        Ok(())
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}
