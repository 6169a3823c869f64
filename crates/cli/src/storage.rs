//! JSON file backend for carts.
//!
//! The file holds a JSON object mapping storage keys to string values, the
//! same shape a browser's `localStorage` has, so a snapshot can be copied
//! between hosts unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use alcary_core::{CartStorage, StorageError};

/// Key/value storage persisted to one JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Use `path` as the backing file. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(unavailable(&self.path, &e)),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| unavailable(&self.path, &e))
    }
}

fn unavailable(path: &Path, error: &dyn std::fmt::Display) -> StorageError {
    StorageError::Unavailable(format!("{}: {error}", path.display()))
}

impl CartStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.remove(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // An unreadable file is replaced rather than blocking every write
        let mut entries = self.entries().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Overwriting unreadable storage file");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        let json = serde_json::to_string_pretty(&entries).map_err(|e| unavailable(&self.path, &e))?;
        fs::write(&self.path, json).map_err(|e| unavailable(&self.path, &e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use alcary_core::{CART_STORAGE_KEY, CartProduct, CartStore, ProductId, Rupiah};

    use super::*;

    fn product() -> CartProduct {
        CartProduct {
            id: ProductId::from(3),
            name: "Roti Sobek".to_string(),
            category: "roti".to_string(),
            price: Rupiah::new(18_000),
            image: None,
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("cart.json"));
        assert_eq!(storage.read(CART_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_cart_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");

        let mut store = CartStore::load(FileStorage::new(&path));
        store.add_item(product(), NonZeroU32::new(3).unwrap());

        let reloaded = CartStore::load(FileStorage::new(&path));
        assert_eq!(reloaded.subtotal(), Rupiah::new(54_000));
        assert_eq!(reloaded.cart().item_quantity(&ProductId::from(3)), 3);
    }

    #[test]
    fn test_other_keys_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let mut storage = FileStorage::new(&path);
        storage.write(CART_STORAGE_KEY, "[]").unwrap();

        assert_eq!(storage.read("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(storage.read(CART_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_file_loads_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, "not json").unwrap();

        let store = CartStore::load(FileStorage::new(&path));
        assert!(store.cart().is_empty());
    }
}
