//! Client-side key/value persistence
//!
//! String values under string keys, the shape a browser's local storage
//! offers. Version history keeps its per-tenant lists here.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::error::StoreResult;

/// Synchronous string store
pub trait KeyValueStore: Send + Sync {
    /// Value under `key`, if any
    ///
    /// # Errors
    /// Fails if the underlying medium cannot be read.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value under `key`
    ///
    /// # Errors
    /// Fails if the underlying medium cannot be written.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`; absent keys are not an error
    ///
    /// # Errors
    /// Fails if the underlying medium cannot be written.
    fn remove_item(&self, key: &str) -> StoreResult<()>;
}

/// Store held in process memory
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: DashMap<String, String>,
}

impl MemoryKeyValueStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Store keeping one file per key inside a directory
///
/// File names are the keys with every byte outside `[A-Za-z0-9._-]`
/// written as `%XX`. Writes go to a temporary sibling first and are then
/// renamed into place.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    /// Fails if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let target = self.path_for(key);
        let staging = target.with_extension("tmp");
        {
            let mut file = fs::File::create(&staging)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &target)?;
        tracing::trace!(key, path = %target.display(), "stored item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
