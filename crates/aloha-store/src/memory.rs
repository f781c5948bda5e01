//! In-process storage implementation.
//!
//! Records live in memory for the lifetime of the process. Values are kept
//! CBOR-encoded so both backends share one encoding path.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::codec;
use crate::error::Result;
use crate::{Record, Store};

type Collection = BTreeMap<String, Vec<u8>>;

/// Memory-backed storage implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Collection>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record in every collection.
    pub fn clear(&self) {
        self.collections.write().clear();
    }
}

impl Store for MemoryStore {
    fn get<R: Record>(&self, key: &str) -> Result<Option<R>> {
        self.collections
            .read()
            .get(R::COLLECTION)
            .and_then(|collection| collection.get(key))
            .map(|data| codec::decode(data))
            .transpose()
    }

    fn put<R: Record>(&self, record: &R) -> Result<()> {
        let value = codec::encode(record)?;
        self.collections
            .write()
            .entry(R::COLLECTION)
            .or_default()
            .insert(record.key(), value);
        Ok(())
    }

    fn delete<R: Record>(&self, key: &str) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(R::COLLECTION)
            .and_then(|collection| collection.remove(key))
            .is_some())
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.collections
            .read()
            .get(R::COLLECTION)
            .map_or_else(
                || Ok(Vec::new()),
                |collection| collection.values().map(|data| codec::decode(data)).collect(),
            )
    }

    fn count<R: Record>(&self) -> Result<usize> {
        Ok(self
            .collections
            .read()
            .get(R::COLLECTION)
            .map_or(0, BTreeMap::len))
    }
}
