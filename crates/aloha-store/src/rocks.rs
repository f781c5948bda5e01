//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Each collection is a column family; keys are the UTF-8 record keys.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::schema::all_collections;
use crate::{Record, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_collections()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!("RocksDB store opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
    }
}

impl Store for RocksStore {
    fn get<R: Record>(&self, key: &str) -> Result<Option<R>> {
        let cf = self.cf(R::COLLECTION)?;

        self.db
            .get_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| codec::decode(&data))
            .transpose()
    }

    fn put<R: Record>(&self, record: &R) -> Result<()> {
        let cf = self.cf(R::COLLECTION)?;
        let value = codec::encode(record)?;

        self.db
            .put_cf(&cf, record.key().as_bytes(), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete<R: Record>(&self, key: &str) -> Result<bool> {
        let cf = self.cf(R::COLLECTION)?;

        let existed = self
            .db
            .get_pinned_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        if existed {
            self.db
                .delete_cf(&cf, key.as_bytes())
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        Ok(existed)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let cf = self.cf(R::COLLECTION)?;

        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            records.push(codec::decode(&value)?);
        }

        Ok(records)
    }
}
