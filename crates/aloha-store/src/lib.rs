//! Keyed record storage for the Aloha Nova gateway.
//!
//! Every persisted type is a [`Record`]: it names the collection it lives in
//! and derives its own key. The [`Store`] trait offers get / put / delete /
//! list over those collections, so services never care what backs them.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process memory, reset on restart
//! - [`RocksStore`]: `RocksDB`, one column family per collection
//!
//! Writes are last-writer-wins. No record carries invariants beyond the
//! uniqueness of its key.
//!
//! # Example
//!
//! ```
//! use aloha_store::{MemoryStore, Store, UserProfile};
//! use aloha_core::Email;
//!
//! let store = MemoryStore::new();
//! let email = Email::parse("user@example.com").unwrap();
//! store.put(&UserProfile::new(email.clone())).unwrap();
//!
//! let user: Option<UserProfile> = store.get(&email.normalized()).unwrap();
//! assert!(user.is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod error;
pub mod memory;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use types::{
    Avatar, AvatarCustomization, ProviderKey, ProviderKeySet, Transaction, TransactionKind,
    UserProfile,
};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A value that can be persisted in a [`Store`].
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Collection (column family) this record lives in.
    const COLLECTION: &'static str;

    /// Unique key of this record within its collection.
    fn key(&self) -> String;
}

/// The storage trait defining all keyed operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (`RocksDB`, in-memory).
pub trait Store: Send + Sync {
    /// Get a record by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored bytes cannot be decoded.
    fn get<R: Record>(&self, key: &str) -> Result<Option<R>>;

    /// Insert or overwrite a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record cannot be encoded.
    fn put<R: Record>(&self, record: &R) -> Result<()>;

    /// Delete a record by key.
    ///
    /// Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn delete<R: Record>(&self, key: &str) -> Result<bool>;

    /// List every record in the collection, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or any record cannot be decoded.
    fn list<R: Record>(&self) -> Result<Vec<R>>;

    /// Count the records in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn count<R: Record>(&self) -> Result<usize> {
        Ok(self.list::<R>()?.len())
    }
}
