//! Avatar records.

use std::sync::Arc;

use aloha_core::AvatarId;
use aloha_store::{Avatar, AvatarCustomization, Store};

use crate::error::{PlatformError, Result};
use crate::non_blank;

const NAME_AND_TYPE_REQUIRED: &str = "Name and type are required";
const AVATAR_NOT_FOUND: &str = "Avatar not found";

/// Avatar create / list / get.
pub struct AvatarService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> AvatarService<S> {
    /// Create a new avatar service.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an avatar. Missing customization fields take their defaults.
    ///
    /// # Errors
    ///
    /// `MissingField` if `name` or `kind` is blank.
    pub fn create(
        &self,
        name: Option<&str>,
        kind: Option<&str>,
        customization: Option<AvatarCustomization>,
    ) -> Result<Avatar> {
        let (Some(name), Some(kind)) = (non_blank(name), non_blank(kind)) else {
            return Err(PlatformError::MissingField(NAME_AND_TYPE_REQUIRED));
        };

        let avatar = Avatar::new(name, kind, customization.unwrap_or_default());
        self.store.put(&avatar)?;

        tracing::info!(avatar_id = %avatar.id, name = %avatar.name, kind = %avatar.kind, "Created avatar");
        Ok(avatar)
    }

    /// All avatars.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list(&self) -> Result<Vec<Avatar>> {
        Ok(self.store.list()?)
    }

    /// One avatar by its hex id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is malformed or unknown.
    pub fn get(&self, id: &str) -> Result<Avatar> {
        let id = AvatarId::from_hex(id).map_err(|_| PlatformError::NotFound(AVATAR_NOT_FOUND))?;
        self.store
            .get(&id.to_hex())?
            .ok_or(PlatformError::NotFound(AVATAR_NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aloha_store::MemoryStore;

    fn service() -> AvatarService<MemoryStore> {
        AvatarService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn create_and_get() {
        let service = service();
        let avatar = service.create(Some("Nova"), Some("cosmic"), None).unwrap();

        let fetched = service.get(&avatar.id.to_hex()).unwrap();
        assert_eq!(fetched.name, "Nova");
        assert_eq!(fetched.customization, AvatarCustomization::default());
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn create_requires_name_and_type() {
        let service = service();
        for (name, kind) in [(None, Some("male")), (Some("Nova"), None), (Some(" "), Some("x"))] {
            assert!(matches!(
                service.create(name, kind, None),
                Err(PlatformError::MissingField(NAME_AND_TYPE_REQUIRED))
            ));
        }
    }

    #[test]
    fn unknown_or_malformed_id_is_not_found() {
        let service = service();
        assert!(matches!(service.get("nope"), Err(PlatformError::NotFound(_))));
        assert!(matches!(
            service.get(&"ab".repeat(32)),
            Err(PlatformError::NotFound(_))
        ));
    }
}
