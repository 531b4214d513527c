//! Memoised descriptor resolution
//!
//! Descriptors are built once per entity type and shared afterwards. The
//! registry also remembers which types were registered with a store, so the
//! repository can refuse to touch tables that were never created.

use crate::errors::{QueryError, RepoError, RepoErrorKind, Result};
use crate::model::{Entity, EntityDescriptor};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
    registered: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (building at most once) the descriptor of `T`
    ///
    /// # Errors
    ///
    /// Whatever `T::descriptor()` reports, e.g. `MissingIdentifier`.
    /// Failures are not cached.
    pub fn resolve<T: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        let key = TypeId::of::<T>();
        if let Some(desc) = self.read_map(&self.descriptors)?.get(&key) {
            return Ok(desc.clone());
        }

        let built = Arc::new(T::descriptor()?);
        let mut map = self.descriptors.write().map_err(|_| poisoned())?;
        let desc = map.entry(key).or_insert(built);
        Ok(desc.clone())
    }

    /// Name of `T`'s identifier field
    ///
    /// # Errors
    ///
    /// `MissingIdentifier` when `T` declares none.
    pub fn identifier_field<T: Entity>(&self) -> Result<String> {
        Ok(self.resolve::<T>()?.identifier().to_string())
    }

    /// Whether `field` is excluded from persistence for `T`
    ///
    /// # Errors
    ///
    /// `UnknownField` when `T` declares no such field.
    pub fn is_transient<T: Entity>(&self, field: &str) -> Result<bool> {
        let desc = self.resolve::<T>()?;
        desc.field(field)
            .map(|f| f.transient)
            .ok_or_else(|| {
                QueryError::UnknownField {
                    entity: desc.table().to_string(),
                    field: field.to_string(),
                }
                .into()
            })
    }

    /// Record that `T`'s table exists in the store
    pub fn mark_registered<T: Entity>(&self, desc: Arc<EntityDescriptor>) -> Result<()> {
        self.registered
            .write()
            .map_err(|_| poisoned())?
            .insert(TypeId::of::<T>(), desc);
        Ok(())
    }

    /// Descriptor of a type whose table was registered
    ///
    /// # Errors
    ///
    /// `NotRegistered` when `register_table` was never called for `T`.
    pub fn registered<T: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.read_map(&self.registered)?
            .get(&TypeId::of::<T>())
            .cloned()
            .ok_or_else(|| {
                RepoError::new(RepoErrorKind::NotRegistered)
                    .with_message(format!("{} was not registered", type_name::<T>()))
            })
    }

    fn read_map<'a>(
        &self,
        map: &'a RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
    ) -> Result<std::sync::RwLockReadGuard<'a, HashMap<TypeId, Arc<EntityDescriptor>>>> {
        map.read().map_err(|_| poisoned())
    }
}

fn poisoned() -> RepoError {
    RepoError::new(RepoErrorKind::Concurrency).with_message("descriptor registry lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Serialize, Deserialize)]
    struct Counted {
        id: i64,
    }

    impl Entity for Counted {
        fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            EntityDescriptor::builder("counted")
                .field("id", FieldKind::Integer)
                .transient("cache", FieldKind::Text)
                .identifier("id")
                .build()
        }
    }

    #[derive(Serialize, Deserialize)]
    struct Keyless {
        name: String,
    }

    impl Entity for Keyless {
        fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
            EntityDescriptor::builder("keyless")
                .field("name", FieldKind::Text)
                .build()
        }
    }

    #[test]
    fn test_resolution_is_memoised() {
        let registry = DescriptorRegistry::new();
        let before = BUILDS.load(Ordering::SeqCst);
        let a = registry.resolve::<Counted>().unwrap();
        let b = registry.resolve::<Counted>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(BUILDS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_identifier_field_and_transient_lookup() {
        let registry = DescriptorRegistry::new();
        assert_eq!(registry.identifier_field::<Counted>().unwrap(), "id");
        assert!(registry.is_transient::<Counted>("cache").unwrap());
        assert!(!registry.is_transient::<Counted>("id").unwrap());
        assert_eq!(
            registry.is_transient::<Counted>("ghost").unwrap_err().kind(),
            RepoErrorKind::UnknownField
        );
    }

    #[test]
    fn test_missing_identifier_surfaces_typed_error() {
        let registry = DescriptorRegistry::new();
        let err = registry.identifier_field::<Keyless>().unwrap_err();
        assert_eq!(err.kind(), RepoErrorKind::MissingIdentifier);
        assert_eq!(err.entity(), Some("keyless"));
    }

    #[test]
    fn test_unregistered_type_is_rejected() {
        let registry = DescriptorRegistry::new();
        let err = registry.registered::<Counted>().unwrap_err();
        assert_eq!(err.kind(), RepoErrorKind::NotRegistered);

        let desc = registry.resolve::<Counted>().unwrap();
        registry.mark_registered::<Counted>(desc).unwrap();
        assert!(registry.registered::<Counted>().is_ok());
    }
}
