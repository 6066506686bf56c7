//! Storage capability.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

/// Marker for repository types handed out by a [`Storage`].
pub trait Repository: Any + Send + Sync {}

/// A unit of work over some persistence backend.
///
/// Backend modules export one implementation; the host registers the first
/// one found as a service.
pub trait Storage: Send + Sync {
    /// The repository of type `repository`, if the backend provides one.
    fn repository_of(&self, repository: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Commits pending changes.
    fn save(&self) -> AppResult<()>;
}

impl dyn Storage {
    /// The repository `R`.
    pub fn repository<R: Repository>(&self) -> AppResult<Arc<R>> {
        self.repository_of(TypeId::of::<R>())
            .and_then(|repository| repository.downcast::<R>().ok())
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Storage provides no repository '{}'",
                    type_name::<R>()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extcore_core::ErrorKind;

    struct Users;
    impl Repository for Users {}

    struct Orders;
    impl Repository for Orders {}

    struct Memory;

    impl Storage for Memory {
        fn repository_of(&self, repository: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
            (repository == TypeId::of::<Users>()).then(|| Arc::new(Users) as Arc<dyn Any + Send + Sync>)
        }

        fn save(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_typed_repository_lookup() {
        let storage: &dyn Storage = &Memory;
        assert!(storage.repository::<Users>().is_ok());
        assert_eq!(
            storage.repository::<Orders>().err().map(|e| e.kind),
            Some(ErrorKind::NotFound)
        );
    }
}
