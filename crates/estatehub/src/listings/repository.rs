use async_trait::async_trait;

use super::domain::{Property, PropertyFilter, PropertyId};
use crate::storage::RepositoryError;

/// Document store for listings.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    async fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// Returns the removed document, or `None` when nothing matched.
    async fn delete(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// Newest first, filtered, capped at `limit`.
    async fn list(
        &self,
        filter: &PropertyFilter,
        limit: usize,
    ) -> Result<Vec<Property>, RepositoryError>;
    async fn count(&self) -> Result<usize, RepositoryError>;
}
