use async_trait::async_trait;

use super::domain::{Lead, LeadId, LeadStatus};
use crate::storage::RepositoryError;

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError>;
    async fn update(&self, lead: Lead) -> Result<(), RepositoryError>;
    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    /// Newest first, capped at `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError>;
    async fn count_by_status(&self, status: LeadStatus) -> Result<usize, RepositoryError>;
}
