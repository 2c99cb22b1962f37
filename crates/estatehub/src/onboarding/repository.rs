use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{Builder, BuilderId, BuilderStatus};
use super::otp::{OtpId, OtpRecord};
use crate::storage::RepositoryError;

/// Builder account storage. Emails are stored normalized and are unique.
#[async_trait]
pub trait BuilderRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the email is already registered.
    async fn insert(&self, builder: Builder) -> Result<Builder, RepositoryError>;
    async fn update(&self, builder: Builder) -> Result<(), RepositoryError>;
    async fn fetch(&self, id: &BuilderId) -> Result<Option<Builder>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError>;
    /// Newest first; `None` lists every builder.
    async fn list_by_status(
        &self,
        status: Option<BuilderStatus>,
    ) -> Result<Vec<Builder>, RepositoryError>;
    async fn count_by_status(&self, status: BuilderStatus) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn insert(&self, record: OtpRecord) -> Result<(), RepositoryError>;
    /// Most recently created record for `email` with the given verification flag.
    async fn latest(
        &self,
        email: &str,
        verified: bool,
    ) -> Result<Option<OtpRecord>, RepositoryError>;
    async fn update(&self, record: OtpRecord) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &OtpId) -> Result<(), RepositoryError>;
    async fn delete_for_email(&self, email: &str) -> Result<usize, RepositoryError>;
    /// Removes every record that expired before `now`, returning how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;
}
