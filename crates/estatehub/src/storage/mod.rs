//! Persistence backends for the builder/lead/OTP store and the property document store.
//!
//! The repository traits live next to the domain they serve (`onboarding::repository`,
//! `leads::repository`, `listings::repository`); this module provides the concrete backends.

pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

use async_trait::async_trait;

pub use memory::MemoryStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteStore;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored record could not be decoded: {0}")]
    Corrupt(String),
}

/// Liveness of a backend, checked by the readiness probe and released on shutdown.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;

    async fn close(&self) {}
}
