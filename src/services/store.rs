//! Tender persistence contract

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Tender;

/// Tender snapshot together with the revision it was read at
#[derive(Debug, Clone)]
pub struct StoredTender {
    pub tender: Tender,
    pub rev: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tender {0} not found")]
    NotFound(String),

    /// Someone else wrote the tender after it was read
    #[error("tender {id} changed since revision {expected}")]
    Conflict { id: String, expected: i64 },

    #[error("stored tender is not readable: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Storage for whole tender documents.
///
/// Every write is conditional on the revision the caller read, so two
/// concurrent patches of the same tender cannot both succeed.
///
/// # Implementations
///
/// - [`super::PgTenderStore`] keeps each tender as JSONB with a revision column
/// - [`super::MemoryTenderStore`] for development and tests
#[async_trait]
pub trait TenderStore: Send + Sync {
    /// Store a new tender at revision 1
    async fn insert(&self, tender: &Tender) -> Result<StoredTender, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<StoredTender>, StoreError>;

    /// Replace the tender if it is still at `rev`; returns the new revision
    async fn update(&self, tender: &Tender, rev: i64) -> Result<StoredTender, StoreError>;

    /// Page of tenders, most recently modified first, and the total count
    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<Tender>, u64), StoreError>;

    async fn health_check(&self) -> bool;
}
