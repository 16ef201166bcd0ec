//! Service layer: tender persistence.

pub mod memory_store;
pub mod pg_store;
pub mod store;

pub use memory_store::MemoryTenderStore;
pub use pg_store::PgTenderStore;
pub use store::{StoreError, StoredTender, TenderStore};
