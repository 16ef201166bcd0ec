//! In-process tender store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::store::{StoreError, StoredTender, TenderStore};
use crate::domain::Tender;

/// Tender store held in memory; used when no database is configured
#[derive(Default)]
pub struct MemoryTenderStore {
    tenders: RwLock<HashMap<String, StoredTender>>,
}

impl MemoryTenderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenderStore for MemoryTenderStore {
    async fn insert(&self, tender: &Tender) -> Result<StoredTender, StoreError> {
        let stored = StoredTender {
            tender: tender.clone(),
            rev: 1,
        };
        let mut tenders = self.tenders.write();
        if tenders.contains_key(&tender.id) {
            return Err(StoreError::Conflict {
                id: tender.id.clone(),
                expected: 0,
            });
        }
        tenders.insert(tender.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredTender>, StoreError> {
        Ok(self.tenders.read().get(id).cloned())
    }

    async fn update(&self, tender: &Tender, rev: i64) -> Result<StoredTender, StoreError> {
        let mut tenders = self.tenders.write();
        let current = tenders
            .get_mut(&tender.id)
            .ok_or_else(|| StoreError::NotFound(tender.id.clone()))?;
        if current.rev != rev {
            return Err(StoreError::Conflict {
                id: tender.id.clone(),
                expected: rev,
            });
        }
        current.tender = tender.clone();
        current.rev = rev + 1;
        Ok(current.clone())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<Tender>, u64), StoreError> {
        let tenders = self.tenders.read();
        let mut all: Vec<&Tender> = tenders.values().map(|s| &s.tender).collect();
        all.sort_by(|a, b| b.date_modified.cmp(&a.date_modified).then(a.id.cmp(&b.id)));
        let page = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, tenders.len() as u64))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
