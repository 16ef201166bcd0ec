//! PostgreSQL tender store

use async_trait::async_trait;
use sqlx::PgPool;

use super::store::{StoreError, StoredTender, TenderStore};
use crate::domain::Tender;

/// Database row for a tender document
#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    data: serde_json::Value,
    rev: i64,
}

impl TryFrom<TenderRow> for StoredTender {
    type Error = StoreError;

    fn try_from(row: TenderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tender: serde_json::from_value(row.data)?,
            rev: row.rev,
        })
    }
}

/// Tenders kept whole as JSONB, guarded by a revision counter
#[derive(Clone)]
pub struct PgTenderStore {
    pool: PgPool,
}

impl PgTenderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenderStore for PgTenderStore {
    async fn insert(&self, tender: &Tender) -> Result<StoredTender, StoreError> {
        let data = serde_json::to_value(tender)?;
        let row = sqlx::query_as::<_, TenderRow>(
            r#"
            INSERT INTO tenders (id, procurement_method_type, status, data, rev, date_modified)
            VALUES ($1, $2, $3, $4, 1, COALESCE($5, NOW()))
            RETURNING data, rev
            "#,
        )
        .bind(&tender.id)
        .bind(tender.procurement_method_type.as_str())
        .bind(tender.status.as_str())
        .bind(data)
        .bind(tender.date_modified)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: &str) -> Result<Option<StoredTender>, StoreError> {
        sqlx::query_as::<_, TenderRow>("SELECT data, rev FROM tenders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(StoredTender::try_from)
            .transpose()
    }

    async fn update(&self, tender: &Tender, rev: i64) -> Result<StoredTender, StoreError> {
        let data = serde_json::to_value(tender)?;
        let row = sqlx::query_as::<_, TenderRow>(
            r#"
            UPDATE tenders
            SET data = $3, status = $4, rev = rev + 1, date_modified = COALESCE($5, NOW())
            WHERE id = $1 AND rev = $2
            RETURNING data, rev
            "#,
        )
        .bind(&tender.id)
        .bind(rev)
        .bind(data)
        .bind(tender.status.as_str())
        .bind(tender.date_modified)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenders WHERE id = $1)")
                        .bind(&tender.id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Err(StoreError::Conflict {
                        id: tender.id.clone(),
                        expected: rev,
                    })
                } else {
                    Err(StoreError::NotFound(tender.id.clone()))
                }
            }
        }
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<Tender>, u64), StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenders")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, TenderRow>(
            r#"
            SELECT data, rev FROM tenders
            ORDER BY date_modified DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let tenders = rows
            .into_iter()
            .map(|row| StoredTender::try_from(row).map(|s| s.tender))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((tenders, total.max(0) as u64))
    }

    async fn health_check(&self) -> bool {
        crate::db::health_check(&self.pool).await
    }
}
