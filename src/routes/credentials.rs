//! Owner credential hand-off between the dialogue stages
//!
//! The stage-transition service reads a digest of the first-stage owner token
//! and stores it on the second-stage tender as `dialogue_token`. The owner then
//! proves possession of the original token to obtain fresh credentials.

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::guard::{load, read_role, require, require_status, save, tender_view};
use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::{sha512_hex, AccessToken, RequireAuth};
use crate::domain::TenderStatus;
use crate::error::ApiResult;
use crate::policy::accept::generate_token;
use crate::policy::{Fields, Permission};

#[derive(Debug, Serialize)]
pub struct ExtractedCredentials {
    pub id: String,
    pub owner: String,
    pub tender_token: String,
}

/// GET /tenders/:tender_id/extract_credentials
pub async fn extract_credentials(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
) -> ApiResult<DataResponse<ExtractedCredentials>> {
    let stored = load(&state, &tender_id).await?;
    let tender = stored.tender;
    require(&tender, &auth, token.as_deref(), Permission::ExtractCredentials)?;

    tracing::info!(tender_id = %tender.id, user = %auth.user_id, "Owner credentials extracted");
    Ok(DataResponse::new(ExtractedCredentials {
        tender_token: sha512_hex(&tender.owner_token),
        id: tender.id,
        owner: tender.owner,
    }))
}

/// PATCH /tenders/:tender_id/credentials
pub async fn generate_credentials(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
) -> ApiResult<DataResponse<Fields>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    require(&tender, &auth, token.as_deref(), Permission::GenerateCredentials)?;
    require_status(&tender, &[TenderStatus::DraftStage2], "generate credentials")?;

    tender.owner_token = generate_token();
    tender.date_modified = Some(Utc::now());
    save(&state, &tender, stored.rev).await?;

    tracing::info!(tender_id = %tender.id, owner = %tender.owner, "Owner credentials generated");
    let view = tender_view(&tender, &read_role(&auth, &tender), true)?;
    Ok(DataResponse::with_access(view, tender.owner_token))
}
