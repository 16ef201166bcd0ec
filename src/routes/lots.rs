use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::guard::{load, require, require_status, revalidate, save};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{AccessToken, RequireAuth};
use crate::domain::{Lot, Tender, TenderStatus};
use crate::error::{ApiError, ApiResult};
use crate::policy::accept::accept_lot;
use crate::policy::{lot_fields, project_fields, Direction, EntityKind, Fields, Permission};

/// Lots change only before bids are in
const LOT_EDIT_STATUSES: &[TenderStatus] = &[
    TenderStatus::Draft,
    TenderStatus::ActiveTendering,
    TenderStatus::DraftStage2,
];

fn lot_view(tender: &Tender, lot: &Lot) -> ApiResult<Fields> {
    let policy = tender.variant().policy();
    Ok(project_fields(
        policy,
        EntityKind::Lot,
        &lot_fields(policy, lot)?,
        "view",
        Direction::Output,
    )?)
}

/// POST /tenders/:tender_id/lots
pub async fn create_lot(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Created<DataResponse<Fields>>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    require(&tender, &auth, token.as_deref(), Permission::EditTender)?;
    require_status(&tender, LOT_EDIT_STATUSES, "add lot")?;

    let lot = accept_lot(tender.variant().policy(), "create", &body, None)?;
    tender.lots.push(lot.clone());
    tender.date_modified = Some(Utc::now());
    revalidate(&tender)?;
    save(&state, &tender, stored.rev).await?;

    tracing::info!(tender_id = %tender.id, lot_id = %lot.id, "Lot added");
    Ok(Created(DataResponse::new(lot_view(&tender, &lot)?)))
}

/// GET /tenders/:tender_id/lots/:lot_id
pub async fn get_lot(
    State(state): State<Arc<AppState>>,
    Path((tender_id, lot_id)): Path<(String, String)>,
) -> ApiResult<DataResponse<Fields>> {
    let tender = load(&state, &tender_id).await?.tender;
    let lot = tender
        .lot(&lot_id)
        .ok_or_else(|| ApiError::not_found(format!("Lot {} not found", lot_id)))?;
    Ok(DataResponse::new(lot_view(&tender, lot)?))
}

/// PATCH /tenders/:tender_id/lots/:lot_id
pub async fn patch_lot(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path((tender_id, lot_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<DataResponse<Fields>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    require(&tender, &auth, token.as_deref(), Permission::EditTender)?;
    require_status(&tender, LOT_EDIT_STATUSES, "update lot")?;

    let policy = tender.variant().policy();
    let slot = tender
        .lot_mut(&lot_id)
        .ok_or_else(|| ApiError::not_found(format!("Lot {} not found", lot_id)))?;
    let lot = accept_lot(policy, "edit", &body, Some(&*slot))?;
    *slot = lot.clone();
    tender.date_modified = Some(Utc::now());
    revalidate(&tender)?;
    save(&state, &tender, stored.rev).await?;

    tracing::info!(tender_id = %tender.id, lot_id = %lot.id, "Lot updated");
    Ok(DataResponse::new(lot_view(&tender, &lot)?))
}
