//! Tender routes
//!
//! Reads are public; what a reader sees depends on the tender status and
//! actor type. Edits need the `edit_tender` grant or a service actor.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::guard::{is_tender_owner, load, read_role, require, save, tender_view};
use crate::api::{Created, DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{AccessToken, MaybeAuth, RequireAuth};
use crate::error::{ApiError, ApiResult};
use crate::policy::accept::{accept_tender_create, accept_tender_patch, requested_variant};
use crate::policy::acl::held_permissions;
use crate::policy::{
    derive_acl, resolve_role, tender_fields, view_fields, ActorType, EntityKind, Fields, Permission,
    PolicyError,
};

/// GET /tenders
pub async fn list_tenders(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<Fields>> {
    let (tenders, total) = state
        .store
        .list(pagination.offset(), pagination.limit())
        .await?;

    let data = tenders
        .iter()
        .map(|tender| {
            let policy = tender.variant().policy();
            view_fields(policy, EntityKind::Tender, &tender_fields(tender)?, "listing")
        })
        .collect::<Result<Vec<_>, PolicyError>>()?;

    tracing::debug!(page = pagination.page(), total, "Listing tenders");
    Ok(Paginated::new(data, &pagination, total))
}

/// POST /tenders
pub async fn create_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Created<DataResponse<Fields>>> {
    let variant = requested_variant(&body)?;
    if variant.is_stage2() && auth.actor != ActorType::CompetitiveDialogue {
        return Err(ApiError::forbidden(format!(
            "{} tenders are created by the stage-transition service only",
            variant
        )));
    }

    let tender = accept_tender_create(variant, &auth.user_id, &body, Utc::now())?;
    state.store.insert(&tender).await?;

    tracing::info!(
        tender_id = %tender.id,
        variant = %variant,
        owner = %tender.owner,
        user = %auth.user_id,
        "Tender created"
    );

    let view = tender_view(&tender, &read_role(&auth, &tender), true)?;
    Ok(Created(DataResponse::with_access(view, tender.owner_token)))
}

/// GET /tenders/:tender_id
pub async fn get_tender(
    auth: MaybeAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
) -> ApiResult<DataResponse<Fields>> {
    let tender = load(&state, &tender_id).await?.tender;
    let role = read_role(&auth, &tender);
    let owner = is_tender_owner(&tender, &auth, token.as_deref());
    Ok(DataResponse::new(tender_view(&tender, &role, owner)?))
}

/// PATCH /tenders/:tender_id
pub async fn patch_tender(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<DataResponse<Fields>> {
    let stored = load(&state, &tender_id).await?;
    let current = &stored.tender;

    // Administrator and chronograph act on any tender; everyone else needs
    // the grant, which the stage-transition service holds through its group
    if !matches!(auth.actor, ActorType::Administrator | ActorType::Chronograph) {
        require(current, &auth, token.as_deref(), Permission::EditTender)?;
    }

    let role = resolve_role(auth.actor, current.status.as_str());
    let tender = accept_tender_patch(current, &role, &body, Utc::now())?;
    save(&state, &tender, stored.rev).await?;

    tracing::info!(
        tender_id = %tender.id,
        role = %role,
        from = %current.status,
        to = %tender.status,
        "Tender patched"
    );

    let owner = is_tender_owner(&tender, &auth, token.as_deref());
    Ok(DataResponse::new(tender_view(&tender, &read_role(&auth, &tender), owner)?))
}

/// GET /tenders/:tender_id/permissions
///
/// Permissions the caller's principals hold on the tender as it is now.
pub async fn tender_permissions(
    auth: MaybeAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
) -> ApiResult<DataResponse<Vec<Permission>>> {
    let stored = load(&state, &tender_id).await?;
    let acl = derive_acl(&stored.tender);
    Ok(DataResponse::new(held_permissions(
        &acl,
        &auth.principals(token.as_deref()),
    )))
}
