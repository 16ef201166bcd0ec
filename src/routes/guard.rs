//! Shared lookups and access checks for tender routes

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::domain::{Bid, Tender, TenderStatus};
use crate::error::{ApiError, ApiResult};
use crate::policy::acl::permits;
use crate::policy::validation::validate_tender;
use crate::policy::{
    derive_acl, privileged_view_fields, tender_fields, view_fields, view_role_key, ActorType, EntityKind, Fields,
    Permission, Principal,
};
use crate::services::StoredTender;

pub async fn load(state: &AppState, id: &str) -> ApiResult<StoredTender> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tender {} not found", id)))
}

/// Fail with 403 unless the caller holds `permission` on `tender` right now
pub fn require(
    tender: &Tender,
    auth: &AuthContext,
    access_token: Option<&str>,
    permission: Permission,
) -> ApiResult<()> {
    let acl = derive_acl(tender);
    if permits(&acl, &auth.principals(access_token), permission) {
        Ok(())
    } else {
        tracing::warn!(
            tender_id = %tender.id,
            user = %auth.user_id,
            actor = %auth.actor,
            permission = %permission,
            "Permission denied"
        );
        Err(ApiError::forbidden(format!("Forbidden: {} required", permission)))
    }
}

fn holds(auth: &AuthContext, access_token: Option<&str>, owner: &str, token: &str) -> bool {
    let principal = Principal::owner(owner, token).to_string();
    auth.principals(access_token).contains(&principal)
}

pub fn is_tender_owner(tender: &Tender, auth: &AuthContext, access_token: Option<&str>) -> bool {
    holds(auth, access_token, &tender.owner, &tender.owner_token)
}

pub fn is_bid_owner(bid: &Bid, auth: &AuthContext, access_token: Option<&str>) -> bool {
    holds(auth, access_token, &bid.owner, &bid.owner_token)
}

/// Fail with 403 unless the tender is in one of `allowed`
pub fn require_status(tender: &Tender, allowed: &[TenderStatus], action: &str) -> ApiResult<()> {
    if allowed.contains(&tender.status) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Can't {} in current ({}) tender status",
            action, tender.status
        )))
    }
}

/// Role a reader sees the tender under
pub fn read_role(auth: &AuthContext, tender: &Tender) -> String {
    match auth.actor {
        ActorType::Chronograph => "chronograph_view".to_string(),
        _ => view_role_key(tender.status.as_str()).to_string(),
    }
}

/// Tender as read under `role`. Only the tender owner sees the content of
/// non-public bid documents.
pub fn tender_view(tender: &Tender, role: &str, owner: bool) -> ApiResult<Fields> {
    let policy = tender.variant().policy();
    let fields = tender_fields(tender)?;
    let view = if owner {
        privileged_view_fields(policy, EntityKind::Tender, &fields, role)?
    } else {
        view_fields(policy, EntityKind::Tender, &fields, role)?
    };
    Ok(view)
}

/// Whole-tender rules still hold after a child entity changed
pub fn revalidate(tender: &Tender) -> ApiResult<()> {
    let errors = validate_tender(tender);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Conditional write of `tender` over the revision it was read at
pub async fn save(state: &AppState, tender: &Tender, rev: i64) -> ApiResult<StoredTender> {
    let stored = state.store.update(tender, rev).await?;
    tracing::debug!(tender_id = %tender.id, rev = stored.rev, "Tender saved");
    Ok(stored)
}
