use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::guard::{is_tender_owner, load, require, save};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{AccessToken, MaybeAuth, RequireAuth};
use crate::domain::Document;
use crate::error::ApiResult;
use crate::policy::accept::accept_document;
use crate::policy::{
    privileged_view_fields, to_fields, view_fields, EntityKind, Fields, Permission,
    VariantPolicy,
};

/// Document as a reader sees it; non-public content is withheld unless
/// `privileged`
pub fn document_view(
    policy: &VariantPolicy,
    document: &Document,
    privileged: bool,
) -> ApiResult<Fields> {
    let fields = to_fields(document)?;
    let view = if privileged {
        privileged_view_fields(policy, EntityKind::Document, &fields, "view")?
    } else {
        view_fields(policy, EntityKind::Document, &fields, "view")?
    };
    Ok(view)
}

/// POST /tenders/:tender_id/documents
pub async fn create_document(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Created<DataResponse<Fields>>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    require(&tender, &auth, token.as_deref(), Permission::UploadTenderDocuments)?;

    let policy = tender.variant().policy();
    let now = Utc::now();
    let mut document = accept_document(policy, "create", &body, None)?;
    document.publish(&auth.user_id, now);
    tender.documents.push(document.clone());
    tender.date_modified = Some(now);
    save(&state, &tender, stored.rev).await?;

    tracing::info!(tender_id = %tender.id, document_id = %document.id, "Tender document uploaded");
    Ok(Created(DataResponse::new(document_view(policy, &document, true)?)))
}

/// GET /tenders/:tender_id/documents
pub async fn list_documents(
    auth: MaybeAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
) -> ApiResult<DataResponse<Vec<Fields>>> {
    let tender = load(&state, &tender_id).await?.tender;
    let policy = tender.variant().policy();
    let owner = is_tender_owner(&tender, &auth, token.as_deref());
    let documents = tender
        .documents
        .iter()
        .map(|document| document_view(policy, document, owner))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(DataResponse::new(documents))
}
