//! Bid routes
//!
//! Bid owners authenticate with the bid token handed out on creation. Other
//! readers see a bid through the role keyed by the tender status, so bids
//! stay sealed while tendering is open.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::documents::document_view;
use super::guard::{is_bid_owner, is_tender_owner, load, require_status, save};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{AccessToken, AuthContext, MaybeAuth, RequireAuth};
use crate::domain::{Bid, Tender, TenderStatus};
use crate::error::{ApiError, ApiResult};
use crate::policy::accept::{accept_bid_create, accept_bid_patch, accept_document};
use crate::policy::{
    privileged_view_fields, to_fields, view_fields, view_role_key, EntityKind, Fields,
};

const BIDDING: &[TenderStatus] = &[TenderStatus::ActiveTendering];

fn find<'a>(tender: &'a Tender, bid_id: &str) -> ApiResult<&'a Bid> {
    tender
        .bid(bid_id)
        .ok_or_else(|| ApiError::not_found(format!("Bid {} not found", bid_id)))
}

/// Who is reading a bid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reader {
    BidOwner,
    TenderOwner,
    Public,
}

impl Reader {
    fn of(tender: &Tender, bid: &Bid, auth: &AuthContext, token: &AccessToken) -> Self {
        if is_bid_owner(bid, auth, token.as_deref()) {
            Reader::BidOwner
        } else if is_tender_owner(tender, auth, token.as_deref()) {
            Reader::TenderOwner
        } else {
            Reader::Public
        }
    }
}

/// The bid owner sees the full bid; everyone else the status view. Non-public
/// documents keep their content for both owners only.
fn bid_view(tender: &Tender, bid: &Bid, reader: Reader) -> ApiResult<Fields> {
    let policy = tender.variant().policy();
    let fields = to_fields(bid)?;
    let view = match reader {
        Reader::BidOwner => privileged_view_fields(policy, EntityKind::Bid, &fields, "view")?,
        Reader::TenderOwner => privileged_view_fields(
            policy,
            EntityKind::Bid,
            &fields,
            view_role_key(tender.status.as_str()),
        )?,
        Reader::Public => view_fields(
            policy,
            EntityKind::Bid,
            &fields,
            view_role_key(tender.status.as_str()),
        )?,
    };
    Ok(view)
}

fn require_bid_owner(bid: &Bid, auth: &AuthContext, token: &AccessToken) -> ApiResult<()> {
    if is_bid_owner(bid, auth, token.as_deref()) {
        Ok(())
    } else {
        tracing::warn!(bid_id = %bid.id, user = %auth.user_id, "Bid owner token required");
        Err(ApiError::forbidden("Forbidden: bid owner token required"))
    }
}

/// POST /tenders/:tender_id/bids
pub async fn create_bid(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Created<DataResponse<Fields>>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    require_status(&tender, BIDDING, "add bid")?;

    let now = Utc::now();
    let bid = accept_bid_create(&tender, &auth.user_id, &body, now)?;
    tender.bids.push(bid.clone());
    tender.date_modified = Some(now);
    save(&state, &tender, stored.rev).await?;

    tracing::info!(tender_id = %tender.id, bid_id = %bid.id, user = %auth.user_id, "Bid submitted");
    let view = bid_view(&tender, &bid, Reader::BidOwner)?;
    Ok(Created(DataResponse::with_access(view, bid.owner_token)))
}

/// GET /tenders/:tender_id/bids/:bid_id
pub async fn get_bid(
    auth: MaybeAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path((tender_id, bid_id)): Path<(String, String)>,
) -> ApiResult<DataResponse<Fields>> {
    let tender = load(&state, &tender_id).await?.tender;
    let bid = find(&tender, &bid_id)?;
    let reader = Reader::of(&tender, bid, &auth, &token);
    Ok(DataResponse::new(bid_view(&tender, bid, reader)?))
}

/// PATCH /tenders/:tender_id/bids/:bid_id
pub async fn patch_bid(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path((tender_id, bid_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<DataResponse<Fields>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    let current = find(&tender, &bid_id)?;
    require_bid_owner(current, &auth, &token)?;
    require_status(&tender, BIDDING, "update bid")?;

    let bid = accept_bid_patch(&tender, current, &body)?;
    if let Some(slot) = tender.bid_mut(&bid_id) {
        *slot = bid.clone();
    }
    tender.date_modified = Some(Utc::now());
    save(&state, &tender, stored.rev).await?;

    tracing::info!(tender_id = %tender.id, bid_id = %bid.id, status = %bid.status, "Bid updated");
    Ok(DataResponse::new(bid_view(&tender, &bid, Reader::BidOwner)?))
}

/// POST /tenders/:tender_id/bids/:bid_id/documents
pub async fn create_bid_document(
    auth: RequireAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path((tender_id, bid_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Created<DataResponse<Fields>>> {
    let stored = load(&state, &tender_id).await?;
    let mut tender = stored.tender;
    require_bid_owner(find(&tender, &bid_id)?, &auth, &token)?;
    require_status(&tender, BIDDING, "add document to bid")?;

    let policy = tender.variant().policy();
    let now = Utc::now();
    let mut document = accept_document(policy, "create", &body, None)?;
    document.publish(&auth.user_id, now);

    let bid = tender
        .bid_mut(&bid_id)
        .ok_or_else(|| ApiError::not_found(format!("Bid {} not found", bid_id)))?;
    bid.documents.push(document.clone());
    tender.date_modified = Some(now);
    save(&state, &tender, stored.rev).await?;

    tracing::info!(bid_id = %bid_id, document_id = %document.id, "Bid document uploaded");
    Ok(Created(DataResponse::new(document_view(policy, &document, true)?)))
}

/// GET /tenders/:tender_id/bids/:bid_id/documents
///
/// The bid owner and the tender owner see every document; others only after
/// tendering closes, with confidential documents stripped of their content.
pub async fn list_bid_documents(
    auth: MaybeAuth,
    token: AccessToken,
    State(state): State<Arc<AppState>>,
    Path((tender_id, bid_id)): Path<(String, String)>,
) -> ApiResult<DataResponse<Vec<Fields>>> {
    let tender = load(&state, &tender_id).await?.tender;
    let bid = find(&tender, &bid_id)?;
    let privileged = Reader::of(&tender, bid, &auth, &token) != Reader::Public;
    if !privileged && tender.status == TenderStatus::ActiveTendering {
        return Err(ApiError::forbidden(format!(
            "Can't view bid documents in current ({}) tender status",
            tender.status
        )));
    }

    let policy = tender.variant().policy();
    let documents = bid
        .documents
        .iter()
        .map(|document| document_view(policy, document, privileged))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(DataResponse::new(documents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::validation::validate_bid;
    use serde_json::json;

    fn tender(status: &str) -> Tender {
        serde_json::from_value(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueUA",
            "status": status,
            "title": "Road repair",
            "owner": "broker",
            "owner_token": "tt",
            "value": {"amount": 1000},
            "bids": [{
                "id": "b1", "status": "pending", "owner": "bidder", "owner_token": "bt",
                "tenderers": [{"name": "Firm", "identifier": {"scheme": "UA-EDR", "id": "1"}}],
                "value": {"amount": 900},
                "documents": [{
                    "id": "d1", "title": "Price breakdown", "url": "http://docs/d1",
                    "confidentiality": "buyerOnly",
                    "confidentialityRationale": "Contains pricing of the bidder's suppliers"
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn bids_are_sealed_while_tendering() {
        let tender = tender("active.tendering");
        let view = bid_view(&tender, &tender.bids[0], Reader::Public).unwrap();
        assert!(view.is_empty());

        let own = bid_view(&tender, &tender.bids[0], Reader::BidOwner).unwrap();
        assert_eq!(own["value"]["amount"], json!(900.0));
        assert!(!own.contains_key("owner_token"));
    }

    #[test]
    fn pre_qualification_shows_summary_only() {
        let tender = tender("active.pre-qualification");
        let view = bid_view(&tender, &tender.bids[0], Reader::Public).unwrap();
        assert!(view.contains_key("tenderers"));
        assert!(!view.contains_key("value"));
    }

    #[test]
    fn confidential_documents_keep_content_for_owners_only() {
        let tender = tender("active.pre-qualification");
        let bid = &tender.bids[0];

        let public = bid_view(&tender, bid, Reader::Public).unwrap();
        let document = &public["documents"][0];
        assert_eq!(document["title"], "Price breakdown");
        assert!(document.get("url").is_none());

        for reader in [Reader::BidOwner, Reader::TenderOwner] {
            let view = bid_view(&tender, bid, reader).unwrap();
            assert_eq!(view["documents"][0]["url"], "http://docs/d1", "{reader:?}");
        }
    }

    #[test]
    fn owner_check_uses_bid_token() {
        let tender = tender("active.tendering");
        let auth = AuthContext {
            user_id: "bidder".into(),
            actor: crate::policy::ActorType::Broker,
        };
        let ok = AccessToken(Some("bt".into()));
        let wrong = AccessToken(Some("tt".into()));
        assert!(require_bid_owner(&tender.bids[0], &auth, &ok).is_ok());
        assert!(require_bid_owner(&tender.bids[0], &auth, &wrong).is_err());
        assert!(validate_bid(&tender, &tender.bids[0], "").is_empty());
    }
}
