//! Input acceptance: project a request body through its role, merge it into
//! the current entity and validate the result.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use thiserror::Error;

use super::projection::{project_fields, to_fields, Fields};
use super::rules::{Direction, EntityKind};
use super::validation::{validate_bid, validate_document, validate_lot, validate_tender};
use super::{MinimalStepPolicy, PolicyError, ValidationError, Variant, VariantPolicy};
use crate::domain::{Bid, BidStatus, Document, Lot, Period, Tender, TenderStatus, Value};

/// Length of the stage-2 tendering period
const STAGE2_TENDER_DAYS: i64 = 30;
/// Questions close this long before tendering ends
const QUESTIONS_STAND_STILL_DAYS: i64 = 10;

#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("{} validation error(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl AcceptError {
    fn single(name: &str, description: impl Into<String>) -> Self {
        AcceptError::Invalid(vec![ValidationError::body(name, description)])
    }
}

fn check(errors: Vec<ValidationError>) -> Result<(), AcceptError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AcceptError::Invalid(errors))
    }
}

/// Fresh secret for a bearer credential
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn body_fields(input: &Json) -> Result<Fields, AcceptError> {
    match input {
        Json::Object(fields) => Ok(fields.clone()),
        _ => Err(AcceptError::single("data", "Data not available")),
    }
}

fn present(fields: &Fields, name: &str) -> bool {
    fields.get(name).is_some_and(|v| !v.is_null())
}

/// `minimalStep` is refused outright where the variant forbids it, whatever
/// else the body contains and whatever the role would have dropped.
fn rogue_minimal_step(policy: &VariantPolicy, kind: EntityKind, fields: &Fields) -> Vec<ValidationError> {
    if policy.minimal_step != MinimalStepPolicy::Forbidden {
        return Vec::new();
    }
    let mut errors = Vec::new();
    if present(fields, "minimalStep") {
        errors.push(ValidationError::body("minimalStep", "Rogue field"));
    }
    if kind == EntityKind::Tender {
        if let Some(Json::Array(lots)) = fields.get("lots") {
            for (index, lot) in lots.iter().enumerate() {
                if lot.as_object().is_some_and(|lot| present(lot, "minimalStep")) {
                    errors.push(ValidationError::body(
                        format!("lots.{}.minimalStep", index),
                        "Rogue field",
                    ));
                }
            }
        }
    }
    errors
}

fn status_value(policy: &VariantPolicy, fields: &Fields) -> Result<(), AcceptError> {
    match fields.get("status") {
        None => Ok(()),
        Some(Json::String(status)) if policy.status(status).is_ok() => Ok(()),
        Some(_) => {
            let allowed: Vec<&str> = policy.statuses.iter().map(|s| s.as_str()).collect();
            Err(AcceptError::single(
                "status",
                format!("Value must be one of {:?}.", allowed),
            ))
        }
    }
}

/// Merge `patch` into `target`: objects key by key, equal-length lists of
/// objects item by item, anything else replaced.
pub fn merge(target: &mut Json, patch: &Json) {
    match (target, patch) {
        (Json::Object(target), Json::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Json::Array(target), Json::Array(patch))
            if target.len() == patch.len()
                && patch.iter().all(Json::is_object)
                && target.iter().all(Json::is_object) =>
        {
            for (existing, value) in target.iter_mut().zip(patch) {
                merge(existing, value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

fn decode<T: DeserializeOwned>(fields: Fields) -> Result<T, AcceptError> {
    serde_json::from_value(Json::Object(fields))
        .map_err(|e| AcceptError::single("data", e.to_string()))
}

/// Project, check and merge `input` over `base` for one entity kind
fn accept_fields(
    policy: &VariantPolicy,
    kind: EntityKind,
    role: &str,
    input: &Json,
    base: Fields,
) -> Result<Fields, AcceptError> {
    let fields = body_fields(input)?;
    check(rogue_minimal_step(policy, kind, &fields))?;

    let accepted = project_fields(policy, kind, &fields, role, Direction::Input)?;
    if kind == EntityKind::Tender {
        status_value(policy, &accepted)?;
    }

    let mut merged = Json::Object(base);
    merge(&mut merged, &Json::Object(accepted));
    match merged {
        Json::Object(fields) => Ok(fields),
        _ => Err(AcceptError::single("data", "Data not available")),
    }
}

/// Variant named by a create body, first-stage EU when absent
pub fn requested_variant(input: &Json) -> Result<Variant, AcceptError> {
    match input.get("procurementMethodType") {
        None | Some(Json::Null) => Ok(Variant::DialogueStage1EU),
        Some(Json::String(tag)) => tag
            .parse()
            .map_err(|e: String| AcceptError::single("procurementMethodType", e)),
        Some(_) => Err(AcceptError::single(
            "procurementMethodType",
            "Value must be a string.",
        )),
    }
}

fn fill_lot_defaults(policy: &VariantPolicy, lot: &mut Lot) {
    if lot.id.is_empty() {
        lot.id = generate_token();
    }
    if policy.minimal_step == MinimalStepPolicy::RequiredDefaultZero && lot.minimal_step.is_none() {
        lot.minimal_step = Some(Value::zero());
    }
}

/// Second-stage tendering and enquiry periods start when the tender is created
fn initialize_periods(tender: &mut Tender, now: DateTime<Utc>) {
    let end = now + Duration::days(STAGE2_TENDER_DAYS);
    tender.tender_period = Some(Period {
        start_date: Some(now),
        end_date: Some(end),
    });
    tender.enquiry_period = Some(Period {
        start_date: Some(now),
        end_date: Some(end - Duration::days(QUESTIONS_STAND_STILL_DAYS)),
    });
}

/// Build a new tender of `variant` from a create body
pub fn accept_tender_create(
    variant: Variant,
    user: &str,
    input: &Json,
    now: DateTime<Utc>,
) -> Result<Tender, AcceptError> {
    let policy = variant.policy();
    let mut fields = accept_fields(policy, EntityKind::Tender, "create", input, Fields::new())?;

    fields.insert("id".into(), Json::String(generate_token()));
    fields.insert("procurementMethodType".into(), Json::String(variant.as_str().into()));
    fields.insert("status".into(), Json::String(policy.initial_status.as_str().into()));
    fields.insert("owner_token".into(), Json::String(generate_token()));
    if !present(&fields, "owner") {
        fields.insert("owner".into(), Json::String(user.to_string()));
    }

    let mut tender: Tender = decode(fields)?;
    tender.date_modified = Some(now);
    if policy.minimal_step == MinimalStepPolicy::RequiredDefaultZero {
        tender.minimal_step.get_or_insert_with(Value::zero);
        initialize_periods(&mut tender, now);
    }
    for lot in &mut tender.lots {
        fill_lot_defaults(policy, lot);
    }

    check(validate_tender(&tender))?;
    Ok(tender)
}

/// Status moves a tender owner may make. The `edit_<status>` roles only say
/// that `status` is writable; every other move belongs to the auction,
/// qualification and chronograph workflows.
const OWNER_TRANSITIONS: &[(TenderStatus, TenderStatus)] = &[
    (
        TenderStatus::ActivePreQualification,
        TenderStatus::ActivePreQualificationStandStill,
    ),
    (TenderStatus::ActiveStage2Pending, TenderStatus::ActiveStage2Waiting),
    (TenderStatus::DraftStage2, TenderStatus::ActiveTendering),
];

fn owner_tender_status(role: &str, from: TenderStatus, to: TenderStatus) -> Result<(), AcceptError> {
    if from == to || !role.starts_with("edit_") || OWNER_TRANSITIONS.contains(&(from, to)) {
        return Ok(());
    }
    Err(AcceptError::single(
        "status",
        format!("Can't change tender status from {} to {}", from, to),
    ))
}

/// Apply a patch body to `current` under `role`
pub fn accept_tender_patch(
    current: &Tender,
    role: &str,
    input: &Json,
    now: DateTime<Utc>,
) -> Result<Tender, AcceptError> {
    let policy = current.variant().policy();
    let fields = accept_fields(policy, EntityKind::Tender, role, input, to_fields(current)?)?;

    let mut tender: Tender = decode(fields)?;
    owner_tender_status(role, current.status, tender.status)?;
    tender.date_modified = Some(now);
    for lot in &mut tender.lots {
        fill_lot_defaults(policy, lot);
    }

    check(validate_tender(&tender))?;
    Ok(tender)
}

/// Build or update a lot under the lot `role`
pub fn accept_lot(
    policy: &VariantPolicy,
    role: &str,
    input: &Json,
    existing: Option<&Lot>,
) -> Result<Lot, AcceptError> {
    let base = existing.map(to_fields).transpose()?.unwrap_or_default();
    let fields = accept_fields(policy, EntityKind::Lot, role, input, base)?;

    let mut lot: Lot = decode(fields)?;
    fill_lot_defaults(policy, &mut lot);
    check(validate_lot(policy, &lot, ""))?;
    Ok(lot)
}

/// Bidders may only move their own bid between draft and pending, or withdraw it
fn owner_bid_status(bid: &Bid, current: Option<BidStatus>) -> Result<(), AcceptError> {
    let allowed = match (current, bid.status) {
        (Some(from), to) if from == to => true,
        (_, BidStatus::Draft | BidStatus::Pending) => true,
        (Some(_), BidStatus::Deleted) => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(AcceptError::single(
            "status",
            format!("Can't change bid status to {}", bid.status),
        ))
    }
}

/// Build a bid for `tender` from a create body, owned by `user`
pub fn accept_bid_create(
    tender: &Tender,
    user: &str,
    input: &Json,
    now: DateTime<Utc>,
) -> Result<Bid, AcceptError> {
    let policy = tender.variant().policy();
    let mut fields = accept_fields(policy, EntityKind::Bid, "create", input, Fields::new())?;
    fields.insert("id".into(), Json::String(generate_token()));
    fields.insert("owner".into(), Json::String(user.to_string()));
    fields.insert("owner_token".into(), Json::String(generate_token()));

    let mut bid: Bid = decode(fields)?;
    bid.date = Some(now);
    owner_bid_status(&bid, None)?;
    check(validate_bid(tender, &bid, ""))?;
    Ok(bid)
}

/// Apply a bid owner's patch
pub fn accept_bid_patch(tender: &Tender, current: &Bid, input: &Json) -> Result<Bid, AcceptError> {
    let policy = tender.variant().policy();
    let fields = accept_fields(policy, EntityKind::Bid, "edit", input, to_fields(current)?)?;

    let bid: Bid = decode(fields)?;
    owner_bid_status(&bid, Some(current.status))?;
    check(validate_bid(tender, &bid, ""))?;
    Ok(bid)
}

/// Build or update a document under the document `role`
pub fn accept_document(
    policy: &VariantPolicy,
    role: &str,
    input: &Json,
    existing: Option<&Document>,
) -> Result<Document, AcceptError> {
    let base = existing.map(to_fields).transpose()?.unwrap_or_default();
    let fields = accept_fields(policy, EntityKind::Document, role, input, base)?;

    let document: Document = decode(fields)?;
    check(validate_document(&document, ""))?;
    Ok(document)
}
