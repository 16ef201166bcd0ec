//! Per-field validation rules
//!
//! Every violated rule yields one [`ValidationError`]; callers get the whole
//! list rather than the first failure.

use serde::Serialize;
use std::collections::HashSet;
use validator::{Validate, ValidationErrorsKind};

use super::{MinimalStepPolicy, VariantPolicy};
use crate::domain::{Bid, Document, Lot, Tender};

/// Minimum length of a confidentiality rationale
pub const RATIONALE_MIN_CHARS: usize = 30;

/// One violated field rule
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationError {
    pub location: &'static str,
    pub name: String,
    pub description: String,
}

impl ValidationError {
    pub fn body(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            location: "body",
            name: name.into(),
            description: description.into(),
        }
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

fn flatten(errors: &validator::ValidationErrors, path: &str, out: &mut Vec<ValidationError>) {
    for (field, kind) in errors.errors() {
        let name = join(path, field);
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let description = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(ValidationError::body(name.clone(), description));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &name, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &join(&name, &index.to_string()), out);
                }
            }
        }
    }
}

fn field_rules<T: Validate>(entity: &T, path: &str, out: &mut Vec<ValidationError>) {
    if let Err(errors) = entity.validate() {
        let mut found = Vec::new();
        flatten(&errors, path, &mut found);
        found.sort_by(|a, b| a.name.cmp(&b.name));
        out.extend(found);
    }
}

pub fn validate_document(document: &Document, path: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    field_rules(document, path, &mut errors);

    if !document.is_public() && !document.is_description_decision {
        let name = join(path, "confidentialityRationale");
        match document.confidentiality_rationale.as_deref() {
            None | Some("") => {
                errors.push(ValidationError::body(name, "confidentialityRationale is required"));
            }
            Some(rationale) if rationale.chars().count() < RATIONALE_MIN_CHARS => {
                errors.push(ValidationError::body(
                    name,
                    format!(
                        "confidentialityRationale should contain at least {} characters",
                        RATIONALE_MIN_CHARS
                    ),
                ));
            }
            Some(_) => {}
        }
    }
    errors
}

fn minimal_step_rule(
    policy: MinimalStepPolicy,
    present: bool,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    match (policy, present) {
        (MinimalStepPolicy::Forbidden, true) => {
            errors.push(ValidationError::body(join(path, "minimalStep"), "Rogue field"));
        }
        (MinimalStepPolicy::RequiredDefaultZero, false) => {
            errors.push(ValidationError::body(
                join(path, "minimalStep"),
                "This field is required.",
            ));
        }
        _ => {}
    }
}

pub fn validate_lot(policy: &VariantPolicy, lot: &Lot, path: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if lot.title.trim().is_empty() {
        errors.push(ValidationError::body(join(path, "title"), "This field is required."));
    }
    minimal_step_rule(policy.minimal_step, lot.minimal_step.is_some(), path, &mut errors);
    errors
}

pub fn validate_bid(tender: &Tender, bid: &Bid, path: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    field_rules(bid, path, &mut errors);

    if bid.tenderers.is_empty() {
        errors.push(ValidationError::body(
            join(path, "tenderers"),
            "Please provide at least 1 item.",
        ));
    }
    if tender.lots.is_empty() {
        if bid.value.is_none() {
            errors.push(ValidationError::body(join(path, "value"), "This field is required."));
        }
    } else {
        for (index, lot_value) in bid.lot_values.iter().enumerate() {
            if tender.lot(&lot_value.related_lot).is_none() {
                errors.push(ValidationError::body(
                    join(path, &format!("lotValues.{}.relatedLot", index)),
                    "relatedLot should be one of lots",
                ));
            }
        }
    }
    for (index, document) in bid.documents.iter().enumerate() {
        errors.extend(validate_document(
            document,
            &join(path, &format!("documents.{}", index)),
        ));
    }
    errors
}

/// Validate a whole tender snapshot against its variant's rules
pub fn validate_tender(tender: &Tender) -> Vec<ValidationError> {
    let policy = tender.variant().policy();
    let mut errors = Vec::new();

    if !policy.declares(tender.status) {
        let allowed: Vec<&str> = policy.statuses.iter().map(|s| s.as_str()).collect();
        errors.push(ValidationError::body(
            "status",
            format!("Value must be one of {:?}.", allowed),
        ));
    }
    if tender.title.trim().is_empty() {
        errors.push(ValidationError::body("title", "This field is required."));
    }
    if policy.requires_english_title
        && tender.title_en.as_deref().map_or(true, |t| t.trim().is_empty())
    {
        errors.push(ValidationError::body("title_en", "This field is required."));
    }

    minimal_step_rule(policy.minimal_step, tender.minimal_step.is_some(), "", &mut errors);

    let mut seen = HashSet::new();
    if tender.lots.iter().any(|lot| !seen.insert(lot.id.as_str())) {
        errors.push(ValidationError::body("lots", "Lot id should be uniq for all lots"));
    }
    for (index, lot) in tender.lots.iter().enumerate() {
        errors.extend(validate_lot(policy, lot, &format!("lots.{}", index)));
    }

    if policy.variant.is_stage2() {
        if tender.dialogue_token.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError::body("dialogue_token", "This field is required."));
        }
        match &tender.shortlisted_firms {
            None => errors.push(ValidationError::body(
                "shortlistedFirms",
                "This field is required.",
            )),
            Some(firms) => {
                for (index, firm) in firms.iter().enumerate() {
                    field_rules(firm, &format!("shortlistedFirms.{}", index), &mut errors);
                }
            }
        }
    }

    for (index, document) in tender.documents.iter().enumerate() {
        errors.extend(validate_document(document, &format!("documents.{}", index)));
    }
    for (index, bid) in tender.bids.iter().enumerate() {
        errors.extend(validate_bid(tender, bid, &format!("bids.{}", index)));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Confidentiality;
    use serde_json::json;

    fn document(rationale: Option<String>) -> Document {
        serde_json::from_value(json!({
            "title": "Specification.pdf",
            "url": "http://docs.example/spec.pdf",
            "confidentiality": "restricted",
            "confidentialityRationale": rationale,
        }))
        .unwrap()
    }

    #[test]
    fn rationale_of_29_characters_fails() {
        let doc = document(Some("x".repeat(29)));
        assert_eq!(doc.confidentiality, Confidentiality::BuyerOnly);
        let errors = validate_document(&doc, "");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "confidentialityRationale");
        assert!(errors[0].description.contains("at least 30"));
    }

    #[test]
    fn rationale_of_30_characters_passes() {
        assert!(validate_document(&document(Some("x".repeat(30))), "").is_empty());
    }

    #[test]
    fn missing_rationale_is_required() {
        let errors = validate_document(&document(None), "documents.0");
        assert_eq!(
            errors,
            vec![ValidationError::body(
                "documents.0.confidentialityRationale",
                "confidentialityRationale is required"
            )]
        );
    }

    #[test]
    fn decision_description_needs_no_rationale() {
        let mut doc = document(None);
        doc.is_description_decision = true;
        assert!(validate_document(&doc, "").is_empty());
    }

    #[test]
    fn public_document_needs_no_rationale() {
        let mut doc = document(None);
        doc.confidentiality = Confidentiality::Public;
        assert!(validate_document(&doc, "").is_empty());
    }

    #[test]
    fn malformed_url_is_reported() {
        let mut doc = document(Some("x".repeat(40)));
        doc.url = "not a url".to_string();
        let errors = validate_document(&doc, "");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "url");
    }

    fn tender(value: serde_json::Value) -> Tender {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn duplicate_lot_ids_are_rejected() {
        let t = tender(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueUA",
            "status": "active.tendering",
            "title": "Road repair",
            "value": {"amount": 1000},
            "lots": [
                {"id": "l1", "title": "A", "value": {"amount": 10}},
                {"id": "l1", "title": "B", "value": {"amount": 10}}
            ]
        }));
        let errors = validate_tender(&t);
        assert!(errors.iter().any(|e| e.name == "lots"));
    }

    #[test]
    fn undeclared_status_is_rejected() {
        let t = tender(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueUA",
            "status": "active.auction",
            "title": "Road repair",
            "value": {"amount": 1000}
        }));
        let errors = validate_tender(&t);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "status");
    }

    #[test]
    fn eu_variant_requires_english_title() {
        let t = tender(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueEU",
            "status": "active.tendering",
            "title": "Ремонт доріг",
            "value": {"amount": 1000}
        }));
        assert_eq!(
            validate_tender(&t),
            vec![ValidationError::body("title_en", "This field is required.")]
        );
    }

    #[test]
    fn stage1_minimal_step_is_rogue() {
        let t = tender(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueUA",
            "status": "active.tendering",
            "title": "Road repair",
            "value": {"amount": 1000},
            "minimalStep": {"amount": 5},
            "lots": [{"id": "l1", "title": "A", "value": {"amount": 10}, "minimalStep": {"amount": 1}}]
        }));
        let names: Vec<String> = validate_tender(&t).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["minimalStep", "lots.0.minimalStep"]);
    }

    #[test]
    fn stage2_requires_dialogue_fields() {
        let t = tender(json!({
            "id": "t2",
            "procurementMethodType": "competitiveDialogueUA.stage2",
            "status": "draft.stage2",
            "title": "Road repair",
            "value": {"amount": 1000},
            "minimalStep": {"amount": 0}
        }));
        let names: Vec<String> = validate_tender(&t).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["dialogue_token", "shortlistedFirms"]);
    }

    #[test]
    fn shortlisted_firm_fields_are_checked() {
        let t = tender(json!({
            "id": "t2",
            "procurementMethodType": "competitiveDialogueUA.stage2",
            "status": "draft.stage2",
            "title": "Road repair",
            "value": {"amount": 1000},
            "minimalStep": {"amount": 0},
            "dialogue_token": "abc",
            "shortlistedFirms": [{"identifier": {"scheme": "UA-EDR", "id": ""}, "name": ""}]
        }));
        let names: Vec<String> = validate_tender(&t).into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["shortlistedFirms.0.identifier.id", "shortlistedFirms.0.name"]
        );
    }

    #[test]
    fn bid_lot_values_must_reference_lots() {
        let t = tender(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueUA",
            "status": "active.tendering",
            "title": "Road repair",
            "value": {"amount": 1000},
            "lots": [{"id": "l1", "title": "A", "value": {"amount": 10}}],
            "bids": [{
                "id": "b1", "status": "pending", "owner": "o", "owner_token": "t",
                "tenderers": [{"name": "Firm", "identifier": {"scheme": "UA-EDR", "id": "1"}}],
                "lotValues": [{"value": {"amount": 5}, "relatedLot": "l2"}]
            }]
        }));
        let errors = validate_tender(&t);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "bids.0.lotValues.0.relatedLot");
    }
}
