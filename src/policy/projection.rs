//! Role-keyed field projection
//!
//! Entities are projected as JSON objects: the serialized field names are
//! exactly what the role tables filter on. Child collections are projected
//! with the child's own table.

use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::borrow::Cow;

use super::rules::{Direction, EntityKind, Rule};
use super::{PolicyError, VariantPolicy};
use crate::domain::{Lot, Tender};

pub type Fields = Map<String, Json>;

/// Child collections nested inside each entity kind
fn children(kind: EntityKind) -> &'static [(&'static str, EntityKind)] {
    match kind {
        EntityKind::Tender => &[
            ("bids", EntityKind::Bid),
            ("lots", EntityKind::Lot),
            ("documents", EntityKind::Document),
        ],
        EntityKind::Bid => &[("documents", EntityKind::Document)],
        EntityKind::Lot | EntityKind::Document => &[],
    }
}

fn child_kind(kind: EntityKind, field: &str) -> Option<EntityKind> {
    children(kind)
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, child)| *child)
}

/// Output role for one item. Sifted bids are shown under their own status;
/// non-public documents under `restricted_view` unless the reader is
/// privileged.
fn item_role<'a>(kind: EntityKind, item: &Fields, role: &'a str, privileged: bool) -> Cow<'a, str> {
    match kind {
        EntityKind::Bid if role != "create" && role != "plain" => {
            match item.get("status").and_then(Json::as_str) {
                Some(status @ ("invalid" | "invalid.pre-qualification" | "deleted")) => {
                    Cow::Owned(status.to_string())
                }
                Some("unsuccessful") => Cow::Borrowed("bid.unsuccessful"),
                _ => Cow::Borrowed(role),
            }
        }
        EntityKind::Document if !privileged && is_confidential(item) => {
            Cow::Borrowed(RESTRICTED_VIEW)
        }
        _ => Cow::Borrowed(role),
    }
}

/// Document role that withholds the content of non-public documents
pub const RESTRICTED_VIEW: &str = "restricted_view";

fn is_confidential(item: &Fields) -> bool {
    item.get("confidentiality")
        .and_then(Json::as_str)
        .is_some_and(|c| c != "public")
}

/// Filter `entity` through the rule `role` names in the `kind` table.
///
/// An undeclared `role` is a configuration error. Nested children fall back
/// to their table's fallback entry on output. On input they use the same role
/// when their table declares it, otherwise `create` or `edit`.
///
/// Output is for an unprivileged reader; see [`privileged_view_fields`].
pub fn project_fields(
    policy: &VariantPolicy,
    kind: EntityKind,
    entity: &Fields,
    role: &str,
    direction: Direction,
) -> Result<Fields, PolicyError> {
    project(policy, kind, entity, role, direction, false)
}

fn project(
    policy: &VariantPolicy,
    kind: EntityKind,
    entity: &Fields,
    role: &str,
    direction: Direction,
    privileged: bool,
) -> Result<Fields, PolicyError> {
    let table = policy.table(kind);
    let role = match direction {
        Direction::Output => item_role(kind, entity, role, privileged),
        Direction::Input => Cow::Borrowed(role),
    };
    let rule = table.get(&role)?;
    filter(policy, kind, entity, &role, rule, direction, privileged)
}

/// Output projection where a role the table lacks falls back to the table's
/// fallback entry. Status-keyed reads go through here.
pub fn view_fields(
    policy: &VariantPolicy,
    kind: EntityKind,
    entity: &Fields,
    role: &str,
) -> Result<Fields, PolicyError> {
    let role = policy.table(kind).declared_or_fallback(role);
    project(policy, kind, entity, role, Direction::Output, false)
}

/// [`view_fields`] for the tender owner or the owner of the bid being read,
/// who also see the content of non-public documents
pub fn privileged_view_fields(
    policy: &VariantPolicy,
    kind: EntityKind,
    entity: &Fields,
    role: &str,
) -> Result<Fields, PolicyError> {
    let role = policy.table(kind).declared_or_fallback(role);
    project(policy, kind, entity, role, Direction::Output, true)
}

fn filter(
    policy: &VariantPolicy,
    kind: EntityKind,
    entity: &Fields,
    role: &str,
    rule: &Rule,
    direction: Direction,
    privileged: bool,
) -> Result<Fields, PolicyError> {
    let mut view = Fields::new();
    for (field, value) in entity {
        if !rule.permits(field) {
            if direction == Direction::Input {
                tracing::debug!(entity = %kind, role, field = %field, "Dropping field not accepted for role");
            }
            continue;
        }
        let projected = match (child_kind(kind, field), value) {
            (Some(child), Json::Array(items)) => {
                Json::Array(project_children(policy, child, items, role, direction, privileged)?)
            }
            _ => value.clone(),
        };
        view.insert(field.clone(), projected);
    }
    Ok(view)
}

fn project_children(
    policy: &VariantPolicy,
    kind: EntityKind,
    items: &[Json],
    parent_role: &str,
    direction: Direction,
    privileged: bool,
) -> Result<Vec<Json>, PolicyError> {
    let table = policy.table(kind);
    items
        .iter()
        .map(|item| {
            let Json::Object(fields) = item else {
                return Ok(item.clone());
            };
            let projected = match direction {
                Direction::Output => {
                    let role = item_role(kind, fields, parent_role, privileged);
                    let rule = table.get_or_fallback(&role)?;
                    filter(policy, kind, fields, &role, rule, direction, privileged)?
                }
                Direction::Input => {
                    let role = if table.contains(parent_role) {
                        parent_role
                    } else if parent_role == "create" {
                        "create"
                    } else {
                        "edit"
                    };
                    filter(policy, kind, fields, role, table.get(role)?, direction, privileged)?
                }
            };
            Ok(Json::Object(projected))
        })
        .collect()
}

fn unserializable(e: impl std::fmt::Display) -> PolicyError {
    PolicyError::Unserializable(e.to_string())
}

/// Serialize any entity into its field map
pub fn to_fields<T: Serialize>(entity: &T) -> Result<Fields, PolicyError> {
    match serde_json::to_value(entity).map_err(unserializable)? {
        Json::Object(fields) => Ok(fields),
        other => Err(unserializable(format!("expected an object, got {}", other))),
    }
}

fn put_minimal_step(
    fields: &mut Fields,
    value: Option<crate::domain::Value>,
) -> Result<(), PolicyError> {
    match value {
        Some(step) => {
            let step = serde_json::to_value(step).map_err(unserializable)?;
            fields.insert("minimalStep".to_string(), step);
        }
        None => {
            fields.remove("minimalStep");
        }
    }
    Ok(())
}

/// Lot fields with `minimalStep` replaced by its derived value
pub fn lot_fields(policy: &VariantPolicy, lot: &Lot) -> Result<Fields, PolicyError> {
    let mut fields = to_fields(lot)?;
    put_minimal_step(&mut fields, policy.minimal_step.derived(lot.minimal_step.as_ref()))?;
    Ok(fields)
}

/// Tender fields with derived `minimalStep` on the tender and each lot
pub fn tender_fields(tender: &Tender) -> Result<Fields, PolicyError> {
    let policy = tender.variant().policy();
    let mut fields = to_fields(tender)?;
    put_minimal_step(
        &mut fields,
        policy.minimal_step.derived(tender.minimal_step.as_ref()),
    )?;
    let lots = tender
        .lots
        .iter()
        .map(|lot| lot_fields(policy, lot).map(Json::Object))
        .collect::<Result<Vec<_>, _>>()?;
    fields.insert("lots".to_string(), Json::Array(lots));
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Variant;
    use serde_json::json;

    fn stage1() -> &'static VariantPolicy {
        Variant::DialogueStage1EU.policy()
    }

    fn object(value: Json) -> Fields {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn tender_json() -> Fields {
        object(json!({
            "id": "t1",
            "status": "active.pre-qualification",
            "title": "Road repair",
            "owner": "broker",
            "owner_token": "secret",
            "minimalStep": {"amount": 10},
            "bids": [
                {"id": "b1", "status": "active", "owner": "b", "owner_token": "x",
                 "tenderers": [], "value": {"amount": 100},
                 "documents": [{"id": "d1", "url": "http://x", "revisions": []}]},
                {"id": "b2", "status": "unsuccessful", "owner": "c", "owner_token": "y",
                 "tenderers": [], "selfEligible": true, "value": {"amount": 90}},
                {"id": "b3", "status": "deleted", "owner": "d", "owner_token": "z",
                 "tenderers": []}
            ],
            "lots": [{"id": "l1", "title": "Lot", "minimalStep": {"amount": 1}, "numberOfBids": 2}]
        }))
    }

    #[test]
    fn status_view_hides_secrets_and_sifts_bids() {
        let view = project_fields(
            stage1(),
            EntityKind::Tender,
            &tender_json(),
            "active.pre-qualification",
            Direction::Output,
        )
        .unwrap();

        assert!(!view.contains_key("owner_token"));
        assert!(!view.contains_key("minimalStep"));
        assert_eq!(view["title"], "Road repair");

        let bids = view["bids"].as_array().unwrap();
        assert_eq!(
            bids[0],
            json!({"id": "b1", "status": "active", "tenderers": [],
                   "documents": [{"id": "d1", "url": "http://x", "revisions": []}]})
        );
        assert_eq!(
            bids[1],
            json!({"id": "b2", "status": "unsuccessful", "tenderers": [], "selfEligible": true})
        );
        assert_eq!(bids[2], json!({"id": "b3", "status": "deleted"}));

        let lots = view["lots"].as_array().unwrap();
        assert_eq!(lots[0], json!({"id": "l1", "title": "Lot"}));
    }

    #[test]
    fn projection_is_idempotent_for_every_declared_role() {
        for variant in Variant::ALL {
            let policy = variant.policy();
            let roles: Vec<String> = policy.tender_roles.roles().map(str::to_string).collect();
            for role in roles {
                let once = project_fields(
                    policy,
                    EntityKind::Tender,
                    &tender_json(),
                    &role,
                    Direction::Output,
                )
                .unwrap();
                let twice =
                    project_fields(policy, EntityKind::Tender, &once, &role, Direction::Output)
                        .unwrap();
                assert_eq!(once, twice, "{variant} {role}");
            }
        }
    }

    #[test]
    fn view_is_a_fixed_point() {
        let once = project_fields(stage1(), EntityKind::Tender, &tender_json(), "view", Direction::Output)
            .unwrap();
        let twice =
            project_fields(stage1(), EntityKind::Tender, &once, "view", Direction::Output).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_role_fails_fast() {
        let err = project_fields(
            stage1(),
            EntityKind::Tender,
            &tender_json(),
            "edit_active.auction.bogus",
            Direction::Input,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownRole { table: EntityKind::Tender, .. }));
    }

    #[test]
    fn undeclared_read_role_falls_back() {
        let bid = object(json!({"id": "b1", "status": "pending", "owner": "o", "owner_token": "x",
                                "tenderers": [], "value": {"amount": 1}}));
        let view = view_fields(stage1(), EntityKind::Bid, &bid, "active.stage2.waiting").unwrap();
        assert_eq!(
            view,
            object(json!({"id": "b1", "status": "pending", "tenderers": [], "value": {"amount": 1}}))
        );

        let hidden = view_fields(stage1(), EntityKind::Bid, &bid, "active.tendering").unwrap();
        assert!(hidden.is_empty());
    }

    fn tender_with_confidential_bid_document(status: &str) -> Fields {
        object(json!({
            "id": "t1",
            "status": status,
            "title": "Road repair",
            "bids": [{
                "id": "b1", "status": "active", "owner": "b", "owner_token": "x",
                "tenderers": [],
                "documents": [
                    {"id": "d1", "title": "Prices", "url": "http://secret/doc",
                     "confidentiality": "buyerOnly"},
                    {"id": "d2", "title": "Licence", "url": "http://public/doc",
                     "confidentiality": "public"}
                ]
            }],
            "documents": [{"id": "d3", "title": "Terms", "url": "http://owner/doc",
                           "confidentiality": "buyerOnly"}]
        }))
    }

    #[test]
    fn nested_confidential_documents_hide_url_from_readers() {
        for status in ["active.pre-qualification", "active.qualification", "complete"] {
            let view = view_fields(
                stage1(),
                EntityKind::Tender,
                &tender_with_confidential_bid_document(status),
                status,
            )
            .unwrap();

            let documents = view["bids"][0]["documents"].as_array().unwrap();
            assert!(documents[0].get("url").is_none(), "{status}");
            assert_eq!(documents[0]["title"], "Prices");
            assert_eq!(documents[1]["url"], "http://public/doc", "{status}");
            assert!(view["documents"][0].get("url").is_none(), "{status}");
        }
    }

    #[test]
    fn privileged_reader_sees_confidential_content() {
        let tender = tender_with_confidential_bid_document("complete");
        let view = privileged_view_fields(stage1(), EntityKind::Tender, &tender, "complete").unwrap();
        assert_eq!(view["bids"][0]["documents"][0]["url"], "http://secret/doc");
        assert_eq!(view["documents"][0]["url"], "http://owner/doc");
    }

    #[test]
    fn confidential_document_on_its_own_uses_restricted_view() {
        let document = object(json!({"id": "d1", "title": "Prices", "url": "http://secret/doc",
                                     "confidentiality": "buyerOnly"}));
        let view = view_fields(stage1(), EntityKind::Document, &document, "view").unwrap();
        assert!(!view.contains_key("url"));

        let bid = object(json!({"id": "b1", "status": "active", "tenderers": [],
                                "documents": [document.clone()]}));
        let view = view_fields(stage1(), EntityKind::Bid, &bid, "active.pre-qualification").unwrap();
        assert!(view["documents"][0].get("url").is_none());
    }

    #[test]
    fn input_children_use_create_or_edit() {
        let input = object(json!({
            "title": "New",
            "status": "active",
            "lots": [{"id": "l1", "title": "Lot", "minimalStep": {"amount": 1}, "status": "cancelled"}]
        }));
        let accepted =
            project_fields(stage1(), EntityKind::Tender, &input, "create", Direction::Input).unwrap();

        assert!(!accepted.contains_key("status"));
        assert_eq!(accepted["lots"], json!([{"id": "l1", "title": "Lot"}]));
    }

    #[test]
    fn stage1_serialization_never_emits_minimal_step() {
        let tender: Tender = serde_json::from_value(json!({
            "id": "t1",
            "procurementMethodType": "competitiveDialogueUA",
            "status": "active.tendering",
            "title": "Road repair",
            "value": {"amount": 1000},
            "minimalStep": {"amount": 10},
            "lots": [{"id": "l1", "title": "Lot", "value": {"amount": 10}, "minimalStep": {"amount": 1}}]
        }))
        .unwrap();

        let fields = tender_fields(&tender).unwrap();
        assert!(!fields.contains_key("minimalStep"));
        assert!(!fields["lots"][0].as_object().unwrap().contains_key("minimalStep"));
    }

    #[test]
    fn stage2_serialization_defaults_minimal_step_to_zero() {
        let tender: Tender = serde_json::from_value(json!({
            "id": "t2",
            "procurementMethodType": "competitiveDialogueEU.stage2",
            "status": "active.tendering",
            "title": "Road repair",
            "value": {"amount": 1000},
            "lots": [{"id": "l1", "title": "Lot", "value": {"amount": 10}}]
        }))
        .unwrap();

        let fields = tender_fields(&tender).unwrap();
        assert_eq!(fields["minimalStep"]["amount"], json!(0.0));
        assert_eq!(fields["lots"][0]["minimalStep"]["amount"], json!(0.0));
    }

    #[test]
    fn non_object_entities_are_reported() {
        assert!(matches!(to_fields(&"plain"), Err(PolicyError::Unserializable(_))));

        let keyed: std::collections::HashMap<(u8, u8), u8> = [((1, 2), 3)].into();
        assert!(matches!(to_fields(&keyed), Err(PolicyError::Unserializable(_))));
    }
}
