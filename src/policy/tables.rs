//! Declarative role tables
//!
//! The base tables describe the generic above-threshold tender; the dialogue
//! stages inherit them and patch individual entries.

use super::rules::{EntityKind, Rule, RoleTable};

/// Storage-internal keys that never leave the service
fn internal() -> Rule {
    Rule::deny(["_id", "_rev", "doc_type"])
}

fn hide_minimal_step() -> Rule {
    Rule::deny(["minimalStep"])
}

fn hide_dialogue_token() -> Rule {
    Rule::deny(["dialogue_token"])
}

fn close_edit_technical_fields() -> Rule {
    Rule::deny(["dialogue_token", "shortlistedFirms", "dialogueID"])
}

fn plain_role() -> Rule {
    Rule::deny(["_attachments", "revisions", "dateModified"]).and(internal())
}

fn create_role() -> Rule {
    Rule::deny([
        "id",
        "owner",
        "owner_token",
        "_attachments",
        "revisions",
        "date",
        "dateModified",
        "tenderID",
        "bids",
        "documents",
        "awards",
        "questions",
        "complaints",
        "auctionUrl",
        "status",
        "auctionPeriod",
        "awardPeriod",
        "procurementMethod",
        "awardCriteria",
        "submissionMethod",
        "numberOfBidders",
        "cancellations",
    ])
    .and(internal())
}

fn edit_role() -> Rule {
    Rule::deny([
        "id",
        "status",
        "procurementMethodType",
        "lots",
        "owner",
        "owner_token",
        "_attachments",
        "revisions",
        "date",
        "dateModified",
        "tenderID",
        "bids",
        "documents",
        "awards",
        "questions",
        "complaints",
        "auctionUrl",
        "auctionPeriod",
        "awardPeriod",
        "procurementMethod",
        "awardCriteria",
        "submissionMethod",
        "mode",
        "cancellations",
    ])
    .and(internal())
}

fn edit_role_eu() -> Rule {
    edit_role().and(Rule::deny(["enquiryPeriod"]))
}

fn view_role() -> Rule {
    Rule::deny(["owner_token", "_attachments", "revisions"]).and(internal())
}

fn listing_role() -> Rule {
    Rule::allow(["dateModified", "id"])
}

fn enquiries_role() -> Rule {
    Rule::deny(["owner_token", "_attachments", "revisions", "bids", "numberOfBids"]).and(internal())
}

fn pre_qualifications_role() -> Rule {
    Rule::deny(["owner_token", "_attachments", "revisions"]).and(internal())
}

fn chronograph_role() -> Rule {
    Rule::allow([
        "status",
        "enquiryPeriod",
        "tenderPeriod",
        "auctionPeriod",
        "awardPeriod",
        "lots",
    ])
}

fn chronograph_view_role() -> Rule {
    Rule::allow([
        "status",
        "enquiryPeriod",
        "tenderPeriod",
        "auctionPeriod",
        "awardPeriod",
        "awards",
        "lots",
        "id",
        "dateModified",
        "submissionMethodDetails",
        "mode",
        "numberOfBids",
        "complaints",
        "procurementMethodType",
    ])
}

fn administrator_role() -> Rule {
    Rule::allow(["status", "mode", "procuringEntity", "auctionPeriod", "lots"])
}

fn contracting_role() -> Rule {
    Rule::allow(["id", "owner"])
}

fn edit_stage2_waiting() -> Rule {
    Rule::allow(["status", "stage2TenderID"])
}

/// Tender table shared by every dialogue stage
pub fn base_tender_roles() -> RoleTable {
    RoleTable::new(EntityKind::Tender, "default")
        .with("plain", plain_role())
        .with("create", create_role())
        .with("edit", edit_role_eu())
        .with("edit_draft", edit_role_eu())
        .with("edit_active.tendering", edit_role_eu())
        .with("edit_active.pre-qualification", Rule::allow(["status"]))
        .with("edit_active.pre-qualification.stand-still", Rule::nothing())
        .with("edit_active.auction", Rule::nothing())
        .with("edit_active.qualification", Rule::nothing())
        .with("edit_active.awarded", Rule::nothing())
        .with("edit_complete", Rule::nothing())
        .with("edit_unsuccessful", Rule::nothing())
        .with("edit_cancelled", Rule::nothing())
        .with("view", view_role())
        .with("listing", listing_role())
        .with(
            "auction_view",
            Rule::allow([
                "tenderID",
                "dateModified",
                "bids",
                "auctionPeriod",
                "minimalStep",
                "auctionUrl",
                "features",
                "lots",
                "items",
                "procurementMethodType",
            ]),
        )
        .with("auction_post", Rule::allow(["bids"]))
        .with("auction_patch", Rule::allow(["auctionUrl", "bids", "lots"]))
        .with("draft", enquiries_role())
        .with("active.tendering", enquiries_role())
        .with("active.pre-qualification", pre_qualifications_role())
        .with("active.pre-qualification.stand-still", pre_qualifications_role())
        .with("active.auction", pre_qualifications_role())
        .with("active.qualification", view_role())
        .with("active.awarded", view_role())
        .with("complete", view_role())
        .with("unsuccessful", view_role())
        .with("cancelled", view_role())
        .with("chronograph", chronograph_role())
        .with("chronograph_view", chronograph_view_role())
        .with("Administrator", administrator_role())
        .with("default", internal())
        .with("contracting", contracting_role())
}

/// First stage: `minimalStep` is hidden everywhere it could appear
pub fn stage1_tender_roles() -> RoleTable {
    RoleTable::inherit(
        &base_tender_roles(),
        [
            ("plain", plain_role().and(hide_minimal_step())),
            ("create", create_role().and(hide_minimal_step())),
            ("view", view_role().and(hide_minimal_step())),
            ("listing", listing_role()),
            (
                "active.pre-qualification",
                pre_qualifications_role().and(hide_minimal_step()),
            ),
            (
                "active.pre-qualification.stand-still",
                pre_qualifications_role().and(hide_minimal_step()),
            ),
            ("active.stage2.pending", enquiries_role().and(hide_minimal_step())),
            (
                "active.stage2.waiting",
                pre_qualifications_role().and(hide_minimal_step()),
            ),
            ("edit_active.stage2.pending", Rule::allow(["status"])),
            ("edit_active.stage2.waiting", Rule::nothing()),
            ("draft", enquiries_role().and(hide_minimal_step())),
            ("active.tendering", enquiries_role().and(hide_minimal_step())),
            ("complete", view_role().and(hide_minimal_step())),
            ("unsuccessful", view_role().and(hide_minimal_step())),
            ("cancelled", view_role().and(hide_minimal_step())),
            ("chronograph", chronograph_role()),
            ("chronograph_view", chronograph_view_role()),
            ("Administrator", administrator_role()),
            ("default", internal().and(hide_minimal_step())),
            ("contracting", contracting_role()),
            ("competitive_dialogue", edit_stage2_waiting()),
        ],
    )
}

/// Second stage: the dialogue credentials are hidden or locked instead
pub fn stage2_tender_roles() -> RoleTable {
    let create = Rule::deny([
        "id",
        "owner_token",
        "tenderPeriod",
        "_attachments",
        "revisions",
        "dateModified",
        "tenderID",
        "bids",
        "documents",
        "awards",
        "questions",
        "complaints",
        "auctionUrl",
        "status",
        "auctionPeriod",
        "awardPeriod",
        "awardCriteria",
        "submissionMethod",
        "cancellations",
    ])
    .and(internal());
    let edit = || edit_role_eu().and(close_edit_technical_fields());

    RoleTable::inherit(
        &base_tender_roles(),
        [
            ("plain", plain_role()),
            ("create", create),
            ("edit", edit()),
            ("edit_draft", edit()),
            // Only `status` is writable; which moves are legal is checked on accept
            ("edit_draft.stage2", Rule::allow(["status"])),
            ("edit_active.tendering", edit()),
            ("edit_active.pre-qualification", Rule::allow(["status"])),
            ("edit_active.pre-qualification.stand-still", Rule::nothing()),
            ("edit_active.auction", Rule::nothing()),
            ("edit_active.qualification", Rule::nothing()),
            ("edit_active.awarded", Rule::nothing()),
            ("edit_complete", Rule::nothing()),
            ("edit_unsuccessful", Rule::nothing()),
            ("edit_cancelled", Rule::nothing()),
            ("view", view_role().and(hide_dialogue_token())),
            ("listing", listing_role()),
            (
                "draft",
                enquiries_role().and(Rule::deny(["dialogue_token", "shortlistedFirms"])),
            ),
            ("draft.stage2", enquiries_role().and(hide_dialogue_token())),
            ("active.tendering", enquiries_role().and(hide_dialogue_token())),
            (
                "active.pre-qualification",
                pre_qualifications_role().and(hide_dialogue_token()),
            ),
            (
                "active.pre-qualification.stand-still",
                pre_qualifications_role().and(hide_dialogue_token()),
            ),
            ("active.auction", pre_qualifications_role().and(hide_dialogue_token())),
            ("active.qualification", view_role().and(hide_dialogue_token())),
            ("active.awarded", view_role().and(hide_dialogue_token())),
            ("complete", view_role().and(hide_dialogue_token())),
            ("unsuccessful", view_role().and(hide_dialogue_token())),
            ("cancelled", view_role().and(hide_dialogue_token())),
            ("default", internal()),
            ("competitive_dialogue", edit_stage2_waiting()),
        ],
    )
}

fn view_bid_role() -> Rule {
    Rule::deny(["owner_token", "owner"]).and(internal())
}

fn bid_summary_role() -> Rule {
    Rule::allow(["id", "status", "documents", "tenderers"])
}

pub fn bid_roles() -> RoleTable {
    RoleTable::new(EntityKind::Bid, "embedded")
        .with("Administrator", Rule::allow(["tenderers"]))
        .with("embedded", view_bid_role())
        .with("view", view_bid_role())
        .with(
            "create",
            Rule::allow([
                "value",
                "tenderers",
                "parameters",
                "lotValues",
                "status",
                "selfQualified",
                "selfEligible",
                "subcontractingDetails",
            ]),
        )
        .with(
            "edit",
            Rule::allow([
                "value",
                "tenderers",
                "parameters",
                "lotValues",
                "status",
                "subcontractingDetails",
            ]),
        )
        .with("active.enquiries", Rule::nothing())
        .with("active.tendering", Rule::nothing())
        .with("active.pre-qualification", bid_summary_role())
        .with("active.pre-qualification.stand-still", bid_summary_role())
        .with("active.auction", bid_summary_role())
        .with("active.stage2.pending", bid_summary_role())
        .with("active.qualification", view_bid_role())
        .with("complete", view_bid_role())
        .with("unsuccessful", view_bid_role())
        .with(
            "bid.unsuccessful",
            Rule::allow([
                "id",
                "status",
                "tenderers",
                "parameters",
                "selfQualified",
                "selfEligible",
                "subcontractingDetails",
            ]),
        )
        .with("cancelled", view_bid_role())
        .with("invalid", Rule::allow(["id", "status"]))
        .with("invalid.pre-qualification", Rule::allow(["id", "status"]))
        .with("deleted", Rule::allow(["id", "status"]))
}

const LOT_TEXT_FIELDS: [&str; 6] = [
    "title",
    "title_en",
    "title_ru",
    "description",
    "description_en",
    "description_ru",
];

fn default_lot_role() -> Rule {
    Rule::deny(["numberOfBids"]).and(internal())
}

/// Lot table with `minimalStep` as an ordinary field
pub fn base_lot_roles() -> RoleTable {
    let create = ["id"]
        .into_iter()
        .chain(LOT_TEXT_FIELDS)
        .chain(["value", "guarantee", "minimalStep"]);
    let edit = LOT_TEXT_FIELDS
        .into_iter()
        .chain(["value", "guarantee", "minimalStep"]);

    RoleTable::new(EntityKind::Lot, "default")
        .with("create", Rule::allow(create))
        .with("edit", Rule::allow(edit))
        .with("embedded", default_lot_role())
        .with("view", default_lot_role())
        .with("default", default_lot_role())
        .with("chronograph", Rule::allow(["id", "auctionPeriod"]))
        .with(
            "chronograph_view",
            Rule::allow(["id", "auctionPeriod", "numberOfBids", "status"]),
        )
}

/// First-stage lots never take or show `minimalStep`
pub fn stage1_lot_roles() -> RoleTable {
    let create = ["id"]
        .into_iter()
        .chain(LOT_TEXT_FIELDS)
        .chain(["value", "guarantee"]);
    let edit = LOT_TEXT_FIELDS.into_iter().chain(["value", "guarantee"]);

    RoleTable::inherit(
        &base_lot_roles(),
        [
            ("create", Rule::allow(create)),
            ("edit", Rule::allow(edit)),
            ("view", default_lot_role().and(hide_minimal_step())),
            ("default", default_lot_role().and(hide_minimal_step())),
        ],
    )
}

pub fn stage2_lot_roles() -> RoleTable {
    base_lot_roles()
}

pub fn document_roles() -> RoleTable {
    let base = RoleTable::new(EntityKind::Document, "embedded")
        .with(
            "create",
            Rule::deny(["id", "datePublished", "dateModified", "author", "revisions"]),
        )
        .with(
            "edit",
            Rule::deny(["id", "url", "datePublished", "dateModified"]),
        )
        .with("embedded", Rule::deny(["url"]).and(internal()))
        .with("view", Rule::deny(["revisions"]).and(internal()))
        .with("revisions", Rule::allow(["url", "dateModified"]));

    RoleTable::inherit(
        &base,
        [
            ("embedded", internal()),
            (
                "restricted_view",
                Rule::deny(["revisions", "url"]).and(internal()),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage1_hides_minimal_step_in_status_views() {
        let table = stage1_tender_roles();
        for role in ["view", "active.tendering", "active.stage2.waiting", "default"] {
            assert!(!table.get(role).unwrap().permits("minimalStep"), "{role}");
        }
        assert!(!table.get("create").unwrap().permits("minimalStep"));
    }

    #[test]
    fn stage2_hides_dialogue_token_but_shows_minimal_step() {
        let table = stage2_tender_roles();
        let view = table.get("view").unwrap();
        assert!(!view.permits("dialogue_token"));
        assert!(view.permits("minimalStep"));
        assert!(view.permits("shortlistedFirms"));
        assert!(!table.get("draft").unwrap().permits("shortlistedFirms"));
    }

    #[test]
    fn stage2_edit_locks_dialogue_fields() {
        let edit = stage2_tender_roles();
        let edit = edit.get("edit_active.tendering").unwrap();
        for field in ["dialogue_token", "shortlistedFirms", "dialogueID", "status", "owner_token"] {
            assert!(!edit.permits(field), "{field}");
        }
        assert!(edit.permits("title"));
    }

    #[test]
    fn stage2_create_accepts_owner_and_dialogue_fields() {
        let table = stage2_tender_roles();
        let create = table.get("create").unwrap();
        assert!(create.permits("owner"));
        assert!(create.permits("dialogue_token"));
        assert!(!create.permits("owner_token"));
        assert!(!create.permits("tenderPeriod"));
    }

    #[test]
    fn stage_transition_service_edits_status_and_link_only() {
        let table = stage1_tender_roles();
        let rule = table.get("competitive_dialogue").unwrap();
        assert!(rule.permits("status"));
        assert!(rule.permits("stage2TenderID"));
        assert!(!rule.permits("title"));
    }

    #[test]
    fn stage1_lots_drop_minimal_step_from_every_input_role() {
        let table = stage1_lot_roles();
        assert!(!table.get("create").unwrap().permits("minimalStep"));
        assert!(!table.get("edit").unwrap().permits("minimalStep"));
        assert!(stage2_lot_roles().get("create").unwrap().permits("minimalStep"));
    }

    #[test]
    fn restricted_document_view_hides_url() {
        let table = document_roles();
        assert!(table.get("view").unwrap().permits("url"));
        assert!(!table.get("restricted_view").unwrap().permits("url"));
        assert!(!table.get("view").unwrap().permits("revisions"));
    }
}
