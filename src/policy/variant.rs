//! Procurement-method variants and the policy data each one carries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::rules::{EntityKind, RoleTable};
use super::{tables, PolicyError};
use crate::domain::{TenderStatus, Value};

/// Competitive dialogue tender variant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Variant {
    #[serde(rename = "competitiveDialogueEU")]
    DialogueStage1EU,
    #[serde(rename = "competitiveDialogueUA")]
    DialogueStage1UA,
    #[serde(rename = "competitiveDialogueEU.stage2")]
    DialogueStage2EU,
    #[serde(rename = "competitiveDialogueUA.stage2")]
    DialogueStage2UA,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::DialogueStage1EU,
        Variant::DialogueStage1UA,
        Variant::DialogueStage2EU,
        Variant::DialogueStage2UA,
    ];

    /// `procurementMethodType` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::DialogueStage1EU => "competitiveDialogueEU",
            Variant::DialogueStage1UA => "competitiveDialogueUA",
            Variant::DialogueStage2EU => "competitiveDialogueEU.stage2",
            Variant::DialogueStage2UA => "competitiveDialogueUA.stage2",
        }
    }

    pub fn is_stage2(&self) -> bool {
        matches!(self, Variant::DialogueStage2EU | Variant::DialogueStage2UA)
    }

    pub fn policy(&self) -> &'static VariantPolicy {
        match self {
            Variant::DialogueStage1EU => &STAGE1_EU,
            Variant::DialogueStage1UA => &STAGE1_UA,
            Variant::DialogueStage2EU => &STAGE2_EU,
            Variant::DialogueStage2UA => &STAGE2_UA,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown procurementMethodType '{}'", s))
    }
}

/// What happens to `minimalStep` on tenders and lots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimalStepPolicy {
    /// Rejected on input as a rogue field; never serialized
    Forbidden,
    /// Required, zero when not supplied
    RequiredDefaultZero,
}

impl MinimalStepPolicy {
    /// The value exposed on output for a stored `minimalStep`
    pub fn derived(&self, stored: Option<&Value>) -> Option<Value> {
        match self {
            MinimalStepPolicy::Forbidden => None,
            MinimalStepPolicy::RequiredDefaultZero => {
                Some(stored.cloned().unwrap_or_else(Value::zero))
            }
        }
    }
}

/// Which credential grants the ACL carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclPolicy {
    /// Stage-transition service may read the owner credentials
    pub group_extracts_credentials: bool,
    /// Owner keyed by dialogue token may bootstrap fresh credentials
    pub dialogue_token_generates_credentials: bool,
}

/// Everything that differs between variants, as data
#[derive(Debug)]
pub struct VariantPolicy {
    pub variant: Variant,
    pub statuses: &'static [TenderStatus],
    pub initial_status: TenderStatus,
    /// EU procedures publish in English as well
    pub requires_english_title: bool,
    pub minimal_step: MinimalStepPolicy,
    pub acl: AclPolicy,
    pub tender_roles: RoleTable,
    pub bid_roles: RoleTable,
    pub lot_roles: RoleTable,
    pub document_roles: RoleTable,
}

const STAGE1_STATUSES: &[TenderStatus] = &[
    TenderStatus::Draft,
    TenderStatus::ActiveTendering,
    TenderStatus::ActivePreQualification,
    TenderStatus::ActivePreQualificationStandStill,
    TenderStatus::ActiveStage2Pending,
    TenderStatus::ActiveStage2Waiting,
    TenderStatus::Complete,
    TenderStatus::Cancelled,
    TenderStatus::Unsuccessful,
];

const STAGE2_STATUSES: &[TenderStatus] = &[
    TenderStatus::Draft,
    TenderStatus::ActiveTendering,
    TenderStatus::ActivePreQualification,
    TenderStatus::ActivePreQualificationStandStill,
    TenderStatus::ActiveAuction,
    TenderStatus::ActiveQualification,
    TenderStatus::ActiveAwarded,
    TenderStatus::Complete,
    TenderStatus::Cancelled,
    TenderStatus::Unsuccessful,
    TenderStatus::DraftStage2,
];

/// Role keys every tender table must declare
const FIXED_TENDER_ROLES: &[&str] = &[
    "plain",
    "create",
    "view",
    "listing",
    "chronograph",
    "chronograph_view",
    "Administrator",
    "default",
    "contracting",
    "competitive_dialogue",
];

const FIXED_CHILD_ROLES: &[&str] = &["create", "edit", "view", "embedded"];

fn stage1(variant: Variant) -> VariantPolicy {
    VariantPolicy {
        variant,
        statuses: STAGE1_STATUSES,
        initial_status: TenderStatus::ActiveTendering,
        requires_english_title: variant == Variant::DialogueStage1EU,
        minimal_step: MinimalStepPolicy::Forbidden,
        acl: AclPolicy {
            group_extracts_credentials: true,
            dialogue_token_generates_credentials: false,
        },
        tender_roles: tables::stage1_tender_roles(),
        bid_roles: tables::bid_roles(),
        lot_roles: tables::stage1_lot_roles(),
        document_roles: tables::document_roles(),
    }
}

fn stage2(variant: Variant) -> VariantPolicy {
    VariantPolicy {
        variant,
        statuses: STAGE2_STATUSES,
        initial_status: TenderStatus::DraftStage2,
        requires_english_title: variant == Variant::DialogueStage2EU,
        minimal_step: MinimalStepPolicy::RequiredDefaultZero,
        acl: AclPolicy {
            group_extracts_credentials: false,
            dialogue_token_generates_credentials: true,
        },
        tender_roles: tables::stage2_tender_roles(),
        bid_roles: tables::bid_roles(),
        lot_roles: tables::stage2_lot_roles(),
        document_roles: tables::document_roles(),
    }
}

static STAGE1_EU: LazyLock<VariantPolicy> = LazyLock::new(|| stage1(Variant::DialogueStage1EU));
static STAGE1_UA: LazyLock<VariantPolicy> = LazyLock::new(|| stage1(Variant::DialogueStage1UA));
static STAGE2_EU: LazyLock<VariantPolicy> = LazyLock::new(|| stage2(Variant::DialogueStage2EU));
static STAGE2_UA: LazyLock<VariantPolicy> = LazyLock::new(|| stage2(Variant::DialogueStage2UA));

impl VariantPolicy {
    pub fn table(&self, kind: EntityKind) -> &RoleTable {
        match kind {
            EntityKind::Tender => &self.tender_roles,
            EntityKind::Bid => &self.bid_roles,
            EntityKind::Lot => &self.lot_roles,
            EntityKind::Document => &self.document_roles,
        }
    }

    pub fn declares(&self, status: TenderStatus) -> bool {
        self.statuses.contains(&status)
    }

    /// Parse a status string and require it to be declared for this variant
    pub fn status(&self, status: &str) -> Result<TenderStatus, PolicyError> {
        status
            .parse::<TenderStatus>()
            .ok()
            .filter(|s| self.declares(*s))
            .ok_or_else(|| PolicyError::UndeclaredStatus {
                variant: self.variant,
                status: status.to_string(),
            })
    }

    /// Verify the tables cover every declared status and fixed role
    pub fn check(&self) -> Result<(), PolicyError> {
        let tender = &self.tender_roles;
        let mut missing: Vec<String> = FIXED_TENDER_ROLES
            .iter()
            .filter(|role| !tender.contains(role))
            .map(|role| role.to_string())
            .collect();
        for status in self.statuses {
            let edit = format!("edit_{}", status);
            if !tender.contains(&edit) {
                missing.push(edit);
            }
        }
        if !missing.is_empty() {
            return Err(PolicyError::MissingRoleEntries {
                variant: self.variant,
                table: EntityKind::Tender,
                missing,
            });
        }

        for kind in [EntityKind::Bid, EntityKind::Lot, EntityKind::Document] {
            let table = self.table(kind);
            let missing: Vec<String> = FIXED_CHILD_ROLES
                .iter()
                .filter(|role| !table.contains(role))
                .map(|role| role.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(PolicyError::MissingRoleEntries {
                    variant: self.variant,
                    table: kind,
                    missing,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_policy_is_complete() {
        for variant in Variant::ALL {
            variant.policy().check().unwrap();
        }
    }

    #[test]
    fn status_sets_match_stage() {
        let stage1 = Variant::DialogueStage1EU.policy();
        assert!(stage1.declares(TenderStatus::ActiveStage2Waiting));
        assert!(!stage1.declares(TenderStatus::ActiveAuction));
        assert!(!stage1.declares(TenderStatus::DraftStage2));

        let stage2 = Variant::DialogueStage2UA.policy();
        assert!(stage2.declares(TenderStatus::DraftStage2));
        assert!(stage2.declares(TenderStatus::ActiveAwarded));
        assert!(!stage2.declares(TenderStatus::ActiveStage2Pending));
    }

    #[test]
    fn status_outside_variant_is_rejected() {
        let policy = Variant::DialogueStage1UA.policy();
        assert_eq!(
            policy.status("active.pre-qualification").unwrap(),
            TenderStatus::ActivePreQualification
        );
        assert!(matches!(
            policy.status("active.auction"),
            Err(PolicyError::UndeclaredStatus { .. })
        ));
        assert!(policy.status("bogus").is_err());
    }

    #[test]
    fn procurement_method_type_round_trips_through_str() {
        for variant in Variant::ALL {
            assert_eq!(variant.as_str().parse::<Variant>().unwrap(), variant);
        }
        assert!("belowThreshold".parse::<Variant>().is_err());
    }

    #[test]
    fn minimal_step_derivation() {
        let step = Value::zero();
        assert_eq!(MinimalStepPolicy::Forbidden.derived(Some(&step)), None);
        assert_eq!(
            MinimalStepPolicy::RequiredDefaultZero.derived(None),
            Some(Value::zero())
        );
    }
}
