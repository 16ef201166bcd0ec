use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use super::{Bid, Document, Identifier, Lot, Period, Value};
use crate::policy::Variant;

/// Tender status, across all dialogue variants.
///
/// Each variant declares which of these it accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TenderStatus {
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "draft.stage2")]
    DraftStage2,
    #[serde(rename = "active.tendering")]
    ActiveTendering,
    #[serde(rename = "active.pre-qualification")]
    ActivePreQualification,
    #[serde(rename = "active.pre-qualification.stand-still")]
    ActivePreQualificationStandStill,
    #[serde(rename = "active.stage2.pending")]
    ActiveStage2Pending,
    #[serde(rename = "active.stage2.waiting")]
    ActiveStage2Waiting,
    #[serde(rename = "active.auction")]
    ActiveAuction,
    #[serde(rename = "active.qualification")]
    ActiveQualification,
    #[serde(rename = "active.awarded")]
    ActiveAwarded,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "unsuccessful")]
    Unsuccessful,
}

impl TenderStatus {
    pub const ALL: [TenderStatus; 13] = [
        TenderStatus::Draft,
        TenderStatus::DraftStage2,
        TenderStatus::ActiveTendering,
        TenderStatus::ActivePreQualification,
        TenderStatus::ActivePreQualificationStandStill,
        TenderStatus::ActiveStage2Pending,
        TenderStatus::ActiveStage2Waiting,
        TenderStatus::ActiveAuction,
        TenderStatus::ActiveQualification,
        TenderStatus::ActiveAwarded,
        TenderStatus::Complete,
        TenderStatus::Cancelled,
        TenderStatus::Unsuccessful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Draft => "draft",
            TenderStatus::DraftStage2 => "draft.stage2",
            TenderStatus::ActiveTendering => "active.tendering",
            TenderStatus::ActivePreQualification => "active.pre-qualification",
            TenderStatus::ActivePreQualificationStandStill => "active.pre-qualification.stand-still",
            TenderStatus::ActiveStage2Pending => "active.stage2.pending",
            TenderStatus::ActiveStage2Waiting => "active.stage2.waiting",
            TenderStatus::ActiveAuction => "active.auction",
            TenderStatus::ActiveQualification => "active.qualification",
            TenderStatus::ActiveAwarded => "active.awarded",
            TenderStatus::Complete => "complete",
            TenderStatus::Cancelled => "cancelled",
            TenderStatus::Unsuccessful => "unsuccessful",
        }
    }
}

impl std::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown tender status '{}'", s))
    }
}

/// Reference to a lot by id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LotId {
    pub id: String,
}

/// Shortlisted participant carried from the first stage into the second
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Firms {
    #[validate(nested)]
    pub identifier: Identifier,
    #[validate(length(min = 1, message = "This field is required."))]
    pub name: String,
    #[serde(default)]
    pub lots: Vec<LotId>,
}

/// Competitive dialogue tender, any stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "tenderID", skip_serializing_if = "Option::is_none")]
    pub tender_id: Option<String>,
    pub procurement_method_type: Variant,
    pub status: TenderStatus,
    pub title: String,
    #[serde(default, rename = "title_en", skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: String,
    #[serde(default, rename = "owner_token")]
    pub owner_token: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_step: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enquiry_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tender_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_period: Option<Period>,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub lots: Vec<Lot>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default, rename = "stage2TenderID", skip_serializing_if = "Option::is_none")]
    pub stage2_tender_id: Option<String>,
    #[serde(default, rename = "dialogue_token", skip_serializing_if = "Option::is_none")]
    pub dialogue_token: Option<String>,
    #[serde(default, rename = "dialogueID", skip_serializing_if = "Option::is_none")]
    pub dialogue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortlisted_firms: Option<Vec<Firms>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
}

impl Tender {
    pub fn variant(&self) -> Variant {
        self.procurement_method_type
    }

    pub fn bid(&self, bid_id: &str) -> Option<&Bid> {
        self.bids.iter().find(|b| b.id == bid_id)
    }

    pub fn bid_mut(&mut self, bid_id: &str) -> Option<&mut Bid> {
        self.bids.iter_mut().find(|b| b.id == bid_id)
    }

    pub fn lot(&self, lot_id: &str) -> Option<&Lot> {
        self.lots.iter().find(|l| l.id == lot_id)
    }

    pub fn lot_mut(&mut self, lot_id: &str) -> Option<&mut Lot> {
        self.lots.iter_mut().find(|l| l.id == lot_id)
    }
}
