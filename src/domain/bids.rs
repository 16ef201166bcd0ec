use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Document, Organization, Value};

/// Bid status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BidStatus {
    #[serde(rename = "draft")]
    Draft,
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "invalid")]
    Invalid,
    #[serde(rename = "invalid.pre-qualification")]
    InvalidPreQualification,
    #[serde(rename = "unsuccessful")]
    Unsuccessful,
    #[serde(rename = "deleted")]
    Deleted,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Draft => "draft",
            BidStatus::Pending => "pending",
            BidStatus::Active => "active",
            BidStatus::Invalid => "invalid",
            BidStatus::InvalidPreQualification => "invalid.pre-qualification",
            BidStatus::Unsuccessful => "unsuccessful",
            BidStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bid value for one lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotValue {
    pub value: Value,
    pub related_lot: String,
}

/// Bid parameter (feature value)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub code: String,
    pub value: f64,
}

/// Bid entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: BidStatus,
    #[serde(default)]
    pub owner: String,
    #[serde(default, rename = "owner_token")]
    pub owner_token: String,
    #[validate(nested)]
    pub tenderers: Vec<Organization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lot_values: Vec<LotValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_qualified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_eligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcontracting_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}
