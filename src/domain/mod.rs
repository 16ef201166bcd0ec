//! Domain types
//!
//! Entities of a competitive dialogue tender. Field names serialize the way
//! the public procurement API exposes them (camelCase, with a few legacy
//! snake_case credentials), because the policy tables filter on those names.

pub mod bids;
pub mod documents;
pub mod lots;
pub mod tenders;

pub use bids::*;
pub use documents::*;
pub use lots::*;
pub use tenders::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Monetary value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub value_added_tax_included: bool,
}

impl Value {
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
            currency: default_currency(),
            value_added_tax_included: true,
        }
    }
}

fn default_currency() -> String {
    "UAH".to_string()
}

fn default_true() -> bool {
    true
}

/// Date range
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Registry identifier of an organization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[validate(length(min = 1, message = "This field is required."))]
    pub scheme: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Tenderer or procuring entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[validate(length(min = 1, message = "This field is required."))]
    pub name: String,
    #[validate(nested)]
    pub identifier: Identifier,
}
