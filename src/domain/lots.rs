use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Period, Value};

/// Lot status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    #[default]
    Active,
    Cancelled,
    Unsuccessful,
    Complete,
}

/// Lot of a tender
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, rename = "title_en", skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, rename = "title_ru", skip_serializing_if = "Option::is_none")]
    pub title_ru: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "description_en", skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    #[serde(default, rename = "description_ru", skip_serializing_if = "Option::is_none")]
    pub description_ru: Option<String>,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarantee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_step: Option<Value>,
    #[serde(default)]
    pub status: LotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}
