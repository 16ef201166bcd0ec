use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Who may read a document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Confidentiality {
    #[default]
    #[serde(rename = "public")]
    Public,
    /// Visible to the procuring entity only. Older clients send "restricted".
    #[serde(rename = "buyerOnly", alias = "restricted")]
    BuyerOnly,
}

/// Earlier upload of the same document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRevision {
    pub url: String,
    pub date_modified: DateTime<Utc>,
}

/// Document attached to a tender or a bid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[validate(url(message = "Not a well formed URL."))]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub confidentiality: Confidentiality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidentiality_rationale: Option<String>,
    /// Description of the decision to purchase; exempt from the rationale rule
    #[serde(default)]
    pub is_description_decision: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<DocumentRevision>,
}

impl Document {
    /// Stamp server-side fields on a freshly accepted document
    pub fn publish(&mut self, author: &str, now: DateTime<Utc>) {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().simple().to_string();
        }
        self.author = Some(author.to_string());
        self.date_published = Some(now);
        self.date_modified = Some(now);
    }

    pub fn is_public(&self) -> bool {
        self.confidentiality == Confidentiality::Public
    }
}
