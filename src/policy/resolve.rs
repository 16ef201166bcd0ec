//! Role resolution from actor type and live status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of the authenticated caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorType {
    Administrator,
    /// Automated deadline processing
    #[serde(rename = "chronograph")]
    Chronograph,
    /// Service moving a dialogue from the first stage to the second
    #[serde(rename = "competitive_dialogue")]
    CompetitiveDialogue,
    /// Any other authenticated platform user (owner or bidder)
    #[serde(rename = "broker")]
    Broker,
    #[serde(rename = "anonymous")]
    Anonymous,
}

impl ActorType {
    /// Map a token `role` claim onto an actor type
    pub fn from_claim(role: Option<&str>) -> Self {
        match role {
            Some("Administrator") => ActorType::Administrator,
            Some("chronograph") => ActorType::Chronograph,
            Some("competitive_dialogue") => ActorType::CompetitiveDialogue,
            _ => ActorType::Broker,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Administrator => "Administrator",
            ActorType::Chronograph => "chronograph",
            ActorType::CompetitiveDialogue => "competitive_dialogue",
            ActorType::Broker => "broker",
            ActorType::Anonymous => "anonymous",
        }
    }

    /// Service actors that bypass owner credentials on tender edits
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            ActorType::Administrator | ActorType::Chronograph | ActorType::CompetitiveDialogue
        )
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role key governing an edit by `actor` on an entity currently in `status`.
///
/// First match wins: Administrator, chronograph, competitive_dialogue, then
/// `edit_<status>`.
pub fn resolve_role(actor: ActorType, status: &str) -> String {
    match actor {
        ActorType::Administrator => "Administrator".to_string(),
        ActorType::Chronograph => "chronograph".to_string(),
        ActorType::CompetitiveDialogue => "competitive_dialogue".to_string(),
        ActorType::Broker | ActorType::Anonymous => format!("edit_{}", status),
    }
}

/// Role key for read access; the status itself, whoever is reading.
///
/// Missing keys fall back to the table's default entry at lookup.
pub fn view_role_key(status: &str) -> &str {
    status
}
