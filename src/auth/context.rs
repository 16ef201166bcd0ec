use sha2::{Digest, Sha512};

use super::Claims;
use crate::policy::acl::DIALOGUE_GROUP;
use crate::policy::ActorType;

/// Authenticated caller, attached to handlers through the auth extractors
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Platform user name (JWT `sub`)
    pub user_id: String,

    pub actor: ActorType,
}

impl AuthContext {
    /// `role` claims are only honoured on service tokens
    pub fn from_claims(claims: &Claims, service_token: bool) -> Result<Self, &'static str> {
        if claims.sub.trim().is_empty() {
            return Err("Token subject is empty");
        }
        let actor = if service_token {
            ActorType::from_claim(claims.role.as_deref())
        } else {
            ActorType::Broker
        };
        Ok(Self {
            user_id: claims.sub.clone(),
            actor,
        })
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: String::new(),
            actor: ActorType::Anonymous,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.actor == ActorType::Anonymous
    }

    /// ACL principals this caller holds when presenting `access_token`
    pub fn principals(&self, access_token: Option<&str>) -> Vec<String> {
        let mut principals = Vec::new();
        if self.is_anonymous() {
            return principals;
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            principals.push(format!("{}_{}", self.user_id, token));
            principals.push(format!("{}_{}", self.user_id, sha512_hex(token)));
        }
        if self.actor == ActorType::CompetitiveDialogue {
            principals.push(format!("g:{}", DIALOGUE_GROUP));
        }
        principals
    }
}

/// Hex SHA-512 digest, the form in which a first-stage owner token is handed
/// to the second stage
pub fn sha512_hex(token: &str) -> String {
    hex::encode(Sha512::digest(token.as_bytes()))
}
