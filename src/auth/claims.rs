use serde::{Deserialize, Serialize};

/// JWT claims carried by broker and service tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (platform user name)
    pub sub: String,

    /// Audience
    pub aud: String,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Actor type of internal services: `chronograph`,
    /// `competitive_dialogue` or `Administrator`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}
