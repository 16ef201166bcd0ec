//! Token verification: broker tokens signed by the identity provider (RS256,
//! keys from its JWKS endpoint) and internal service tokens signed with a
//! shared secret (HS256).

use anyhow::{Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{AuthContext, Claims};
use crate::config::Settings;

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Default)]
struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

/// RSA keys of the identity provider, refetched once the TTL lapses
#[derive(Clone)]
pub struct JwksKeys {
    inner: Arc<RwLock<KeySet>>,
    jwks_url: String,
    issuer: String,
    ttl: Duration,
    http: reqwest::Client,
}

impl JwksKeys {
    pub fn new(jwks_url: String, issuer: String, ttl_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            inner: Arc::new(RwLock::new(KeySet::default())),
            jwks_url,
            issuer,
            ttl: Duration::from_secs(ttl_seconds),
            http,
        })
    }

    async fn key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let set = self.inner.read();
            let fresh = set.fetched_at.is_some_and(|at| at.elapsed() < self.ttl);
            if let (true, Some(key)) = (fresh, set.keys.get(kid)) {
                return Ok(key.clone());
            }
        }

        self.refresh().await?;

        self.inner
            .read()
            .keys
            .get(kid)
            .cloned()
            .context("Key not found in JWKS")
    }

    async fn refresh(&self) -> Result<()> {
        // At most one fetch per second, whatever the kid
        if self
            .inner
            .read()
            .fetched_at
            .is_some_and(|at| at.elapsed() < Duration::from_secs(1))
        {
            return Ok(());
        }

        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("Failed to fetch JWKS")?;
        if !response.status().is_success() {
            anyhow::bail!("JWKS fetch failed with status: {}", response.status());
        }
        let jwks: JwksResponse = response.json().await.context("Failed to parse JWKS")?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys.into_iter().filter(|k| k.kty == "RSA") {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => tracing::warn!(kid = %jwk.kid, error = %e, "Skipping unusable JWK"),
            }
        }

        let mut set = self.inner.write();
        set.keys = keys;
        set.fetched_at = Some(Instant::now());
        tracing::info!(keys = set.keys.len(), "JWKS refreshed");
        Ok(())
    }
}

/// Verifies bearer tokens and turns them into an [`AuthContext`]
#[derive(Clone)]
pub struct TokenVerifier {
    jwks: Option<JwksKeys>,
    service_key: Option<DecodingKey>,
    audience: String,
}

impl TokenVerifier {
    pub fn new(jwks: Option<JwksKeys>, service_secret: Option<&str>, audience: String) -> Self {
        Self {
            jwks,
            service_key: service_secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            audience,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let jwks = settings
            .jwt_jwks_url
            .clone()
            .map(|url| {
                JwksKeys::new(
                    url,
                    settings.jwt_issuer.clone(),
                    settings.jwks_cache_ttl_seconds,
                )
            })
            .transpose()?;
        Ok(Self::new(
            jwks,
            settings.service_jwt_secret.as_deref(),
            settings.jwt_audience.clone(),
        ))
    }

    /// Fetch signing keys ahead of the first request
    pub async fn warm(&self) -> Result<()> {
        match &self.jwks {
            Some(jwks) => jwks.refresh().await,
            None => Ok(()),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<AuthContext> {
        let header = decode_header(token).context("Invalid JWT header")?;

        let (claims, service_token) = match header.alg {
            Algorithm::RS256 => {
                let jwks = self.jwks.as_ref().context("RS256 tokens are not accepted")?;
                let kid = header.kid.context("JWT missing kid header")?;
                let key = jwks.key(&kid).await?;
                let mut validation = self.validation(Algorithm::RS256);
                validation.set_issuer(&[&jwks.issuer]);
                (self.decode(token, &key, &validation)?, false)
            }
            Algorithm::HS256 => {
                let key = self
                    .service_key
                    .as_ref()
                    .context("HS256 tokens are not accepted")?;
                (self.decode(token, key, &self.validation(Algorithm::HS256))?, true)
            }
            other => anyhow::bail!("Unsupported JWT algorithm {:?}", other),
        };

        AuthContext::from_claims(&claims, service_token).map_err(anyhow::Error::msg)
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation
    }

    fn decode(&self, token: &str, key: &DecodingKey, validation: &Validation) -> Result<Claims> {
        Ok(decode::<Claims>(token, key, validation)
            .context("JWT validation failed")?
            .claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ActorType;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, sub: &str, role: Option<&str>, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.into(),
            aud: "authenticated".into(),
            iss: None,
            iat: None,
            exp: chrono::Utc::now().timestamp() + exp_offset,
            role: role.map(str::to_string),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(None, Some("secret"), "authenticated".into())
    }

    #[tokio::test]
    async fn service_token_carries_actor() {
        let ctx = verifier()
            .verify(&mint("secret", "bot", Some("chronograph"), 600))
            .await
            .unwrap();
        assert_eq!(ctx.user_id, "bot");
        assert_eq!(ctx.actor, ActorType::Chronograph);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        assert!(verifier().verify(&mint("other", "bot", None, 600)).await.is_err());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        assert!(verifier().verify(&mint("secret", "bot", None, -600)).await.is_err());
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        assert!(verifier().verify("not-a-jwt").await.is_err());
    }
}
