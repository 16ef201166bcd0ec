use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

use super::AuthContext;
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Header carrying an entity access token
pub const X_ACCESS_TOKEN: &str = "x-access-token";

/// Extractor that requires a valid bearer token
///
/// Example:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extractor for public routes: anonymous without an `Authorization`
/// header, rejected when one is present but invalid
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub AuthContext);

impl std::ops::Deref for MaybeAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidFormat => "Invalid authorization format",
            AuthError::InvalidToken => "Invalid or expired token",
        };
        let body = ErrorResponse::single("header", "Authorization", message);

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

fn bearer(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = header
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(Some(token))
}

async fn authenticate(state: &AppState, token: &str) -> Result<AuthContext, AuthError> {
    state.verifier.verify(token).await.map_err(|e| {
        tracing::warn!(error = %e, "JWT verification failed");
        AuthError::InvalidToken
    })
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers)?.ok_or(AuthError::MissingToken)?;
        Ok(RequireAuth(authenticate(state, token).await?))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer(&parts.headers)? {
            Some(token) => Ok(MaybeAuth(authenticate(state, token).await?)),
            None => Ok(MaybeAuth(AuthContext::anonymous())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessQuery {
    acc_token: Option<String>,
}

/// Entity access token presented with the request, from the `acc_token`
/// query parameter or the `X-Access-Token` header
#[derive(Debug, Clone, Default)]
pub struct AccessToken(pub Option<String>);

impl AccessToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AccessToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_query = Query::<AccessQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.acc_token);
        let from_header = || {
            parts
                .headers
                .get(X_ACCESS_TOKEN)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Ok(AccessToken(
            from_query.or_else(from_header).filter(|t| !t.is_empty()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn access_token(uri: &str, header: Option<&str>) -> AccessToken {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = header {
            builder = builder.header(X_ACCESS_TOKEN, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AccessToken::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn access_token_from_query_wins() {
        let token = access_token("/tenders/t1?acc_token=q", Some("h")).await;
        assert_eq!(token.as_deref(), Some("q"));
    }

    #[tokio::test]
    async fn access_token_from_header() {
        let token = access_token("/tenders/t1?page=2", Some("h")).await;
        assert_eq!(token.as_deref(), Some("h"));
        assert_eq!(access_token("/tenders/t1", None).await.as_deref(), None);
    }

    #[test]
    fn bearer_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer(&headers), Ok(None)));
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(matches!(bearer(&headers), Err(AuthError::InvalidFormat)));
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert!(matches!(bearer(&headers), Ok(Some("abc"))));
    }
}
