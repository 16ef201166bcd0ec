#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use dialogue_tender_backend::app::{create_app, AppState};
use dialogue_tender_backend::auth::{Claims, TokenVerifier};
use dialogue_tender_backend::config::{Environment, Settings};
use dialogue_tender_backend::services::MemoryTenderStore;

pub const SECRET: &str = "test-service-secret";
pub const AUDIENCE: &str = "authenticated";

pub fn test_settings() -> Settings {
    Settings {
        env: Environment::Dev,
        server_addr: "127.0.0.1:0".into(),
        max_body_bytes: 1024 * 1024,
        database_url: None,
        database_max_connections: 1,
        cors_allow_origins: vec!["http://localhost:3000".into()],
        jwt_jwks_url: None,
        jwt_issuer: String::new(),
        jwt_audience: AUDIENCE.into(),
        jwks_cache_ttl_seconds: 300,
        service_jwt_secret: Some(SECRET.into()),
    }
}

pub fn create_test_app() -> Router {
    let verifier = TokenVerifier::new(None, Some(SECRET), AUDIENCE.into());
    let state = AppState::new(Arc::new(MemoryTenderStore::new()), test_settings(), verifier);
    create_app(state)
}

/// HS256 bearer token for `sub`, acting as `role` when given
pub fn token(sub: &str, role: Option<&str>) -> String {
    let claims = Claims {
        sub: sub.into(),
        aud: AUDIENCE.into(),
        iss: None,
        iat: None,
        exp: chrono::Utc::now().timestamp() + 600,
        role: role.map(str::to_string),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn stage1_body() -> Value {
    serde_json::json!({
        "procurementMethodType": "competitiveDialogueUA",
        "title": "Road repair",
        "value": {"amount": 1000},
        "lots": [{"id": "l1", "title": "Section A", "value": {"amount": 500}}]
    })
}

/// Create a stage-1 tender as `broker`; returns its id and owner token
pub async fn create_stage1(app: &Router, broker: &str) -> (String, String) {
    let (status, json) = send(
        app,
        Method::POST,
        "/tenders",
        Some(&token(broker, None)),
        Some(stage1_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    (
        json["data"]["id"].as_str().unwrap().to_string(),
        json["access"]["token"].as_str().unwrap().to_string(),
    )
}

pub fn error_names(json: &Value) -> Vec<String> {
    json["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
