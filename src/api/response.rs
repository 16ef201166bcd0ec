//! Standard API response types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Credential handed back once, when an entity is created or rotated
#[derive(Debug, Serialize)]
pub struct Access {
    pub token: String,
}

/// `{"data": ...}` envelope, with `access` on creation
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, access: None }
    }

    pub fn with_access(data: T, token: impl Into<String>) -> Self {
        Self {
            data,
            access: Some(Access {
                token: token.into(),
            }),
        }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Helper for creating responses with status codes
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_only_serialized_when_present() {
        assert_eq!(
            serde_json::to_value(DataResponse::new(json!({"id": "t1"}))).unwrap(),
            json!({"data": {"id": "t1"}})
        );
        assert_eq!(
            serde_json::to_value(DataResponse::with_access(json!({"id": "t1"}), "abc")).unwrap(),
            json!({"data": {"id": "t1"}, "access": {"token": "abc"}})
        );
    }
}
