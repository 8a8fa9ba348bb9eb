use axum::extract::{FromRequest, Request};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

// 非 JSON 请求在进入注册中心之前被拒绝
#[derive(Error, Debug)]
pub enum MalformedRequest {
    #[error("Content type is not application/json")]
    ContentType,

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for MalformedRequest {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Rejected malformed request");
        (StatusCode::BAD_REQUEST, "Invalid JSON.").into_response()
    }
}

/// JSON 请求体提取器
///
/// Content-Type 只要包含 `application/json` 即可（允许带 charset）。
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = MalformedRequest;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        if !is_json {
            return Err(MalformedRequest::ContentType);
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| MalformedRequest::Body(e.body_text()))?;
        let value = serde_json::from_slice(&body)?;
        Ok(JsonBody(value))
    }
}
