use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// The outcome of one route invocation.
///
/// Produced exactly once per request by an execution container and written onto the
/// outgoing response by the router. Error bodies always have the shape
/// `{ "error": <message>, "status": <code> }`.
///
/// # Example
/// ```
/// use talon::common::ExecutionResult;
/// use axum::http::StatusCode;
///
/// let result = ExecutionResult::error(StatusCode::BAD_REQUEST, "Bad Request");
/// assert_eq!(result.status, StatusCode::BAD_REQUEST);
/// assert_eq!(result.body["error"], "Bad Request");
/// assert_eq!(result.body["status"], 400);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub body: Value,
    pub status: StatusCode,
    /// Extra headers set through the response side channel.
    pub headers: HeaderMap,
}

impl ExecutionResult {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            body,
            status,
            headers: HeaderMap::new(),
        }
    }

    /// A `200 OK` result carrying `body`.
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// A structured error result.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            status,
            json!({
                "error": message,
                "status": status.as_u16(),
            }),
        )
    }

    /// The fixed response for requests matching no dispatch entry.
    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, "Not Found")
    }

    /// The generic response for unrecognized failures. Never carries internal detail.
    pub fn internal_error() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for ExecutionResult {
    fn into_response(self) -> Response {
        (self.status, self.headers, Json(self.body)).into_response()
    }
}
