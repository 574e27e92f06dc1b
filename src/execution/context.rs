use crate::exception::HttpException;
use axum::{
    body::Body,
    extract::Query,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// The framework's view of an inbound request: method, path, parameters, headers and a
/// parsed body.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    path: String,
    path_params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Value,
}

impl IncomingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: HashMap::new(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Value::Null,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(key.into(), value.into());
        self
    }

    /// Convert an axum request, reading at most `body_limit` bytes of body.
    ///
    /// Query parameters are decoded with axum's `Query` extractor. JSON bodies are parsed;
    /// a malformed JSON body is a `400`. Other non-empty bodies are kept as a string.
    pub async fn from_http(request: Request<Body>, body_limit: usize) -> Result<Self, HttpException> {
        let (parts, body) = request.into_parts();

        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .map_err(|e| HttpException::bad_request(e.body_text()))?;

        let bytes = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|_| HttpException::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large"))?;

        let is_json = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let body = if bytes.is_empty() {
            Value::Null
        } else if is_json {
            serde_json::from_slice(&bytes)
                .map_err(|e| HttpException::bad_request(format!("Malformed JSON body: {}", e)))?
        } else {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        };

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            path_params: HashMap::new(),
            query,
            headers: parts.headers,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_param(&self, key: &str) -> Option<&str> {
        self.path_params.get(key).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub(crate) fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Header value by case-insensitive name. Non-visible-ASCII values read as absent.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|value| value.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

#[derive(Debug, Default)]
struct ResponseParts {
    status: Option<StatusCode>,
    headers: HeaderMap,
}

/// Mutable side channel onto the outgoing response.
///
/// An explicit status set here overrides the default `200` of a normal return.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    parts: Arc<Mutex<ResponseParts>>,
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.parts.lock().unwrap_or_else(PoisonError::into_inner).status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.parts.lock().unwrap_or_else(PoisonError::into_inner).status
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .headers
            .insert(name, value);
    }

    pub fn headers(&self) -> HeaderMap {
        self.parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .headers
            .clone()
    }
}

/// Per-request context shared by hooks and actions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: Uuid,
    received_at: DateTime<Utc>,
    request: Arc<IncomingRequest>,
    response: ResponseHandle,
}

impl RequestContext {
    pub fn new(request: IncomingRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            request: Arc::new(request),
            response: ResponseHandle::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn request(&self) -> &Arc<IncomingRequest> {
        &self.request
    }

    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }
}
