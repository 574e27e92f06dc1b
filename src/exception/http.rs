use crate::common::ExecutionResult;
use crate::exception::{ActionError, ExceptionFilter};
use crate::execution::BindingError;
use axum::http::StatusCode;
use thiserror::Error;

/// A recoverable, request-scoped failure carrying an HTTP status and message.
///
/// # Example
/// ```
/// use talon::exception::HttpException;
/// use axum::http::StatusCode;
///
/// let err = HttpException::bad_request("Bad Request");
/// assert_eq!(err.status(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HttpException {
    status: StatusCode,
    message: String,
}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<HttpException> for ExecutionResult {
    fn from(exception: HttpException) -> Self {
        ExecutionResult::error(exception.status, exception.message)
    }
}

/// The default exception filter.
///
/// HTTP exceptions keep their status and message, coercion failures become `400`,
/// everything else is logged and answered with a generic `500`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpExceptionFilter;

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: ActionError) -> ExecutionResult {
        match error {
            ActionError::Http(exception) => {
                tracing::warn!("HTTP exception: {}", exception);
                exception.into()
            }
            ActionError::Binding(BindingError::Coercion { index, message }) => {
                tracing::warn!("Argument {} could not be coerced: {}", index, message);
                ExecutionResult::error(StatusCode::BAD_REQUEST, message)
            }
            other => {
                tracing::error!("Unhandled failure: {:#}", other);
                ExecutionResult::internal_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_exception_keeps_status_and_message() {
        let result = HttpExceptionFilter.catch(HttpException::bad_request("Bad Request").into());
        assert_eq!(result.status, StatusCode::BAD_REQUEST);
        assert_eq!(result.body, json!({ "error": "Bad Request", "status": 400 }));
    }

    #[test]
    fn test_unknown_failure_is_generic() {
        let error = ActionError::from(anyhow::anyhow!("connection string leaked: secret"));
        let result = HttpExceptionFilter.catch(error);
        assert_eq!(result.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            result.body,
            json!({ "error": "Internal Server Error", "status": 500 })
        );
    }

    #[test]
    fn test_binding_errors() {
        let coercion = BindingError::Coercion {
            index: 0,
            message: "Invalid integer".to_string(),
        };
        let result = HttpExceptionFilter.catch(coercion.into());
        assert_eq!(result.status, StatusCode::BAD_REQUEST);
        assert_eq!(result.body["error"], "Invalid integer");

        let mismatch = BindingError::KindMismatch {
            index: 1,
            expected: "body",
            found: "header",
        };
        let result = HttpExceptionFilter.catch(mismatch.into());
        assert_eq!(result.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
