use crate::common::ExecutionResult;
use crate::error::TalonError;
use crate::execution::BindingError;
use thiserror::Error;

pub mod http;

pub use http::{HttpException, HttpExceptionFilter};

/// Failure raised by a before-hook or an action.
///
/// Contained within the request that raised it: the execution container hands it to
/// its [`ExceptionFilter`] and the process keeps serving.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Http(#[from] HttpException),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TalonError> for ActionError {
    fn from(err: TalonError) -> Self {
        ActionError::Other(err.into())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::Other(err.into())
    }
}

/// The ExceptionFilter trait
///
/// Filters translate request failures into an [`ExecutionResult`].
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, error: ActionError) -> ExecutionResult;
}
