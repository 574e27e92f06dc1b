use std::fmt::Debug;

pub mod builtins;

pub type PipeResult<T> = Result<T, PipeError>;

#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing value")]
    Missing,
}

/// A coercion primitive for string-sourced arguments (path, query, header).
///
/// The input is `None` when the request carried no value for the binding's key.
pub trait Pipe: Send + Sync + 'static {
    type Output: Debug + Send + 'static;

    fn transform(&self, input: Option<&str>) -> PipeResult<Self::Output>;
}
