use std::future::Future;
use std::pin::Pin;

pub mod result;

pub use result::ExecutionResult;

/// A boxed, sendable future, used wherever the framework erases async callables.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
