use crate::common::ExecutionResult;
use crate::exception::ActionError;
use crate::execution::RequestContext;
use async_trait::async_trait;

pub mod guard;

pub use guard::{Guard, GuardError, GuardHook, GuardResult};

/// What a before-hook decided.
#[derive(Debug)]
pub enum HookOutcome {
    /// Run the next hook, then the action.
    Continue,
    /// Skip the remaining hooks and the action; answer with this result.
    Respond(ExecutionResult),
}

/// A pre-action check or transform, run in declared order.
///
/// # Example
/// ```
/// use talon::hook::{BeforeHook, HookOutcome};
/// use talon::execution::RequestContext;
/// use talon::exception::ActionError;
/// use talon::common::ExecutionResult;
/// use talon::async_trait;
/// use axum::http::StatusCode;
///
/// pub struct RequireApiKey;
///
/// #[async_trait]
/// impl BeforeHook for RequireApiKey {
///     async fn before(&self, context: &RequestContext) -> Result<HookOutcome, ActionError> {
///         if context.request().header("x-api-key").is_some() {
///             Ok(HookOutcome::Continue)
///         } else {
///             Ok(HookOutcome::Respond(ExecutionResult::error(
///                 StatusCode::UNAUTHORIZED,
///                 "Unauthorized",
///             )))
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait BeforeHook: Send + Sync + 'static {
    async fn before(&self, context: &RequestContext) -> Result<HookOutcome, ActionError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
