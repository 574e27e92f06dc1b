use crate::common::ExecutionResult;
use crate::exception::ActionError;
use crate::execution::RequestContext;
use crate::hook::{BeforeHook, HookOutcome};
use async_trait::async_trait;
use axum::http::StatusCode;

/// Standard Result type for Guard
/// Ok(()) means allowed
/// Err(GuardError) means denied
pub type GuardResult = Result<(), GuardError>;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl GuardError {
    fn status(&self) -> StatusCode {
        match self {
            GuardError::Forbidden(_) => StatusCode::FORBIDDEN,
            GuardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

/// The Guard trait
/// Implement this to protect routes; wrap it in a [`GuardHook`] to attach it.
#[async_trait]
pub trait Guard: Send + Sync + 'static {
    async fn can_activate(&self, context: &RequestContext) -> GuardResult;
}

/// Runs a [`Guard`] as a before-hook, answering `401`/`403` when it denies.
pub struct GuardHook<G: Guard> {
    guard: G,
}

impl<G: Guard> GuardHook<G> {
    pub fn new(guard: G) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl<G: Guard> BeforeHook for GuardHook<G> {
    async fn before(&self, context: &RequestContext) -> Result<HookOutcome, ActionError> {
        match self.guard.can_activate(context).await {
            Ok(()) => Ok(HookOutcome::Continue),
            Err(denied) => {
                tracing::debug!("Guard {} denied request: {}", self.name(), denied);
                Ok(HookOutcome::Respond(ExecutionResult::error(
                    denied.status(),
                    denied.to_string(),
                )))
            }
        }
    }

    fn name(&self) -> &str {
        std::any::type_name::<G>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::IncomingRequest;

    struct AdminOnly;

    #[async_trait]
    impl Guard for AdminOnly {
        async fn can_activate(&self, context: &RequestContext) -> GuardResult {
            match context.request().header("x-role") {
                Some("admin") => Ok(()),
                Some(_) => Err(GuardError::Forbidden("admins only".into())),
                None => Err(GuardError::Unauthorized("missing role".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_guard_hook_outcomes() {
        let hook = GuardHook::new(AdminOnly);

        let admin = RequestContext::new(IncomingRequest::get("/").with_header("x-role", "admin"));
        assert!(matches!(
            hook.before(&admin).await.unwrap(),
            HookOutcome::Continue
        ));

        let visitor = RequestContext::new(IncomingRequest::get("/").with_header("x-role", "visitor"));
        match hook.before(&visitor).await.unwrap() {
            HookOutcome::Respond(result) => assert_eq!(result.status, StatusCode::FORBIDDEN),
            HookOutcome::Continue => panic!("guard should deny"),
        }

        let anonymous = RequestContext::new(IncomingRequest::get("/"));
        match hook.before(&anonymous).await.unwrap() {
            HookOutcome::Respond(result) => {
                assert_eq!(result.status, StatusCode::UNAUTHORIZED);
                assert_eq!(result.body["error"], "Unauthorized: missing role");
            }
            HookOutcome::Continue => panic!("guard should deny"),
        }
    }
}
