use talon::prelude::*;

/// Requires the configured `API_KEY` in the `x-api-key` header.
pub struct ApiKeyGuard {
    key: String,
}

impl ApiKeyGuard {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl Guard for ApiKeyGuard {
    async fn can_activate(&self, context: &RequestContext) -> GuardResult {
        match context.request().header("x-api-key") {
            Some(key) if key == self.key => Ok(()),
            _ => Err(GuardError::Unauthorized("missing or invalid API key".to_string())),
        }
    }
}
