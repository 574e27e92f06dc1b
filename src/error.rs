use thiserror::Error;

pub type Result<T> = std::result::Result<T, TalonError>;

/// Startup and resolution errors raised by the container, the router and the application builder.
///
/// Request-time failures are modelled separately by [`crate::exception::ActionError`].
#[derive(Debug, Error)]
pub enum TalonError {
    #[error("Duplicate registration: {name}")]
    DuplicateRegistration { name: String },

    #[error("Type is not a controller: {type_name}")]
    NotAController { type_name: String },

    #[error("Dependency not found: {type_name}")]
    UnresolvedDependency { type_name: String },

    #[error("Circular dependency detected: {cycle}")]
    CyclicDependency { cycle: String },

    #[error("Scope mismatch: {message}")]
    ScopeMismatch { message: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Invalid route {route}: {message}")]
    InvalidRoute { route: String, message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TalonError {
    pub(crate) fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateRegistration { name: name.into() }
    }

    pub(crate) fn unresolved(type_name: impl Into<String>) -> Self {
        Self::UnresolvedDependency {
            type_name: type_name.into(),
        }
    }

    pub(crate) fn downcast(type_name: impl Into<String>) -> Self {
        Self::DowncastFailed {
            type_name: type_name.into(),
        }
    }
}
