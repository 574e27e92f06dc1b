//! # Talon
//!
//! A controller-based web framework with scoped dependency injection for Rust.
//!
//! ## Features
//!
//! - **Dependency Injection**: Singleton, Transient and Request scopes, cycle detection and
//!   eager singleton construction at startup
//! - **Controller descriptors**: routes declared with their argument bindings and before-hooks
//! - **Execution pipeline**: hooks, argument binding, action invocation and exception
//!   translation, contained per request
//! - **Routing**: normalized dispatch paths with `{param}` segments, served through axum
//! - **Trait Object Support**: inject `Arc<dyn Trait>` through trait bindings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use talon::prelude::*;
//!
//! pub struct DinosaurService;
//!
//! #[async_trait]
//! impl Injectable for DinosaurService {
//!     async fn inject(_resolver: &mut Resolver) -> talon::Result<Self> {
//!         Ok(DinosaurService)
//!     }
//! }
//!
//! pub struct DinosaurController {
//!     service: Arc<DinosaurService>,
//! }
//!
//! #[async_trait]
//! impl Injectable for DinosaurController {
//!     async fn inject(resolver: &mut Resolver) -> talon::Result<Self> {
//!         Ok(DinosaurController {
//!             service: resolver.resolve::<DinosaurService>().await?,
//!         })
//!     }
//! }
//!
//! impl DinosaurController {
//!     async fn find(&self, id: Option<String>) -> Result<String, ActionError> {
//!         id.ok_or_else(|| HttpException::bad_request("id is required").into())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> talon::Result<()> {
//!     let config = ApplicationConfig::new()
//!         .provider::<DinosaurService>(Scope::Singleton)
//!         .controller(
//!             ControllerDescriptor::builder::<DinosaurController>("/dino")
//!                 .get("/{id}", |route| {
//!                     route.path_param("id").action("find", |controller, args| async move {
//!                         controller.find(args.string(0)?).await
//!                     })
//!                 })
//!                 .build(),
//!         );
//!
//!     Application::builder().config(config).build().await?.run(3000).await
//! }
//! ```

pub mod common;
pub mod config;
pub mod controller;
pub mod di;
pub mod error;
pub mod exception;
pub mod execution;
pub mod hook;
pub mod lifecycle;
pub mod module;
pub mod pipe;
pub mod router;

// Re-export core types
pub use common::ExecutionResult;
pub use di::{Container, ContainerBuilder, Injectable, Resolver, Scope};
pub use error::{Result, TalonError};
pub use module::{ApplicationConfig, Module};
pub use router::Router;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use talon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::ExecutionResult;
    pub use crate::config::{ConfigService, ServerConfig};
    pub use crate::controller::{ControllerDescriptor, DescriptorRegistry, ParamBinding, ParamSource};
    pub use crate::di::{Container, ContainerBuilder, Injectable, RequestScope, Resolver, Scope};
    pub use crate::error::TalonError;
    pub use crate::exception::{ActionError, ExceptionFilter, HttpException, HttpExceptionFilter};
    pub use crate::execution::{Arguments, IncomingRequest, RequestContext, ResponseHandle};
    pub use crate::hook::{BeforeHook, Guard, GuardError, GuardHook, GuardResult, HookOutcome};
    pub use crate::lifecycle::{Application, ApplicationBuilder, shutdown_signal};
    pub use crate::module::{ApplicationConfig, Module};
    pub use crate::pipe::builtins::*;
    pub use crate::pipe::{Pipe, PipeError, PipeResult};
    pub use crate::router::Router;
    pub use async_trait::async_trait;
    pub use axum::http::StatusCode;
    pub use std::sync::Arc;
}
