//! Per-controller request pipeline.
//!
//! For each invocation the [`ExecutionContainer`] runs, strictly in order:
//!
//! ```text
//! 1. resolve the controller (fresh request scope)
//! 2. before-hooks, in declared order, short-circuiting on HookOutcome::Respond
//! 3. bind arguments by ascending target index
//! 4. invoke the action
//! 5. translate the outcome into an ExecutionResult
//! ```

mod arguments;
mod context;

pub use arguments::{Argument, Arguments, BindingError};
pub use context::{IncomingRequest, RequestContext, ResponseHandle};

use crate::common::ExecutionResult;
use crate::controller::{ControllerDescriptor, ParamSource, RouteDescriptor};
use crate::di::{Container, RequestScope, Resolver};
use crate::exception::{ActionError, ExceptionFilter, HttpExceptionFilter};
use crate::hook::HookOutcome;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::Instrument;

/// Runs routes of exactly one controller.
///
/// Holds the controller's descriptor and a handle to the DI container; it retains no
/// state between invocations.
pub struct ExecutionContainer {
    descriptor: Arc<ControllerDescriptor>,
    container: Container,
    filter: Arc<dyn ExceptionFilter>,
}

impl ExecutionContainer {
    pub fn new(descriptor: Arc<ControllerDescriptor>, container: Container) -> Self {
        Self::with_filter(descriptor, container, Arc::new(HttpExceptionFilter))
    }

    pub fn with_filter(
        descriptor: Arc<ControllerDescriptor>,
        container: Container,
        filter: Arc<dyn ExceptionFilter>,
    ) -> Self {
        Self {
            descriptor,
            container,
            filter,
        }
    }

    pub fn descriptor(&self) -> &Arc<ControllerDescriptor> {
        &self.descriptor
    }

    /// Execute `route` for one request. Failures never escape: they are translated by
    /// the exception filter.
    pub async fn execute(&self, route: &RouteDescriptor, request: IncomingRequest) -> ExecutionResult {
        let context = RequestContext::new(request);
        let span = tracing::info_span!(
            "request",
            id = %context.id(),
            method = %context.request().method(),
            path = %context.request().path(),
            action = route.action_name,
        );

        async {
            match self.run(route, &context).await {
                Ok(result) => result,
                Err(error) => self.filter.catch(error),
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        route: &RouteDescriptor,
        context: &RequestContext,
    ) -> Result<ExecutionResult, ActionError> {
        let scope = RequestScope::with_id(context.id());
        let mut resolver = self.container.resolver(Some(scope));

        let controller = resolver
            .resolve_instance(self.descriptor.type_id(), self.descriptor.type_name())
            .await?;

        for hook in &route.before_hooks {
            if let HookOutcome::Respond(result) = hook.before(context).await? {
                tracing::debug!("Hook {} short-circuited with {}", hook.name(), result.status);
                return Ok(result.with_headers(context.response().headers()));
            }
        }

        let arguments = self.bind(route, context, &mut resolver).await?;
        let body = (route.action)(controller, arguments).await?;

        let status = context.response().status().unwrap_or(StatusCode::OK);
        Ok(ExecutionResult::new(status, body).with_headers(context.response().headers()))
    }

    async fn bind(
        &self,
        route: &RouteDescriptor,
        context: &RequestContext,
        resolver: &mut Resolver,
    ) -> Result<Arguments, ActionError> {
        let request = context.request();
        let mut values = Vec::with_capacity(route.params.len());

        for param in route.ordered_params() {
            let key = param.key.as_deref().unwrap_or_default();
            let argument = match param.source {
                ParamSource::PathParam => Argument::Value(request.path_param(key).map(str::to_string)),
                ParamSource::Query => Argument::Value(request.query(key).map(str::to_string)),
                ParamSource::Header => Argument::Value(request.header(key).map(str::to_string)),
                ParamSource::Body => Argument::Body(request.body().clone()),
                ParamSource::RequestContext => Argument::Context(context.clone()),
                ParamSource::RawRequest => Argument::Request(Arc::clone(request)),
                ParamSource::RawResponse => Argument::Response(context.response().clone()),
                ParamSource::InjectedDependency(dependency) => Argument::Dependency(
                    resolver
                        .resolve_instance(dependency.type_id, dependency.type_name)
                        .await?,
                ),
            };
            values.push(argument);
        }

        Ok(Arguments::new(values))
    }
}
