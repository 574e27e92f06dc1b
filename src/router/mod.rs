//! Dispatch table built from controller descriptors.
//!
//! One [`ExecutionContainer`] is created per controller prefix. Each route is installed
//! under `(method, normalize_path(prefix, path))`; literal paths go into an exact-match
//! table, paths with `{param}` or `:param` segments are tried afterwards in registration
//! order.

mod path;
mod service;

pub use path::{PathPattern, normalize_path, normalize_request_path};

use crate::common::ExecutionResult;
use crate::controller::{DescriptorRegistry, RouteDescriptor};
use crate::di::Container;
use crate::error::{Result, TalonError};
use crate::exception::{ExceptionFilter, HttpExceptionFilter};
use crate::execution::{ExecutionContainer, IncomingRequest};
use axum::http::Method;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
struct RouteEntry {
    executor: Arc<ExecutionContainer>,
    route: Arc<RouteDescriptor>,
}

/// One line of the bootstrap route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub method: Method,
    pub path: String,
    pub prefix: String,
    pub action: &'static str,
}

/// Routes inbound requests to the execution container owning the matching route.
pub struct Router {
    container: Container,
    registry: Arc<DescriptorRegistry>,
    filter: Arc<dyn ExceptionFilter>,
    executors: HashMap<String, Arc<ExecutionContainer>>,
    exact: HashMap<(Method, String), RouteEntry>,
    patterns: Vec<(Method, PathPattern, RouteEntry)>,
    summary: Vec<RouteSummary>,
}

impl Router {
    pub fn new(container: Container, registry: Arc<DescriptorRegistry>) -> Self {
        Self {
            container,
            registry,
            filter: Arc::new(HttpExceptionFilter),
            executors: HashMap::new(),
            exact: HashMap::new(),
            patterns: Vec::new(),
            summary: Vec::new(),
        }
    }

    /// Use `filter` for controllers registered from now on.
    pub fn exception_filter(mut self, filter: Arc<dyn ExceptionFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Register controller `T`.
    pub fn register<T: 'static>(&mut self) -> Result<&mut Self> {
        self.register_id(TypeId::of::<T>(), type_name::<T>())
    }

    /// Register a controller by type identity.
    ///
    /// Fails with `NotAController` when the type has no controller descriptor, with
    /// `UnresolvedDependency` when the controller is not registered in the container,
    /// with `InvalidRoute` when a route's bindings are malformed, and with
    /// `DuplicateRegistration` on a repeated prefix or `(method, path)`. Nothing is
    /// installed when registration fails.
    pub fn register_id(&mut self, type_id: TypeId, type_name: &'static str) -> Result<&mut Self> {
        let descriptor = self
            .registry
            .controller(type_id)
            .ok_or_else(|| TalonError::NotAController {
                type_name: type_name.to_string(),
            })?;

        if !self.container.contains_id(type_id) {
            return Err(TalonError::unresolved(type_name));
        }

        let prefix = normalize_path(&descriptor.prefix, "");
        if self.executors.contains_key(&prefix) {
            return Err(TalonError::duplicate(format!("controller prefix {}", prefix)));
        }

        let mut staged: Vec<(Method, PathPattern, Arc<RouteDescriptor>)> = Vec::new();
        for route in &descriptor.routes {
            let full_path = normalize_path(&prefix, &route.path);
            route.validate().map_err(|message| TalonError::InvalidRoute {
                route: format!("{} {}", route.method, full_path),
                message,
            })?;

            let pattern = PathPattern::parse(&full_path);
            let taken = self.is_taken(&route.method, &pattern)
                || staged
                    .iter()
                    .any(|(method, other, _)| *method == route.method && other.same_shape(&pattern));
            if taken {
                return Err(TalonError::duplicate(format!("route {} {}", route.method, full_path)));
            }
            staged.push((route.method.clone(), pattern, Arc::new(route.clone())));
        }

        let executor = Arc::new(ExecutionContainer::with_filter(
            Arc::clone(&descriptor),
            self.container.clone(),
            Arc::clone(&self.filter),
        ));

        for (method, pattern, route) in staged {
            self.summary.push(RouteSummary {
                method: method.clone(),
                path: pattern.as_str().to_string(),
                prefix: prefix.clone(),
                action: route.action_name,
            });
            tracing::debug!("Mapped {} {} -> {}", method, pattern.as_str(), route.action_name);

            let entry = RouteEntry {
                executor: Arc::clone(&executor),
                route,
            };
            if pattern.is_literal() {
                self.exact.insert((method, pattern.as_str().to_string()), entry);
            } else {
                self.patterns.push((method, pattern, entry));
            }
        }

        self.executors.insert(prefix, executor);
        Ok(self)
    }

    fn is_taken(&self, method: &Method, pattern: &PathPattern) -> bool {
        if pattern.is_literal() {
            self.exact
                .contains_key(&(method.clone(), pattern.as_str().to_string()))
        } else {
            self.patterns
                .iter()
                .any(|(m, other, _)| m == method && other.same_shape(pattern))
        }
    }

    /// Dispatch one request. Unmatched requests get the fixed `404` result.
    pub async fn dispatch(&self, mut request: IncomingRequest) -> ExecutionResult {
        let path = normalize_request_path(request.path());
        let method = request.method().clone();

        if let Some(entry) = self.exact.get(&(method.clone(), path.clone())) {
            return entry.executor.execute(&entry.route, request).await;
        }

        for (route_method, pattern, entry) in &self.patterns {
            if *route_method != method {
                continue;
            }
            if let Some(params) = pattern.matches(&path) {
                request.set_path_params(params);
                return entry.executor.execute(&entry.route, request).await;
            }
        }

        tracing::debug!("No route for {} {}", method, path);
        ExecutionResult::not_found()
    }

    /// The bootstrap route table, in registration order.
    pub fn summary(&self) -> &[RouteSummary] {
        &self.summary
    }

    pub fn route_count(&self) -> usize {
        self.summary.len()
    }

    pub fn controller_count(&self) -> usize {
        self.executors.len()
    }
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} routes in {} controllers",
            self.route_count(),
            self.controller_count()
        )?;
        for line in &self.summary {
            writeln!(
                f,
                "  {:<7} {:<32} [{}] {}",
                line.method.as_str(),
                line.path,
                line.prefix,
                line.action
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("controllers", &self.executors.len())
            .field("routes", &self.summary)
            .finish()
    }
}
