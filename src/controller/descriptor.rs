use crate::common::BoxFuture;
use crate::di::{Injectable, InjectableDescriptor, Instance, Scope};
use crate::exception::ActionError;
use crate::execution::Arguments;
use crate::hook::BeforeHook;
use axum::http::Method;
use serde::Serialize;
use serde_json::Value;
use std::any::{TypeId, type_name};
use std::collections::BTreeSet;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

pub type ActionResult = Result<Value, ActionError>;

/// A type-erased action: receives the resolved controller instance and the bound arguments.
pub type ActionFn = Arc<dyn Fn(Instance, Arguments) -> BoxFuture<'static, ActionResult> + Send + Sync>;

pub type HookRef = Arc<dyn BeforeHook>;

/// Type identity of an injected dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyKey {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl DependencyKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// Where a bound argument's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    PathParam,
    Body,
    Query,
    Header,
    RequestContext,
    RawRequest,
    RawResponse,
    InjectedDependency(DependencyKey),
}

/// Binds one positional action argument to a request source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub source: ParamSource,
    pub key: Option<String>,
    pub target_index: usize,
}

impl ParamBinding {
    pub fn new(source: ParamSource, key: Option<String>, target_index: usize) -> Self {
        Self {
            source,
            key,
            target_index,
        }
    }
}

/// One route of a controller.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub method: Method,
    pub path: String,
    pub action_name: &'static str,
    pub params: Vec<ParamBinding>,
    pub before_hooks: Vec<HookRef>,
    pub(crate) action: ActionFn,
}

impl RouteDescriptor {
    /// Check that target indices are unique and cover `0..params.len()`.
    pub fn validate(&self) -> Result<(), String> {
        let indices: BTreeSet<usize> = self.params.iter().map(|p| p.target_index).collect();
        if indices.len() != self.params.len() {
            return Err("duplicate target index".to_string());
        }
        if let Some(missing) = (0..self.params.len()).find(|i| !indices.contains(i)) {
            return Err(format!("no binding for argument {}", missing));
        }
        for param in &self.params {
            let needs_key = matches!(
                param.source,
                ParamSource::PathParam | ParamSource::Query | ParamSource::Header
            );
            if needs_key && param.key.is_none() {
                return Err(format!("argument {} needs a key", param.target_index));
            }
        }
        Ok(())
    }

    /// Bindings in ascending target index order.
    pub fn ordered_params(&self) -> Vec<&ParamBinding> {
        let mut params: Vec<&ParamBinding> = self.params.iter().collect();
        params.sort_by_key(|param| param.target_index);
        params
    }
}

impl std::fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("action_name", &self.action_name)
            .field("params", &self.params)
            .field("before_hooks", &self.before_hooks.len())
            .finish()
    }
}

/// Immutable description of a controller: its prefix, its own injectable registration and
/// its routes.
#[derive(Clone)]
pub struct ControllerDescriptor {
    pub prefix: String,
    pub injectable: InjectableDescriptor,
    pub routes: Vec<RouteDescriptor>,
}

impl ControllerDescriptor {
    /// Start describing controller `C`, mounted under `prefix`. Controllers are singletons
    /// unless [`ControllerBuilder::scope`] says otherwise.
    pub fn builder<C: Injectable>(prefix: impl Into<String>) -> ControllerBuilder<C> {
        ControllerBuilder {
            prefix: prefix.into(),
            scope: Scope::Singleton,
            routes: Vec::new(),
            _controller: PhantomData,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.injectable.type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.injectable.type_name()
    }

    pub fn scope(&self) -> Scope {
        self.injectable.scope()
    }
}

impl std::fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("prefix", &self.prefix)
            .field("controller", &self.type_name())
            .field("scope", &self.scope())
            .field("routes", &self.routes)
            .finish()
    }
}

/// Builds a [`ControllerDescriptor`].
///
/// # Example
/// ```
/// use talon::controller::ControllerDescriptor;
/// use talon::di::{Injectable, Resolver};
/// use talon::exception::ActionError;
/// use talon::async_trait;
///
/// pub struct HealthController;
///
/// #[async_trait]
/// impl Injectable for HealthController {
///     async fn inject(_resolver: &mut Resolver) -> talon::Result<Self> {
///         Ok(HealthController)
///     }
/// }
///
/// impl HealthController {
///     async fn check(&self) -> Result<&'static str, ActionError> {
///         Ok("ok")
///     }
/// }
///
/// let descriptor = ControllerDescriptor::builder::<HealthController>("/health")
///     .get("/", |route| route.action("check", |controller, _args| async move {
///         controller.check().await
///     }))
///     .build();
/// assert_eq!(descriptor.routes.len(), 1);
/// ```
pub struct ControllerBuilder<C> {
    prefix: String,
    scope: Scope,
    routes: Vec<RouteDescriptor>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Injectable> ControllerBuilder<C> {
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn route<F>(mut self, method: Method, path: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RouteBuilder<C>) -> RouteDescriptor,
    {
        self.routes.push(configure(RouteBuilder::new(method, path.into())));
        self
    }

    pub fn get<F>(self, path: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RouteBuilder<C>) -> RouteDescriptor,
    {
        self.route(Method::GET, path, configure)
    }

    pub fn post<F>(self, path: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RouteBuilder<C>) -> RouteDescriptor,
    {
        self.route(Method::POST, path, configure)
    }

    pub fn put<F>(self, path: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RouteBuilder<C>) -> RouteDescriptor,
    {
        self.route(Method::PUT, path, configure)
    }

    pub fn patch<F>(self, path: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RouteBuilder<C>) -> RouteDescriptor,
    {
        self.route(Method::PATCH, path, configure)
    }

    pub fn delete<F>(self, path: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RouteBuilder<C>) -> RouteDescriptor,
    {
        self.route(Method::DELETE, path, configure)
    }

    pub fn build(self) -> ControllerDescriptor {
        ControllerDescriptor {
            prefix: self.prefix,
            injectable: InjectableDescriptor::of::<C>(self.scope),
            routes: self.routes,
        }
    }
}

/// Builds one [`RouteDescriptor`]. The shorthand binding methods append arguments at the
/// next free index; [`RouteBuilder::bind`] takes an explicit one.
pub struct RouteBuilder<C> {
    method: Method,
    path: String,
    params: Vec<ParamBinding>,
    before_hooks: Vec<HookRef>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Injectable> RouteBuilder<C> {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            params: Vec::new(),
            before_hooks: Vec::new(),
            _controller: PhantomData,
        }
    }

    fn push(mut self, source: ParamSource, key: Option<String>) -> Self {
        let index = self.params.len();
        self.params.push(ParamBinding::new(source, key, index));
        self
    }

    pub fn bind(mut self, binding: ParamBinding) -> Self {
        self.params.push(binding);
        self
    }

    pub fn path_param(self, key: impl Into<String>) -> Self {
        self.push(ParamSource::PathParam, Some(key.into()))
    }

    pub fn query(self, key: impl Into<String>) -> Self {
        self.push(ParamSource::Query, Some(key.into()))
    }

    pub fn header(self, key: impl Into<String>) -> Self {
        self.push(ParamSource::Header, Some(key.into()))
    }

    pub fn body(self) -> Self {
        self.push(ParamSource::Body, None)
    }

    pub fn context(self) -> Self {
        self.push(ParamSource::RequestContext, None)
    }

    pub fn raw_request(self) -> Self {
        self.push(ParamSource::RawRequest, None)
    }

    pub fn raw_response(self) -> Self {
        self.push(ParamSource::RawResponse, None)
    }

    pub fn inject<T: Send + Sync + 'static>(self) -> Self {
        self.push(ParamSource::InjectedDependency(DependencyKey::of::<T>()), None)
    }

    /// Inject a trait object bound with [`crate::di::ContainerBuilder::bind`].
    pub fn inject_trait<T: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.push(ParamSource::InjectedDependency(DependencyKey::of::<T>()), None)
    }

    pub fn before<H: BeforeHook>(mut self, hook: H) -> Self {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    pub fn before_shared(mut self, hook: HookRef) -> Self {
        self.before_hooks.push(hook);
        self
    }

    /// Finish the route with its action. The action's return value is serialized as the
    /// response body.
    pub fn action<F, Fut, R>(self, name: &'static str, handler: F) -> RouteDescriptor
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ActionError>> + Send + 'static,
        R: Serialize + 'static,
    {
        let action: ActionFn = Arc::new(
            move |instance: Instance, args: Arguments| -> BoxFuture<'static, ActionResult> {
                let invocation = instance
                    .downcast::<C>()
                    .map(|controller| handler(controller, args));
                Box::pin(async move {
                    let invocation = invocation.map_err(|_| {
                        ActionError::Other(anyhow::anyhow!(
                            "controller instance is not a {}",
                            type_name::<C>()
                        ))
                    })?;
                    let value = invocation.await?;
                    Ok(serde_json::to_value(value)?)
                })
            },
        );

        RouteDescriptor {
            method: self.method,
            path: self.path,
            action_name: name,
            params: self.params,
            before_hooks: self.before_hooks,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Resolver;
    use async_trait::async_trait;

    struct Probe;

    #[async_trait]
    impl Injectable for Probe {
        async fn inject(_resolver: &mut Resolver) -> crate::Result<Self> {
            Ok(Probe)
        }
    }

    impl Probe {
        async fn echo(&self, value: Option<String>) -> Result<Option<String>, ActionError> {
            Ok(value)
        }
    }

    fn describe() -> ControllerDescriptor {
        ControllerDescriptor::builder::<Probe>("/probe")
            .scope(Scope::Request)
            .get("/{id}", |route| {
                route
                    .path_param("id")
                    .query("verbose")
                    .inject::<String>()
                    .action("echo", |probe, args| async move {
                        probe.echo(args.string(0)?).await
                    })
            })
            .build()
    }

    #[test]
    fn test_builder_assigns_sequential_indices() {
        let descriptor = describe();
        assert_eq!(descriptor.prefix, "/probe");
        assert_eq!(descriptor.scope(), Scope::Request);

        let route = &descriptor.routes[0];
        assert_eq!(route.method, Method::GET);
        assert_eq!(route.action_name, "echo");
        let indices: Vec<usize> = route.params.iter().map(|p| p.target_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            route.params[2].source,
            ParamSource::InjectedDependency(DependencyKey::of::<String>())
        );
        assert!(route.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gaps_and_duplicates() {
        let mut route = describe().routes.remove(0);
        route.params[1].target_index = 5;
        assert!(route.validate().unwrap_err().contains("argument 1"));

        route.params[1].target_index = 0;
        assert_eq!(route.validate().unwrap_err(), "duplicate target index");
    }

    #[test]
    fn test_ordered_params() {
        let mut route = describe().routes.remove(0);
        route.params.reverse();
        let order: Vec<usize> = route.ordered_params().iter().map(|p| p.target_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_action_serializes_return_value() {
        let route = describe().routes.remove(0);
        let args = Arguments::new(vec![crate::execution::Argument::Value(Some("7".into()))]);
        let value = (route.action)(Arc::new(Probe), args).await.unwrap();
        assert_eq!(value, serde_json::json!("7"));
    }

    #[tokio::test]
    async fn test_action_rejects_wrong_controller() {
        let route = describe().routes.remove(0);
        let err = (route.action)(Arc::new(42_u8), Arguments::default()).await.unwrap_err();
        assert!(matches!(err, ActionError::Other(_)));
    }
}
