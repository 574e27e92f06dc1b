//! Application Bootstrap
//!
//! Wires registration, the DI container and the router together and serves them over
//! axum.

use super::shutdown_signal;
use crate::config::{ConfigService, ServerConfig};
use crate::controller::DescriptorRegistry;
use crate::di::{Container, ContainerBuilder};
use crate::error::Result;
use crate::exception::{ExceptionFilter, HttpExceptionFilter};
use crate::module::{ApplicationConfig, Module};
use crate::router::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// A bootstrapped application: every controller is routed and every singleton constructed.
///
/// # Example
///
/// ```rust,no_run
/// use talon::lifecycle::Application;
/// use talon::module::ApplicationConfig;
///
/// #[tokio::main]
/// async fn main() -> talon::Result<()> {
///     let app = Application::builder()
///         .config(ApplicationConfig::new())
///         .build()
///         .await?;
///
///     app.run(3000).await
/// }
/// ```
pub struct Application {
    container: Container,
    router: Router,
    server: ServerConfig,
}

impl Application {
    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// The axum service: the dispatch table as fallback, wrapped in request tracing and,
    /// when enabled, a permissive CORS layer.
    pub fn into_axum(self) -> axum::Router {
        let cors = self.server.cors.then(CorsLayer::permissive);
        self.router.into_axum(self.server.body_limit).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .option_layer(cors),
        )
    }

    /// Serve on the configured port.
    pub async fn listen(self) -> Result<()> {
        let port = self.server.port;
        self.run(port).await
    }

    /// Serve on `port` until Ctrl+C or SIGTERM.
    pub async fn run(self, port: u16) -> Result<()> {
        let addr = format!("{}:{}", self.server.host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Server running on http://{}", addr);

        axum::serve(listener, self.into_axum())
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                tracing::info!("Initiating graceful shutdown...");
            })
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    config: ApplicationConfig,
    settings: Option<ConfigService>,
    server: Option<ServerConfig>,
    filter: Arc<dyn ExceptionFilter>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            config: ApplicationConfig::new(),
            settings: None,
            server: None,
            filter: Arc::new(HttpExceptionFilter),
        }
    }

    /// Add registrations. May be called more than once.
    pub fn config(mut self, config: ApplicationConfig) -> Self {
        self.config = self.config.import(config);
        self
    }

    pub fn module<M: Module>(mut self) -> Self {
        self.config = self.config.module::<M>();
        self
    }

    /// Settings store. Defaults to [`ConfigService::from_env`].
    pub fn settings(mut self, settings: ConfigService) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Server settings. Defaults to [`ServerConfig::from_config`] over the settings store.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    pub fn exception_filter(mut self, filter: Arc<dyn ExceptionFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Register everything, route every controller and construct every singleton.
    ///
    /// # Errors
    ///
    /// Any registration, routing or singleton construction failure aborts startup.
    pub async fn build(self) -> Result<Application> {
        tracing::info!("Starting application initialization...");

        let settings = self.settings.unwrap_or_else(ConfigService::from_env);
        let server = match self.server {
            Some(server) => server,
            None => ServerConfig::from_config(&settings)?,
        };

        let ApplicationConfig {
            injectables,
            controllers,
            bindings,
        } = self.config;

        let mut registry = DescriptorRegistry::new();
        let mut builder = ContainerBuilder::new();
        builder.register_instance(settings)?;

        for descriptor in injectables {
            builder.register(descriptor.clone())?;
            registry.add_injectable(descriptor)?;
        }

        let mut routed = Vec::with_capacity(controllers.len());
        for descriptor in controllers {
            builder.register(descriptor.injectable.clone())?;
            routed.push((descriptor.type_id(), descriptor.type_name()));
            registry.add_controller(descriptor)?;
        }

        for bind in bindings {
            bind(&mut builder)?;
        }

        let container = builder.build();
        let mut router =
            Router::new(container.clone(), Arc::new(registry)).exception_filter(self.filter);
        for (type_id, type_name) in routed {
            router.register_id(type_id, type_name)?;
        }

        let singletons = container.instantiate_all_singletons().await?;
        tracing::info!(
            "Application initialization complete: {} services, {} singletons\n{}",
            container.len(),
            singletons,
            router
        );

        Ok(Application {
            container,
            router,
            server,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerDescriptor;
    use crate::di::{Injectable, InstanceState, Resolver, Scope};
    use crate::error::TalonError;
    use crate::exception::ActionError;
    use crate::execution::IncomingRequest;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;

    struct Greeting {
        text: String,
    }

    #[async_trait]
    impl Injectable for Greeting {
        async fn inject(resolver: &mut Resolver) -> Result<Self> {
            let settings = resolver.resolve::<ConfigService>().await?;
            Ok(Greeting {
                text: settings.get_or("GREETING", "hello"),
            })
        }
    }

    struct GreetController {
        greeting: Arc<Greeting>,
    }

    #[async_trait]
    impl Injectable for GreetController {
        async fn inject(resolver: &mut Resolver) -> Result<Self> {
            Ok(GreetController {
                greeting: resolver.resolve::<Greeting>().await?,
            })
        }
    }

    impl GreetController {
        async fn greet(&self) -> std::result::Result<String, ActionError> {
            Ok(self.greeting.text.clone())
        }
    }

    fn greet_config() -> ApplicationConfig {
        ApplicationConfig::new()
            .provider::<Greeting>(Scope::Singleton)
            .controller(
                ControllerDescriptor::builder::<GreetController>("/greet")
                    .get("/", |route| {
                        route.action("greet", |controller, _args| async move {
                            controller.greet().await
                        })
                    })
                    .build(),
            )
    }

    fn settings() -> ConfigService {
        let settings = ConfigService::new();
        settings.set("GREETING", "rawr");
        settings
    }

    #[tokio::test]
    async fn test_build_routes_and_instantiates() {
        let app = Application::builder()
            .config(greet_config())
            .settings(settings())
            .build()
            .await
            .unwrap();

        assert_eq!(app.container().state_of::<Greeting>(), Some(InstanceState::Instantiated));
        assert_eq!(
            app.container().state_of::<GreetController>(),
            Some(InstanceState::Instantiated)
        );
        assert_eq!(app.router().route_count(), 1);
        assert_eq!(app.server_config().port, 3000);

        let result = app.router().dispatch(IncomingRequest::get("/greet")).await;
        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(result.body, json!("rawr"));
    }

    #[tokio::test]
    async fn test_duplicate_injectable_aborts_startup() {
        let err = Application::builder()
            .config(greet_config())
            .config(ApplicationConfig::new().provider::<Greeting>(Scope::Transient))
            .settings(ConfigService::new())
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TalonError::DuplicateRegistration { .. }));
    }

    #[tokio::test]
    async fn test_missing_dependency_aborts_startup() {
        let config = ApplicationConfig::new().controller(
            ControllerDescriptor::builder::<GreetController>("/greet")
                .get("/", |route| {
                    route.action("greet", |controller, _args| async move {
                        controller.greet().await
                    })
                })
                .build(),
        );

        let err = Application::builder()
            .config(config)
            .settings(ConfigService::new())
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TalonError::UnresolvedDependency { .. }));
    }

    #[tokio::test]
    async fn test_invalid_server_settings_abort_startup() {
        let settings = ConfigService::new();
        settings.set("PORT", "not-a-port");

        let err = Application::builder()
            .settings(settings)
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TalonError::InvalidConfig { .. }));
    }
}
