use crate::controller::ControllerDescriptor;
use crate::di::{ContainerBuilder, Injectable, InjectableDescriptor, Scope};
use crate::error::Result;
use std::sync::Arc;

type BindingFn = Box<dyn FnOnce(&mut ContainerBuilder) -> Result<()> + Send>;

/// Everything an application registers at startup: injectables, controllers and trait
/// bindings.
///
/// Nothing is validated here; duplicates surface when the application is built.
///
/// # Example
/// ```
/// use talon::module::{ApplicationConfig, Module};
///
/// struct HealthModule;
///
/// impl Module for HealthModule {
///     fn configure(config: ApplicationConfig) -> ApplicationConfig {
///         config.instance(String::from("ok"))
///     }
/// }
///
/// let config = ApplicationConfig::new().module::<HealthModule>();
/// assert_eq!(config.injectable_count(), 1);
/// ```
#[derive(Default)]
pub struct ApplicationConfig {
    pub(crate) injectables: Vec<InjectableDescriptor>,
    pub(crate) controllers: Vec<ControllerDescriptor>,
    pub(crate) bindings: Vec<BindingFn>,
}

impl ApplicationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn injectable(mut self, descriptor: InjectableDescriptor) -> Self {
        self.injectables.push(descriptor);
        self
    }

    /// Register `T` with the given scope.
    pub fn provider<T: Injectable>(self, scope: Scope) -> Self {
        self.injectable(InjectableDescriptor::of::<T>(scope))
    }

    /// Register an already constructed singleton.
    pub fn instance<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.injectable(InjectableDescriptor::instance(value))
    }

    pub fn controller(mut self, descriptor: ControllerDescriptor) -> Self {
        self.controllers.push(descriptor);
        self
    }

    /// Bind `Trait` to `Impl`; see [`ContainerBuilder::bind`].
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        Impl: Send + Sync + 'static,
        F: Fn(Arc<Impl>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.bindings.push(Box::new(move |builder: &mut ContainerBuilder| {
            builder.bind::<Trait, Impl, F>(caster).map(|_| ())
        }));
        self
    }

    /// Merge another configuration into this one, after the existing entries.
    pub fn import(mut self, other: ApplicationConfig) -> Self {
        self.injectables.extend(other.injectables);
        self.controllers.extend(other.controllers);
        self.bindings.extend(other.bindings);
        self
    }

    pub fn module<M: Module>(self) -> Self {
        self.import(M::configure(ApplicationConfig::new()))
    }

    pub fn injectable_count(&self) -> usize {
        self.injectables.len()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }
}

impl std::fmt::Debug for ApplicationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationConfig")
            .field("injectables", &self.injectables)
            .field("controllers", &self.controllers.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

/// Trait for application modules
///
/// A module is a reusable unit of configuration: it adds its providers, controllers and
/// bindings, and may import other modules.
pub trait Module {
    fn configure(config: ApplicationConfig) -> ApplicationConfig;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Resolver;
    use async_trait::async_trait;

    struct Clock;

    #[async_trait]
    impl Injectable for Clock {
        async fn inject(_resolver: &mut Resolver) -> Result<Self> {
            Ok(Clock)
        }
    }

    struct TimeModule;

    impl Module for TimeModule {
        fn configure(config: ApplicationConfig) -> ApplicationConfig {
            config.provider::<Clock>(Scope::Singleton)
        }
    }

    struct AppModule;

    impl Module for AppModule {
        fn configure(config: ApplicationConfig) -> ApplicationConfig {
            config.module::<TimeModule>().instance(42_u32)
        }
    }

    #[test]
    fn test_modules_compose_in_order() {
        let config = ApplicationConfig::new().module::<AppModule>();
        let names: Vec<&str> = config.injectables.iter().map(|d| d.type_name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Clock"));
        assert_eq!(names[1], "u32");
    }

    #[test]
    fn test_bindings_apply_to_builder() {
        trait Tick: Send + Sync {}
        impl Tick for Clock {}

        let config = ApplicationConfig::new()
            .provider::<Clock>(Scope::Singleton)
            .bind::<dyn Tick, Clock, _>(|clock| clock as Arc<dyn Tick>);

        let mut builder = ContainerBuilder::new();
        for bind in config.bindings {
            bind(&mut builder).unwrap();
        }
        assert!(builder.contains::<dyn Tick>());
    }
}
