use crate::common::BoxFuture;
use crate::di::{Instance, Resolver, Scope};
use crate::error::Result;
use async_trait::async_trait;
use std::any::{TypeId, type_name};
use std::sync::Arc;

/// Trait for types that can be constructed by the DI container.
///
/// Dependencies are resolved through the [`Resolver`], which applies the scope rules of
/// each dependency and detects cycles.
///
/// # Example
/// ```
/// use talon::di::{Injectable, Resolver};
/// use talon::async_trait;
/// use std::sync::Arc;
///
/// pub struct Database;
///
/// #[async_trait]
/// impl Injectable for Database {
///     async fn inject(_resolver: &mut Resolver) -> talon::Result<Self> {
///         Ok(Database)
///     }
/// }
///
/// pub struct UserService {
///     database: Arc<Database>,
/// }
///
/// #[async_trait]
/// impl Injectable for UserService {
///     async fn inject(resolver: &mut Resolver) -> talon::Result<Self> {
///         Ok(UserService {
///             database: resolver.resolve::<Database>().await?,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency cannot be resolved.
    async fn inject(resolver: &mut Resolver) -> Result<Self>;
}

pub(crate) type Factory =
    Arc<dyn for<'a> Fn(&'a mut Resolver) -> BoxFuture<'a, Result<Instance>> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Provider {
    Factory(Factory),
    Instance(Instance),
}

fn construct<T: Injectable>(resolver: &mut Resolver) -> BoxFuture<'_, Result<Instance>> {
    Box::pin(async move {
        let instance = T::inject(resolver).await?;
        Ok(Arc::new(instance) as Instance)
    })
}

/// Immutable registration record: type identity, name and scope.
#[derive(Clone)]
pub struct InjectableDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    name: String,
    scope: Scope,
    pub(crate) provider: Provider,
}

impl InjectableDescriptor {
    /// Describe `T`, registered under its type name.
    pub fn of<T: Injectable>(scope: Scope) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: type_name::<T>().to_string(),
            scope,
            provider: Provider::Factory(Arc::new(construct::<T>)),
        }
    }

    /// Describe an already constructed value. Always a singleton.
    pub fn instance<T: Send + Sync + 'static>(instance: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: type_name::<T>().to_string(),
            scope: Scope::Singleton,
            provider: Provider::Instance(Arc::new(instance)),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl std::fmt::Debug for InjectableDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectableDescriptor")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}
