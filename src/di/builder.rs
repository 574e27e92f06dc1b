use crate::di::container::{Binding, CasterFn, Registry, ServiceEntry};
use crate::di::{Container, Injectable, InjectableDescriptor, Instance, Scope};
use crate::error::{Result, TalonError};
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for constructing a dependency injection container
///
/// Registration only records descriptors; nothing is constructed until resolution or
/// [`Container::instantiate_all_singletons`].
///
/// # Example
/// ```
/// use talon::di::{ContainerBuilder, Scope};
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_instance(String::from("postgres://localhost")).unwrap();
/// let container = builder.build();
/// assert!(container.contains::<String>());
/// ```
pub struct ContainerBuilder {
    entries: HashMap<TypeId, ServiceEntry>,
    names: HashMap<String, TypeId>,
    order: Vec<TypeId>,
    bindings: HashMap<TypeId, Binding>,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            names: HashMap::new(),
            order: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    /// Register a descriptor.
    ///
    /// # Errors
    /// `DuplicateRegistration` if the type or the name is already registered.
    pub fn register(&mut self, descriptor: InjectableDescriptor) -> Result<&mut Self> {
        let type_id = descriptor.type_id();
        if self.entries.contains_key(&type_id) || self.bindings.contains_key(&type_id) {
            return Err(TalonError::duplicate(descriptor.type_name()));
        }
        if self.names.contains_key(descriptor.name()) {
            return Err(TalonError::duplicate(descriptor.name()));
        }

        tracing::debug!(
            "Registering {} as {} ({})",
            descriptor.type_name(),
            descriptor.name(),
            descriptor.scope()
        );
        self.names.insert(descriptor.name().to_string(), type_id);
        self.order.push(type_id);
        self.entries.insert(type_id, ServiceEntry::new(descriptor));
        Ok(self)
    }

    /// Register `T` under its type name.
    pub fn register_type<T: Injectable>(&mut self, scope: Scope) -> Result<&mut Self> {
        self.register(InjectableDescriptor::of::<T>(scope))
    }

    /// Register `T` under an explicit name.
    pub fn register_named<T: Injectable>(
        &mut self,
        scope: Scope,
        name: impl Into<String>,
    ) -> Result<&mut Self> {
        self.register(InjectableDescriptor::of::<T>(scope).named(name))
    }

    /// Register an already constructed singleton.
    pub fn register_instance<T: Send + Sync + 'static>(&mut self, instance: T) -> Result<&mut Self> {
        self.register(InjectableDescriptor::instance(instance))
    }

    /// Bind a trait to a concrete implementation
    ///
    /// This enables resolving `Arc<dyn Trait>`; the instance is obtained through the
    /// implementation's own registration and scope.
    pub fn bind<Trait, Impl, F>(&mut self, caster_fn: F) -> Result<&mut Self>
    where
        Trait: ?Sized + Send + Sync + 'static,
        Impl: Send + Sync + 'static,
        F: Fn(Arc<Impl>) -> Arc<Trait> + Send + Sync + 'static,
    {
        let trait_id = TypeId::of::<Trait>();
        if self.bindings.contains_key(&trait_id) || self.entries.contains_key(&trait_id) {
            return Err(TalonError::duplicate(type_name::<Trait>()));
        }

        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance)
        });

        self.bindings.insert(
            trait_id,
            Binding {
                target: TypeId::of::<Impl>(),
                target_name: type_name::<Impl>(),
                caster,
            },
        );
        Ok(self)
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.entries.contains_key(&type_id) || self.bindings.contains_key(&type_id)
    }

    /// Build the container
    pub fn build(self) -> Container {
        Container::from_registry(Registry {
            entries: self.entries,
            names: self.names,
            order: self.order,
            bindings: self.bindings,
        })
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
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

    struct OtherClock;

    #[async_trait]
    impl Injectable for OtherClock {
        async fn inject(_resolver: &mut Resolver) -> Result<Self> {
            Ok(OtherClock)
        }
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let mut builder = ContainerBuilder::new();
        builder.register_type::<Clock>(Scope::Singleton).unwrap();
        let err = builder.register_type::<Clock>(Scope::Transient).err().unwrap();
        assert!(matches!(err, TalonError::DuplicateRegistration { .. }));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut builder = ContainerBuilder::new();
        builder.register_named::<Clock>(Scope::Singleton, "clock").unwrap();
        let err = builder
            .register_named::<OtherClock>(Scope::Singleton, "clock")
            .err()
            .unwrap();
        match err {
            TalonError::DuplicateRegistration { name } => assert_eq!(name, "clock"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_registration_does_not_construct() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_named::<Clock>(Scope::Singleton, "clock")
            .unwrap();
        let container = builder.build();
        assert!(container.contains_name("clock"));
        assert_eq!(
            container.state_of::<Clock>(),
            Some(crate::di::InstanceState::Registered)
        );
        assert_eq!(container.len(), 1);
    }
}
