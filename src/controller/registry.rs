use crate::controller::ControllerDescriptor;
use crate::di::InjectableDescriptor;
use crate::error::{Result, TalonError};
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

/// Declaration-time metadata: every injectable and controller the application may use.
///
/// Written once at startup, read-only afterwards. Lookups are by type identity, so a type
/// that never deposited a controller descriptor is reported as `NotAController`.
#[derive(Debug, Default, Clone)]
pub struct DescriptorRegistry {
    injectables: HashMap<TypeId, InjectableDescriptor>,
    controllers: HashMap<TypeId, Arc<ControllerDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_injectable(&mut self, descriptor: InjectableDescriptor) -> Result<&mut Self> {
        let type_id = descriptor.type_id();
        if self.injectables.contains_key(&type_id) || self.controllers.contains_key(&type_id) {
            return Err(TalonError::duplicate(descriptor.type_name()));
        }
        self.injectables.insert(type_id, descriptor);
        Ok(self)
    }

    pub fn add_controller(&mut self, descriptor: ControllerDescriptor) -> Result<&mut Self> {
        let type_id = descriptor.type_id();
        if self.controllers.contains_key(&type_id) || self.injectables.contains_key(&type_id) {
            return Err(TalonError::duplicate(descriptor.type_name()));
        }
        self.controllers.insert(type_id, Arc::new(descriptor));
        Ok(self)
    }

    pub fn injectable(&self, type_id: TypeId) -> Option<&InjectableDescriptor> {
        self.injectables.get(&type_id)
    }

    pub fn controller(&self, type_id: TypeId) -> Option<Arc<ControllerDescriptor>> {
        self.controllers.get(&type_id).cloned()
    }

    /// Controller descriptor for `T`.
    ///
    /// # Errors
    /// `NotAController` when `T` carries no controller descriptor.
    pub fn controller_of<T: 'static>(&self) -> Result<Arc<ControllerDescriptor>> {
        self.controller(TypeId::of::<T>())
            .ok_or_else(|| TalonError::NotAController {
                type_name: type_name::<T>().to_string(),
            })
    }

    pub fn injectable_count(&self) -> usize {
        self.injectables.len()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Injectable, Resolver, Scope};
    use async_trait::async_trait;

    struct Stats;

    #[async_trait]
    impl Injectable for Stats {
        async fn inject(_resolver: &mut Resolver) -> Result<Self> {
            Ok(Stats)
        }
    }

    struct StatsController;

    #[async_trait]
    impl Injectable for StatsController {
        async fn inject(_resolver: &mut Resolver) -> Result<Self> {
            Ok(StatsController)
        }
    }

    #[test]
    fn test_lookup_by_type() {
        let mut registry = DescriptorRegistry::new();
        registry
            .add_injectable(InjectableDescriptor::of::<Stats>(Scope::Singleton))
            .unwrap()
            .add_controller(ControllerDescriptor::builder::<StatsController>("/stats").build())
            .unwrap();

        assert!(registry.controller_of::<StatsController>().is_ok());
        assert!(matches!(
            registry.controller_of::<Stats>(),
            Err(TalonError::NotAController { .. })
        ));
        assert_eq!(registry.injectable_count(), 1);
        assert_eq!(registry.controller_count(), 1);
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut registry = DescriptorRegistry::new();
        registry
            .add_injectable(InjectableDescriptor::of::<Stats>(Scope::Singleton))
            .unwrap();
        assert!(matches!(
            registry.add_injectable(InjectableDescriptor::of::<Stats>(Scope::Transient)),
            Err(TalonError::DuplicateRegistration { .. })
        ));
    }
}
