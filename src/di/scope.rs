use crate::di::Instance;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Injection scope of a registered type.
///
/// - `Singleton`: one instance for the lifetime of the container.
/// - `Transient`: a new instance on every resolution.
/// - `Request`: one instance per [`RequestScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scope {
    Singleton,
    Transient,
    Request,
}

/// Ephemeral instance cache for a single logical request.
///
/// Created at the start of request handling and dropped at the end. Clones share the
/// same cache, distinct scopes never do.
#[derive(Clone)]
pub struct RequestScope {
    id: Uuid,
    instances: Arc<DashMap<TypeId, Instance>>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Create a scope that shares its identity with a request.
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            instances: Arc::new(DashMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub(crate) fn get(&self, type_id: TypeId) -> Option<Instance> {
        self.instances.get(&type_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Publish a freshly constructed instance. If another construction won the race the
    /// earlier instance is kept and returned.
    pub(crate) fn publish(&self, type_id: TypeId, instance: Instance) -> Instance {
        Arc::clone(self.instances.entry(type_id).or_insert(instance).value())
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("id", &self.id)
            .field("instances", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scope_display_and_parse() {
        assert_eq!(Scope::Singleton.to_string(), "singleton");
        assert_eq!(Scope::from_str("Request").unwrap(), Scope::Request);
        assert!(Scope::from_str("session").is_err());
    }

    #[test]
    fn test_publish_keeps_first_instance() {
        let scope = RequestScope::new();
        let first: Instance = Arc::new(1_u32);
        let second: Instance = Arc::new(2_u32);

        let kept = scope.publish(TypeId::of::<u32>(), Arc::clone(&first));
        assert!(Arc::ptr_eq(&kept, &first));

        let kept = scope.publish(TypeId::of::<u32>(), second);
        assert!(Arc::ptr_eq(&kept, &first));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_clones_share_cache() {
        let scope = RequestScope::new();
        let clone = scope.clone();
        scope.publish(TypeId::of::<u8>(), Arc::new(7_u8));
        assert!(clone.get(TypeId::of::<u8>()).is_some());
        assert!(RequestScope::new().get(TypeId::of::<u8>()).is_none());
    }
}
