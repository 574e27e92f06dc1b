use crate::common::BoxFuture;
use crate::di::injectable::Provider;
use crate::di::{Instance, InjectableDescriptor, RequestScope, Scope};
use crate::error::{Result, TalonError};
use dashmap::DashMap;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tokio::sync::OnceCell;

/// Casts a resolved implementation into an `Arc<Arc<dyn Trait>>` wrapped as an [`Instance`].
pub(crate) type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// Lifecycle of a singleton entry. Transitions `Registered -> Instantiating -> Instantiated`
/// once; a failed construction falls back to `Registered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Registered,
    Instantiating,
    Instantiated,
}

impl InstanceState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => InstanceState::Instantiating,
            2 => InstanceState::Instantiated,
            _ => InstanceState::Registered,
        }
    }
}

pub(crate) struct ServiceEntry {
    pub(crate) descriptor: InjectableDescriptor,
    singleton: OnceCell<Instance>,
    state: AtomicU8,
}

impl ServiceEntry {
    pub(crate) fn new(descriptor: InjectableDescriptor) -> Self {
        let (singleton, state) = match &descriptor.provider {
            Provider::Instance(instance) => (
                OnceCell::new_with(Some(Arc::clone(instance))),
                InstanceState::Instantiated,
            ),
            Provider::Factory(_) => (OnceCell::new(), InstanceState::Registered),
        };
        Self {
            descriptor,
            singleton,
            state: AtomicU8::new(state as u8),
        }
    }

    fn state(&self) -> InstanceState {
        InstanceState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: InstanceState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

pub(crate) struct Binding {
    pub(crate) target: TypeId,
    pub(crate) target_name: &'static str,
    pub(crate) caster: CasterFn,
}

pub(crate) struct Registry {
    pub(crate) entries: HashMap<TypeId, ServiceEntry>,
    pub(crate) names: HashMap<String, TypeId>,
    pub(crate) order: Vec<TypeId>,
    pub(crate) bindings: HashMap<TypeId, Binding>,
}

static NEXT_RESOLVER: AtomicU64 = AtomicU64::new(1);

/// Which resolver is constructing which singleton, and which singleton each resolver is
/// blocked on. Shared by every resolver of a container so that a cycle split across
/// concurrent resolutions fails instead of deadlocking.
#[derive(Default)]
struct WaitFor {
    constructing: DashMap<TypeId, u64>,
    waiting: DashMap<u64, (TypeId, &'static str)>,
}

/// Map entry that lives as long as the guard.
struct Claim<'a, K: Eq + Hash, V> {
    map: &'a DashMap<K, V>,
    key: K,
}

impl<'a, K: Eq + Hash, V> Claim<'a, K, V> {
    fn new(map: &'a DashMap<K, V>, key: K, value: V) -> Self
    where
        K: Clone,
    {
        map.insert(key.clone(), value);
        Self { map, key }
    }
}

impl<K: Eq + Hash, V> Drop for Claim<'_, K, V> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// Thread-safe dependency injection container.
///
/// Built once by [`crate::di::ContainerBuilder`]; the registry is immutable afterwards and
/// clones are cheap handles onto the same singleton cache.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    wait_for: Arc<WaitFor>,
}

impl Container {
    pub(crate) fn from_registry(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            wait_for: Arc::new(WaitFor::default()),
        }
    }

    /// A resolver bound to this container, optionally inside a request scope.
    pub fn resolver(&self, request: Option<RequestScope>) -> Resolver {
        Resolver {
            id: NEXT_RESOLVER.fetch_add(1, Ordering::Relaxed),
            container: self.clone(),
            request,
            stack: Vec::new(),
        }
    }

    /// Resolve `T` outside of any request.
    pub async fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolver(None).resolve::<T>().await
    }

    /// Resolve `T` inside the given request scope.
    pub async fn resolve_in<T: Send + Sync + 'static>(&self, scope: &RequestScope) -> Result<Arc<T>> {
        self.resolver(Some(scope.clone())).resolve::<T>().await
    }

    /// Resolve a trait object bound with [`crate::di::ContainerBuilder::bind`].
    pub async fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolver(None).resolve_trait::<T>().await
    }

    /// Eagerly construct every singleton, in registration order.
    ///
    /// Called once at startup so construction failures surface before the first request.
    pub async fn instantiate_all_singletons(&self) -> Result<usize> {
        let singletons: Vec<(TypeId, &'static str)> = self
            .registry
            .order
            .iter()
            .filter_map(|type_id| self.registry.entries.get(type_id))
            .filter(|entry| entry.descriptor.scope() == Scope::Singleton)
            .map(|entry| (entry.descriptor.type_id(), entry.descriptor.type_name()))
            .collect();

        tracing::info!("Instantiating {} singletons...", singletons.len());
        for &(type_id, name) in &singletons {
            self.resolver(None).resolve_instance(type_id, name).await?;
            tracing::debug!("Instantiated: {}", name);
        }
        Ok(singletons.len())
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.contains_id(TypeId::of::<T>())
    }

    pub fn contains_id(&self, type_id: TypeId) -> bool {
        self.registry.entries.contains_key(&type_id) || self.registry.bindings.contains_key(&type_id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.registry.names.contains_key(name)
    }

    pub fn scope_of<T: 'static>(&self) -> Option<Scope> {
        self.registry
            .entries
            .get(&TypeId::of::<T>())
            .map(|entry| entry.descriptor.scope())
    }

    /// Lifecycle state of a singleton; `None` for unregistered or non-singleton types.
    pub fn state_of<T: 'static>(&self) -> Option<InstanceState> {
        self.registry
            .entries
            .get(&TypeId::of::<T>())
            .filter(|entry| entry.descriptor.scope() == Scope::Singleton)
            .map(ServiceEntry::state)
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &InjectableDescriptor> {
        self.registry
            .order
            .iter()
            .filter_map(|type_id| self.registry.entries.get(type_id))
            .map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.registry.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.entries.is_empty()
    }

    fn entry(&self, type_id: TypeId) -> Option<&ServiceEntry> {
        self.registry.entries.get(&type_id)
    }

    fn binding(&self, type_id: TypeId) -> Option<&Binding> {
        self.registry.bindings.get(&type_id)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.registry.entries.len())
            .field("bindings", &self.registry.bindings.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    type_id: TypeId,
    type_name: &'static str,
}

/// A single resolution pass.
///
/// Carries the resolution stack used for cycle detection and the request scope (if any)
/// that Request-scoped types are cached in.
pub struct Resolver {
    id: u64,
    container: Container,
    request: Option<RequestScope>,
    stack: Vec<Frame>,
}

impl Resolver {
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The request scope visible to this resolution. `None` at startup and while a
    /// singleton is being constructed.
    pub fn request_scope(&self) -> Option<&RequestScope> {
        self.request.as_ref()
    }

    pub async fn resolve<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let instance = self
            .resolve_instance(TypeId::of::<T>(), type_name::<T>())
            .await?;
        instance
            .downcast::<T>()
            .map_err(|_| TalonError::downcast(type_name::<T>()))
    }

    pub async fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let instance = self
            .resolve_instance(TypeId::of::<T>(), type_name::<T>())
            .await?;
        // Bindings hand out an Arc<Arc<dyn Trait>>.
        let wrapper = instance
            .downcast::<Arc<T>>()
            .map_err(|_| TalonError::downcast(type_name::<T>()))?;
        Ok(wrapper.as_ref().clone())
    }

    /// Type-erased resolution, depth-first, honoring each entry's scope.
    pub(crate) fn resolve_instance(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> BoxFuture<'_, Result<Instance>> {
        Box::pin(async move {
            let binding = self
                .container
                .binding(type_id)
                .map(|b| (b.target, b.target_name, Arc::clone(&b.caster)));
            if let Some((target, target_name, caster)) = binding {
                let instance = self.resolve_instance(target, target_name).await?;
                return caster(instance).ok_or_else(|| TalonError::downcast(type_name));
            }

            let container = self.container.clone();
            let entry = container
                .entry(type_id)
                .ok_or_else(|| TalonError::unresolved(type_name))?;

            if self.stack.iter().any(|frame| frame.type_id == type_id) {
                return Err(self.cycle_error(type_id, type_name, &[]));
            }

            let frame = Frame { type_id, type_name };
            match entry.descriptor.scope() {
                Scope::Singleton => {
                    if let Some(instance) = entry.singleton.get() {
                        return Ok(Arc::clone(instance));
                    }
                    let factory = factory_of(entry)?;

                    // Registered before the check so that of two resolvers closing a cycle,
                    // the later one always sees the whole chain.
                    let wait_for = &*container.wait_for;
                    let resolver_id = self.id;
                    let _waiting = Claim::new(&wait_for.waiting, resolver_id, (type_id, type_name));
                    if let Some((owned, chain)) = self.wait_chain(type_id) {
                        return Err(self.cycle_error(owned, type_name, &chain));
                    }

                    // Singletons never capture request-scoped state.
                    let request = self.request.take();
                    self.stack.push(frame);
                    let this = &mut *self;
                    let result = entry
                        .singleton
                        .get_or_try_init(move || async move {
                            wait_for.waiting.remove(&resolver_id);
                            let _constructing =
                                Claim::new(&wait_for.constructing, type_id, resolver_id);
                            entry.set_state(InstanceState::Instantiating);
                            tracing::debug!("Constructing singleton {}", type_name);
                            let outcome = factory(this).await;
                            entry.set_state(if outcome.is_ok() {
                                InstanceState::Instantiated
                            } else {
                                InstanceState::Registered
                            });
                            outcome
                        })
                        .await
                        .map(Arc::clone);
                    self.stack.pop();
                    self.request = request;
                    result
                }
                Scope::Transient => {
                    let factory = factory_of(entry)?;
                    self.stack.push(frame);
                    let outcome = factory(self).await;
                    self.stack.pop();
                    outcome
                }
                Scope::Request => {
                    let scope = self.request.clone().ok_or_else(|| TalonError::ScopeMismatch {
                        message: format!(
                            "{} is request-scoped but was resolved outside of a request",
                            type_name
                        ),
                    })?;
                    if let Some(instance) = scope.get(type_id) {
                        return Ok(instance);
                    }
                    let factory = factory_of(entry)?;
                    self.stack.push(frame);
                    let outcome = factory(self).await;
                    self.stack.pop();
                    Ok(scope.publish(type_id, outcome?))
                }
            }
        })
    }

    /// Follows singleton owners from `type_id` through the types they are blocked on.
    /// Returns the singleton this resolver is constructing that closes the loop, with the
    /// types waited on along the way.
    fn wait_chain(&self, type_id: TypeId) -> Option<(TypeId, Vec<&'static str>)> {
        let wait_for = &self.container.wait_for;
        let mut current = type_id;
        let mut chain = Vec::new();
        for _ in 0..=self.container.len() {
            let owner = *wait_for.constructing.get(&current)?;
            if owner == self.id {
                return Some((current, chain));
            }
            let (next, name) = *wait_for.waiting.get(&owner)?;
            chain.push(name);
            current = next;
        }
        None
    }

    fn cycle_error(&self, from: TypeId, type_name: &'static str, chain: &[&'static str]) -> TalonError {
        let mut cycle: Vec<&str> = self
            .stack
            .iter()
            .skip_while(|frame| frame.type_id != from)
            .map(|frame| frame.type_name)
            .collect();
        cycle.push(type_name);
        cycle.extend_from_slice(chain);
        TalonError::CyclicDependency {
            cycle: cycle.join(" -> "),
        }
    }
}

fn factory_of(entry: &ServiceEntry) -> Result<crate::di::injectable::Factory> {
    match &entry.descriptor.provider {
        Provider::Factory(factory) => Ok(Arc::clone(factory)),
        Provider::Instance(_) => Err(TalonError::Internal(format!(
            "{} was registered as an instance but has no cached value",
            entry.descriptor.type_name()
        ))),
    }
}
