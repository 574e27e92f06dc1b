mod builder;
mod container;
mod injectable;
mod scope;

use std::any::Any;
use std::sync::Arc;

pub use builder::ContainerBuilder;
pub use container::{Container, InstanceState, Resolver};
pub use injectable::{Injectable, InjectableDescriptor};
pub use scope::{RequestScope, Scope};

/// A type-erased, shareable instance held by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;
