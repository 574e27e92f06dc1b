// Controllers are declared with explicit descriptors:
// - ControllerDescriptor::builder::<C>("/prefix") for the controller and its scope
// - .get/.post/.put/.patch/.delete for routes, each finished by .action(name, handler)
//
// Descriptors are deposited into a DescriptorRegistry at startup; the router turns them
// into dispatch entries.

mod descriptor;
mod registry;

pub use descriptor::{
    ActionFn, ActionResult, ControllerBuilder, ControllerDescriptor, DependencyKey, HookRef,
    ParamBinding, ParamSource, RouteBuilder, RouteDescriptor,
};
pub use registry::DescriptorRegistry;
