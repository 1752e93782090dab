//! Hierarchical inversion-of-control container with transient and singleton scopes.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use niwa::*;
//! // Define traits and implementors
//! trait Runner: Send + Sync {
//!     fn speed(&self) -> u32;
//! }
//!
//! #[derive(Default)]
//! struct Cheetah;
//!
//! impl Runner for Cheetah {
//!     fn speed(&self) -> u32 {
//!         120
//!     }
//! }
//!
//! // Declare how to build the implementor and which capabilities it serves
//! component!(Cheetah => Cheetah::default);
//! implements!(Cheetah: dyn Runner);
//!
//! # fn main() -> Result<(), ResolveError> {
//! let mut container = Container::new();
//! container.bind::<dyn Runner>().to::<Cheetah>().in_singleton_scope();
//!
//! let runner: Arc<dyn Runner> = container.get()?;
//! assert_eq!(runner.speed(), 120);
//! assert!(Arc::ptr_eq(&runner, &container.get::<dyn Runner>()?));
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! The container is a registry of bindings keyed by [Capability], the runtime identity of a
//! requested type (usually a trait object). Each [Binding] pairs a set of capabilities with
//! a single provider and a single scope policy.
//!
//! * A provider builds the concrete value: from the declared dependencies of a [Component],
//!   from a custom function receiving the [ResolutionContext], or by handing out a constant.
//! * The [Scope] decides whether the provider runs on every request ([Scope::Transient]) or
//!   once, the binding caching the shared instance for the lifetime of the container
//!   ([Scope::Singleton]).
//! * Instances are reference counted. The concrete ```Arc``` produced by the provider is
//!   converted to the requested capability with [Implements], so every capability of a
//!   binding shares the same allocation and the same singleton slot.
//!
//! Resolving a component recursively resolves its dependencies through the same
//! [ResolutionContext], which detects cycles and lets contextual factories know which
//! component they are building for ([ResolutionContext::requester]).
//!
//! Containers can be nested: a child sees the bindings of its ancestors, never the other way
//! around. Collection requests ([Container::get_all], or a ```Vec<Arc<I>>``` dependency)
//! gather the bindings of every ancestor, root first, then those of the querying container.

mod binding;
mod capability;
mod component;
mod container;
mod context;
mod error;
mod helpers;
mod provider;
mod scope;

pub use binding::{Binding, BindingBuilder, BindingHandle, Facet, ServedBy, With};
pub use capability::{Capability, Implements};
pub use component::{Callable, Component, Dependencies, Dependency, DependencySpec, Manifest};
pub use container::Container;
pub use context::{Requester, ResolutionContext, ROOT_REQUESTER};
pub use error::ResolveError;
pub use provider::{
    ConstantProvider, ConstructorProvider, FactoryProvider, Instance, Provide, Provider,
};
pub use scope::Scope;
