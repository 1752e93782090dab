//! The container: a binding registry with an optional parent.
//!
//! # Lookup rules
//!
//! * A single resolution uses the earliest registered binding of the querying container.
//!   If it has none, the whole request is delegated to the parent, which only sees its own
//!   bindings and those of its ancestors.
//! * A collection resolution concatenates the bindings of every container from the root down
//!   to the querying one, each in registration order. An absent capability yields an empty
//!   collection.
//!
//! Lookups never go from a parent to its children.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::binding::{Caster, Erased, Registry};
use crate::{Binding, BindingBuilder, Capability, ResolutionContext, ResolveError, With};

/// Inversion-of-control container.
///
/// ```
/// # use std::sync::Arc;
/// # use niwa::*;
/// #[derive(Default)]
/// struct City;
/// component!(City => City::default);
///
/// #[derive(Default)]
/// struct Building;
/// component!(Building => Building::default);
///
/// # fn main() -> Result<(), ResolveError> {
/// let mut root = Container::new();
/// root.bind::<City>().to_self().in_singleton_scope();
///
/// let mut child = root.child();
/// child.bind::<Building>().to_self();
///
/// let city: Arc<City> = child.get()?;
/// assert!(Arc::ptr_eq(&city, &root.get::<City>()?));
/// assert!(root.get::<Building>().is_err());
/// # Ok(())
/// # }
/// ```
pub struct Container<'p> {
    registry: Registry,
    parent: Option<&'p Container<'p>>,
}

impl Container<'static> {
    /// Create a root container
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            parent: None,
        }
    }
}

impl Default for Container<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Container<'p> {
    /// Create a container delegating to ```parent``` for the capabilities it does not bind
    pub fn with_parent(parent: &'p Container<'p>) -> Self {
        Self {
            registry: Registry::default(),
            parent: Some(parent),
        }
    }

    /// Create a child of this container
    pub fn child(&self) -> Container<'_> {
        Container::with_parent(self)
    }

    pub fn parent(&self) -> Option<&'p Container<'p>> {
        self.parent
    }

    /// Start registering a binding for the capability ```I```.
    ///
    /// A capability can be bound several times: the first binding wins for single
    /// resolution, all of them are used for collection resolution.
    pub fn bind<I: ?Sized + 'static>(&mut self) -> BindingBuilder<'_, With<I, ()>> {
        BindingBuilder::new(&mut self.registry)
    }

    /// Resolve a single instance of ```I```
    pub fn get<I: ?Sized + 'static>(&self) -> Result<Arc<I>, ResolveError> {
        trace!(capability = %Capability::of::<I>(), "Resolving");
        ResolutionContext::new(self).get::<I>()
    }

    /// Resolve every instance of ```I``` visible from this container, root bindings first
    pub fn get_all<I: ?Sized + 'static>(&self) -> Result<Vec<Arc<I>>, ResolveError> {
        trace!(capability = %Capability::of::<I>(), "Resolving collection");
        ResolutionContext::new(self).get_all::<I>()
    }

    /// Check if ```I``` has a binding in this container or one of its ancestors
    pub fn is_bound<I: ?Sized + 'static>(&self) -> bool {
        let capability = Capability::of::<I>();
        self.lineage()
            .iter()
            .any(|container| container.registry.first(capability).is_some())
    }

    /// Local bindings, in registration order
    pub fn bindings(&self) -> &[Binding] {
        self.registry.bindings()
    }

    /// Number of local bindings
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// This container followed by its ancestors
    fn lineage<'s>(&'s self) -> Vec<&'s Container<'s>> {
        let mut lineage = Vec::new();
        let mut current: Option<&'s Container<'s>> = Some(self);
        while let Some(container) = current {
            lineage.push(container);
            current = container.parent;
        }
        lineage
    }

    pub(crate) fn resolve<'a>(
        &'a self,
        capability: Capability,
        ctx: &mut ResolutionContext<'a>,
    ) -> Result<Erased, ResolveError> {
        ctx.ensure_not_resolving(capability)?;

        match self.registry.first(capability) {
            Some((binding, cast)) => self.activate(binding, cast, capability, ctx),
            None => match self.parent {
                Some(parent) => {
                    trace!(capability = %capability, "No local binding, trying parent container");
                    parent.resolve(capability, ctx)
                }
                None => Err(ctx.not_found(capability)),
            },
        }
    }

    pub(crate) fn resolve_all<'a>(
        &'a self,
        capability: Capability,
        ctx: &mut ResolutionContext<'a>,
    ) -> Result<Vec<Erased>, ResolveError> {
        let mut handles = Vec::new();
        for container in self.lineage().into_iter().rev() {
            for (binding, cast) in container.registry.lookup(capability) {
                ctx.ensure_not_resolving(capability)?;
                handles.push(container.activate(binding, cast, capability, ctx)?);
            }
        }
        trace!(capability = %capability, count = handles.len(), "Resolved collection");
        Ok(handles)
    }

    /// Build (or fetch) the instance of a local binding inside a new frame
    fn activate<'a>(
        &'a self,
        binding: &Binding,
        cast: Caster,
        capability: Capability,
        ctx: &mut ResolutionContext<'a>,
    ) -> Result<Erased, ResolveError> {
        trace!(
            capability = %capability,
            order = binding.order(),
            scope = %binding.scope(),
            depth = ctx.depth(),
            "Activating binding"
        );
        let instance = {
            let mut frame = ctx.enter(self, capability, binding.manifest().clone());
            binding.instance(&mut frame)?
        };
        Ok(cast(instance))
    }
}

impl fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("depth", &(self.lineage().len() - 1))
            .finish()
    }
}
