//! Per-call resolution state.
//!
//! A [ResolutionContext] is created for each top-level request and threaded by reference
//! through every nested resolution. It tracks the chain of capabilities being built, which
//! is used to detect cycles and to name the requester of a dependency, and the container
//! owning the binding that is currently being built.
//!
//! Frames are pushed through a guard which pops them on every exit path, including errors
//! and panics, so sibling resolutions always see the stack of their parent.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;

use crate::binding::Erased;
use crate::{Capability, Container, Manifest, ResolveError};

/// Requester name used when no component is being built
pub const ROOT_REQUESTER: &str = "<root>";

#[derive(Debug, Clone)]
struct Frame {
    capability: Capability,
    component: Arc<Manifest>,
}

/// Identity of the component whose construction pulls the current dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    name: &'static str,
}

impl Requester {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// State of an ongoing resolution
pub struct ResolutionContext<'a> {
    container: &'a Container<'a>,
    stack: Vec<Frame>,
}

impl<'a> ResolutionContext<'a> {
    pub(crate) fn new(container: &'a Container<'a>) -> Self {
        Self {
            container,
            stack: Vec::new(),
        }
    }

    /// The container owning the binding being built.
    ///
    /// Resolving through ```ctx.container().get()``` starts a fresh context: cycles in that
    /// sub-tree are not detected and the requester is lost. Use [ResolutionContext::get]
    /// to stay in the current resolution.
    pub fn container(&self) -> &'a Container<'a> {
        self.container
    }

    /// The component whose construction triggered the current resolution.
    ///
    /// This is the frame below the top of the stack, not the original top-level request.
    pub fn requester(&self) -> Requester {
        let name = match self.stack.len() {
            0 | 1 => ROOT_REQUESTER,
            len => self.stack[len - 2].component.display_name(),
        };
        Requester { name }
    }

    /// Capabilities currently being resolved, outermost first
    pub fn chain(&self) -> impl Iterator<Item = Capability> + '_ {
        self.stack.iter().map(|frame| frame.capability)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Resolve a single instance as part of the current resolution
    pub fn get<I: ?Sized + 'static>(&mut self) -> Result<Arc<I>, ResolveError> {
        let container = self.container;
        container.resolve(Capability::of::<I>(), self).map(unerase)
    }

    /// Resolve all instances of a capability as part of the current resolution
    pub fn get_all<I: ?Sized + 'static>(&mut self) -> Result<Vec<Arc<I>>, ResolveError> {
        let container = self.container;
        let handles = container.resolve_all(Capability::of::<I>(), self)?;
        Ok(handles.into_iter().map(unerase).collect())
    }

    /// Fail if the capability is already in flight
    pub(crate) fn ensure_not_resolving(&self, capability: Capability) -> Result<(), ResolveError> {
        if !self.chain().any(|resolving| resolving == capability) {
            return Ok(());
        }

        let chain: Vec<Capability> = self.chain().chain(Some(capability)).collect();
        debug!(capability = %capability, depth = chain.len(), "Circular dependency found");
        Err(ResolveError::CircularDependency { chain })
    }

    pub(crate) fn not_found(&self, capability: Capability) -> ResolveError {
        let required_by = self.stack.last().map(|f| f.component.display_name());
        debug!(capability = %capability, ?required_by, "Component not found");
        ResolveError::ComponentNotFound {
            capability,
            required_by,
        }
    }

    /// Push a frame and switch to the owning container until the guard is dropped
    pub(crate) fn enter<'f>(
        &'f mut self,
        owner: &'a Container<'a>,
        capability: Capability,
        component: Arc<Manifest>,
    ) -> ActiveFrame<'f, 'a> {
        let previous = std::mem::replace(&mut self.container, owner);
        self.stack.push(Frame {
            capability,
            component,
        });
        ActiveFrame {
            ctx: self,
            previous,
        }
    }
}

fn unerase<I: ?Sized + 'static>(handle: Erased) -> Arc<I> {
    match handle.downcast::<Arc<I>>() {
        Ok(instance) => *instance,
        Err(_) => unreachable!(
            "binding for {} produced a foreign handle",
            std::any::type_name::<I>()
        ),
    }
}

/// Scoped frame of a [ResolutionContext], removed when dropped
pub(crate) struct ActiveFrame<'f, 'a> {
    ctx: &'f mut ResolutionContext<'a>,
    previous: &'a Container<'a>,
}

impl<'a> Deref for ActiveFrame<'_, 'a> {
    type Target = ResolutionContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ActiveFrame<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ActiveFrame<'_, '_> {
    fn drop(&mut self) {
        self.ctx.stack.pop();
        self.ctx.container = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Home;
    struct Snake;

    fn home() -> Arc<Manifest> {
        Arc::new(Manifest::opaque::<Home>())
    }

    fn snake() -> Arc<Manifest> {
        Arc::new(Manifest::opaque::<Snake>())
    }

    #[test]
    fn frames_are_popped_on_drop() {
        let root = Container::new();
        let child = root.child();
        let mut ctx = ResolutionContext::new(&root);

        {
            let mut outer = ctx.enter(&child, Capability::of::<Snake>(), snake());
            assert!(std::ptr::eq(outer.container(), &child));
            {
                let inner = outer.enter(&root, Capability::of::<Home>(), home());
                assert_eq!(inner.depth(), 2);
                assert!(inner.requester().name().ends_with("Snake"));
            }
            assert_eq!(outer.depth(), 1);
            assert!(std::ptr::eq(outer.container(), &child));
            assert_eq!(outer.requester().name(), ROOT_REQUESTER);
        }

        assert_eq!(ctx.depth(), 0);
        assert!(std::ptr::eq(ctx.container(), &root));
    }

    #[test]
    fn in_flight_capability_is_a_cycle() {
        let root = Container::new();
        let mut ctx = ResolutionContext::new(&root);
        let frame = ctx.enter(&root, Capability::of::<Snake>(), snake());

        assert!(frame.ensure_not_resolving(Capability::of::<Home>()).is_ok());
        let err = frame.ensure_not_resolving(Capability::of::<Snake>()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::CircularDependency {
                chain: vec![Capability::of::<Snake>(), Capability::of::<Snake>()],
            }
        );
    }

    #[test]
    fn not_found_names_the_component_being_built() {
        let root = Container::new();
        let mut ctx = ResolutionContext::new(&root);
        assert_eq!(
            ctx.not_found(Capability::of::<Home>()),
            ResolveError::ComponentNotFound {
                capability: Capability::of::<Home>(),
                required_by: None,
            }
        );

        let frame = ctx.enter(&root, Capability::of::<Snake>(), snake());
        let err = frame.not_found(Capability::of::<Home>());
        assert!(err.to_string().ends_with("Snake)"));
    }
}
