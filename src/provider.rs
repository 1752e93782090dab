//! Units of construction used by bindings.
//!
//! A provider produces a fresh (or fixed) instance each time it is asked. Caching is not its
//! concern: the [scope](crate::Scope) of the binding decides whether a provider runs at all.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{Component, Dependencies, Manifest, ResolutionContext, ResolveError};

/// Type-erased shared instance produced by a provider.
///
/// It always wraps an ```Arc``` of the concrete type registered with the binding.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Produce an instance of a concrete type
///
/// This trait allows to use a uniform API for constructors with injected dependencies,
/// custom factory functions and pre-built values.
pub trait Provide: Send + Sync {
    /// Build an instance, resolving the dependencies through the context.
    ///
    /// Fails only by propagating a failed nested resolution.
    fn produce(&self, ctx: &mut ResolutionContext<'_>) -> Result<Instance, ResolveError>;

    /// Metadata about the produced component
    fn manifest(&self) -> &Arc<Manifest>;
}

/// Shared trait object implementing [Provide]
pub type Provider = Arc<dyn Provide>;

/// Build a [Component] after resolving its declared dependencies
pub struct ConstructorProvider<C> {
    manifest: Arc<Manifest>,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> ConstructorProvider<C> {
    pub fn build() -> Arc<Self> {
        Arc::new(Self {
            manifest: Arc::new(Manifest::of::<C>()),
            _component: PhantomData,
        })
    }
}

impl<C: Component> Provide for ConstructorProvider<C> {
    fn produce(&self, ctx: &mut ResolutionContext<'_>) -> Result<Instance, ResolveError> {
        let deps = C::Deps::resolve(ctx)?;
        Ok(Arc::new(C::construct(deps)))
    }

    fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }
}

/// Delegate construction to a caller-supplied function.
///
/// The function receives the current [ResolutionContext] and may resolve any number of
/// nested dependencies through it, or ignore it.
pub struct FactoryProvider<C, F> {
    factory: F,
    manifest: Arc<Manifest>,
    _component: PhantomData<fn() -> C>,
}

impl<C, F> FactoryProvider<C, F>
where
    C: Send + Sync + 'static,
    F: Fn(&mut ResolutionContext<'_>) -> Result<C, ResolveError> + Send + Sync + 'static,
{
    pub fn build(factory: F) -> Arc<Self> {
        Self::with_manifest(factory, Manifest::opaque::<C>())
    }

    /// Same as [FactoryProvider::build], describing the component with the given manifest
    pub fn with_manifest(factory: F, manifest: Manifest) -> Arc<Self> {
        Arc::new(Self {
            factory,
            manifest: Arc::new(manifest),
            _component: PhantomData,
        })
    }
}

impl<C, F> Provide for FactoryProvider<C, F>
where
    C: Send + Sync + 'static,
    F: Fn(&mut ResolutionContext<'_>) -> Result<C, ResolveError> + Send + Sync + 'static,
{
    fn produce(&self, ctx: &mut ResolutionContext<'_>) -> Result<Instance, ResolveError> {
        let value = (self.factory)(ctx)?;
        Ok(Arc::new(value))
    }

    fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }
}

/// Hand out a pre-built value
pub struct ConstantProvider {
    value: Instance,
    manifest: Arc<Manifest>,
}

impl ConstantProvider {
    pub fn build<C: Send + Sync + 'static>(value: Arc<C>) -> Arc<Self> {
        Arc::new(Self {
            value,
            manifest: Arc::new(Manifest::opaque::<C>()),
        })
    }
}

impl Provide for ConstantProvider {
    fn produce(&self, _ctx: &mut ResolutionContext<'_>) -> Result<Instance, ResolveError> {
        Ok(self.value.clone())
    }

    fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }
}

impl fmt::Debug for dyn Provide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("component", &self.manifest().display_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

    #[derive(Default)]
    struct Lamp;
    crate::component!(Lamp => Lamp::default);

    #[test]
    fn constructor_builds_fresh_instances() {
        let container = Container::new();
        let mut ctx = ResolutionContext::new(&container);
        let provider = ConstructorProvider::<Lamp>::build();

        let first = provider.produce(&mut ctx).unwrap();
        let second = provider.produce(&mut ctx).unwrap();
        assert!(first.is::<Lamp>());
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn constant_hands_out_the_same_instance() {
        let container = Container::new();
        let mut ctx = ResolutionContext::new(&container);
        let lamp = Arc::new(Lamp);
        let provider: Provider = ConstantProvider::build(lamp.clone());

        let produced = provider.produce(&mut ctx).unwrap();
        let produced = produced.downcast::<Lamp>().unwrap();
        assert!(Arc::ptr_eq(&produced, &lamp));
        assert!(format!("{provider:?}").contains("Lamp"));
    }

    fn requester_len(ctx: &mut ResolutionContext<'_>) -> Result<usize, ResolveError> {
        Ok(ctx.requester().name().len())
    }

    #[test]
    fn factory_sees_the_context() {
        let container = Container::new();
        let mut ctx = ResolutionContext::new(&container);
        let provider = FactoryProvider::build(requester_len);

        let produced = provider.produce(&mut ctx).unwrap();
        let len = produced.downcast::<usize>().unwrap();
        assert_eq!(*len, crate::ROOT_REQUESTER.len());
        assert_eq!(provider.manifest().dependencies().len(), 0);
    }
}
