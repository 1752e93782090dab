//! Bindings and the per-container registry.
//!
//! A [Binding] associates one or more capabilities with exactly one provider and one scope
//! policy: all its capabilities share the same singleton slot. The [Registry] keeps the
//! bindings of a container in registration order and indexes them by capability.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::provider::{ConstantProvider, ConstructorProvider, FactoryProvider};
use crate::scope::ScopePolicy;
use crate::{
    Capability, Component, Implements, Instance, Manifest, Provider, ResolutionContext,
    ResolveError, Scope,
};

/// Type-erased ```Arc<I>``` for a requested capability ```I```
pub(crate) type Erased = Box<dyn Any>;

/// Convert an instance of the bound implementation into the handle of one capability
pub(crate) type Caster = fn(Instance) -> Erased;

fn upcast<C, I>(instance: Instance) -> Erased
where
    C: Implements<I> + Send + Sync + 'static,
    I: ?Sized + 'static,
{
    match instance.downcast::<C>() {
        Ok(concrete) => Box::new(C::upcast(concrete)),
        Err(_) => unreachable!(
            "provider for {} produced a foreign type",
            std::any::type_name::<C>()
        ),
    }
}

/// One capability served by a binding, with its conversion from the implementation
#[derive(Clone, Copy)]
pub struct Facet {
    pub(crate) capability: Capability,
    pub(crate) cast: Caster,
}

impl Facet {
    fn of<C, I>() -> Self
    where
        C: Implements<I> + Send + Sync + 'static,
        I: ?Sized + 'static,
    {
        Self {
            capability: Capability::of::<I>(),
            cast: upcast::<C, I>,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

/// Type-level list of the capabilities of a binding under construction
///
/// ```With<I, Rest>``` prepends the capability ```I``` to the list ```Rest```, the empty list
/// is ```()```. This type is never instantiated.
pub struct With<I: ?Sized, Rest>(PhantomData<fn() -> (PhantomData<I>, Rest)>);

/// Mark a capability list as servable by the implementation ```C```
///
/// This trait is implemented for [With] lists when ```C``` implements every listed capability.
pub trait ServedBy<C> {
    /// Append the facets of the list, in declaration order
    fn facets(out: &mut Vec<Facet>);
}

impl<C> ServedBy<C> for () {
    fn facets(_out: &mut Vec<Facet>) {}
}

impl<C, I, Rest> ServedBy<C> for With<I, Rest>
where
    C: Implements<I> + Send + Sync + 'static,
    I: ?Sized + 'static,
    Rest: ServedBy<C>,
{
    fn facets(out: &mut Vec<Facet>) {
        Rest::facets(out);
        out.push(Facet::of::<C, I>());
    }
}

/// A registered mapping from capabilities to a provider and a scope policy
pub struct Binding {
    order: usize,
    capabilities: Vec<Capability>,
    provider: Provider,
    manifest: Arc<Manifest>,
    policy: ScopePolicy,
}

impl Binding {
    /// Position of this binding in the registration order of its container
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn scope(&self) -> Scope {
        self.policy.scope()
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Component reported in resolution frames, the provider's own unless renamed
    pub fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }

    /// Obtain the instance according to the scope policy
    pub(crate) fn instance(
        &self,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        self.policy.resolve(&*self.provider, ctx)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("order", &self.order)
            .field("capabilities", &self.capabilities)
            .field("component", &self.manifest.display_name())
            .field("scope", &self.policy)
            .finish()
    }
}

#[derive(Clone, Copy)]
struct Slot {
    binding: usize,
    cast: Caster,
}

/// Ordered multimap from capability to bindings
#[derive(Default)]
pub(crate) struct Registry {
    bindings: Vec<Binding>,
    index: HashMap<Capability, Vec<Slot>>,
}

impl Registry {
    pub(crate) fn register(&mut self, facets: Vec<Facet>, provider: Provider) -> &mut Binding {
        let order = self.bindings.len();
        let mut capabilities: Vec<Capability> = Vec::with_capacity(facets.len());
        for facet in facets {
            if capabilities.contains(&facet.capability) {
                continue;
            }
            capabilities.push(facet.capability);
            self.index.entry(facet.capability).or_default().push(Slot {
                binding: order,
                cast: facet.cast,
            });
        }

        debug!(
            order,
            capabilities = ?capabilities,
            component = provider.manifest().display_name(),
            "Registered binding"
        );
        self.bindings.push(Binding {
            order,
            capabilities,
            manifest: provider.manifest().clone(),
            provider,
            policy: ScopePolicy::default(),
        });
        &mut self.bindings[order]
    }

    /// Bindings for a capability, in registration order, with their conversion
    pub(crate) fn lookup(
        &self,
        capability: Capability,
    ) -> impl Iterator<Item = (&Binding, Caster)> + '_ {
        self.index
            .get(&capability)
            .into_iter()
            .flatten()
            .map(|slot| (&self.bindings[slot.binding], slot.cast))
    }

    /// The earliest registered binding for a capability
    pub(crate) fn first(&self, capability: Capability) -> Option<(&Binding, Caster)> {
        self.lookup(capability).next()
    }

    pub(crate) fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }
}

/// Start of a registration, created by [crate::Container::bind]
///
/// More capabilities can be added with [BindingBuilder::and] before choosing the provider.
/// The binding is registered as soon as the provider is chosen, in transient scope.
#[must_use = "a binding is only registered once its provider is chosen"]
pub struct BindingBuilder<'c, L> {
    registry: &'c mut Registry,
    capabilities: PhantomData<fn() -> L>,
}

impl<'c, L> BindingBuilder<'c, L> {
    pub(crate) fn new(registry: &'c mut Registry) -> Self {
        Self {
            registry,
            capabilities: PhantomData,
        }
    }

    /// Also serve the capability ```I``` with the same provider and scope
    pub fn and<I: ?Sized + 'static>(self) -> BindingBuilder<'c, With<I, L>> {
        BindingBuilder {
            registry: self.registry,
            capabilities: PhantomData,
        }
    }

    /// Build a [Component] from its declared dependencies
    pub fn to<C: Component>(self) -> BindingHandle<'c>
    where
        L: ServedBy<C>,
    {
        self.register::<C>(ConstructorProvider::<C>::build())
    }

    /// Build instances with a custom function.
    ///
    /// Nested resolutions should go through the context the function receives: resolving
    /// through ```ctx.container().get()``` starts a new context, which loses cycle detection
    /// and requester names for that sub-tree.
    pub fn to_function<C, F>(self, factory: F) -> BindingHandle<'c>
    where
        C: Send + Sync + 'static,
        F: Fn(&mut ResolutionContext<'_>) -> Result<C, ResolveError> + Send + Sync + 'static,
        L: ServedBy<C>,
    {
        self.register::<C>(FactoryProvider::build(factory))
    }

    /// Build a [Component] with a custom function, keeping its declared name.
    ///
    /// The declared dependencies are not resolved: the function resolves what it needs
    /// through the context it receives.
    pub fn to_factory<C, F>(self, factory: F) -> BindingHandle<'c>
    where
        C: Component,
        F: Fn(&mut ResolutionContext<'_>) -> Result<C, ResolveError> + Send + Sync + 'static,
        L: ServedBy<C>,
    {
        let manifest = Manifest::factory::<C>();
        self.register::<C>(FactoryProvider::with_manifest(factory, manifest))
    }

    /// Always hand out the given instance
    pub fn to_constant<C: Send + Sync + 'static>(self, value: Arc<C>) -> BindingHandle<'c>
    where
        L: ServedBy<C>,
    {
        self.register::<C>(ConstantProvider::build(value))
    }

    fn register<C>(self, provider: Provider) -> BindingHandle<'c>
    where
        L: ServedBy<C>,
    {
        let mut facets = Vec::new();
        L::facets(&mut facets);
        BindingHandle {
            binding: self.registry.register(facets, provider),
        }
    }
}

impl<'c, C: Component> BindingBuilder<'c, With<C, ()>> {
    /// Bind a concrete component to itself
    pub fn to_self(self) -> BindingHandle<'c> {
        self.to::<C>()
    }
}

/// Registered binding, allowing to change its scope
pub struct BindingHandle<'c> {
    binding: &'c mut Binding,
}

impl BindingHandle<'_> {
    /// Build once and share the instance for the lifetime of the container
    pub fn in_singleton_scope(self) -> Self {
        self.in_scope(Scope::Singleton)
    }

    /// Build a new instance for every request (the default)
    pub fn in_transient_scope(self) -> Self {
        self.in_scope(Scope::Transient)
    }

    pub fn in_scope(self, scope: Scope) -> Self {
        if self.binding.scope() != scope {
            self.binding.policy = ScopePolicy::new(scope);
        }
        self
    }

    /// Report this binding to contextual factories under the given name
    pub fn named(self, name: &'static str) -> Self {
        let manifest = self.binding.manifest.as_ref().clone().with_name(name);
        self.binding.manifest = Arc::new(manifest);
        self
    }

    pub fn scope(&self) -> Scope {
        self.binding.scope()
    }

    pub fn order(&self) -> usize {
        self.binding.order()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Animal: Send + Sync {}
    trait Swimmer: Send + Sync {}

    #[derive(Default)]
    struct Fish;
    impl Animal for Fish {}
    impl Swimmer for Fish {}
    crate::implements!(Fish: dyn Animal, dyn Swimmer);

    #[derive(Default)]
    struct Bird;
    impl Animal for Bird {}
    crate::implements!(Bird: dyn Animal);

    crate::component!(Fish => Fish::default);
    crate::component!(Bird => Bird::default);

    #[test]
    fn registry_keeps_registration_order() {
        let mut registry = Registry::default();
        BindingBuilder::<With<dyn Animal, ()>>::new(&mut registry).to::<Fish>();
        BindingBuilder::<With<dyn Animal, ()>>::new(&mut registry).to::<Bird>();
        BindingBuilder::<With<dyn Animal, ()>>::new(&mut registry).to::<Fish>();

        let orders: Vec<usize> = registry
            .lookup(Capability::of::<dyn Animal>())
            .map(|(binding, _)| binding.order())
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);
        let (first, _) = registry.first(Capability::of::<dyn Animal>()).unwrap();
        assert_eq!(first.order(), 0);
        assert!(registry.first(Capability::of::<dyn Swimmer>()).is_none());
    }

    #[test]
    fn one_binding_serves_many_capabilities() {
        let mut registry = Registry::default();
        let handle = BindingBuilder::<With<dyn Animal, ()>>::new(&mut registry)
            .and::<dyn Swimmer>()
            .and::<dyn Animal>()
            .to::<Fish>()
            .in_singleton_scope();
        assert_eq!(handle.scope(), Scope::Singleton);

        assert_eq!(registry.len(), 1);
        let binding = &registry.bindings()[0];
        let animal = Capability::of::<dyn Animal>();
        let swimmer = Capability::of::<dyn Swimmer>();
        assert_eq!(binding.capabilities(), &[animal, swimmer]);
        assert_eq!(registry.lookup(Capability::of::<dyn Animal>()).count(), 1);
        assert_eq!(registry.lookup(Capability::of::<dyn Swimmer>()).count(), 1);
    }

    #[test]
    fn scope_defaults_to_transient() {
        let mut registry = Registry::default();
        let handle = BindingBuilder::<With<Bird, ()>>::new(&mut registry).to_self();
        assert_eq!(handle.scope(), Scope::Transient);
        let handle = handle.in_singleton_scope().in_transient_scope();
        assert_eq!(handle.scope(), Scope::Transient);
    }

    #[test]
    fn facets_follow_declaration_order() {
        let mut facets = Vec::new();
        <With<dyn Swimmer, With<dyn Animal, ()>> as ServedBy<Fish>>::facets(&mut facets);

        let capabilities: Vec<Capability> = facets.iter().map(Facet::capability).collect();
        let animal = Capability::of::<dyn Animal>();
        let swimmer = Capability::of::<dyn Swimmer>();
        assert_eq!(capabilities, vec![animal, swimmer]);
    }

    #[test]
    fn renaming_keeps_the_provider_manifest() {
        let mut registry = Registry::default();
        BindingBuilder::<With<Bird, ()>>::new(&mut registry)
            .to_self()
            .named("Sparrow");

        let binding = &registry.bindings()[0];
        assert_eq!(binding.manifest().display_name(), "Sparrow");
        assert_eq!(binding.provider().manifest().name(), None);
        assert!(format!("{binding:?}").contains("Sparrow"));
    }
}
