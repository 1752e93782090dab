//! Static description of the components built by the container.
//!
//! A [Component] declares the ordered list of values its constructor needs as a tuple type.
//! Each element of the tuple is either an ```Arc<I>``` (resolve one binding of ```I```) or
//! a ```Vec<Arc<I>>``` (resolve every binding of ```I``` across the container hierarchy).
//!
//! From this tuple we derive both the [Manifest] (what the component needs, used for
//! diagnostics and requester names) and the actual resolution of its dependencies, so both
//! views can not drift apart.

use std::any::type_name;
use std::sync::Arc;

use crate::{Capability, ResolutionContext, ResolveError};

/// A concrete type that the container can build from its declared dependencies.
///
/// ```
/// # use std::sync::Arc;
/// # use niwa::Component;
/// trait Nest: Send + Sync {}
///
/// struct Spider {
///     nest: Arc<dyn Nest>,
/// }
///
/// impl Component for Spider {
///     type Deps = (Arc<dyn Nest>,);
///     const NAME: Option<&'static str> = Some("Spider");
///
///     fn construct((nest,): Self::Deps) -> Self {
///         Spider { nest }
///     }
/// }
/// ```
///
/// The [component!](crate::component) macro writes this impl from a constructor function.
pub trait Component: Send + Sync + Sized + 'static {
    /// Injected values, in constructor order
    type Deps: Dependencies;

    /// Optional display name, reported to contextual factories through [crate::Requester]
    const NAME: Option<&'static str> = None;

    fn construct(deps: Self::Deps) -> Self;
}

/// One declared constructor parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySpec {
    pub capability: Capability,
    /// Inject all bindings of the capability instead of the first one
    pub collection: bool,
}

/// Immutable, per-type metadata about a component.
///
/// Built once when a binding is registered and shared by its provider and by the
/// resolution frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    name: Option<&'static str>,
    type_name: &'static str,
    dependencies: Vec<DependencySpec>,
}

impl Manifest {
    /// Describe a component from its [Component] impl
    pub fn of<C: Component>() -> Self {
        Self {
            name: C::NAME,
            type_name: type_name::<C>(),
            dependencies: C::Deps::specs(),
        }
    }

    /// Describe a type built outside of the container: no declared dependencies, no name
    pub fn opaque<C: ?Sized + 'static>() -> Self {
        Self {
            name: None,
            type_name: type_name::<C>(),
            dependencies: Vec::new(),
        }
    }

    /// Describe a component built by a custom function: its declared name, no dependencies
    pub fn factory<C: Component>() -> Self {
        Self {
            name: C::NAME,
            type_name: type_name::<C>(),
            dependencies: Vec::new(),
        }
    }

    /// Replace the display name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The declared name, or the Rust type name when none was declared
    pub fn display_name(&self) -> &'static str {
        self.name.unwrap_or(self.type_name)
    }

    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }
}

/// A single injectable constructor parameter
pub trait Dependency: Sized {
    fn spec() -> DependencySpec;

    fn resolve(ctx: &mut ResolutionContext<'_>) -> Result<Self, ResolveError>;
}

impl<I: ?Sized + 'static> Dependency for Arc<I> {
    fn spec() -> DependencySpec {
        DependencySpec {
            capability: Capability::of::<I>(),
            collection: false,
        }
    }

    fn resolve(ctx: &mut ResolutionContext<'_>) -> Result<Self, ResolveError> {
        ctx.get::<I>()
    }
}

impl<I: ?Sized + 'static> Dependency for Vec<Arc<I>> {
    fn spec() -> DependencySpec {
        DependencySpec {
            capability: Capability::of::<I>(),
            collection: true,
        }
    }

    fn resolve(ctx: &mut ResolutionContext<'_>) -> Result<Self, ResolveError> {
        ctx.get_all::<I>()
    }
}

/// Ordered list of injectable parameters
///
/// This trait is implemented for tuples of up to 10 [Dependency] types.
pub trait Dependencies: Sized {
    fn specs() -> Vec<DependencySpec>;

    /// Resolve every parameter in declaration order, stopping at the first failure
    fn resolve(ctx: &mut ResolutionContext<'_>) -> Result<Self, ResolveError>;
}

/// A Callable has a ```call``` function with a single argument and a single return type.
///
/// This trait is implemented for all functions with up to 10 arguments, using a tuple to
/// wrap them all in a single type. It lets [component!](crate::component) use any
/// constructor function with the resolved [Dependencies].
pub trait Callable<Args, Ret> {
    fn call(&self, args: Args) -> Ret;
}

macro_rules! dependency_tuple ({ $($param:ident)* } => {
    impl<Func, Ret, $($param,)*> Callable<($($param,)*), Ret> for Func
    where
        Func: Fn($($param),*) -> Ret,
    {
        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Ret {
            (self)($($param,)*)
        }
    }

    #[allow(clippy::unused_unit)]
    impl<$($param: Dependency,)*> Dependencies for ($($param,)*) {
        #[inline]
        fn specs() -> Vec<DependencySpec> {
            vec![$($param::spec(),)*]
        }

        #[inline]
        #[allow(unused_variables)]
        fn resolve(ctx: &mut ResolutionContext<'_>) -> Result<Self, ResolveError> {
            Ok(($($param::resolve(ctx)?,)*))
        }
    }
});

dependency_tuple! {}
dependency_tuple! { A }
dependency_tuple! { A B }
dependency_tuple! { A B C }
dependency_tuple! { A B C D }
dependency_tuple! { A B C D E }
dependency_tuple! { A B C D E F }
dependency_tuple! { A B C D E F G }
dependency_tuple! { A B C D E F G H }
dependency_tuple! { A B C D E F G H I }
dependency_tuple! { A B C D E F G H I J }

#[cfg(test)]
mod tests {
    use super::*;

    trait Material: Send + Sync {}
    trait Snake: Send + Sync {}

    struct Encyclopedy;

    impl Component for Encyclopedy {
        type Deps = (Arc<dyn Material>, Vec<Arc<dyn Snake>>);
        const NAME: Option<&'static str> = Some("Encyclopedy");

        fn construct(_: Self::Deps) -> Self {
            Encyclopedy
        }
    }

    struct Anonymous;

    impl Component for Anonymous {
        type Deps = ();

        fn construct((): ()) -> Self {
            Anonymous
        }
    }

    #[test]
    fn manifest_keeps_declaration_order() {
        let manifest = Manifest::of::<Encyclopedy>();
        assert_eq!(manifest.display_name(), "Encyclopedy");
        assert_eq!(
            manifest.dependencies(),
            &[
                DependencySpec {
                    capability: Capability::of::<dyn Material>(),
                    collection: false,
                },
                DependencySpec {
                    capability: Capability::of::<dyn Snake>(),
                    collection: true,
                },
            ]
        );
    }

    #[test]
    fn display_name_falls_back_to_type_name() {
        let manifest = Manifest::of::<Anonymous>();
        assert_eq!(manifest.name(), None);
        assert!(manifest.display_name().ends_with("Anonymous"));
        assert!(manifest.dependencies().is_empty());

        let opaque = Manifest::opaque::<dyn Snake>();
        assert!(opaque.display_name().contains("Snake"));
    }

    #[test]
    fn callable_spreads_the_tuple() {
        let add = |a: u32, b: u32| a + b;
        assert_eq!(Callable::call(&add, (2, 3)), 5);

        let unit = || "unit";
        assert_eq!(Callable::call(&unit, ()), "unit");
    }
}
