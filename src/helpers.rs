/// Declare that a concrete type can serve one or more trait-object capabilities.
///
/// This macro writes one [Implements](crate::Implements) impl per capability, each one a plain
/// ```Arc``` coercion. Every type already serves itself, only list the other capabilities.
///
/// ```
/// # use niwa::*;
/// trait Runner: Send + Sync {}
/// trait Jumper: Send + Sync {}
///
/// struct Cheetah;
/// impl Runner for Cheetah {}
/// impl Jumper for Cheetah {}
///
/// implements!(Cheetah: dyn Runner, dyn Jumper);
/// ```
#[macro_export]
macro_rules! implements {
    ($Concrete:ty : $($Capability:ty),+ $(,)?) => {
        $(
        impl $crate::Implements<$Capability> for $Concrete {
            fn upcast(this: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$Capability> {
                this
            }
        }
        )+
    };
}

/// Declare how the container builds a concrete type.
///
/// This macro provides an implementation of [Component](crate::Component) for ```$Type```.
/// The instance is obtained by calling the ```$constructor``` function with one argument per
/// listed dependency, in order. A dependency is either ```Arc<I>``` (first binding of ```I```)
/// or ```Vec<Arc<I>>``` (all bindings of ```I```). An optional display name can be given with
/// ```as "Name"```.
///
/// ```
/// # use std::sync::Arc;
/// # use niwa::*;
/// #[derive(Default)]
/// struct Home;
/// component!(Home => Home::default);
///
/// struct Snake {
///     home: Arc<Home>,
/// }
/// component!(Snake as "GrassSnake" => |home: Arc<Home>| Snake { home }, Arc<Home>);
///
/// assert_eq!(Manifest::of::<Snake>().display_name(), "GrassSnake");
/// assert_eq!(Manifest::of::<Snake>().dependencies().len(), 1);
/// ```
#[macro_export]
macro_rules! component {
    ($Type:ty $(as $name:expr)? => $constructor:expr $(, $Dep:ty)* $(,)?) => {
        impl $crate::Component for $Type {
            type Deps = ($($Dep,)*);
            $( const NAME: ::std::option::Option<&'static str> = ::std::option::Option::Some($name); )?

            fn construct(deps: Self::Deps) -> Self {
                $crate::Callable::call(&$constructor, deps)
            }
        }
    };
}
