//! Capability keys and the upcasting contract between implementations and capabilities.
//!
//! A [Capability] identifies anything that can be requested from a container: a trait object
//! such as ```dyn Logger``` or a plain concrete type. Bindings are keyed by capability.
//!
//! Converting an ```Arc``` of the concrete type into an ```Arc``` of the capability can not be
//! expressed generically on stable Rust, so implementations declare it with [Implements],
//! usually through the [implements!](crate::implements) macro.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Comparable identifier for a requested type.
///
/// Equality and hashing only consider the [TypeId]; the type name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability({})", self.name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declare that a shared instance of the implementing type can serve the capability ```I```.
///
/// Every type serves itself. Trait objects need an explicit impl, which is a single coercion:
///
/// ```
/// # use std::sync::Arc;
/// # use niwa::Implements;
/// trait Runner: Send + Sync {}
/// struct Cheetah;
/// impl Runner for Cheetah {}
///
/// impl Implements<dyn Runner> for Cheetah {
///     fn upcast(this: Arc<Self>) -> Arc<dyn Runner> {
///         this
///     }
/// }
/// ```
pub trait Implements<I: ?Sized> {
    fn upcast(this: Arc<Self>) -> Arc<I>;
}

impl<T: ?Sized> Implements<T> for T {
    fn upcast(this: Arc<Self>) -> Arc<T> {
        this
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Walker {}
    struct Human;

    #[test]
    fn capabilities_compare_by_type() {
        assert_eq!(Capability::of::<Human>(), Capability::of::<Human>());
        assert_ne!(Capability::of::<Human>(), Capability::of::<dyn Walker>());

        let set: HashSet<Capability> = [
            Capability::of::<Human>(),
            Capability::of::<dyn Walker>(),
            Capability::of::<Human>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_uses_the_type_name() {
        assert!(Capability::of::<Human>().to_string().ends_with("Human"));
        assert!(Capability::of::<dyn Walker>().name().contains("Walker"));
    }

    #[test]
    fn type_id_matches_the_std_one() {
        assert_eq!(Capability::of::<Human>().type_id(), TypeId::of::<Human>());
        assert_ne!(Capability::of::<dyn Walker>().type_id(), TypeId::of::<Human>());
    }

    #[test]
    fn identity_upcast_keeps_the_allocation() {
        let human = Arc::new(Human);
        let same = <Human as Implements<Human>>::upcast(human.clone());
        assert!(Arc::ptr_eq(&human, &same));
    }
}
