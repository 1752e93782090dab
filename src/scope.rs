//! Lifetime policies of bound instances.

use std::fmt;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::{Instance, Provide, ResolutionContext, ResolveError};

/// Lifetime of the instances produced by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Build a new instance on every request
    #[default]
    Transient,
    /// Build once, then share the cached instance for the lifetime of the container
    Singleton,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Transient => write!(f, "Transient"),
            Scope::Singleton => write!(f, "Singleton"),
        }
    }
}

/// Caching rule wrapped around the provider of a binding.
///
/// The singleton slot is owned by the binding, it is one of the holders of the shared instance.
#[derive(Default)]
pub(crate) enum ScopePolicy {
    #[default]
    Transient,
    Singleton(OnceCell<Instance>),
}

impl ScopePolicy {
    pub(crate) fn new(scope: Scope) -> Self {
        match scope {
            Scope::Transient => ScopePolicy::Transient,
            Scope::Singleton => ScopePolicy::Singleton(OnceCell::new()),
        }
    }

    pub(crate) fn scope(&self) -> Scope {
        match self {
            ScopePolicy::Transient => Scope::Transient,
            ScopePolicy::Singleton(_) => Scope::Singleton,
        }
    }

    pub(crate) fn resolve(
        &self,
        provider: &dyn Provide,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        match self {
            ScopePolicy::Transient => provider.produce(ctx),
            ScopePolicy::Singleton(slot) => {
                if let Some(instance) = slot.get() {
                    return Ok(instance.clone());
                }

                // Construct outside of the cell: the provider may re-enter this binding
                // through another capability before failing on the cycle.
                let produced = provider.produce(ctx)?;
                let cached = slot.get_or_init(|| {
                    debug!(
                        component = provider.manifest().display_name(),
                        "Cached singleton instance"
                    );
                    produced
                });
                Ok(cached.clone())
            }
        }
    }
}

impl fmt::Debug for ScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopePolicy::Transient => f.write_str("Transient"),
            ScopePolicy::Singleton(slot) => f
                .debug_struct("Singleton")
                .field("cached", &slot.get().is_some())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display() {
        assert_eq!(format!("{}", Scope::Singleton), "Singleton");
        assert_eq!(format!("{}", Scope::Transient), "Transient");
        assert_eq!(Scope::default(), Scope::Transient);
    }

    #[test]
    fn policy_reports_its_scope() {
        assert_eq!(ScopePolicy::new(Scope::Singleton).scope(), Scope::Singleton);
        assert_eq!(ScopePolicy::default().scope(), Scope::Transient);
    }
}
