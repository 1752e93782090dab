use std::fmt;

use thiserror::Error;

use crate::Capability;

/// Errors triggered while resolving a capability.
///
/// Both kinds are configuration errors: resolution is all-or-nothing and
/// the error reaches the caller exactly as it was raised, however deep in
/// the dependency graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Component not found: no binding for {capability}{}", RequiredBy(.required_by))]
    ComponentNotFound {
        /// The capability with no reachable binding
        capability: Capability,
        /// Display name of the component that was being built, if any
        required_by: Option<&'static str>,
    },
    #[error("Circular dependency found: {}", Chain(.chain))]
    CircularDependency {
        /// In-flight resolution chain, ending with the repeated capability
        chain: Vec<Capability>,
    },
}

impl ResolveError {
    /// The capability this error is about: the missing one, or the one that closed the cycle.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            ResolveError::ComponentNotFound { capability, .. } => Some(*capability),
            ResolveError::CircularDependency { chain } => chain.last().copied(),
        }
    }
}

struct RequiredBy<'a>(&'a Option<&'static str>);

impl fmt::Display for RequiredBy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, " (required by {name})"),
            None => Ok(()),
        }
    }
}

struct Chain<'a>(&'a [Capability]);

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, capability) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{capability}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Start;
    struct End;

    #[test]
    fn cycle_message_lists_the_chain() {
        let err = ResolveError::CircularDependency {
            chain: vec![
                Capability::of::<Start>(),
                Capability::of::<End>(),
                Capability::of::<Start>(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Circular dependency found: "));
        assert_eq!(msg.matches(" -> ").count(), 2);
        assert_eq!(err.capability(), Some(Capability::of::<Start>()));
    }

    #[test]
    fn missing_message_names_the_requester() {
        let err = ResolveError::ComponentNotFound {
            capability: Capability::of::<End>(),
            required_by: Some("Start"),
        };
        assert!(err.to_string().ends_with("(required by Start)"));
    }
}
