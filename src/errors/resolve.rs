use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt::{self, Display, Formatter};

use super::instantiate::InstantiateErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Not found {name}: no alias, factory, scalar or known type with this name")]
    NotFound { name: String },
    #[error("Type is not instantiable {name}")]
    NotInstantiable { name: String },
    #[error("Circular dependency while building {name}")]
    CircularDependency { name: String },
    #[error("Scalar value not found: {name}")]
    ScalarMissing { name: String },
    #[error("Parameter {parameter} has no single concrete type: {}", .candidates.join(" | "))]
    AmbiguousParameterType { parameter: String, candidates: Vec<String> },
    #[error("Reflection failure: can't build {name}: {reason}")]
    ReflectionFailure { name: String, reason: String },
    #[error("Injection target {target} registered for {interface} is not a method of the built type")]
    InjectionTargetInvalid { interface: String, target: String },
    #[error("Dependency graph is deeper than {limit} levels while building {name}")]
    DepthLimitExceeded { name: String, limit: usize },
    #[error("Incorrect type of {name}. Actual: {actual}, expected: {expected}")]
    IncorrectType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error(transparent)]
    Instantiate(InstantiateErrorKind),
}

/// Error returned by the resolver.
///
/// Carries the names under construction at the point of failure, ordered from the outermost
/// requested name to the innermost one.
#[derive(thiserror::Error, Debug)]
#[error("{kind}{}", Chain(.chain))]
pub struct ResolveError {
    kind: ResolveErrorKind,
    chain: Box<[String]>,
}

impl ResolveError {
    #[inline]
    #[must_use]
    pub(crate) fn new(kind: ResolveErrorKind, chain: Vec<String>) -> Self {
        Self {
            kind,
            chain: chain.into_boxed_slice(),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ResolveErrorKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn into_kind(self) -> ResolveErrorKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

struct Chain<'a>(&'a [String]);

impl Display for Chain<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.0.split_first() else {
            return Ok(());
        };

        write!(f, ": while building {first}")?;
        for name in rest {
            write!(f, " - {name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ResolveError, ResolveErrorKind};

    use alloc::{string::ToString as _, vec, vec::Vec};

    #[test]
    fn test_display_with_chain() {
        let err = ResolveError::new(
            ResolveErrorKind::CircularDependency { name: "A".into() },
            vec!["A".into(), "B".into(), "C".into()],
        );

        assert_eq!(err.to_string(), "Circular dependency while building A: while building A - B - C");
        assert_eq!(err.chain(), ["A", "B", "C"]);
    }

    #[test]
    fn test_display_without_chain() {
        let err = ResolveError::new(ResolveErrorKind::ScalarMissing { name: "speed".into() }, Vec::new());

        assert_eq!(err.to_string(), "Scalar value not found: speed");
    }

    #[test]
    fn test_display_ambiguous() {
        let err = ResolveError::new(
            ResolveErrorKind::AmbiguousParameterType {
                parameter: "engine".into(),
                candidates: vec!["ElectricEngine".into(), "V8Engine".into()],
            },
            vec!["Car".into()],
        );

        assert_eq!(
            err.to_string(),
            "Parameter engine has no single concrete type: ElectricEngine | V8Engine: while building Car"
        );
    }
}
