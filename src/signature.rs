use alloc::{borrow::Cow, vec::Vec};

pub type Name = Cow<'static, str>;

/// Declared type of a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// No type declared, the value is looked up as a scalar by the parameter name
    Untyped,
    /// Primitive type (`i64`, `bool`, `str`, ...), the value is looked up as a scalar by the parameter name
    Builtin(Name),
    /// Concrete type or interface, the value is resolved by this name
    Named(Name),
    /// Several candidate types, can't be resolved
    Union(Vec<Name>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: Name,
    pub ty: ParameterType,
    pub has_default: bool,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub fn untyped(name: impl Into<Name>) -> Self {
        Self::new(name, ParameterType::Untyped)
    }

    #[inline]
    #[must_use]
    pub fn builtin(name: impl Into<Name>, ty: impl Into<Name>) -> Self {
        Self::new(name, ParameterType::Builtin(ty.into()))
    }

    #[inline]
    #[must_use]
    pub fn object(name: impl Into<Name>, ty: impl Into<Name>) -> Self {
        Self::new(name, ParameterType::Named(ty.into()))
    }

    #[inline]
    #[must_use]
    pub fn union<I, T>(name: impl Into<Name>, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Name>,
    {
        Self::new(name, ParameterType::Union(types.into_iter().map(Into::into).collect()))
    }

    /// Marks the parameter as having a default value in the callee.
    /// Parameters with defaults must trail the required ones.
    #[inline]
    #[must_use]
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[inline]
    #[must_use]
    fn new(name: impl Into<Name>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
        }
    }
}

/// Ordered parameter list of a constructor, factory, method or scalar producer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { parameters: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn new(parameters: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            parameters: parameters.into_iter().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Count of parameters before the first one with a default value
    #[must_use]
    pub fn required_len(&self) -> usize {
        self.parameters.iter().take_while(|parameter| !parameter.has_default).count()
    }
}

impl FromIterator<Parameter> for Signature {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::{Parameter, ParameterType, Signature};

    #[test]
    fn test_required_len() {
        let signature = Signature::new([
            Parameter::object("engine", "EngineInterface"),
            Parameter::builtin("x", "i64"),
            Parameter::builtin("y", "i64").with_default(),
        ]);

        assert_eq!(signature.parameters().len(), 3);
        assert_eq!(signature.required_len(), 2);
        assert_eq!(Signature::empty().required_len(), 0);
    }

    #[test]
    fn test_union() {
        let parameter = Parameter::union("engine", ["ElectricEngine", "V8Engine"]);

        assert_eq!(
            parameter.ty,
            ParameterType::Union(["ElectricEngine", "V8Engine"].into_iter().map(Into::into).collect())
        );
        assert!(!parameter.has_default);
    }
}
