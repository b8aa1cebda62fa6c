use alloc::{collections::VecDeque, sync::Arc, vec::Vec};
use core::any::type_name;

use crate::{errors::InstantiateErrorKind, instance::Instance};

/// Positional arguments collected for a callable.
///
/// Arguments are consumed front to back in the order of the callable's [`crate::Signature`].
/// Collection stops at the first parameter with a default, so the remaining parameters
/// are read with [`Arguments::value_or`] or [`Arguments::next_instance`].
#[derive(Debug, Default, Clone)]
pub struct Arguments {
    values: VecDeque<Instance>,
    position: usize,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub(crate) fn push(&mut self, value: Instance) {
        self.values.push_back(value);
    }

    #[inline]
    pub(crate) fn push_front(&mut self, value: Instance) {
        self.values.push_front(value);
    }

    #[inline]
    pub fn next_instance(&mut self) -> Option<Instance> {
        let value = self.values.pop_front()?;
        self.position += 1;
        Some(value)
    }

    /// Takes the next argument as a shared concrete value
    ///
    /// # Errors
    /// - Returns [`InstantiateErrorKind::MissingArgument`] if all arguments are consumed
    /// - Returns [`InstantiateErrorKind::IncorrectArgumentType`] if the argument has another type
    pub fn take<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>, InstantiateErrorKind> {
        self.next_with(type_name::<T>(), |instance| instance.downcast())
    }

    /// Takes the next argument as an interface view, for example `Arc<dyn Engine>`
    ///
    /// # Errors
    /// - Returns [`InstantiateErrorKind::MissingArgument`] if all arguments are consumed
    /// - Returns [`InstantiateErrorKind::IncorrectArgumentType`] if the argument isn't a view of `T`
    pub fn take_dyn<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, InstantiateErrorKind> {
        self.next_with(type_name::<T>(), |instance| instance.downcast_dyn())
    }

    /// Takes the next argument as an owned scalar
    ///
    /// # Errors
    /// - Returns [`InstantiateErrorKind::MissingArgument`] if all arguments are consumed
    /// - Returns [`InstantiateErrorKind::IncorrectArgumentType`] if the argument has another type
    pub fn value<T: Clone + 'static>(&mut self) -> Result<T, InstantiateErrorKind> {
        self.next_with(type_name::<T>(), |instance| instance.downcast_ref::<T>().cloned())
    }

    /// Takes the next argument as an owned scalar, or returns `default` if no argument was supplied.
    /// Use it for parameters declared with [`crate::Parameter::with_default`].
    ///
    /// # Errors
    /// Returns [`InstantiateErrorKind::IncorrectArgumentType`] if the argument has another type
    pub fn value_or<T: Clone + 'static>(&mut self, default: T) -> Result<T, InstantiateErrorKind> {
        if self.values.is_empty() {
            return Ok(default);
        }
        self.value()
    }

    fn next_with<T>(&mut self, expected: &'static str, cast: impl FnOnce(&Instance) -> Option<T>) -> Result<T, InstantiateErrorKind> {
        let position = self.position;
        let Some(instance) = self.next_instance() else {
            return Err(InstantiateErrorKind::MissingArgument { position });
        };

        cast(&instance).ok_or(InstantiateErrorKind::IncorrectArgumentType {
            position,
            expected,
            actual: instance.type_info().name,
        })
    }
}

impl From<Vec<Instance>> for Arguments {
    fn from(values: Vec<Instance>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }
}

impl FromIterator<Instance> for Arguments {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
            position: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Arguments;
    use crate::{errors::InstantiateErrorKind, instance::Instance};

    use alloc::{sync::Arc, vec};

    trait Engine: Send + Sync {}

    struct V8Engine;

    impl Engine for V8Engine {}

    #[test]
    fn test_take_in_order() {
        let engine: Arc<dyn Engine> = Arc::new(V8Engine);
        let mut arguments = Arguments::from(vec![Instance::from_dyn(engine), Instance::new(100_i64), Instance::new("km/h")]);

        assert_eq!(arguments.len(), 3);
        assert!(arguments.take_dyn::<dyn Engine>().is_ok());
        assert_eq!(arguments.value::<i64>().unwrap(), 100);
        assert_eq!(*arguments.take::<&str>().unwrap(), "km/h");
        assert!(arguments.is_empty());
    }

    #[test]
    fn test_missing_argument() {
        let mut arguments = Arguments::from(vec![Instance::new(1_u8)]);

        arguments.value::<u8>().unwrap();

        assert!(matches!(
            arguments.value::<u8>(),
            Err(InstantiateErrorKind::MissingArgument { position: 1 })
        ));
    }

    #[test]
    fn test_incorrect_type() {
        let mut arguments = Arguments::from(vec![Instance::new(1_u8)]);

        assert!(matches!(
            arguments.take::<V8Engine>(),
            Err(InstantiateErrorKind::IncorrectArgumentType { position: 0, .. })
        ));
    }

    #[test]
    fn test_value_or_default() {
        let mut arguments = Arguments::from(vec![Instance::new(2_i64)]);

        assert_eq!(arguments.value_or(5_i64).unwrap(), 2);
        assert_eq!(arguments.value_or(5_i64).unwrap(), 5);
    }
}
