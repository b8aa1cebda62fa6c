use alloc::sync::Arc;
use once_cell::sync::OnceCell;

use crate::{
    instance::Instance,
    instantiator::{Callable, Instantiator},
    signature::Signature,
};

/// Value of a parameter looked up by name instead of by type
#[derive(Clone, Debug)]
pub enum Scalar {
    Value(Instance),
    /// Called once on first use, then replaced with its result
    Producer(Callable),
}

impl Scalar {
    #[inline]
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Value(Instance::new(value))
    }

    #[inline]
    #[must_use]
    pub fn producer<Inst>(signature: Signature, instantiator: Inst) -> Self
    where
        Inst: Instantiator + Send + Sync,
    {
        Self::Producer(Callable::new(signature, instantiator))
    }
}

impl From<Instance> for Scalar {
    fn from(value: Instance) -> Self {
        Self::Value(value)
    }
}

impl From<Callable> for Scalar {
    fn from(producer: Callable) -> Self {
        Self::Producer(producer)
    }
}

pub(crate) struct ProducerCell {
    pub(crate) producer: Callable,
    pub(crate) produced: OnceCell<Instance>,
}

#[derive(Clone)]
pub(crate) enum ScalarEntry {
    Value(Instance),
    Producer(Arc<ProducerCell>),
}

impl From<Scalar> for ScalarEntry {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Value(value) => Self::Value(value),
            Scalar::Producer(producer) => Self::Producer(Arc::new(ProducerCell {
                producer,
                produced: OnceCell::new(),
            })),
        }
    }
}
