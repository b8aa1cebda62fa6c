use core::fmt::{self, Debug, Formatter};
use tracing::debug;

use crate::{
    any::TypeInfo,
    arguments::Arguments,
    errors::InstantiateErrorKind,
    instance::Instance,
    service::{service_fn, BoxCloneService, Service as _},
    signature::Signature,
};

/// Body of a constructor, factory or scalar producer.
///
/// Implemented for every `FnMut(Arguments) -> Result<T, E>` closure that is `Clone`.
pub trait Instantiator: Clone + 'static {
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, arguments: Arguments) -> Result<Self::Provides, Self::Error>;
}

impl<F, Response, Err> Instantiator for F
where
    F: FnMut(Arguments) -> Result<Response, Err> + Clone + 'static,
    Response: Send + Sync + 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;

    #[inline]
    fn instantiate(&mut self, arguments: Arguments) -> Result<Self::Provides, Self::Error> {
        self(arguments)
    }
}

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the resolver.
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(val: T) -> impl Instantiator<Provides = T, Error = InstantiateErrorKind> + Send + Sync {
    move |_: Arguments| Ok(val.clone())
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<Arguments, Instance, InstantiateErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst>(mut instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator + Send + Sync,
{
    BoxCloneService::new(service_fn(move |arguments: Arguments| -> Result<Instance, InstantiateErrorKind> {
        let provided = match instantiator.instantiate(arguments) {
            Ok(provided) => provided,
            Err(err) => return Err(err.into()),
        };

        debug!("Instantiated");

        Ok(Instance::new(provided))
    }))
}

/// Signature together with the erased body it describes
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    provides: TypeInfo,
    instantiator: BoxedCloneInstantiator,
}

impl Callable {
    #[inline]
    #[must_use]
    pub fn new<Inst>(signature: Signature, instantiator: Inst) -> Self
    where
        Inst: Instantiator + Send + Sync,
    {
        Self {
            signature,
            provides: TypeInfo::of::<Inst::Provides>(),
            instantiator: boxed_instantiator(instantiator),
        }
    }

    /// Callable without parameters
    #[inline]
    #[must_use]
    pub fn from_fn<Inst>(instantiator: Inst) -> Self
    where
        Inst: Instantiator + Send + Sync,
    {
        Self::new(Signature::empty(), instantiator)
    }

    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    #[must_use]
    pub fn provides(&self) -> TypeInfo {
        self.provides
    }

    #[inline]
    pub(crate) fn call(&self, arguments: Arguments) -> Result<Instance, InstantiateErrorKind> {
        self.instantiator.clone().call(arguments)
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.signature)
            .field("provides", &self.provides.name)
            .finish_non_exhaustive()
    }
}
