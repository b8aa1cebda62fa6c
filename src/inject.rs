use alloc::string::String;
use core::fmt::{self, Debug, Formatter};

use crate::{
    arguments::Arguments,
    errors::InstantiateErrorKind,
    instance::Instance,
    service::{service_fn, BoxCloneService, Service as _},
    signature::Signature,
};

pub(crate) type BoxedCloneHook = BoxCloneService<Arguments, Option<Instance>, InstantiateErrorKind>;

/// External callable run on every built value implementing an interface.
///
/// The value, upcast to the interface view when its type declares one, is the first argument,
/// followed by the arguments collected for the hook's own signature.
/// Returning `Some` replaces the built value.
#[derive(Clone)]
pub struct Hook {
    signature: Signature,
    body: BoxedCloneHook,
}

impl Hook {
    #[must_use]
    pub fn new<F, Err>(signature: Signature, mut body: F) -> Self
    where
        F: FnMut(Arguments) -> Result<Option<Instance>, Err> + Clone + Send + Sync + 'static,
        Err: Into<InstantiateErrorKind>,
    {
        Self {
            signature,
            body: BoxCloneService::new(service_fn(
                move |arguments: Arguments| -> Result<Option<Instance>, InstantiateErrorKind> {
                    match body(arguments) {
                        Ok(replacement) => Ok(replacement),
                        Err(err) => Err(err.into()),
                    }
                },
            )),
        }
    }

    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub(crate) fn call(&self, arguments: Arguments) -> Result<Option<Instance>, InstantiateErrorKind> {
        self.body.clone().call(arguments)
    }
}

impl Debug for Hook {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("signature", &self.signature).finish_non_exhaustive()
    }
}

/// Setter injection registered for an interface.
///
/// Runs on values whose type declares the interface, and on values built under the interface name itself.
#[derive(Clone, Debug)]
pub enum InjectAction {
    /// Calls the method with this name, declared on the built type.
    /// Skipped for values the provider doesn't describe, e.g. a trait object returned by a factory
    Method(String),
    /// Receives the value as the first argument. Also runs on values the provider doesn't describe
    Hook(Hook),
}

impl InjectAction {
    #[inline]
    #[must_use]
    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    #[inline]
    #[must_use]
    pub fn hook<F, Err>(signature: Signature, body: F) -> Self
    where
        F: FnMut(Arguments) -> Result<Option<Instance>, Err> + Clone + Send + Sync + 'static,
        Err: Into<InstantiateErrorKind>,
    {
        Self::Hook(Hook::new(signature, body))
    }
}
