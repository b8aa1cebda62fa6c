#![no_std]

extern crate alloc;

pub(crate) mod any;
pub(crate) mod arguments;
pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod instance;
pub(crate) mod instantiator;
pub(crate) mod resolution;
pub(crate) mod resolver;
pub(crate) mod scalar;
pub(crate) mod service;
pub(crate) mod signature;
pub(crate) mod stack;

pub use any::TypeInfo;
pub use arguments::Arguments;
pub use catalog::{Catalog, Method, SignatureProvider, TypeDef, TypeDescriptor, TypeKind};
pub use config::Config;
pub use errors::{InstantiateErrorKind, IntrospectErrorKind, RegistrationErrorKind, ResolveError, ResolveErrorKind};
pub use inject::{Hook, InjectAction};
pub use instance::Instance;
pub use instantiator::{instance, Callable, Instantiator};
pub use resolver::Resolver;
pub use scalar::Scalar;
pub use signature::{Name, Parameter, ParameterType, Signature};
