mod instantiate;
mod introspect;
mod registration;
mod resolve;

pub use instantiate::InstantiateErrorKind;
pub use introspect::IntrospectErrorKind;
pub use registration::RegistrationErrorKind;
pub use resolve::{ResolveError, ResolveErrorKind};
