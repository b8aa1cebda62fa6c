use alloc::string::String;

/// Failure of a [`crate::SignatureProvider`] while describing a type
#[derive(thiserror::Error, Debug)]
pub enum IntrospectErrorKind {
    #[error("Signature of {name} can't be read: {reason}")]
    Unreadable { name: String, reason: String },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
