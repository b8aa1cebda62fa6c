#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("Missing argument at position {position}")]
    MissingArgument { position: usize },
    #[error("Incorrect argument type at position {position}. Actual: {actual}, expected: {expected}")]
    IncorrectArgumentType {
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
