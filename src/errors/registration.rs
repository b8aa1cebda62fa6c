use alloc::string::String;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegistrationErrorKind {
    #[error("Alias {alias} can't point to {target}, because {target} is an alias itself")]
    TargetIsAlias { alias: String, target: String },
    #[error("Alias {alias} can't be added, because it is already the target of alias {aliased_by}")]
    AliasIsTarget { alias: String, aliased_by: String },
}
