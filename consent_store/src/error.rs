use thiserror::Error;

/// Errors surfaced to callers of the consent store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsentError {
    /// A mutating operation ran without an interactive host.
    #[error("{operation} requires an interactive host")]
    NonInteractiveHost { operation: &'static str },
}

pub type Result<T> = std::result::Result<T, ConsentError>;
