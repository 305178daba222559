//! Error types raised by the runtime itself (not by resource handlers).

use crate::schema::Diagnostic;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration failed schema validation; raised before any handler runs.
    #[error("invalid configuration for {address}: {}", join(.diagnostics))]
    Validation {
        address: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// A handler asked for an attribute that is not set.
    #[error("attribute {0:?} is not set")]
    MissingAttribute(String),

    /// A handler asked for an attribute with the wrong type.
    #[error("attribute {name:?} is not a {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
    },

    #[error("unknown resource type {0:?}")]
    UnknownResourceType(String),

    #[error("invalid resource address {0:?}, expected <type>.<name>")]
    InvalidAddress(String),

    /// Import found nothing behind the identifier.
    #[error("cannot import non-existent remote object: {address} (id {id:?})")]
    ImportNotFound { address: String, id: String },

    #[error("{0} is already managed; remove it from state before importing")]
    AlreadyManaged(String),

    /// Two addresses would manage the same remote object.
    #[error("{address} refers to {id:?}, which is already managed by {owner}")]
    DuplicateIdentity {
        address: String,
        id: String,
        owner: String,
    },
}

fn join(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
