//! # Framework Errors
//!
//! Every layer of the controller pipeline reports failures through one of three enums:
//!
//! - [`ConfigurationError`] - the association chain was declared wrong. Raised while the
//!   controller is being defined, so a broken controller never serves a request.
//! - [`StoreError`] - the model/persistence collaborator failed.
//! - [`ControllerError`] - what a request can fail with. Not-found, missing parent and
//!   unsupported operations stay distinguishable so the dispatch layer can map them.
//!
//! Validation failures are **not** errors. A rejected create or update comes back as
//! [`Outcome::Rejected`](crate::framework::Outcome::Rejected) inside the execution result.

use thiserror::Error;

/// Invalid association chain declaration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// An association was declared with an empty name.
    #[error("association name must not be empty")]
    EmptyName,

    /// A non-polymorphic association has no target type.
    #[error("association `{0}` has no target type")]
    MissingTargetType(String),

    /// A polymorphic association was declared without candidate types.
    #[error("polymorphic association `{0}` declares no candidate types")]
    MissingCandidates(String),

    /// A polymorphic candidate has an empty type name.
    #[error("polymorphic association `{0}` has an empty candidate type")]
    EmptyCandidate(String),

    /// A singleton association is followed by another association.
    #[error("singleton association `{0}` must be the innermost association")]
    SingletonNotInnermost(String),

    /// A singleton association has nothing outside it to be reached through.
    #[error("singleton association `{0}` needs an enclosing association")]
    SingletonWithoutOwner(String),

    /// Two associations expose the same binding name.
    #[error("association `{0}` is declared twice")]
    DuplicateAssociation(String),

    /// The terminal resource is singleton but the chain may resolve no parent.
    #[error("singleton resource `{0}` requires a parent that is always present")]
    SingletonWithoutParent(String),

    /// The terminal resource was declared with an empty name.
    #[error("resource name must not be empty")]
    EmptyResource,

    /// A serialized declaration could not be parsed.
    #[error("invalid chain declaration: {0}")]
    InvalidDeclaration(String),
}

/// Failures reported by a model store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("`{model}` has no association `{accessor}`")]
    UnknownAssociation { model: String, accessor: String },
    #[error("`{0}` is no longer stored")]
    RecordMissing(String),
    #[error("Store error: {0}")]
    Backend(String),
}

/// Everything a single request can fail with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A parent or member id did not resolve to a record.
    #[error("{model} not found: {id}")]
    NotFound { model: String, id: String },

    /// A required association had none of its parameters in the request.
    #[error("missing parent `{association}`: expected one of {expected:?}")]
    MissingParent {
        association: String,
        expected: Vec<String>,
    },

    /// The action needs a request parameter that was not sent.
    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    /// The scope cannot perform the requested operation.
    #[error("`{action}` is not supported on a {scope} scope")]
    UnsupportedOperation { action: String, scope: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ControllerError {
    pub fn not_found(model: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            model: model.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_converts_into_controller_error() {
        let err: ControllerError = ConfigurationError::MissingCandidates("parent".into()).into();
        assert!(matches!(err, ControllerError::Configuration(_)));
        assert_eq!(
            err.to_string(),
            "polymorphic association `parent` declares no candidate types"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = ControllerError::not_found("factory", "37");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "factory not found: 37");
    }

    #[test]
    fn test_store_error_is_not_not_found() {
        let err: ControllerError = StoreError::ActorClosed.into();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("closed"));
    }
}
