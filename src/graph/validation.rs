//! Entity validation errors

use thiserror::Error;

/// Reasons an entity fails its structural invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} id must not be empty")]
    EmptyId(&'static str),

    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(String),

    #[error("relationship type must not be empty")]
    EmptyRelationshipType,

    #[error("relationship weight must be a finite, non-negative number (got {0})")]
    InvalidWeight(String),

    #[error("field '{0}' is immutable")]
    ImmutableField(&'static str),
}
