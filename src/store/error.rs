use thiserror::Error;

use crate::model::ResourceKind;

/// Failures raised by store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: ResourceKind, id: String },

    #[error("referenced {kind} '{id}' does not exist")]
    InvalidReference { kind: ResourceKind, id: String },

    #[error("{kind} '{id}' is in use by {}", .used_by.join(", "))]
    InUse {
        kind: ResourceKind,
        id: String,
        used_by: Vec<String>,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
