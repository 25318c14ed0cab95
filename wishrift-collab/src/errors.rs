use thiserror::Error;

use crate::{Cents, DatabaseError};

pub type CollabResult<T> = Result<T, CollabError>;

#[derive(Debug, Error)]
pub enum CollabError {
    /// The input was malformed or out of range
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    /// The resource doesn't exist, or the caller isn't allowed to see it
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    /// Something went wrong while talking to storage
    #[error(transparent)]
    Database(DatabaseError),
}

impl CollabError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<DatabaseError> for CollabError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound { resource, .. } => Self::NotFound { resource },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Database(e),
        }
    }
}

/// Rejects empty or whitespace-only text
pub(crate) fn require_text(field: &'static str, value: &str) -> CollabResult<()> {
    if value.trim().is_empty() {
        return Err(CollabError::validation(field, "must not be empty"));
    }

    Ok(())
}

pub(crate) fn require_price(field: &'static str, value: Cents) -> CollabResult<()> {
    if value > Cents::MAX {
        return Err(CollabError::validation(
            field,
            format!("must be at most {}", Cents::MAX.value()),
        ));
    }

    Ok(())
}
