use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;
use wishrift_collab::{AuthError, CollabError, DatabaseError};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        // Internal details only go to the log
        if let Self::Unknown(message) = &self {
            error!("Request failed: {}", message);
            return (status, "Internal server error").into_response();
        }

        (status, self.to_string()).into_response()
    }
}

impl From<CollabError> for ServerError {
    fn from(value: CollabError) -> Self {
        match value {
            CollabError::Validation { .. } => Self::Validation(value.to_string()),
            CollabError::NotFound { resource } => Self::NotFound { resource },
            CollabError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            CollabError::Database(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for ServerError {
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
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidSession => Self::Unauthorized("Session does not exist"),
            AuthError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn expired_sessions_are_unauthorized() {
        let error = ServerError::from(AuthError::InvalidSession);

        assert_eq!(error.as_status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn storage_failures_during_auth_are_internal() {
        let cause = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let error = ServerError::from(AuthError::Db(DatabaseError::Internal(Box::new(cause))));

        assert_eq!(error.as_status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
