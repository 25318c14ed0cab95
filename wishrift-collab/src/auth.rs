use chrono::{Duration, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::{
    util::random_string, ArcedDatabase, DatabaseError, NewSession, NewUser, SessionData,
};

/// Issues and resolves sessions for identities verified by the external provider.
pub struct Auth {
    db: ArcedDatabase,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The session doesn't exist or has expired
    #[error("Session does not exist")]
    InvalidSession,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
}

/// The claims the identity provider hands over after a successful sign in
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    /// The provider's opaque subject id
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

impl Auth {
    const SESSION_DURATION_IN_DAYS: i64 = 7;
    const TOKEN_LENGTH: usize = 32;

    pub fn new(db: &ArcedDatabase) -> Self {
        Self { db: db.clone() }
    }

    /// Mirrors the identity into the users table and starts a new session
    pub async fn login(&self, identity: ExternalIdentity) -> Result<SessionData, AuthError> {
        if let Err(e) = self.db.clear_expired_sessions().await {
            warn!("Could not clear expired sessions: {}", e);
        }

        let user = self
            .db
            .upsert_user(NewUser {
                id: identity.id,
                username: identity.username,
                email: identity.email,
                first_name: identity.first_name,
                last_name: identity.last_name,
                bio: identity.bio,
                profile_image_url: identity.profile_image_url,
            })
            .await
            .map_err(AuthError::Db)?;

        let expires_at = Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS);

        let session = self
            .db
            .create_session(NewSession {
                token: random_string(Self::TOKEN_LENGTH),
                user_id: user.id,
                expires_at,
            })
            .await
            .map_err(AuthError::Db)?;

        info!("User {} signed in", session.user.username);

        Ok(session)
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.db.delete_session_by_token(token).await
    }

    /// Returns a session if it exists and hasn't expired
    pub async fn session(&self, token: &str) -> Result<SessionData, AuthError> {
        let session = self.db.session_by_token(token).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::InvalidSession,
            e => AuthError::Db(e),
        })?;

        if session.expires_at <= Utc::now() {
            return Err(AuthError::InvalidSession);
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{identity, memory_db};

    #[tokio::test]
    async fn login_issues_a_resolvable_session() {
        let auth = Auth::new(&memory_db());

        let session = auth.login(identity("u1")).await.unwrap();
        let resolved = auth.session(&session.token).await.unwrap();

        assert_eq!(session.token.len(), 32);
        assert_eq!(resolved.user.id, "u1");
        assert_eq!(resolved.user.username, "u1-name");
    }

    #[tokio::test]
    async fn repeated_login_keeps_one_user() {
        let db = memory_db();
        let auth = Auth::new(&db);

        auth.login(identity("u1")).await.unwrap();

        let mut renamed = identity("u1");
        renamed.username = "new-name".to_string();
        let session = auth.login(renamed).await.unwrap();

        assert_eq!(session.user.username, "new-name");
        assert!(db.user_by_username("u1-name").await.is_err());
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let auth = Auth::new(&memory_db());

        let session = auth.login(identity("u1")).await.unwrap();
        auth.logout(&session.token).await.unwrap();

        assert!(matches!(
            auth.session(&session.token).await,
            Err(AuthError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn unknown_tokens_are_invalid() {
        let auth = Auth::new(&memory_db());

        assert!(matches!(
            auth.session("nope").await,
            Err(AuthError::InvalidSession)
        ));
    }
}
