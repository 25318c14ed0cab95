use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    routing::{get, post},
    Json,
};
use wishrift_collab::{ExternalIdentity, SessionData, UserData};

use crate::{
    errors::{ServerError, ServerResult},
    schemas::{IdentitySchema, ValidatedJson},
    serialized::{LoginResult, ToSerialized, User},
    Router, ServerContext,
};

/// The header the identity provider authenticates itself with
pub const IDENTITY_SECRET_HEADER: &str = "x-identity-secret";

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it
pub struct Session(SessionData);

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> &UserData {
        &self.0.user
    }

    pub fn user_id(&self) -> &str {
        &self.0.user.id
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or(ServerError::Unauthorized("Missing authorization"))?;

        let parts: Vec<_> = token.split_ascii_whitespace().collect();

        if parts.first() != Some(&"Bearer") {
            return Err(ServerError::Unauthorized("Authorization must be Bearer"));
        }

        let token = parts.get(1).copied().unwrap_or_default();

        let session = state.collab.auth.session(token).await?;

        Ok(Self(session))
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/identity",
    tag = "auth",
    request_body = IdentitySchema,
    params(
        ("X-Identity-Secret" = String, Header, description = "Secret shared with the identity provider")
    ),
    responses(
        (status = 200, body = LoginResult),
        (status = 401, description = "The secret doesn't match"),
        (status = 404, description = "Identity hand-over is disabled")
    )
)]
async fn identity(
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<IdentitySchema>,
) -> ServerResult<Json<LoginResult>> {
    let Some(secret) = &context.identity_secret else {
        return Err(ServerError::NotFound { resource: "route" });
    };

    let presented = headers
        .get(IDENTITY_SECRET_HEADER)
        .and_then(|x| x.to_str().ok());

    if presented != Some(&**secret) {
        return Err(ServerError::Unauthorized("Invalid identity secret"));
    }

    let session = context
        .collab
        .auth
        .login(ExternalIdentity {
            id: body.id,
            username: body.username,
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            bio: body.bio,
            profile_image_url: body.profile_image_url,
        })
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/auth/user",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User)
    )
)]
async fn user(session: Session) -> Json<User> {
    Json(session.user().to_serialized())
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204)
    )
)]
async fn logout(session: Session, State(context): State<ServerContext>) -> ServerResult<StatusCode> {
    context.collab.auth.logout(&session.0.token).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/identity", post(identity))
        .route("/user", get(user))
        .route("/logout", post(logout))
}
