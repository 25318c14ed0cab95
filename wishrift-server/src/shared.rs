use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::Session,
    errors::ServerResult,
    serialized::{SharedWishlist, ToSerialized, Wishlist},
    ServerContext,
};

/// Views a wishlist through its share id, no account needed
#[utoipa::path(
    get,
    path = "/api/shared/{shareId}",
    tag = "shared",
    responses(
        (status = 200, body = SharedWishlist),
        (status = 404, description = "No wishlist has this share id")
    )
)]
pub async fn shared_wishlist(
    State(context): State<ServerContext>,
    Path(share_id): Path<String>,
) -> ServerResult<Json<SharedWishlist>> {
    let shared = context
        .collab
        .wishlists
        .wishlist_by_share_id(&share_id)
        .await?;

    Ok(Json(shared.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/shared-with-me",
    tag = "shared",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Wishlist>)
    )
)]
pub async fn shared_with_me(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Wishlist>>> {
    let wishlists = context
        .collab
        .wishlists
        .shared_with(session.user_id())
        .await?;

    Ok(Json(wishlists.to_serialized()))
}
