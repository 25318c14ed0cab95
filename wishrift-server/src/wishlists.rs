use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json,
};
use wishrift_collab::{Cents, ItemFields, PrimaryKey};

use crate::{
    auth::Session,
    errors::{ServerError, ServerResult},
    schemas::{NewItemSchema, NewWishlistSchema, ShareSchema, UpdateWishlistSchema, ValidatedJson},
    serialized::{Item, SharedAccess, ToSerialized, Wishlist},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/wishlists",
    tag = "wishlists",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Wishlist>)
    )
)]
async fn list_wishlists(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Wishlist>>> {
    let wishlists = context
        .collab
        .wishlists
        .list_wishlists(session.user_id())
        .await?;

    Ok(Json(wishlists.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/wishlists",
    tag = "wishlists",
    request_body = NewWishlistSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Wishlist)
    )
)]
async fn create_wishlist(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewWishlistSchema>,
) -> ServerResult<(StatusCode, Json<Wishlist>)> {
    let wishlist = context
        .collab
        .wishlists
        .create_wishlist(session.user_id(), &body.title, body.description)
        .await?;

    Ok((StatusCode::CREATED, Json(wishlist.to_serialized())))
}

#[utoipa::path(
    get,
    path = "/api/wishlists/{id}",
    tag = "wishlists",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Wishlist)
    )
)]
async fn wishlist(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Wishlist>> {
    let wishlist = context
        .collab
        .wishlists
        .readable(session.user_id(), id)
        .await?;

    Ok(Json(wishlist.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/api/wishlists/{id}",
    tag = "wishlists",
    request_body = UpdateWishlistSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Wishlist)
    )
)]
async fn update_wishlist(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdateWishlistSchema>,
) -> ServerResult<Json<Wishlist>> {
    let wishlists = &context.collab.wishlists;
    wishlists.owned(session.user_id(), id).await?;

    let wishlist = wishlists
        .update_wishlist(id, body.title, body.description)
        .await?;

    Ok(Json(wishlist.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/wishlists/{id}",
    tag = "wishlists",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204)
    )
)]
async fn delete_wishlist(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<StatusCode> {
    let wishlists = &context.collab.wishlists;
    wishlists.owned(session.user_id(), id).await?;

    if !wishlists.delete_wishlist(id).await? {
        return Err(ServerError::NotFound {
            resource: "wishlist",
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/wishlists/{id}/items",
    tag = "wishlists",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Item>)
    )
)]
async fn list_items(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Vec<Item>>> {
    context
        .collab
        .wishlists
        .readable(session.user_id(), id)
        .await?;

    let items = context.collab.items.list_items(id).await?;

    Ok(Json(items.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/wishlists/{id}/items",
    tag = "wishlists",
    request_body = NewItemSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Item)
    )
)]
async fn create_item(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<NewItemSchema>,
) -> ServerResult<(StatusCode, Json<Item>)> {
    context.collab.wishlists.owned(session.user_id(), id).await?;

    let item = context
        .collab
        .items
        .create_item(
            id,
            ItemFields {
                name: body.name,
                description: body.description,
                current_price: Cents::new(body.current_price),
                original_price: body.original_price.map(Cents::new),
                image_url: body.image_url,
                product_url: body.product_url,
                store: body.store,
                category: body.category,
                is_favorite: body.is_favorite.unwrap_or(false),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item.to_serialized())))
}

#[utoipa::path(
    get,
    path = "/api/wishlists/{id}/shares",
    tag = "wishlists",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<SharedAccess>)
    )
)]
async fn list_shares(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Vec<SharedAccess>>> {
    let wishlists = &context.collab.wishlists;
    wishlists.owned(session.user_id(), id).await?;

    let shares = wishlists.list_shares(id).await?;

    Ok(Json(shares.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/wishlists/{id}/shares",
    tag = "wishlists",
    request_body = ShareSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = SharedAccess),
        (status = 409, description = "The list is already shared with this user")
    )
)]
async fn share_wishlist(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<ShareSchema>,
) -> ServerResult<(StatusCode, Json<SharedAccess>)> {
    let wishlists = &context.collab.wishlists;
    wishlists.owned(session.user_id(), id).await?;

    let access = wishlists.share_wishlist(id, &body.username).await?;

    Ok((StatusCode::CREATED, Json(access.to_serialized())))
}

#[utoipa::path(
    delete,
    path = "/api/wishlists/{id}/shares/{userId}",
    tag = "wishlists",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204)
    )
)]
async fn remove_share(
    session: Session,
    State(context): State<ServerContext>,
    Path((id, user_id)): Path<(PrimaryKey, String)>,
) -> ServerResult<StatusCode> {
    let wishlists = &context.collab.wishlists;
    wishlists.owned(session.user_id(), id).await?;

    if !wishlists.remove_shared_access(id, &user_id).await? {
        return Err(ServerError::NotFound {
            resource: "shared access",
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_wishlists).post(create_wishlist))
        .route(
            "/:id",
            get(wishlist).put(update_wishlist).delete(delete_wishlist),
        )
        .route("/:id/items", get(list_items).post(create_item))
        .route("/:id/shares", get(list_shares).post(share_wishlist))
        .route("/:id/shares/:user_id", delete(remove_share))
}
