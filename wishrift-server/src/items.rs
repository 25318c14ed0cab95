use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};
use wishrift_collab::{Cents, CollabError, ItemData, PrimaryKey, UpdatedItem};

use crate::{
    auth::Session,
    errors::{ServerError, ServerResult},
    schemas::{
        NewAlertSchema, OptionalJson, ScrapeSchema, SearchSchema, UpdateItemSchema, ValidatedJson,
    },
    serialized::{
        Item, Listing, PriceAlert, PriceHistoryEntry, ScrapeResult, SearchResult, ToSerialized,
    },
    Router, ServerContext,
};

/// Resolves an item the user may read, hiding items on lists they can't see
async fn readable_item(
    context: &ServerContext,
    session: &Session,
    item_id: PrimaryKey,
) -> ServerResult<ItemData> {
    let item = context.collab.items.item(item_id).await?;
    let access = context
        .collab
        .wishlists
        .readable(session.user_id(), item.wishlist_id)
        .await;

    hide_item(access).map(|_| item)
}

/// Resolves an item on one of the user's own lists
pub(crate) async fn owned_item(
    context: &ServerContext,
    session: &Session,
    item_id: PrimaryKey,
) -> ServerResult<ItemData> {
    let item = context.collab.items.item(item_id).await?;
    let access = context
        .collab
        .wishlists
        .owned(session.user_id(), item.wishlist_id)
        .await;

    hide_item(access).map(|_| item)
}

fn hide_item<T>(access: Result<T, CollabError>) -> ServerResult<T> {
    match access {
        Ok(x) => Ok(x),
        Err(CollabError::NotFound { .. }) => Err(ServerError::NotFound { resource: "item" }),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "items",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Item)
    )
)]
async fn item(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Item>> {
    let item = readable_item(&context, &session, id).await?;

    Ok(Json(item.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    tag = "items",
    request_body = UpdateItemSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Item)
    )
)]
async fn update_item(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdateItemSchema>,
) -> ServerResult<Json<Item>> {
    owned_item(&context, &session, id).await?;

    let item = context
        .collab
        .items
        .update_item(UpdatedItem {
            id,
            name: body.name,
            description: body.description,
            current_price: body.current_price.map(Cents::new),
            original_price: body.original_price.map(Cents::new),
            image_url: body.image_url.map(Some),
            product_url: body.product_url,
            store: body.store,
            category: body.category,
            is_favorite: body.is_favorite,
        })
        .await?;

    Ok(Json(item.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    tag = "items",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204)
    )
)]
async fn delete_item(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<StatusCode> {
    owned_item(&context, &session, id).await?;

    if !context.collab.items.delete_item(id).await? {
        return Err(ServerError::NotFound { resource: "item" });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/history",
    tag = "items",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Oldest entry first", body = Vec<PriceHistoryEntry>)
    )
)]
async fn price_history(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Vec<PriceHistoryEntry>>> {
    readable_item(&context, &session, id).await?;

    let history = context.collab.items.price_history(id).await?;

    Ok(Json(history.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/alerts",
    tag = "items",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<PriceAlert>)
    )
)]
async fn list_alerts(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Vec<PriceAlert>>> {
    owned_item(&context, &session, id).await?;

    let alerts = context.collab.alerts.list_alerts(id).await?;

    Ok(Json(alerts.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/items/{id}/alerts",
    tag = "items",
    request_body = NewAlertSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = PriceAlert)
    )
)]
async fn create_alert(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<NewAlertSchema>,
) -> ServerResult<(StatusCode, Json<PriceAlert>)> {
    owned_item(&context, &session, id).await?;

    let alert = context
        .collab
        .alerts
        .set_price_alert(
            id,
            Cents::new(body.target_price),
            body.is_active.unwrap_or(true),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(alert.to_serialized())))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/listings",
    tag = "items",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Listing>)
    )
)]
async fn listings(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Vec<Listing>>> {
    owned_item(&context, &session, id).await?;

    let listings = context.collab.items.listings(id).await?;

    Ok(Json(listings.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/items/{id}/scrape",
    tag = "items",
    request_body(content = ScrapeSchema, description = "Optional, searches for the item's name by default"),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ScrapeResult)
    )
)]
async fn scrape(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    OptionalJson(body): OptionalJson<ScrapeSchema>,
) -> ServerResult<Json<ScrapeResult>> {
    owned_item(&context, &session, id).await?;

    let query = body.and_then(|b| b.query);
    let outcome = context.collab.items.scrape(id, query.as_deref()).await?;

    Ok(Json(outcome.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/items/search",
    tag = "items",
    request_body = SearchSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Cheapest first", body = Vec<SearchResult>)
    )
)]
async fn search(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<SearchSchema>,
) -> Json<Vec<SearchResult>> {
    let listings = context.collab.discovery.search(&body.query);

    Json(listings.to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/:id", get(item).put(update_item).delete(delete_item))
        .route("/:id/history", get(price_history))
        .route("/:id/alerts", get(list_alerts).post(create_alert))
        .route("/:id/listings", get(listings))
        .route("/:id/scrape", post(scrape))
}
