use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{alerts, auth, items, schemas, serialized, shared, wishlists};

#[derive(OpenApi)]
#[openapi(
    modifiers(&Security),
    info(
        description = "wishrift-server exposes endpoints to track wishlists, prices and alerts"
    ),
    paths(
        auth::identity,
        auth::user,
        auth::logout,
        wishlists::list_wishlists,
        wishlists::create_wishlist,
        wishlists::wishlist,
        wishlists::update_wishlist,
        wishlists::delete_wishlist,
        wishlists::list_items,
        wishlists::create_item,
        wishlists::list_shares,
        wishlists::share_wishlist,
        wishlists::remove_share,
        items::item,
        items::update_item,
        items::delete_item,
        items::price_history,
        items::list_alerts,
        items::create_alert,
        items::listings,
        items::scrape,
        items::search,
        alerts::alert,
        alerts::update_alert,
        alerts::delete_alert,
        shared::shared_wishlist,
        shared::shared_with_me,
    ),
    components(schemas(
        schemas::IdentitySchema,
        schemas::NewWishlistSchema,
        schemas::UpdateWishlistSchema,
        schemas::NewItemSchema,
        schemas::UpdateItemSchema,
        schemas::NewAlertSchema,
        schemas::UpdateAlertSchema,
        schemas::SearchSchema,
        schemas::ScrapeSchema,
        schemas::ShareSchema,
        serialized::User,
        serialized::LoginResult,
        serialized::Wishlist,
        serialized::Item,
        serialized::PriceHistoryEntry,
        serialized::PriceAlert,
        serialized::Listing,
        serialized::SearchResult,
        serialized::SharedAccess,
        serialized::SharedWishlist,
        serialized::ScrapeResult,
    ))
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("Bearer <token>")
            .build();

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
