mod alerts;
mod auth;
mod config;
mod context;
mod docs;
mod errors;
mod items;
mod schemas;
mod serialized;
mod shared;
mod wishlists;


use std::net::{Ipv6Addr, SocketAddr};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use wishrift_collab::Collab;

pub use auth::IDENTITY_SECRET_HEADER;
pub use config::*;
pub use context::ServerContext;
pub use docs::ApiDoc;
pub use errors::*;

pub type Router = axum::Router<ServerContext>;

/// Builds the full API with its state
pub fn router(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/wishlists", wishlists::router())
        .nest("/items", items::router())
        .nest("/alerts", alerts::router())
        .route("/shared/:share_id", get(shared::shared_wishlist))
        .route("/shared-with-me", get(shared::shared_with_me))
        .route("/docs.json", get(docs::docs));

    Router::new()
        .nest("/api", api_router)
        .layer(cors)
        .with_state(context)
}

/// Starts the wishrift server
pub async fn run_server(config: &ServerConfig, collab: Collab) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();
    let context = ServerContext::new(collab, config.identity_secret.clone());

    if config.identity_secret.is_none() {
        info!("No identity secret configured, identity hand-over is disabled");
    }

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(context).into_make_service()).await
}
