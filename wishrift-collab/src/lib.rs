mod alerts;
mod auth;
mod db;
mod discovery;
mod errors;
mod items;
mod price;
mod util;
mod wishlists;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use alerts::*;
pub use auth::*;
pub use db::*;
pub use discovery::*;
pub use errors::*;
pub use items::*;
pub use price::*;
pub use wishlists::*;

/// The wishrift collab system, tying together authentication, wishlists, price tracking and discovery.
pub struct Collab {
    pub auth: Auth,
    pub wishlists: WishlistManager,
    pub items: ItemManager,
    pub alerts: AlertManager,
    pub discovery: Arc<Discovery>,
}

/// A type passed to the managers of the collab system, to access shared state.
#[derive(Clone)]
pub struct CollabContext {
    pub database: ArcedDatabase,
    pub discovery: Arc<Discovery>,
}

impl Collab {
    pub fn new(database: ArcedDatabase, discovery: Discovery) -> Self {
        let discovery = Arc::new(discovery);

        let context = CollabContext {
            database: database.clone(),
            discovery: discovery.clone(),
        };

        Self {
            auth: Auth::new(&database),
            wishlists: WishlistManager::new(&context),
            items: ItemManager::new(&context),
            alerts: AlertManager::new(&context),
            discovery,
        }
    }
}
