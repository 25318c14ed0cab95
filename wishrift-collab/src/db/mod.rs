use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Cents;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type ArcedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(DatabaseError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can store and fetch wishrift data.
///
/// Implementations must keep children ordered by insertion (ids ascending),
/// cascade deletes of wishlists and items to everything they own,
/// and record the initial price history entry in the same unit as [Database::create_item].
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: &str) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    /// Inserts the user, or updates the profile in place if the id already exists
    async fn upsert_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn wishlist_by_id(&self, wishlist_id: PrimaryKey) -> Result<WishlistData>;
    async fn wishlist_by_share_id(&self, share_id: &str) -> Result<WishlistData>;
    async fn list_wishlists(&self, user_id: &str) -> Result<Vec<WishlistData>>;
    async fn create_wishlist(&self, new_wishlist: NewWishlist) -> Result<WishlistData>;
    async fn update_wishlist(&self, updated_wishlist: UpdatedWishlist) -> Result<WishlistData>;
    async fn delete_wishlist(&self, wishlist_id: PrimaryKey) -> Result<bool>;

    async fn item_by_id(&self, item_id: PrimaryKey) -> Result<ItemData>;
    async fn list_items(&self, wishlist_id: PrimaryKey) -> Result<Vec<ItemData>>;
    /// Creates the item along with its first price history entry, or neither
    async fn create_item(&self, new_item: NewItem) -> Result<ItemData>;
    async fn update_item(&self, updated_item: UpdatedItem) -> Result<ItemData>;
    async fn delete_item(&self, item_id: PrimaryKey) -> Result<bool>;

    /// Returns the price history of an item, oldest first
    async fn price_history(&self, item_id: PrimaryKey) -> Result<Vec<PriceHistoryData>>;
    async fn append_price_history(&self, new_entry: NewPriceHistory) -> Result<PriceHistoryData>;

    async fn alert_by_id(&self, alert_id: PrimaryKey) -> Result<PriceAlertData>;
    async fn list_alerts(&self, item_id: PrimaryKey) -> Result<Vec<PriceAlertData>>;
    async fn create_alert(&self, new_alert: NewPriceAlert) -> Result<PriceAlertData>;
    async fn update_alert(&self, updated_alert: UpdatedPriceAlert) -> Result<PriceAlertData>;
    async fn delete_alert(&self, alert_id: PrimaryKey) -> Result<bool>;

    async fn list_listings(&self, item_id: PrimaryKey) -> Result<Vec<ListingData>>;
    async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData>;

    async fn list_shared_access(&self, wishlist_id: PrimaryKey) -> Result<Vec<SharedAccessData>>;
    async fn shared_access(&self, wishlist_id: PrimaryKey, user_id: &str)
        -> Result<SharedAccessData>;
    /// Returns every wishlist the user has been granted access to
    async fn list_shared_with(&self, user_id: &str) -> Result<Vec<WishlistData>>;
    async fn create_shared_access(&self, new_access: NewSharedAccess) -> Result<SharedAccessData>;
    async fn delete_shared_access(&self, wishlist_id: PrimaryKey, user_id: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewWishlist {
    /// The owner of the new wishlist
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub share_id: String,
}

#[derive(Debug, Default)]
pub struct UpdatedWishlist {
    pub id: PrimaryKey,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub wishlist_id: PrimaryKey,
    pub name: String,
    pub description: Option<String>,
    pub current_price: Cents,
    pub original_price: Cents,
    pub image_url: Option<String>,
    pub product_url: String,
    pub store: String,
    pub category: String,
    pub is_favorite: bool,
    /// When the initial price was observed
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatedItem {
    pub id: PrimaryKey,
    pub name: Option<String>,
    pub description: Option<String>,
    pub current_price: Option<Cents>,
    pub original_price: Option<Cents>,
    /// `Some(None)` clears the image
    pub image_url: Option<Option<String>>,
    pub product_url: Option<String>,
    pub store: Option<String>,
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
}

#[derive(Debug)]
pub struct NewPriceHistory {
    pub item_id: PrimaryKey,
    pub price: Cents,
    pub date: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewPriceAlert {
    pub item_id: PrimaryKey,
    pub target_price: Cents,
    pub is_active: bool,
}

#[derive(Debug, Default)]
pub struct UpdatedPriceAlert {
    pub id: PrimaryKey,
    pub target_price: Option<Cents>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub item_id: PrimaryKey,
    pub name: String,
    pub price: Cents,
    pub image_url: Option<String>,
    pub product_url: String,
    pub store: String,
    pub is_available: bool,
}

#[derive(Debug)]
pub struct NewSharedAccess {
    pub wishlist_id: PrimaryKey,
    pub user_id: UserId,
}
