use chrono::{DateTime, Utc};

use crate::Cents;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// Users are keyed by the opaque id issued by the identity provider.
pub type UserId = String;

/// A wishrift account, mirrored from the identity provider
#[derive(Debug, Clone, PartialEq)]
pub struct UserData {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

/// A named collection of tracked items
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistData {
    pub id: PrimaryKey,
    /// The owner of the list
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    /// The unguessable token used to view the list without authentication.
    /// Never changes after creation.
    pub share_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tracked product on a wishlist
#[derive(Debug, Clone, PartialEq)]
pub struct ItemData {
    pub id: PrimaryKey,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single entry in the append-only price timeline of an item
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistoryData {
    pub id: PrimaryKey,
    pub item_id: PrimaryKey,
    pub price: Cents,
    pub date: DateTime<Utc>,
}

/// A price threshold that triggers once the item is at or below it
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlertData {
    pub id: PrimaryKey,
    pub item_id: PrimaryKey,
    pub target_price: Cents,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A discovered offer for an item, kept for audit
#[derive(Debug, Clone, PartialEq)]
pub struct ListingData {
    pub id: PrimaryKey,
    pub item_id: PrimaryKey,
    pub name: String,
    pub price: Cents,
    pub image_url: Option<String>,
    pub product_url: String,
    pub store: String,
    pub is_available: bool,
    pub scraped_at: DateTime<Utc>,
}

/// Grants a user that isn't the owner read access to a wishlist.
/// Note: `wishlist_id` and `user_id` are unique together.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedAccessData {
    pub id: PrimaryKey,
    pub wishlist_id: PrimaryKey,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
