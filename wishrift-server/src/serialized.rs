//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls. Prices are always in cents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use wishrift_collab::{
    DiscoveredListing, ItemData, ListingData, PriceAlertData, PriceHistoryData, ScrapeOutcome,
    SessionData, SharedAccessData, SharedWishlist as CollabSharedWishlist, UserData,
    WishlistData,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: String,
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    profile_image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    id: i32,
    user_id: String,
    title: String,
    description: Option<String>,
    share_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    id: i32,
    wish_list_id: i32,
    name: String,
    description: Option<String>,
    current_price: u64,
    original_price: u64,
    image_url: Option<String>,
    product_url: String,
    store: String,
    category: String,
    is_favorite: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    id: i32,
    item_id: i32,
    price: u64,
    date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    id: i32,
    item_id: i32,
    target_price: u64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    id: i32,
    item_id: i32,
    name: String,
    price: u64,
    image_url: Option<String>,
    product_url: String,
    store: String,
    is_available: bool,
    scraped_at: DateTime<Utc>,
}

/// A search result that hasn't been recorded for any item
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    name: String,
    price: u64,
    image_url: Option<String>,
    product_url: String,
    store: String,
    is_available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedAccess {
    id: i32,
    wish_list_id: i32,
    user_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SharedWishlist {
    wishlist: Wishlist,
    items: Vec<Item>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    item: Item,
    listings: Vec<Listing>,
    triggered_alerts: Vec<PriceAlert>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            bio: self.bio.clone(),
            profile_image_url: self.profile_image_url.clone(),
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Wishlist> for WishlistData {
    fn to_serialized(&self) -> Wishlist {
        Wishlist {
            id: self.id,
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            share_id: self.share_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ToSerialized<Item> for ItemData {
    fn to_serialized(&self) -> Item {
        Item {
            id: self.id,
            wish_list_id: self.wishlist_id,
            name: self.name.clone(),
            description: self.description.clone(),
            current_price: self.current_price.value(),
            original_price: self.original_price.value(),
            image_url: self.image_url.clone(),
            product_url: self.product_url.clone(),
            store: self.store.clone(),
            category: self.category.clone(),
            is_favorite: self.is_favorite,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ToSerialized<PriceHistoryEntry> for PriceHistoryData {
    fn to_serialized(&self) -> PriceHistoryEntry {
        PriceHistoryEntry {
            id: self.id,
            item_id: self.item_id,
            price: self.price.value(),
            date: self.date,
        }
    }
}

impl ToSerialized<PriceAlert> for PriceAlertData {
    fn to_serialized(&self) -> PriceAlert {
        PriceAlert {
            id: self.id,
            item_id: self.item_id,
            target_price: self.target_price.value(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Listing> for ListingData {
    fn to_serialized(&self) -> Listing {
        Listing {
            id: self.id,
            item_id: self.item_id,
            name: self.name.clone(),
            price: self.price.value(),
            image_url: self.image_url.clone(),
            product_url: self.product_url.clone(),
            store: self.store.clone(),
            is_available: self.is_available,
            scraped_at: self.scraped_at,
        }
    }
}

impl ToSerialized<SearchResult> for DiscoveredListing {
    fn to_serialized(&self) -> SearchResult {
        SearchResult {
            name: self.name.clone(),
            price: self.price.value(),
            image_url: self.image_url.clone(),
            product_url: self.product_url.clone(),
            store: self.store.clone(),
            is_available: self.is_available,
        }
    }
}

impl ToSerialized<SharedAccess> for SharedAccessData {
    fn to_serialized(&self) -> SharedAccess {
        SharedAccess {
            id: self.id,
            wish_list_id: self.wishlist_id,
            user_id: self.user_id.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<SharedWishlist> for CollabSharedWishlist {
    fn to_serialized(&self) -> SharedWishlist {
        SharedWishlist {
            wishlist: self.wishlist.to_serialized(),
            items: self.items.to_serialized(),
        }
    }
}

impl ToSerialized<ScrapeResult> for ScrapeOutcome {
    fn to_serialized(&self) -> ScrapeResult {
        ScrapeResult {
            item: self.item.to_serialized(),
            listings: self.listings.to_serialized(),
            triggered_alerts: self.triggered_alerts.to_serialized(),
        }
    }
}
