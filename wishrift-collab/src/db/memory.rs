use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::{
    Database, DatabaseError, ItemData, ListingData, NewItem, NewListing, NewPriceAlert,
    NewPriceHistory, NewSession, NewSharedAccess, NewUser, NewWishlist, PriceAlertData,
    PriceHistoryData, PrimaryKey, Result, SessionData, SharedAccessData, UpdatedItem,
    UpdatedPriceAlert, UpdatedWishlist, UserData, WishlistData,
};

/// An in-memory database, useful for tests and running without postgres.
/// Rows are kept in insertion order, so ids are always ascending.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    last_id: PrimaryKey,

    users: Vec<UserData>,
    sessions: Vec<StoredSession>,
    wishlists: Vec<WishlistData>,
    items: Vec<ItemData>,
    history: Vec<PriceHistoryData>,
    alerts: Vec<PriceAlertData>,
    listings: Vec<ListingData>,
    shared_access: Vec<SharedAccessData>,
}

struct StoredSession {
    id: PrimaryKey,
    token: String,
    user_id: String,
    expires_at: chrono::DateTime<Utc>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn next_id(&mut self) -> PrimaryKey {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, user_id: &str) -> Result<&UserData> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    fn wishlist_mut(&mut self, wishlist_id: PrimaryKey) -> Result<&mut WishlistData> {
        self.wishlists
            .iter_mut()
            .find(|w| w.id == wishlist_id)
            .ok_or(DatabaseError::NotFound {
                resource: "wishlist",
                identifier: "id",
            })
    }

    fn item_mut(&mut self, item_id: PrimaryKey) -> Result<&mut ItemData> {
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(DatabaseError::NotFound {
                resource: "item",
                identifier: "id",
            })
    }

    fn remove_item_rows(&mut self, item_ids: &[PrimaryKey]) {
        self.items.retain(|i| !item_ids.contains(&i.id));
        self.history.retain(|h| !item_ids.contains(&h.item_id));
        self.alerts.retain(|a| !item_ids.contains(&a.item_id));
        self.listings.retain(|l| !item_ids.contains(&l.item_id));
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: &str) -> Result<UserData> {
        self.tables.lock().user(user_id).cloned()
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.tables
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })
    }

    async fn upsert_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut tables = self.tables.lock();
        let now = Utc::now();

        let username_taken = tables
            .users
            .iter()
            .any(|u| u.username == new_user.username && u.id != new_user.id);

        if username_taken {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            });
        }

        if let Some(user) = tables.users.iter_mut().find(|u| u.id == new_user.id) {
            user.username = new_user.username;
            user.email = new_user.email;
            user.first_name = new_user.first_name;
            user.last_name = new_user.last_name;
            user.bio = new_user.bio;
            user.profile_image_url = new_user.profile_image_url;
            user.updated_at = now;

            return Ok(user.clone());
        }

        let user = UserData {
            id: new_user.id,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            bio: new_user.bio,
            profile_image_url: new_user.profile_image_url,
            created_at: now,
            updated_at: now,
        };

        tables.users.push(user.clone());
        Ok(user)
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let tables = self.tables.lock();

        let session = tables
            .sessions
            .iter()
            .find(|s| s.token == token)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })?;

        Ok(SessionData {
            id: session.id,
            token: session.token.clone(),
            expires_at: session.expires_at,
            user: tables.user(&session.user_id)?.clone(),
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        {
            let mut tables = self.tables.lock();

            if tables.sessions.iter().any(|s| s.token == new_session.token) {
                return Err(DatabaseError::Conflict {
                    resource: "session",
                    field: "token",
                    value: new_session.token,
                });
            }

            tables.user(&new_session.user_id)?;

            let id = tables.next_id();
            tables.sessions.push(StoredSession {
                id,
                token: new_session.token.clone(),
                user_id: new_session.user_id,
                expires_at: new_session.expires_at,
            });
        }

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        let before = tables.sessions.len();

        tables.sessions.retain(|s| s.token != token);

        if tables.sessions.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            });
        }

        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();
        self.tables.lock().sessions.retain(|s| s.expires_at > now);

        Ok(())
    }

    async fn wishlist_by_id(&self, wishlist_id: PrimaryKey) -> Result<WishlistData> {
        self.tables
            .lock()
            .wishlist_mut(wishlist_id)
            .map(|w| w.clone())
    }

    async fn wishlist_by_share_id(&self, share_id: &str) -> Result<WishlistData> {
        self.tables
            .lock()
            .wishlists
            .iter()
            .find(|w| w.share_id == share_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "wishlist",
                identifier: "share_id",
            })
    }

    async fn list_wishlists(&self, user_id: &str) -> Result<Vec<WishlistData>> {
        Ok(self
            .tables
            .lock()
            .wishlists
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_wishlist(&self, new_wishlist: NewWishlist) -> Result<WishlistData> {
        let mut tables = self.tables.lock();

        if tables
            .wishlists
            .iter()
            .any(|w| w.share_id == new_wishlist.share_id)
        {
            return Err(DatabaseError::Conflict {
                resource: "wishlist",
                field: "share_id",
                value: new_wishlist.share_id,
            });
        }

        tables.user(&new_wishlist.user_id)?;

        let now = Utc::now();
        let wishlist = WishlistData {
            id: tables.next_id(),
            user_id: new_wishlist.user_id,
            title: new_wishlist.title,
            description: new_wishlist.description,
            share_id: new_wishlist.share_id,
            created_at: now,
            updated_at: now,
        };

        tables.wishlists.push(wishlist.clone());
        Ok(wishlist)
    }

    async fn update_wishlist(&self, updated_wishlist: UpdatedWishlist) -> Result<WishlistData> {
        let mut tables = self.tables.lock();
        let wishlist = tables.wishlist_mut(updated_wishlist.id)?;

        if let Some(title) = updated_wishlist.title {
            wishlist.title = title;
        }

        if let Some(description) = updated_wishlist.description {
            wishlist.description = Some(description);
        }

        wishlist.updated_at = Utc::now();
        Ok(wishlist.clone())
    }

    async fn delete_wishlist(&self, wishlist_id: PrimaryKey) -> Result<bool> {
        let mut tables = self.tables.lock();

        if tables.wishlist_mut(wishlist_id).is_err() {
            return Ok(false);
        }

        let item_ids: Vec<_> = tables
            .items
            .iter()
            .filter(|i| i.wishlist_id == wishlist_id)
            .map(|i| i.id)
            .collect();

        tables.remove_item_rows(&item_ids);
        tables.shared_access.retain(|s| s.wishlist_id != wishlist_id);
        tables.wishlists.retain(|w| w.id != wishlist_id);

        Ok(true)
    }

    async fn item_by_id(&self, item_id: PrimaryKey) -> Result<ItemData> {
        self.tables.lock().item_mut(item_id).map(|i| i.clone())
    }

    async fn list_items(&self, wishlist_id: PrimaryKey) -> Result<Vec<ItemData>> {
        Ok(self
            .tables
            .lock()
            .items
            .iter()
            .filter(|i| i.wishlist_id == wishlist_id)
            .cloned()
            .collect())
    }

    async fn create_item(&self, new_item: NewItem) -> Result<ItemData> {
        let mut tables = self.tables.lock();
        tables.wishlist_mut(new_item.wishlist_id)?;

        let now = Utc::now();
        let item = ItemData {
            id: tables.next_id(),
            wishlist_id: new_item.wishlist_id,
            name: new_item.name,
            description: new_item.description,
            current_price: new_item.current_price,
            original_price: new_item.original_price,
            image_url: new_item.image_url,
            product_url: new_item.product_url,
            store: new_item.store,
            category: new_item.category,
            is_favorite: new_item.is_favorite,
            created_at: now,
            updated_at: now,
        };

        // Both rows are written under the same lock
        let entry = PriceHistoryData {
            id: tables.next_id(),
            item_id: item.id,
            price: item.current_price,
            date: new_item.recorded_at,
        };

        tables.items.push(item.clone());
        tables.history.push(entry);

        Ok(item)
    }

    async fn update_item(&self, updated_item: UpdatedItem) -> Result<ItemData> {
        let mut tables = self.tables.lock();
        let item = tables.item_mut(updated_item.id)?;

        if let Some(name) = updated_item.name {
            item.name = name;
        }
        if let Some(description) = updated_item.description {
            item.description = Some(description);
        }
        if let Some(price) = updated_item.current_price {
            item.current_price = price;
        }
        if let Some(price) = updated_item.original_price {
            item.original_price = price;
        }
        if let Some(image_url) = updated_item.image_url {
            item.image_url = image_url;
        }
        if let Some(product_url) = updated_item.product_url {
            item.product_url = product_url;
        }
        if let Some(store) = updated_item.store {
            item.store = store;
        }
        if let Some(category) = updated_item.category {
            item.category = category;
        }
        if let Some(is_favorite) = updated_item.is_favorite {
            item.is_favorite = is_favorite;
        }

        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_item(&self, item_id: PrimaryKey) -> Result<bool> {
        let mut tables = self.tables.lock();

        if tables.item_mut(item_id).is_err() {
            return Ok(false);
        }

        tables.remove_item_rows(&[item_id]);
        Ok(true)
    }

    async fn price_history(&self, item_id: PrimaryKey) -> Result<Vec<PriceHistoryData>> {
        let mut history: Vec<_> = self
            .tables
            .lock()
            .history
            .iter()
            .filter(|h| h.item_id == item_id)
            .cloned()
            .collect();

        history.sort_by_key(|h| (h.date, h.id));
        Ok(history)
    }

    async fn append_price_history(&self, new_entry: NewPriceHistory) -> Result<PriceHistoryData> {
        let mut tables = self.tables.lock();
        tables.item_mut(new_entry.item_id)?;

        let entry = PriceHistoryData {
            id: tables.next_id(),
            item_id: new_entry.item_id,
            price: new_entry.price,
            date: new_entry.date,
        };

        tables.history.push(entry.clone());
        Ok(entry)
    }

    async fn alert_by_id(&self, alert_id: PrimaryKey) -> Result<PriceAlertData> {
        self.tables
            .lock()
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "price alert",
                identifier: "id",
            })
    }

    async fn list_alerts(&self, item_id: PrimaryKey) -> Result<Vec<PriceAlertData>> {
        Ok(self
            .tables
            .lock()
            .alerts
            .iter()
            .filter(|a| a.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn create_alert(&self, new_alert: NewPriceAlert) -> Result<PriceAlertData> {
        let mut tables = self.tables.lock();
        tables.item_mut(new_alert.item_id)?;

        let alert = PriceAlertData {
            id: tables.next_id(),
            item_id: new_alert.item_id,
            target_price: new_alert.target_price,
            is_active: new_alert.is_active,
            created_at: Utc::now(),
        };

        tables.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn update_alert(&self, updated_alert: UpdatedPriceAlert) -> Result<PriceAlertData> {
        let mut tables = self.tables.lock();

        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == updated_alert.id)
            .ok_or(DatabaseError::NotFound {
                resource: "price alert",
                identifier: "id",
            })?;

        if let Some(target_price) = updated_alert.target_price {
            alert.target_price = target_price;
        }
        if let Some(is_active) = updated_alert.is_active {
            alert.is_active = is_active;
        }

        Ok(alert.clone())
    }

    async fn delete_alert(&self, alert_id: PrimaryKey) -> Result<bool> {
        let mut tables = self.tables.lock();
        let before = tables.alerts.len();

        tables.alerts.retain(|a| a.id != alert_id);
        Ok(tables.alerts.len() != before)
    }

    async fn list_listings(&self, item_id: PrimaryKey) -> Result<Vec<ListingData>> {
        Ok(self
            .tables
            .lock()
            .listings
            .iter()
            .filter(|l| l.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData> {
        let mut tables = self.tables.lock();
        tables.item_mut(new_listing.item_id)?;

        let listing = ListingData {
            id: tables.next_id(),
            item_id: new_listing.item_id,
            name: new_listing.name,
            price: new_listing.price,
            image_url: new_listing.image_url,
            product_url: new_listing.product_url,
            store: new_listing.store,
            is_available: new_listing.is_available,
            scraped_at: Utc::now(),
        };

        tables.listings.push(listing.clone());
        Ok(listing)
    }

    async fn list_shared_access(&self, wishlist_id: PrimaryKey) -> Result<Vec<SharedAccessData>> {
        Ok(self
            .tables
            .lock()
            .shared_access
            .iter()
            .filter(|s| s.wishlist_id == wishlist_id)
            .cloned()
            .collect())
    }

    async fn shared_access(
        &self,
        wishlist_id: PrimaryKey,
        user_id: &str,
    ) -> Result<SharedAccessData> {
        self.tables
            .lock()
            .shared_access
            .iter()
            .find(|s| s.wishlist_id == wishlist_id && s.user_id == user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "shared access",
                identifier: "wishlist_id:user_id",
            })
    }

    async fn list_shared_with(&self, user_id: &str) -> Result<Vec<WishlistData>> {
        let tables = self.tables.lock();

        let wishlists = tables
            .shared_access
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| tables.wishlists.iter().find(|w| w.id == s.wishlist_id))
            .cloned()
            .collect();

        Ok(wishlists)
    }

    async fn create_shared_access(&self, new_access: NewSharedAccess) -> Result<SharedAccessData> {
        let mut tables = self.tables.lock();

        let exists = tables
            .shared_access
            .iter()
            .any(|s| s.wishlist_id == new_access.wishlist_id && s.user_id == new_access.user_id);

        if exists {
            return Err(DatabaseError::Conflict {
                resource: "shared access",
                field: "wishlist:user",
                value: format!("{}:{}", new_access.wishlist_id, new_access.user_id),
            });
        }

        tables.wishlist_mut(new_access.wishlist_id)?;
        tables.user(&new_access.user_id)?;

        let access = SharedAccessData {
            id: tables.next_id(),
            wishlist_id: new_access.wishlist_id,
            user_id: new_access.user_id,
            created_at: Utc::now(),
        };

        tables.shared_access.push(access.clone());
        Ok(access)
    }

    async fn delete_shared_access(&self, wishlist_id: PrimaryKey, user_id: &str) -> Result<bool> {
        let mut tables = self.tables.lock();
        let before = tables.shared_access.len();

        tables
            .shared_access
            .retain(|s| !(s.wishlist_id == wishlist_id && s.user_id == user_id));

        Ok(tables.shared_access.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::Cents;

    fn new_user(id: &str) -> NewUser {
        NewUser {
            id: id.to_string(),
            username: id.to_string(),
            email: None,
            first_name: None,
            last_name: None,
            bio: None,
            profile_image_url: None,
        }
    }

    fn new_item(wishlist_id: PrimaryKey) -> NewItem {
        NewItem {
            wishlist_id,
            name: "Xbox Series X".to_string(),
            description: None,
            current_price: Cents::new(49999),
            original_price: Cents::new(49999),
            image_url: None,
            product_url: "https://www.amazon.com/Xbox-X/dp/B08H75RTZ8".to_string(),
            store: "Amazon".to_string(),
            category: "Gaming".to_string(),
            is_favorite: false,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let db = MemoryDatabase::new();

        db.upsert_user(new_user("abc")).await.unwrap();

        let mut changed = new_user("abc");
        changed.username = "renamed".to_string();
        changed.bio = Some("hello".to_string());

        let user = db.upsert_user(changed).await.unwrap();

        assert_eq!(user.username, "renamed");
        assert_eq!(user.bio.as_deref(), Some("hello"));
        assert!(db.user_by_username("abc").await.is_err());
    }

    #[tokio::test]
    async fn deleting_a_wishlist_cascades() {
        let db = MemoryDatabase::new();
        db.upsert_user(new_user("owner")).await.unwrap();
        db.upsert_user(new_user("friend")).await.unwrap();

        let wishlist = db
            .create_wishlist(NewWishlist {
                user_id: "owner".to_string(),
                title: "Birthday".to_string(),
                description: None,
                share_id: "share".to_string(),
            })
            .await
            .unwrap();

        let item = db.create_item(new_item(wishlist.id)).await.unwrap();
        db.create_alert(NewPriceAlert {
            item_id: item.id,
            target_price: Cents::new(45000),
            is_active: true,
        })
        .await
        .unwrap();
        db.create_shared_access(NewSharedAccess {
            wishlist_id: wishlist.id,
            user_id: "friend".to_string(),
        })
        .await
        .unwrap();

        assert!(db.delete_wishlist(wishlist.id).await.unwrap());
        assert!(!db.delete_wishlist(wishlist.id).await.unwrap());

        assert!(db.item_by_id(item.id).await.is_err());
        assert!(db.price_history(item.id).await.unwrap().is_empty());
        assert!(db.list_alerts(item.id).await.unwrap().is_empty());
        assert!(db.list_shared_with("friend").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shared_access_is_unique_per_pair() {
        let db = MemoryDatabase::new();
        db.upsert_user(new_user("owner")).await.unwrap();
        db.upsert_user(new_user("friend")).await.unwrap();

        let wishlist = db
            .create_wishlist(NewWishlist {
                user_id: "owner".to_string(),
                title: "Birthday".to_string(),
                description: None,
                share_id: "share".to_string(),
            })
            .await
            .unwrap();

        let grant = || NewSharedAccess {
            wishlist_id: wishlist.id,
            user_id: "friend".to_string(),
        };

        db.create_shared_access(grant()).await.unwrap();
        let second = db.create_shared_access(grant()).await;

        assert!(matches!(second, Err(DatabaseError::Conflict { .. })));
        assert!(db.delete_shared_access(wishlist.id, "friend").await.unwrap());
        assert!(!db.delete_shared_access(wishlist.id, "friend").await.unwrap());
    }
}
