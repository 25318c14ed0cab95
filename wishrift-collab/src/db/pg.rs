use async_trait::async_trait;
use sqlx::{
    migrate::MigrateError, postgres::PgPoolOptions, postgres::PgRow, query, query_as,
    Error as SqlxError, FromRow, PgPool, Row,
};

use crate::{
    Cents, Database, DatabaseError, DatabaseResult, IntoDatabaseError, ItemData, ListingData,
    NewItem, NewListing, NewPriceAlert, NewPriceHistory, NewSession, NewSharedAccess, NewUser,
    NewWishlist, PriceAlertData, PriceHistoryData, PrimaryKey, Result, SessionData,
    SharedAccessData, UpdatedItem, UpdatedPriceAlert, UpdatedWishlist, UserData, WishlistData,
};

/// A postgres database implementation for wishrift
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        Ok(Self { pool })
    }

    /// Brings the schema up to date
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e: MigrateError| DatabaseError::Internal(Box::new(e)))
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "username"))
    }

    async fn upsert_user(&self, new_user: NewUser) -> Result<UserData> {
        // The username may only move between ids if nobody else holds it
        match self.user_by_username(&new_user.username).await {
            Ok(existing) if existing.id != new_user.id => {
                return Err(DatabaseError::Conflict {
                    resource: "user",
                    field: "username",
                    value: new_user.username,
                })
            }
            Ok(_) | Err(DatabaseError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        query_as::<_, UserData>(
            "
            INSERT INTO users (id, username, email, first_name, last_name, bio, profile_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                bio = EXCLUDED.bio,
                profile_image_url = EXCLUDED.profile_image_url,
                updated_at = now()
            RETURNING *",
        )
        .bind(&new_user.id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.bio)
        .bind(&new_user.profile_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row = query(
            "SELECT
                sessions.id AS session_id,
                sessions.token,
                sessions.expires_at,
                users.*
            FROM sessions
                INNER JOIN users ON sessions.user_id = users.id
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))?;

        let decode = || -> sqlx::Result<SessionData> {
            Ok(SessionData {
                id: row.try_get("session_id")?,
                token: row.try_get("token")?,
                expires_at: row.try_get("expires_at")?,
                user: UserData::from_row(&row)?,
            })
        };

        decode().map_err(|e| e.any())
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&new_session.token)
            .bind(&new_session.user_id)
            .bind(new_session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_token(token).await?;

        query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE now() > expires_at")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn wishlist_by_id(&self, wishlist_id: PrimaryKey) -> Result<WishlistData> {
        query_as::<_, WishlistData>("SELECT * FROM wishlists WHERE id = $1")
            .bind(wishlist_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("wishlist", "id"))
    }

    async fn wishlist_by_share_id(&self, share_id: &str) -> Result<WishlistData> {
        query_as::<_, WishlistData>("SELECT * FROM wishlists WHERE share_id = $1")
            .bind(share_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("wishlist", "share_id"))
    }

    async fn list_wishlists(&self, user_id: &str) -> Result<Vec<WishlistData>> {
        query_as::<_, WishlistData>("SELECT * FROM wishlists WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_wishlist(&self, new_wishlist: NewWishlist) -> Result<WishlistData> {
        self.wishlist_by_share_id(&new_wishlist.share_id)
            .await
            .conflict_or_ok("wishlist", "share_id", &new_wishlist.share_id)?;

        let user = self.user_by_id(&new_wishlist.user_id).await?;

        query_as::<_, WishlistData>(
            "
            INSERT INTO wishlists (user_id, title, description, share_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *",
        )
        .bind(&user.id)
        .bind(&new_wishlist.title)
        .bind(&new_wishlist.description)
        .bind(&new_wishlist.share_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn update_wishlist(&self, updated_wishlist: UpdatedWishlist) -> Result<WishlistData> {
        query_as::<_, WishlistData>(
            "UPDATE wishlists SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING *",
        )
        .bind(updated_wishlist.id)
        .bind(updated_wishlist.title)
        .bind(updated_wishlist.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("wishlist", "id"))
    }

    async fn delete_wishlist(&self, wishlist_id: PrimaryKey) -> Result<bool> {
        query("DELETE FROM wishlists WHERE id = $1")
            .bind(wishlist_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|r| r.rows_affected() > 0)
    }

    async fn item_by_id(&self, item_id: PrimaryKey) -> Result<ItemData> {
        query_as::<_, ItemData>("SELECT * FROM wishlist_items WHERE id = $1")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("item", "id"))
    }

    async fn list_items(&self, wishlist_id: PrimaryKey) -> Result<Vec<ItemData>> {
        query_as::<_, ItemData>("SELECT * FROM wishlist_items WHERE wishlist_id = $1 ORDER BY id")
            .bind(wishlist_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_item(&self, new_item: NewItem) -> Result<ItemData> {
        // Ensure wishlist exists
        let _ = self.wishlist_by_id(new_item.wishlist_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let item = query_as::<_, ItemData>(
            "
            INSERT INTO wishlist_items (
                wishlist_id, name, description, current_price, original_price,
                image_url, product_url, store, category, is_favorite
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *",
        )
        .bind(new_item.wishlist_id)
        .bind(&new_item.name)
        .bind(&new_item.description)
        .bind(to_column(new_item.current_price)?)
        .bind(to_column(new_item.original_price)?)
        .bind(&new_item.image_url)
        .bind(&new_item.product_url)
        .bind(&new_item.store)
        .bind(&new_item.category)
        .bind(new_item.is_favorite)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        query("INSERT INTO price_history (item_id, price, date) VALUES ($1, $2, $3)")
            .bind(item.id)
            .bind(to_column(item.current_price)?)
            .bind(new_item.recorded_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        Ok(item)
    }

    async fn update_item(&self, updated_item: UpdatedItem) -> Result<ItemData> {
        let replace_image = updated_item.image_url.is_some();

        query_as::<_, ItemData>(
            "UPDATE wishlist_items SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                current_price = COALESCE($4, current_price),
                original_price = COALESCE($5, original_price),
                image_url = CASE WHEN $11 THEN $6 ELSE image_url END,
                product_url = COALESCE($7, product_url),
                store = COALESCE($8, store),
                category = COALESCE($9, category),
                is_favorite = COALESCE($10, is_favorite),
                updated_at = now()
            WHERE id = $1
            RETURNING *",
        )
        .bind(updated_item.id)
        .bind(updated_item.name)
        .bind(updated_item.description)
        .bind(updated_item.current_price.map(to_column).transpose()?)
        .bind(updated_item.original_price.map(to_column).transpose()?)
        .bind(updated_item.image_url.flatten())
        .bind(updated_item.product_url)
        .bind(updated_item.store)
        .bind(updated_item.category)
        .bind(updated_item.is_favorite)
        .bind(replace_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("item", "id"))
    }

    async fn delete_item(&self, item_id: PrimaryKey) -> Result<bool> {
        query("DELETE FROM wishlist_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|r| r.rows_affected() > 0)
    }

    async fn price_history(&self, item_id: PrimaryKey) -> Result<Vec<PriceHistoryData>> {
        query_as::<_, PriceHistoryData>(
            "SELECT * FROM price_history WHERE item_id = $1 ORDER BY date, id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn append_price_history(&self, new_entry: NewPriceHistory) -> Result<PriceHistoryData> {
        // Ensure item exists
        let _ = self.item_by_id(new_entry.item_id).await?;

        query_as::<_, PriceHistoryData>(
            "INSERT INTO price_history (item_id, price, date) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_entry.item_id)
        .bind(to_column(new_entry.price)?)
        .bind(new_entry.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn alert_by_id(&self, alert_id: PrimaryKey) -> Result<PriceAlertData> {
        query_as::<_, PriceAlertData>("SELECT * FROM price_alerts WHERE id = $1")
            .bind(alert_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("price alert", "id"))
    }

    async fn list_alerts(&self, item_id: PrimaryKey) -> Result<Vec<PriceAlertData>> {
        query_as::<_, PriceAlertData>("SELECT * FROM price_alerts WHERE item_id = $1 ORDER BY id")
            .bind(item_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_alert(&self, new_alert: NewPriceAlert) -> Result<PriceAlertData> {
        // Ensure item exists
        let _ = self.item_by_id(new_alert.item_id).await?;

        query_as::<_, PriceAlertData>(
            "
            INSERT INTO price_alerts (item_id, target_price, is_active)
            VALUES ($1, $2, $3)
            RETURNING *",
        )
        .bind(new_alert.item_id)
        .bind(to_column(new_alert.target_price)?)
        .bind(new_alert.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn update_alert(&self, updated_alert: UpdatedPriceAlert) -> Result<PriceAlertData> {
        query_as::<_, PriceAlertData>(
            "UPDATE price_alerts SET
                target_price = COALESCE($2, target_price),
                is_active = COALESCE($3, is_active)
            WHERE id = $1
            RETURNING *",
        )
        .bind(updated_alert.id)
        .bind(updated_alert.target_price.map(to_column).transpose()?)
        .bind(updated_alert.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("price alert", "id"))
    }

    async fn delete_alert(&self, alert_id: PrimaryKey) -> Result<bool> {
        query("DELETE FROM price_alerts WHERE id = $1")
            .bind(alert_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|r| r.rows_affected() > 0)
    }

    async fn list_listings(&self, item_id: PrimaryKey) -> Result<Vec<ListingData>> {
        query_as::<_, ListingData>(
            "SELECT * FROM product_listings WHERE item_id = $1 ORDER BY id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData> {
        // Ensure item exists
        let _ = self.item_by_id(new_listing.item_id).await?;

        query_as::<_, ListingData>(
            "
            INSERT INTO product_listings (item_id, name, price, image_url, product_url, store, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(new_listing.item_id)
        .bind(&new_listing.name)
        .bind(to_column(new_listing.price)?)
        .bind(&new_listing.image_url)
        .bind(&new_listing.product_url)
        .bind(&new_listing.store)
        .bind(new_listing.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn list_shared_access(&self, wishlist_id: PrimaryKey) -> Result<Vec<SharedAccessData>> {
        query_as::<_, SharedAccessData>(
            "SELECT * FROM shared_access WHERE wishlist_id = $1 ORDER BY id",
        )
        .bind(wishlist_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn shared_access(
        &self,
        wishlist_id: PrimaryKey,
        user_id: &str,
    ) -> Result<SharedAccessData> {
        query_as::<_, SharedAccessData>(
            "SELECT * FROM shared_access WHERE wishlist_id = $1 AND user_id = $2",
        )
        .bind(wishlist_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("shared access", "wishlist_id:user_id"))
    }

    async fn list_shared_with(&self, user_id: &str) -> Result<Vec<WishlistData>> {
        query_as::<_, WishlistData>(
            "
            SELECT wishlists.* FROM shared_access
                INNER JOIN wishlists ON shared_access.wishlist_id = wishlists.id
            WHERE shared_access.user_id = $1
            ORDER BY shared_access.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_shared_access(&self, new_access: NewSharedAccess) -> Result<SharedAccessData> {
        self.shared_access(new_access.wishlist_id, &new_access.user_id)
            .await
            .conflict_or_ok(
                "shared access",
                "wishlist:user",
                format!("{}:{}", new_access.wishlist_id, new_access.user_id).as_str(),
            )?;

        let _ = self.wishlist_by_id(new_access.wishlist_id).await?;
        let _ = self.user_by_id(&new_access.user_id).await?;

        query_as::<_, SharedAccessData>(
            "INSERT INTO shared_access (wishlist_id, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(new_access.wishlist_id)
        .bind(&new_access.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn delete_shared_access(&self, wishlist_id: PrimaryKey, user_id: &str) -> Result<bool> {
        query("DELETE FROM shared_access WHERE wishlist_id = $1 AND user_id = $2")
            .bind(wishlist_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|r| r.rows_affected() > 0)
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}

/// Money is stored as BIGINT, which can't hold every u64
fn to_column(cents: Cents) -> Result<i64> {
    i64::try_from(cents.value()).map_err(|e| DatabaseError::Internal(Box::new(e)))
}

fn cents(row: &PgRow, column: &str) -> sqlx::Result<Cents> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value)
        .map(Cents::new)
        .map_err(|e| SqlxError::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

impl<'r> FromRow<'r, PgRow> for UserData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            bio: row.try_get("bio")?,
            profile_image_url: row.try_get("profile_image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for WishlistData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            share_id: row.try_get("share_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ItemData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            wishlist_id: row.try_get("wishlist_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            current_price: cents(row, "current_price")?,
            original_price: cents(row, "original_price")?,
            image_url: row.try_get("image_url")?,
            product_url: row.try_get("product_url")?,
            store: row.try_get("store")?,
            category: row.try_get("category")?,
            is_favorite: row.try_get("is_favorite")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for PriceHistoryData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            price: cents(row, "price")?,
            date: row.try_get("date")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for PriceAlertData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            target_price: cents(row, "target_price")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ListingData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            name: row.try_get("name")?,
            price: cents(row, "price")?,
            image_url: row.try_get("image_url")?,
            product_url: row.try_get("product_url")?,
            store: row.try_get("store")?,
            is_available: row.try_get("is_available")?,
            scraped_at: row.try_get("scraped_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for SharedAccessData {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            wishlist_id: row.try_get("wishlist_id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
