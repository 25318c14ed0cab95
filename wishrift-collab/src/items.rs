use chrono::Utc;
use log::info;

use crate::{
    errors::{require_price, require_text},
    AlertManager, Cents, CollabContext, CollabResult, DiscoveredListing, ItemData, ListingData,
    NewItem, NewListing, NewPriceHistory, PriceAlertData, PriceHistoryData, PrimaryKey,
    UpdatedItem,
};

/// Manages wishlist items and keeps their price history in step with their price
pub struct ItemManager {
    context: CollabContext,
    alerts: AlertManager,
}

/// The fields of a new item
#[derive(Debug, Clone)]
pub struct ItemFields {
    pub name: String,
    pub description: Option<String>,
    pub current_price: Cents,
    /// Defaults to the current price
    pub original_price: Option<Cents>,
    pub image_url: Option<String>,
    pub product_url: String,
    pub store: String,
    pub category: String,
    pub is_favorite: bool,
}

/// What a scrape of an item found and changed
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// The item after the cheapest available listing was applied
    pub item: ItemData,
    /// Every listing recorded, available or not
    pub listings: Vec<ListingData>,
    pub triggered_alerts: Vec<PriceAlertData>,
}

impl ItemManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
            alerts: AlertManager::new(context),
        }
    }

    /// Creates the item and records its initial price, as one unit
    pub async fn create_item(
        &self,
        wishlist_id: PrimaryKey,
        fields: ItemFields,
    ) -> CollabResult<ItemData> {
        require_text("name", &fields.name)?;
        require_text("productUrl", &fields.product_url)?;
        require_text("store", &fields.store)?;
        require_text("category", &fields.category)?;
        require_price("currentPrice", fields.current_price)?;

        if let Some(price) = fields.original_price {
            require_price("originalPrice", price)?;
        }

        let item = self
            .context
            .database
            .create_item(NewItem {
                wishlist_id,
                name: fields.name.trim().to_string(),
                description: fields.description,
                current_price: fields.current_price,
                original_price: fields.original_price.unwrap_or(fields.current_price),
                image_url: fields.image_url,
                product_url: fields.product_url,
                store: fields.store,
                category: fields.category,
                is_favorite: fields.is_favorite,
                recorded_at: Utc::now(),
            })
            .await?;

        info!(
            "Item {} added to wishlist {} at {}",
            item.id, wishlist_id, item.current_price
        );

        Ok(item)
    }

    pub async fn list_items(&self, wishlist_id: PrimaryKey) -> CollabResult<Vec<ItemData>> {
        Ok(self.context.database.list_items(wishlist_id).await?)
    }

    pub async fn item(&self, item_id: PrimaryKey) -> CollabResult<ItemData> {
        Ok(self.context.database.item_by_id(item_id).await?)
    }

    /// Applies a partial update.
    ///
    /// When the current price changes, a history entry is appended after the item is written
    /// and the item's alerts are evaluated against the new price. A failed append is returned
    /// as an error even though the item itself was already updated.
    pub async fn update_item(&self, changes: UpdatedItem) -> CollabResult<ItemData> {
        if let Some(name) = &changes.name {
            require_text("name", name)?;
        }
        if let Some(price) = changes.current_price {
            require_price("currentPrice", price)?;
        }
        if let Some(price) = changes.original_price {
            require_price("originalPrice", price)?;
        }

        let previous = self.context.database.item_by_id(changes.id).await?;
        let price_changed = changes
            .current_price
            .map_or(false, |p| p != previous.current_price);

        let item = self.context.database.update_item(changes).await?;

        if price_changed {
            self.context
                .database
                .append_price_history(NewPriceHistory {
                    item_id: item.id,
                    price: item.current_price,
                    date: Utc::now(),
                })
                .await?;

            match item.current_price.drop_from(previous.current_price) {
                Some(drop) => info!(
                    "Price of item {} dropped by {} to {}",
                    item.id, drop, item.current_price
                ),
                None => info!(
                    "Price of item {} rose from {} to {}",
                    item.id, previous.current_price, item.current_price
                ),
            }

            for alert in self.alerts.evaluate_alerts(item.id, item.current_price).await? {
                info!(
                    "Price alert {} triggered for item {}: {} is at or below {}",
                    alert.id, item.id, item.current_price, alert.target_price
                );
            }
        }

        Ok(item)
    }

    /// Deletes the item with its history, alerts and listings
    pub async fn delete_item(&self, item_id: PrimaryKey) -> CollabResult<bool> {
        Ok(self.context.database.delete_item(item_id).await?)
    }

    /// Returns the price history of the item, oldest first
    pub async fn price_history(&self, item_id: PrimaryKey) -> CollabResult<Vec<PriceHistoryData>> {
        Ok(self.context.database.price_history(item_id).await?)
    }

    pub async fn listings(&self, item_id: PrimaryKey) -> CollabResult<Vec<ListingData>> {
        Ok(self.context.database.list_listings(item_id).await?)
    }

    /// Moves the item to the cheapest available listing of the batch.
    /// Returns `None` when nothing in the batch is available.
    pub async fn apply_discovered_listing(
        &self,
        item_id: PrimaryKey,
        batch: &[DiscoveredListing],
    ) -> CollabResult<Option<ItemData>> {
        let Some(cheapest) = cheapest_available(batch) else {
            return Ok(None);
        };

        let item = self
            .update_item(UpdatedItem {
                id: item_id,
                current_price: Some(cheapest.price),
                store: Some(cheapest.store.clone()),
                product_url: Some(cheapest.product_url.clone()),
                image_url: Some(cheapest.image_url.clone()),
                ..Default::default()
            })
            .await?;

        Ok(Some(item))
    }

    /// Searches for offers on the item, records all of them and applies the cheapest available one
    pub async fn scrape(&self, item_id: PrimaryKey, query: Option<&str>) -> CollabResult<ScrapeOutcome> {
        let item = self.item(item_id).await?;

        let query = query
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&item.name);

        let discovered = self.context.discovery.search(query);
        let mut listings = Vec::with_capacity(discovered.len());

        for listing in &discovered {
            let recorded = self
                .context
                .database
                .create_listing(NewListing {
                    item_id,
                    name: listing.name.clone(),
                    price: listing.price,
                    image_url: listing.image_url.clone(),
                    product_url: listing.product_url.clone(),
                    store: listing.store.clone(),
                    is_available: listing.is_available,
                })
                .await?;

            listings.push(recorded);
        }

        let item = self
            .apply_discovered_listing(item_id, &discovered)
            .await?
            .unwrap_or(item);

        let triggered_alerts = self
            .alerts
            .evaluate_alerts(item_id, item.current_price)
            .await?;

        Ok(ScrapeOutcome {
            item,
            listings,
            triggered_alerts,
        })
    }
}

fn cheapest_available(batch: &[DiscoveredListing]) -> Option<&DiscoveredListing> {
    batch
        .iter()
        .filter(|l| l.is_available)
        .min_by_key(|l| l.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{collab, identity, item_fields},
        Collab, CollabError, WishlistData,
    };

    async fn wishlist(collab: &Collab) -> WishlistData {
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;

        collab
            .wishlists
            .create_wishlist(&owner.id, "Wants", None)
            .await
            .unwrap()
    }

    fn listing(store: &str, price: u64, is_available: bool) -> DiscoveredListing {
        DiscoveredListing {
            name: "PlayStation 5 Console".to_string(),
            price: Cents::new(price),
            image_url: None,
            product_url: format!("https://www.{}.com/dp/ps5", store.to_lowercase()),
            store: store.to_string(),
            is_available,
        }
    }

    fn prices(history: &[PriceHistoryData]) -> Vec<u64> {
        history.iter().map(|h| h.price.value()).collect()
    }

    #[tokio::test]
    async fn price_drop_scenario() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;

        let mut fields = item_fields("PlayStation 5", 49999);
        fields.original_price = Some(Cents::new(49999));
        let item = collab.items.create_item(wishlist.id, fields).await.unwrap();

        let history = collab.items.price_history(item.id).await.unwrap();
        assert_eq!(prices(&history), vec![49999]);

        collab
            .items
            .update_item(UpdatedItem {
                id: item.id,
                current_price: Some(Cents::new(44999)),
                ..Default::default()
            })
            .await
            .unwrap();

        let history = collab.items.price_history(item.id).await.unwrap();
        assert_eq!(prices(&history), vec![49999, 44999]);

        let alert = collab
            .alerts
            .set_price_alert(item.id, Cents::new(45000), true)
            .await
            .unwrap();

        let triggered = collab
            .alerts
            .evaluate_alerts(item.id, Cents::new(44999))
            .await
            .unwrap();
        assert_eq!(triggered, vec![alert]);

        let triggered = collab
            .alerts
            .evaluate_alerts(item.id, Cents::new(45500))
            .await
            .unwrap();
        assert!(triggered.is_empty());
    }

    #[tokio::test]
    async fn original_price_defaults_to_current() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;

        let item = collab
            .items
            .create_item(wishlist.id, item_fields("Switch", 29999))
            .await
            .unwrap();

        assert_eq!(item.original_price, Cents::new(29999));
    }

    #[tokio::test]
    async fn unchanged_price_appends_nothing() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("Xbox", 49999))
            .await
            .unwrap();

        let updated = collab
            .items
            .update_item(UpdatedItem {
                id: item.id,
                current_price: Some(Cents::new(49999)),
                is_favorite: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(updated.is_favorite);
        assert_eq!(collab.items.price_history(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn items_need_an_existing_wishlist() {
        let collab = collab();

        let result = collab
            .items
            .create_item(404, item_fields("Ghost", 100))
            .await;

        assert!(matches!(result, Err(CollabError::NotFound { .. })));
    }

    #[tokio::test]
    async fn updating_a_missing_item_is_not_found() {
        let collab = collab();

        let result = collab
            .items
            .update_item(UpdatedItem {
                id: 404,
                current_price: Some(Cents::new(1)),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(CollabError::NotFound { .. })));
    }

    #[tokio::test]
    async fn prices_beyond_storage_are_rejected() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;

        let created = collab
            .items
            .create_item(wishlist.id, item_fields("Yacht", u64::MAX))
            .await;
        assert!(matches!(
            created,
            Err(CollabError::Validation { field: "currentPrice", .. })
        ));

        let item = collab
            .items
            .create_item(wishlist.id, item_fields("Yacht", Cents::MAX.value()))
            .await
            .unwrap();

        let updated = collab
            .items
            .update_item(UpdatedItem {
                id: item.id,
                original_price: Some(Cents::new(u64::MAX)),
                ..Default::default()
            })
            .await;
        assert!(matches!(
            updated,
            Err(CollabError::Validation { field: "originalPrice", .. })
        ));
        assert_eq!(collab.items.price_history(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cheapest_available_listing_is_applied() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("PlayStation 5", 49999))
            .await
            .unwrap();

        let batch = vec![
            listing("Walmart", 47999, true),
            listing("Target", 41999, false),
            listing("Newegg", 45999, true),
        ];

        let updated = collab
            .items
            .apply_discovered_listing(item.id, &batch)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.current_price, Cents::new(45999));
        assert_eq!(updated.store, "Newegg");
        assert_eq!(updated.product_url, "https://www.newegg.com/dp/ps5");

        let history = collab.items.price_history(item.id).await.unwrap();
        assert_eq!(prices(&history), vec![49999, 45999]);
    }

    #[tokio::test]
    async fn applied_listing_replaces_the_image() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;

        let mut fields = item_fields("PlayStation 5", 49999);
        fields.image_url = Some("https://old.example/img.png".to_string());
        let item = collab.items.create_item(wishlist.id, fields).await.unwrap();

        let updated = collab
            .items
            .apply_discovered_listing(item.id, &[listing("Walmart", 47999, true)])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.store, "Walmart");
        assert_eq!(updated.image_url, None);
        assert_eq!(collab.items.item(item.id).await.unwrap().image_url, None);
    }

    #[tokio::test]
    async fn unavailable_listings_are_never_applied() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("PlayStation 5", 49999))
            .await
            .unwrap();

        let batch = vec![listing("Target", 100, false), listing("eBay", 200, false)];

        let applied = collab
            .items
            .apply_discovered_listing(item.id, &batch)
            .await
            .unwrap();

        assert!(applied.is_none());
        assert_eq!(
            collab.items.item(item.id).await.unwrap().current_price,
            Cents::new(49999)
        );
    }

    #[tokio::test]
    async fn scrape_records_every_listing() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("PlayStation 5", 49999))
            .await
            .unwrap();

        let outcome = collab.items.scrape(item.id, None).await.unwrap();
        let discovered = collab.discovery.search("PlayStation 5");

        assert_eq!(outcome.listings.len(), discovered.len());
        assert_eq!(collab.items.listings(item.id).await.unwrap(), outcome.listings);

        match cheapest_available(&discovered) {
            Some(cheapest) => assert_eq!(outcome.item.current_price, cheapest.price),
            None => assert_eq!(outcome.item.current_price, Cents::new(49999)),
        }
    }

    #[tokio::test]
    async fn deleting_an_item_reports_whether_it_existed() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("AirPods", 12999))
            .await
            .unwrap();

        assert!(collab.items.delete_item(item.id).await.unwrap());
        assert!(!collab.items.delete_item(item.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_an_item_removes_its_rows() {
        let collab = collab();
        let wishlist = wishlist(&collab).await;
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("PlayStation 5", 49999))
            .await
            .unwrap();

        collab
            .alerts
            .set_price_alert(item.id, Cents::new(40000), true)
            .await
            .unwrap();
        collab.items.scrape(item.id, None).await.unwrap();
        collab
            .items
            .update_item(UpdatedItem {
                id: item.id,
                current_price: Some(Cents::new(39999)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!collab.items.listings(item.id).await.unwrap().is_empty());
        assert!(collab.items.delete_item(item.id).await.unwrap());

        assert!(collab.items.price_history(item.id).await.unwrap().is_empty());
        assert!(collab.alerts.list_alerts(item.id).await.unwrap().is_empty());
        assert!(collab.items.listings(item.id).await.unwrap().is_empty());
    }
}
