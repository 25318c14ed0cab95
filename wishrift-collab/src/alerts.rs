use log::info;

use crate::{
    errors::require_price, Cents, CollabContext, CollabError, CollabResult, NewPriceAlert,
    PriceAlertData, PrimaryKey, UpdatedPriceAlert,
};

/// Manages price alerts and decides when they trigger
pub struct AlertManager {
    context: CollabContext,
}

impl AlertManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Adds an alert to the item. Items may carry any number of alerts.
    pub async fn set_price_alert(
        &self,
        item_id: PrimaryKey,
        target_price: Cents,
        is_active: bool,
    ) -> CollabResult<PriceAlertData> {
        validate_target(target_price)?;

        let alert = self
            .context
            .database
            .create_alert(NewPriceAlert {
                item_id,
                target_price,
                is_active,
            })
            .await?;

        info!("Price alert {} set on item {} at {}", alert.id, item_id, target_price);
        Ok(alert)
    }

    pub async fn list_alerts(&self, item_id: PrimaryKey) -> CollabResult<Vec<PriceAlertData>> {
        Ok(self.context.database.list_alerts(item_id).await?)
    }

    pub async fn alert(&self, alert_id: PrimaryKey) -> CollabResult<PriceAlertData> {
        Ok(self.context.database.alert_by_id(alert_id).await?)
    }

    pub async fn update_alert(
        &self,
        alert_id: PrimaryKey,
        target_price: Option<Cents>,
        is_active: Option<bool>,
    ) -> CollabResult<PriceAlertData> {
        if let Some(target_price) = target_price {
            validate_target(target_price)?;
        }

        Ok(self
            .context
            .database
            .update_alert(UpdatedPriceAlert {
                id: alert_id,
                target_price,
                is_active,
            })
            .await?)
    }

    pub async fn delete_alert(&self, alert_id: PrimaryKey) -> CollabResult<bool> {
        Ok(self.context.database.delete_alert(alert_id).await?)
    }

    /// Returns the alerts of the item that trigger at the given price.
    /// An item without alerts simply yields nothing.
    pub async fn evaluate_alerts(
        &self,
        item_id: PrimaryKey,
        new_price: Cents,
    ) -> CollabResult<Vec<PriceAlertData>> {
        let alerts = self.context.database.list_alerts(item_id).await?;

        Ok(triggered_alerts(alerts, new_price))
    }
}

/// Keeps the alerts that are active and whose target is at or above the price
pub fn triggered_alerts(
    alerts: impl IntoIterator<Item = PriceAlertData>,
    price: Cents,
) -> Vec<PriceAlertData> {
    alerts
        .into_iter()
        .filter(|a| a.is_active && price <= a.target_price)
        .collect()
}

fn validate_target(target_price: Cents) -> CollabResult<()> {
    if target_price == Cents::ZERO {
        return Err(CollabError::validation(
            "targetPrice",
            "must be greater than zero",
        ));
    }

    require_price("targetPrice", target_price)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::testing::{collab, identity, item_fields};

    fn alert(target_price: u64, is_active: bool) -> PriceAlertData {
        PriceAlertData {
            id: 1,
            item_id: 1,
            target_price: Cents::new(target_price),
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn triggers_at_or_below_target() {
        let alerts = vec![alert(45000, true)];

        assert_eq!(triggered_alerts(alerts.clone(), Cents::new(44999)).len(), 1);
        assert_eq!(triggered_alerts(alerts.clone(), Cents::new(45000)).len(), 1);
        assert!(triggered_alerts(alerts, Cents::new(45001)).is_empty());
    }

    #[test]
    fn inactive_alerts_never_trigger() {
        let alerts = vec![alert(45000, false)];

        assert!(triggered_alerts(alerts.clone(), Cents::new(1)).is_empty());
        assert!(triggered_alerts(alerts, Cents::new(99999)).is_empty());
    }

    #[tokio::test]
    async fn zero_targets_are_rejected() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;
        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Tech", None)
            .await
            .unwrap();
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("iPad", 32999))
            .await
            .unwrap();

        let created = collab.alerts.set_price_alert(item.id, Cents::ZERO, true).await;
        assert!(matches!(created, Err(CollabError::Validation { .. })));

        let alert = collab
            .alerts
            .set_price_alert(item.id, Cents::new(30000), true)
            .await
            .unwrap();
        let updated = collab
            .alerts
            .update_alert(alert.id, Some(Cents::ZERO), None)
            .await;
        assert!(matches!(updated, Err(CollabError::Validation { .. })));

        let huge = collab
            .alerts
            .set_price_alert(item.id, Cents::new(u64::MAX), true)
            .await;
        assert!(matches!(huge, Err(CollabError::Validation { field: "targetPrice", .. })));
    }

    #[tokio::test]
    async fn alerts_on_missing_items_are_not_found() {
        let collab = collab();

        let result = collab
            .alerts
            .set_price_alert(404, Cents::new(100), true)
            .await;

        assert!(matches!(result, Err(CollabError::NotFound { .. })));
    }

    #[tokio::test]
    async fn items_without_alerts_trigger_nothing() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;
        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Tech", None)
            .await
            .unwrap();
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("AirPods", 12999))
            .await
            .unwrap();

        let triggered = collab.alerts.evaluate_alerts(item.id, Cents::new(1)).await.unwrap();

        assert!(triggered.is_empty());
    }

    #[tokio::test]
    async fn alerts_can_be_toggled_and_deleted() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;
        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Tech", None)
            .await
            .unwrap();
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("MacBook", 99999))
            .await
            .unwrap();

        let alert = collab
            .alerts
            .set_price_alert(item.id, Cents::new(90000), true)
            .await
            .unwrap();

        let paused = collab
            .alerts
            .update_alert(alert.id, None, Some(false))
            .await
            .unwrap();
        assert!(!paused.is_active);
        assert_eq!(paused.target_price, Cents::new(90000));

        assert!(collab
            .alerts
            .evaluate_alerts(item.id, Cents::new(1))
            .await
            .unwrap()
            .is_empty());

        assert!(collab.alerts.delete_alert(alert.id).await.unwrap());
        assert!(!collab.alerts.delete_alert(alert.id).await.unwrap());
    }
}
