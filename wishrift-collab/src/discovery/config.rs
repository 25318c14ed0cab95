use std::{collections::BTreeMap, env, time::Duration};

/// Environment variables holding credentials for affiliate networks and retailers
pub const AFFILIATE_KEY_VARIABLES: [&str; 5] = [
    "RAKUTEN_API_KEY",
    "SKIMLINKS_API_KEY",
    "CJ_AFFILIATE_API_KEY",
    "AMAZON_API_KEY",
    "WALMART_API_KEY",
];

/// Credentials for affiliate networks, keyed by their variable name
#[derive(Debug, Clone, Default)]
pub struct AffiliateKeys {
    keys: BTreeMap<String, String>,
}

impl AffiliateKeys {
    /// Reads every known key from the environment, skipping missing or empty ones
    pub fn from_env() -> Self {
        let keys = AFFILIATE_KEY_VARIABLES
            .iter()
            .filter_map(|name| {
                env::var(name)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v))
            })
            .collect();

        Self { keys }
    }

    pub fn with_key(mut self, name: &str, value: &str) -> Self {
        self.keys.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.keys.get(name).map(String::as_str)
    }

    pub fn has_any(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Names of the configured networks, never their values
    pub fn names(&self) -> Vec<&str> {
        self.keys.keys().map(String::as_str).collect()
    }
}

/// Settings for product discovery
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub affiliate_keys: AffiliateKeys,
    /// Appended to every generated product link
    pub affiliate_tag: String,
    /// How long search results are reused for the same query
    pub cache_ttl: Duration,
    /// Maximum deviation of a store's price from the base price, in basis points
    pub price_variation_bp: i64,
    /// Chance that a store is out of stock
    pub unavailable_probability: f64,
}

impl DiscoveryConfig {
    pub const DEFAULT_AFFILIATE_TAG: &'static str = "wishrift-20";

    pub fn from_env() -> Self {
        Self {
            affiliate_keys: AffiliateKeys::from_env(),
            affiliate_tag: env::var("WISHRIFT_AFFILIATE_TAG")
                .unwrap_or_else(|_| Self::DEFAULT_AFFILIATE_TAG.to_string()),
            ..Default::default()
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            affiliate_keys: AffiliateKeys::default(),
            affiliate_tag: Self::DEFAULT_AFFILIATE_TAG.to_string(),
            cache_ttl: Duration::from_secs(60 * 60),
            // ±10%
            price_variation_bp: 1_000,
            unavailable_probability: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affiliate_keys_expose_names_only() {
        let keys = AffiliateKeys::default()
            .with_key("SKIMLINKS_API_KEY", "secret-1")
            .with_key("AMAZON_API_KEY", "secret-2");

        assert!(keys.has_any());
        assert_eq!(keys.names(), vec!["AMAZON_API_KEY", "SKIMLINKS_API_KEY"]);
        assert_eq!(keys.get("AMAZON_API_KEY"), Some("secret-2"));
        assert_eq!(keys.get("WALMART_API_KEY"), None);
    }

    #[test]
    fn defaults() {
        let config = DiscoveryConfig::default();

        assert!(!config.affiliate_keys.has_any());
        assert_eq!(config.affiliate_tag, "wishrift-20");
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }
}
