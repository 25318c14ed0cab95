mod catalog;
mod config;

use std::time::Instant;

use dashmap::DashMap;
use log::{info, warn};
use parking_lot::Mutex;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use thiserror::Error;

pub use catalog::*;
pub use config::*;

use crate::Cents;

/// A candidate offer for a product, as returned by a [ListingSource]
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredListing {
    pub name: String,
    pub price: Cents,
    pub image_url: Option<String>,
    pub product_url: String,
    pub store: String,
    pub is_available: bool,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid product url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The source could not produce listings
    #[error("Listing source failed: {0}")]
    Source(String),
}

/// Something that can find offers for a free-text product query
pub trait ListingSource: Send + Sync {
    fn search(
        &self,
        query: &str,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<DiscoveredListing>, DiscoveryError>;
}

struct CachedSearch {
    listings: Vec<DiscoveredListing>,
    cached_at: Instant,
}

/// Best-effort product search with a per-query result cache.
///
/// Cached results are returned unchanged until they are older than the configured TTL,
/// at which point the next lookup regenerates and overwrites them.
pub struct Discovery {
    config: DiscoveryConfig,
    source: Box<dyn ListingSource>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    cache: DashMap<String, CachedSearch>,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        let source = DemoCatalog::new(&config);

        Self::with_parts(config, Box::new(source), Box::new(StdRng::from_entropy()))
    }

    /// Creates a discovery with a custom source and randomness
    pub fn with_parts(
        config: DiscoveryConfig,
        source: Box<dyn ListingSource>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        if config.affiliate_keys.has_any() {
            info!(
                "Affiliate networks configured: {}",
                config.affiliate_keys.names().join(", ")
            );
        }

        Self {
            config,
            source,
            rng: Mutex::new(rng),
            cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Returns listings for the query, cheapest first.
    /// Failures of the source degrade to an empty result and are not cached.
    pub fn search(&self, query: &str) -> Vec<DiscoveredListing> {
        let key = normalize_query(query);

        if let Some(cached) = self.cache.get(&key) {
            if cached.cached_at.elapsed() < self.config.cache_ttl {
                info!("Serving cached results for \"{}\"", key);
                return cached.listings.clone();
            }
        }

        let result = {
            let mut rng = self.rng.lock();
            self.source.search(query, &mut **rng)
        };

        let mut listings = match result {
            Ok(listings) => listings,
            Err(e) => {
                warn!("Search for \"{}\" failed: {}", key, e);
                return vec![];
            }
        };

        listings.sort_by_key(|l| l.price);
        info!("Generated {} listings for \"{}\"", listings.len(), key);

        self.cache.insert(
            key,
            CachedSearch {
                listings: listings.clone(),
                cached_at: Instant::now(),
            },
        );

        listings
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Lower-cases and trims a query, so equivalent queries share a cache entry
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        sync::Arc,
        time::Duration,
    };

    use super::*;

    fn seeded(config: DiscoveryConfig, seed: u64) -> Discovery {
        let source = DemoCatalog::new(&config);
        Discovery::with_parts(
            config,
            Box::new(source),
            Box::new(StdRng::seed_from_u64(seed)),
        )
    }

    struct FailingSource;

    impl ListingSource for FailingSource {
        fn search(
            &self,
            _query: &str,
            _rng: &mut dyn RngCore,
        ) -> Result<Vec<DiscoveredListing>, DiscoveryError> {
            Err(DiscoveryError::Source("marketplace unreachable".to_string()))
        }
    }

    struct CountingSource(Arc<AtomicUsize>);

    impl ListingSource for CountingSource {
        fn search(
            &self,
            _query: &str,
            _rng: &mut dyn RngCore,
        ) -> Result<Vec<DiscoveredListing>, DiscoveryError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[test]
    fn results_are_sorted_by_price() {
        let discovery = seeded(DiscoveryConfig::default(), 42);

        for query in ["PlayStation 5", "macbook", "garden hose", "airpods"] {
            let listings = discovery.search(query);

            assert_eq!(listings.len(), STORES.len());
            assert!(listings.windows(2).all(|w| w[0].price <= w[1].price));
        }
    }

    #[test]
    fn every_store_comes_from_the_roster() {
        let discovery = seeded(DiscoveryConfig::default(), 9);
        let listings = discovery.search("xbox");

        for store in STORES.iter() {
            assert_eq!(listings.iter().filter(|l| l.store == store.name).count(), 1);
        }
    }

    #[test]
    fn playstation_query_matches_the_template() {
        let discovery = seeded(DiscoveryConfig::default(), 5);
        let listings = discovery.search("PlayStation 5");

        assert!(listings.iter().all(|l| l.name == "PlayStation 5 Console"));
    }

    #[test]
    fn cache_hits_return_identical_results() {
        let discovery = seeded(DiscoveryConfig::default(), 11);

        let first = discovery.search("Nintendo Switch");
        let second = discovery.search("  nintendo switch ");

        assert_eq!(first, second);
    }

    #[test]
    fn expired_entries_are_regenerated() {
        let calls = Arc::new(AtomicUsize::new(0));

        let mut config = DiscoveryConfig::default();
        config.cache_ttl = Duration::ZERO;

        let discovery = Discovery::with_parts(
            config,
            Box::new(CountingSource(calls.clone())),
            Box::new(StdRng::seed_from_u64(0)),
        );

        discovery.search("ipad");
        discovery.search("ipad");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clearing_the_cache_forces_a_new_search() {
        let calls = Arc::new(AtomicUsize::new(0));
        let discovery = Discovery::with_parts(
            DiscoveryConfig::default(),
            Box::new(CountingSource(calls.clone())),
            Box::new(StdRng::seed_from_u64(0)),
        );

        discovery.search("ipad");
        discovery.search("ipad");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        discovery.clear_cache();
        discovery.search("ipad");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failing_source_degrades_to_empty() {
        let discovery = Discovery::with_parts(
            DiscoveryConfig::default(),
            Box::new(FailingSource),
            Box::new(StdRng::seed_from_u64(0)),
        );

        assert!(discovery.search("anything").is_empty());
    }

    #[test]
    fn seeded_randomness_is_reproducible() {
        let a = seeded(DiscoveryConfig::default(), 1234).search("garden hose");
        let b = seeded(DiscoveryConfig::default(), 1234).search("garden hose");

        assert_eq!(a, b);
    }
}
