use lazy_static::lazy_static;
use rand::{Rng, RngCore};
use regex::Regex;
use url::Url;

use crate::Cents;

use super::{normalize_query, DiscoveredListing, DiscoveryConfig, DiscoveryError, ListingSource};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug)]
pub struct Store {
    pub name: &'static str,
    pub domain: &'static str,
}

/// Every store the catalog produces listings for
pub const STORES: [Store; 10] = [
    Store { name: "Amazon", domain: "amazon.com" },
    Store { name: "Best Buy", domain: "bestbuy.com" },
    Store { name: "Walmart", domain: "walmart.com" },
    Store { name: "Target", domain: "target.com" },
    Store { name: "GameStop", domain: "gamestop.com" },
    Store { name: "Newegg", domain: "newegg.com" },
    Store { name: "B&H Photo", domain: "bhphotovideo.com" },
    Store { name: "Apple Store", domain: "apple.com" },
    Store { name: "Microsoft Store", domain: "microsoft.com" },
    Store { name: "eBay", domain: "ebay.com" },
];

struct Product {
    keywords: &'static [&'static str],
    title: &'static str,
    category: &'static str,
    base_price: Cents,
    image_url: &'static str,
}

/// Checked in order, the first product with a matching keyword wins
const PRODUCTS: [Product; 7] = [
    Product {
        keywords: &["xbox series x"],
        title: "Xbox Series X Console",
        category: "Gaming Consoles",
        base_price: Cents::new(49999),
        image_url: XBOX_IMAGE_URL,
    },
    Product {
        keywords: &["xbox series s"],
        title: "Xbox Series S Console",
        category: "Gaming Consoles",
        base_price: Cents::new(29999),
        image_url: XBOX_IMAGE_URL,
    },
    Product {
        keywords: &["playstation 5", "ps5"],
        title: "PlayStation 5 Console",
        category: "Gaming Consoles",
        base_price: Cents::new(49999),
        image_url: "https://images.unsplash.com/photo-1607853202273-797f1c22a38e?w=800&auto=format&fit=crop&q=60",
    },
    Product {
        keywords: &["nintendo switch"],
        title: "Nintendo Switch",
        category: "Gaming Consoles",
        base_price: Cents::new(29999),
        image_url: "https://images.unsplash.com/photo-1578303512597-81e6cc155b3e?w=800&auto=format&fit=crop&q=60",
    },
    Product {
        keywords: &["ipad"],
        title: "Apple iPad",
        category: "Tablets",
        base_price: Cents::new(32999),
        image_url: "https://images.unsplash.com/photo-1544244015-0df4b3ffc6b0?w=800&auto=format&fit=crop&q=60",
    },
    Product {
        keywords: &["macbook"],
        title: "Apple MacBook Air",
        category: "Laptops",
        base_price: Cents::new(99999),
        image_url: "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=800&auto=format&fit=crop&q=60",
    },
    Product {
        keywords: &["airpods"],
        title: "Apple AirPods",
        category: "Headphones",
        base_price: Cents::new(12999),
        image_url: "https://images.unsplash.com/photo-1606741965574-a493eb7a7831?w=800&auto=format&fit=crop&q=60",
    },
];

const XBOX_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1621259182288-4443f2367f00?w=800&auto=format&fit=crop&q=60";

const GENERIC_CATEGORY: &str = "Electronics";
const GENERIC_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1550009158-9ebf69173e03?w=800&auto=format&fit=crop&q=60";
const GENERIC_PRICE_RANGE: std::ops::RangeInclusive<u64> = 5_000..=25_000;

/// Generates plausible listings across [STORES] without talking to any marketplace
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    affiliate_tag: String,
    price_variation_bp: i64,
    unavailable_probability: f64,
}

impl DemoCatalog {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            affiliate_tag: config.affiliate_tag.clone(),
            price_variation_bp: config.price_variation_bp.abs(),
            unavailable_probability: config.unavailable_probability.clamp(0.0, 1.0),
        }
    }

    /// Returns the category a query would be listed under
    pub fn category_for(query: &str) -> &'static str {
        product_for(&normalize_query(query))
            .map(|p| p.category)
            .unwrap_or(GENERIC_CATEGORY)
    }

    fn product_url(
        &self,
        store: &Store,
        slug: &str,
        rng: &mut dyn RngCore,
    ) -> Result<String, DiscoveryError> {
        let mut url = Url::parse(&format!("https://www.{}/dp/", store.domain))?;

        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Source(format!("{} has no path", store.domain)))?
            .pop_if_empty()
            .push(&format!("{}-{}", slug, rng.gen_range(0..1000)));

        url.query_pairs_mut()
            .append_pair("tag", &self.affiliate_tag);

        Ok(url.into())
    }
}

impl ListingSource for DemoCatalog {
    fn search(
        &self,
        query: &str,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<DiscoveredListing>, DiscoveryError> {
        let normalized = normalize_query(query);
        let slug = WHITESPACE.replace_all(&normalized, "-").to_string();

        let (name, base_price, image_url) = match product_for(&normalized) {
            Some(product) => (product.title.to_string(), product.base_price, product.image_url),
            None => (
                query.trim().to_string(),
                Cents::new(rng.gen_range(GENERIC_PRICE_RANGE)),
                GENERIC_IMAGE_URL,
            ),
        };

        STORES
            .iter()
            .map(|store| {
                let variation = rng.gen_range(-self.price_variation_bp..=self.price_variation_bp);
                let is_available = !rng.gen_bool(self.unavailable_probability);

                Ok::<_, DiscoveryError>(DiscoveredListing {
                    name: name.clone(),
                    price: base_price.vary_by(variation),
                    image_url: Some(image_url.to_string()),
                    product_url: self.product_url(store, &slug, rng)?,
                    store: store.name.to_string(),
                    is_available,
                })
            })
            .collect()
    }
}

fn product_for(normalized: &str) -> Option<&'static Product> {
    PRODUCTS
        .iter()
        .find(|p| p.keywords.iter().any(|k| normalized.contains(k)))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn catalog() -> DemoCatalog {
        DemoCatalog::new(&DiscoveryConfig::default())
    }

    #[test]
    fn known_products_use_their_template() {
        let mut rng = StdRng::seed_from_u64(7);
        let listings = catalog().search("  PlayStation 5 ", &mut rng).unwrap();

        assert_eq!(listings.len(), STORES.len());

        for listing in &listings {
            assert_eq!(listing.name, "PlayStation 5 Console");
            assert!(listing.price >= Cents::new(44999) && listing.price <= Cents::new(54999));
        }
    }

    #[test]
    fn unknown_products_keep_the_query_as_name() {
        let mut rng = StdRng::seed_from_u64(7);
        let listings = catalog().search(" Garden Hose ", &mut rng).unwrap();

        for listing in &listings {
            assert_eq!(listing.name, "Garden Hose");
            assert!(listing.price >= Cents::new(4500) && listing.price <= Cents::new(27500));
        }
    }

    #[test]
    fn product_urls_carry_the_affiliate_tag() {
        let mut rng = StdRng::seed_from_u64(1);
        let listings = catalog().search("nintendo switch oled", &mut rng).unwrap();

        for listing in &listings {
            let url = Url::parse(&listing.product_url).unwrap();
            let store = STORES.iter().find(|s| s.name == listing.store).unwrap();

            assert_eq!(url.host_str(), Some(format!("www.{}", store.domain).as_str()));
            assert!(url.path().starts_with("/dp/nintendo-switch-oled-"));
            assert_eq!(url.query(), Some("tag=wishrift-20"));
        }
    }

    #[test]
    fn availability_follows_configured_probability() {
        let mut config = DiscoveryConfig::default();
        config.unavailable_probability = 1.0;

        let mut rng = StdRng::seed_from_u64(3);
        let listings = DemoCatalog::new(&config).search("ipad", &mut rng).unwrap();

        assert!(listings.iter().all(|l| !l.is_available));
    }

    #[test]
    fn categories() {
        assert_eq!(DemoCatalog::category_for("MacBook Pro"), "Laptops");
        assert_eq!(DemoCatalog::category_for("AirPods Pro"), "Headphones");
        assert_eq!(DemoCatalog::category_for("ps5 slim"), "Gaming Consoles");
        assert_eq!(DemoCatalog::category_for("toaster"), "Electronics");
    }

    #[test]
    fn consoles_need_their_full_name() {
        let mut rng = StdRng::seed_from_u64(11);

        let series_s = catalog().search("Xbox Series S", &mut rng).unwrap();
        assert!(series_s.iter().all(|l| l.name == "Xbox Series S Console"));
        assert!(series_s
            .iter()
            .all(|l| l.price >= Cents::new(26999) && l.price <= Cents::new(32999)));

        let network = catalog().search("network switch", &mut rng).unwrap();
        assert!(network.iter().all(|l| l.name == "network switch"));
        assert_eq!(DemoCatalog::category_for("network switch"), "Electronics");
    }
}
