use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    ArcedDatabase, Cents, Collab, DemoCatalog, Discovery, DiscoveryConfig, ExternalIdentity,
    ItemFields, MemoryDatabase,
};

pub fn identity(id: &str) -> ExternalIdentity {
    ExternalIdentity {
        id: id.to_string(),
        username: format!("{}-name", id),
        email: None,
        first_name: None,
        last_name: None,
        bio: None,
        profile_image_url: None,
    }
}

pub fn memory_db() -> ArcedDatabase {
    Arc::new(MemoryDatabase::new())
}

/// A collab system on an empty in-memory database with seeded discovery
pub fn collab() -> Collab {
    let config = DiscoveryConfig::default();
    let source = DemoCatalog::new(&config);
    let discovery = Discovery::with_parts(
        config,
        Box::new(source),
        Box::new(StdRng::seed_from_u64(17)),
    );

    Collab::new(memory_db(), discovery)
}

pub fn item_fields(name: &str, price: u64) -> ItemFields {
    ItemFields {
        name: name.to_string(),
        description: None,
        current_price: Cents::new(price),
        original_price: None,
        image_url: None,
        product_url: "https://www.example.com/dp/item".to_string(),
        store: "Amazon".to_string(),
        category: "Gaming Consoles".to_string(),
        is_favorite: false,
    }
}
