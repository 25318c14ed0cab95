use std::sync::Arc;

use axum::extract::FromRef;
use wishrift_collab::Collab;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub collab: Arc<Collab>,
    pub identity_secret: Option<Arc<str>>,
}

impl ServerContext {
    pub fn new(collab: Collab, identity_secret: Option<String>) -> Self {
        Self {
            collab: Arc::new(collab),
            identity_secret: identity_secret.map(Arc::from),
        }
    }
}
