use std::sync::Arc;

use super::auth::SessionResolver;
use crate::feed::Fetcher;
use crate::storage::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub fetcher: Arc<Fetcher>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(db: Database, fetcher: Fetcher, sessions: Arc<dyn SessionResolver>) -> Self {
        Self {
            db,
            fetcher: Arc::new(fetcher),
            sessions,
        }
    }
}
