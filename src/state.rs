use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{RestStore, TableStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn TableStore>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(RestStore::new(&config.store)?) as Arc<dyn TableStore>;
        Ok(Self { config, store })
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by an in-memory store; the second return value keeps a
    /// handle on the store for seeding and inspection.
    pub fn fake() -> (Self, Arc<crate::store::MemStore>) {
        use crate::config::{BootstrapConfig, JwtConfig, StoreConfig};

        let mem = Arc::new(crate::store::MemStore::default());
        let config = Arc::new(AppConfig {
            store: StoreConfig {
                base_url: "http://store.local".into(),
                api_key: "test-key".into(),
                timeout_secs: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_hours: 24,
            },
            bootstrap: BootstrapConfig {
                admin_email: "admin@hoopwithher.com".into(),
                admin_password: "AdminPass123!".into(),
            },
            require_coach_verification: true,
        });
        let state = Self {
            config,
            store: mem.clone(),
        };
        (state, mem)
    }
}
