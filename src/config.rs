use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Well-known first-admin credentials created by `/auth/setup` on an empty
/// deployment. Rotate immediately after first login.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    pub bootstrap: BootstrapConfig,
    pub require_coach_verification: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = StoreConfig {
            base_url: std::env::var("STORE_URL").context("STORE_URL must be set")?,
            api_key: std::env::var("STORE_API_KEY").context("STORE_API_KEY must be set")?,
            timeout_secs: std::env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let jwt = JwtConfig {
            secret,
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };

        let bootstrap = BootstrapConfig {
            admin_email: std::env::var("BOOTSTRAP_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@hoopwithher.com".into()),
            admin_password: std::env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "AdminPass123!".into()),
        };

        let require_coach_verification = std::env::var("REQUIRE_COACH_VERIFICATION")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Ok(Self {
            store,
            jwt,
            bootstrap,
            require_coach_verification,
        })
    }
}
