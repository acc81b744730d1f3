//! Kiosk configuration resolved from the environment.
//!
//! Values come from `.env.local` / `.env` (loaded in `run()`) or the real
//! environment. The booth service defaults to localhost so the kiosk works
//! on the booth machine with zero configuration; the photo store has no
//! sensible default and must be set for the gallery to go live.

#[derive(Debug, Clone)]
pub struct BoothConfig {
    /// Base URL of the remote photo store (REST + change feed).
    pub store_url: String,
    /// Key sent as `apikey` and bearer token on every store request.
    pub store_key: String,
    /// Base URL of the capture service (camera, filters, printer).
    pub booth_url: String,
}

impl BoothConfig {
    pub fn from_env() -> Self {
        Self {
            store_url: env_or("MAGIC_STORE_URL", ""),
            store_key: env_or("MAGIC_STORE_KEY", ""),
            booth_url: env_or("MAGIC_BOOTH_URL", "http://127.0.0.1:5000"),
        }
    }

    /// Whether the photo store is reachable in principle. Without it the
    /// gallery starts empty and never updates.
    pub fn store_configured(&self) -> bool {
        !self.store_url.is_empty() && !self.store_key.is_empty()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
