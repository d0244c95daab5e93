use chrono::Duration;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 10 * 60;

/// Upper bound for link and session lifetimes.
pub const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct MagicLinkConfig {
    app_base_url: String,
    token_ttl_seconds: i64,
    session_ttl_seconds: i64,
    sweep_interval_seconds: u64,
}

impl MagicLinkConfig {
    #[must_use]
    pub fn new(app_base_url: String) -> Self {
        Self {
            app_base_url,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    #[must_use]
    pub fn app_base_url(&self) -> &str {
        &self.app_base_url
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_seconds.clamp(1, MAX_TTL_SECONDS))
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds())
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds.clamp(1, MAX_TTL_SECONDS)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds.max(1))
    }

    /// Only mark cookies secure when the app is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.app_base_url.starts_with("https://")
    }
}
