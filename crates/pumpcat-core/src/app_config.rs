use std::path::PathBuf;

/// Flat application configuration, built once at startup and passed to
/// components by the caller (no global settings object).
#[derive(Clone)]
pub struct AppConfig {
    /// Shopify store, e.g. `"my-shop"` or `"https://my-shop.myshopify.com"`.
    /// Optional: only required for the upload path.
    pub shopify_shop_url: Option<String>,
    /// Shopify Admin API access token. Optional: only required for uploads.
    pub shopify_access_token: Option<String>,
    /// Admin API version segment, e.g. `"2024-01"`.
    pub shopify_api_version: String,
    pub log_level: String,
    /// Country key into [`crate::countries::COUNTRIES`].
    pub country: String,
    /// Entry URL of the catalog to traverse.
    pub catalog_url: String,
    pub headless: bool,
    /// Delay between browser actions, in milliseconds.
    pub action_delay_ms: u64,
    pub max_products_per_category: usize,
    /// Deadline for poll-with-timeout element waits, in seconds.
    pub browser_timeout_secs: u64,
    /// Timeout for outbound HTTP requests (sprite sheets, Shopify), in seconds.
    pub http_timeout_secs: u64,
    /// User-Agent for sprite-sheet fetches; the site rejects bot-like agents.
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Delay between consecutive product uploads, in milliseconds.
    pub upload_delay_ms: u64,
    pub screenshot_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("shopify_shop_url", &self.shopify_shop_url)
            .field(
                "shopify_access_token",
                &self.shopify_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("shopify_api_version", &self.shopify_api_version)
            .field("log_level", &self.log_level)
            .field("country", &self.country)
            .field("catalog_url", &self.catalog_url)
            .field("headless", &self.headless)
            .field("action_delay_ms", &self.action_delay_ms)
            .field(
                "max_products_per_category",
                &self.max_products_per_category,
            )
            .field("browser_timeout_secs", &self.browser_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("upload_delay_ms", &self.upload_delay_ms)
            .field("screenshot_dir", &self.screenshot_dir)
            .finish()
    }
}
