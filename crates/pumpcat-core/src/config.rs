use crate::app_config::AppConfig;
use crate::ConfigError;

/// Default User-Agent for sprite-sheet fetches. The selection site serves
/// error pages to obviously non-browser agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const DEFAULT_CATALOG_URL: &str =
    "https://wilo.com/de/de/Katalog/de/anwendung/industrie/heizung/heizung";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a recognized env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a recognized env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected a boolean, got \"{other}\""),
            }),
        }
    };

    let shopify_shop_url = lookup("SHOPIFY_SHOP_URL").ok().filter(|s| !s.is_empty());
    let shopify_access_token = lookup("SHOPIFY_ACCESS_TOKEN")
        .ok()
        .filter(|s| !s.is_empty());
    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2024-01");

    let log_level = or_default("PUMPCAT_LOG_LEVEL", "info");
    let country = or_default("PUMPCAT_COUNTRY", "germany");
    let catalog_url = or_default("PUMPCAT_CATALOG_URL", DEFAULT_CATALOG_URL);

    let headless = parse_bool("PUMPCAT_HEADLESS", "true")?;
    let action_delay_ms = parse_u64("PUMPCAT_ACTION_DELAY_MS", "2000")?;
    let max_products_per_category = parse_usize("PUMPCAT_MAX_PRODUCTS_PER_CATEGORY", "100")?;
    let browser_timeout_secs = parse_u64("PUMPCAT_BROWSER_TIMEOUT_SECS", "20")?;
    let http_timeout_secs = parse_u64("PUMPCAT_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PUMPCAT_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("PUMPCAT_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("PUMPCAT_RETRY_BACKOFF_BASE_SECS", "5")?;
    let upload_delay_ms = parse_u64("PUMPCAT_UPLOAD_DELAY_MS", "500")?;
    let screenshot_dir = PathBuf::from(or_default("PUMPCAT_SCREENSHOT_DIR", "./screenshots"));

    Ok(AppConfig {
        shopify_shop_url,
        shopify_access_token,
        shopify_api_version,
        log_level,
        country,
        catalog_url,
        headless,
        action_delay_ms,
        max_products_per_category,
        browser_timeout_secs,
        http_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        upload_delay_ms,
        screenshot_dir,
    })
}
