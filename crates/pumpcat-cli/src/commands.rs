//! Subcommand implementations: wiring between config, browser, scraper,
//! transformer, and exports.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Context;
use pumpcat_core::{country_by_key, AppConfig, Country, ProductRecord};
use pumpcat_scraper::resolve::resolve_with_retry;
use pumpcat_scraper::{
    export, extract_grid_products, strategies, CatalogConfig, CatalogScraper, ChromeDriver,
    GridContext, PageDriver, SelectionNavigator, SpriteSheetFetcher,
};
use pumpcat_shopify::{transform, ShopifyClient};

/// Entry page of the selection tool.
const SELECT_TOOL_URL: &str = "https://select.wilo.com/";

/// Category labels recorded for catalog-page traversals.
const CATALOG_CATEGORY: &str = "Industrial Heating";
const CATALOG_SUBCATEGORY: &str = "Heating Pumps";

pub async fn scrape(
    config: &AppConfig,
    url: Option<String>,
    max_products: Option<usize>,
    output: &Path,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    let country = resolve_country(config, None)?;
    let catalog_url = url.unwrap_or_else(|| config.catalog_url.clone());

    std::fs::create_dir_all(&config.screenshot_dir)
        .with_context(|| format!("creating {}", config.screenshot_dir.display()))?;
    let asset_dir = config.screenshot_dir.join("tiles");
    std::fs::create_dir_all(&asset_dir)?;

    let fetcher = SpriteSheetFetcher::new(config.http_timeout_secs, &config.user_agent)?;
    let driver = ChromeDriver::launch(config.headless).await?;

    let catalog_config = CatalogConfig {
        catalog_url,
        category: CATALOG_CATEGORY.to_owned(),
        subcategory: CATALOG_SUBCATEGORY.to_owned(),
        country: country.display_name.to_owned(),
        max_products: max_products.unwrap_or(config.max_products_per_category),
        action_delay: Duration::from_millis(config.action_delay_ms),
        wait_timeout: Duration::from_secs(config.browser_timeout_secs),
        screenshot_dir: Some(config.screenshot_dir.clone()),
        asset_dir: Some(asset_dir),
    };

    let scraper = CatalogScraper::new(&driver, Some(&fetcher), catalog_config);
    spawn_cancel_handler(&scraper);
    let records = scraper.run().await?;
    drop(scraper);
    driver.close().await?;

    write_outputs(&records, output, csv)?;
    println!("Scraped {} products.", records.len());
    Ok(())
}

pub async fn select(
    config: &AppConfig,
    country: Option<String>,
    max_products: Option<usize>,
    output: &Path,
) -> anyhow::Result<()> {
    let country = resolve_country(config, country.as_deref())?;
    let fetcher = SpriteSheetFetcher::new(config.http_timeout_secs, &config.user_agent)?;
    let driver = ChromeDriver::launch(config.headless).await?;

    let result = run_selection_flow(config, country, max_products, &driver, &fetcher).await;
    driver.close().await?;
    let records = result?;

    write_outputs(&records, output, None)?;
    println!(
        "Extracted {} products from the selection grid.",
        records.len()
    );
    Ok(())
}

async fn run_selection_flow(
    config: &AppConfig,
    country: &'static Country,
    max_products: Option<usize>,
    driver: &ChromeDriver,
    fetcher: &SpriteSheetFetcher,
) -> anyhow::Result<Vec<ProductRecord>> {
    driver
        .navigate(SELECT_TOOL_URL)
        .await
        .context("selection tool unreachable")?;

    let action_delay = Duration::from_millis(config.action_delay_ms);
    let wait_timeout = Duration::from_secs(config.browser_timeout_secs);
    let navigator = SelectionNavigator::new(driver, action_delay, wait_timeout);

    if !navigator.select_country(country).await {
        anyhow::bail!("could not select country \"{}\"", country.key);
    }
    if !navigator.open_pump_selection(country).await {
        anyhow::bail!("could not open pump selection for \"{}\"", country.key);
    }

    // The grid renders asynchronously after the tile click; retry the row
    // lookup a few times before concluding the view is empty.
    if resolve_with_retry(
        driver,
        &strategies::grid_rows(),
        false,
        config.max_retries.max(1),
        action_delay,
    )
    .await
    .is_none()
    {
        tracing::warn!("no grid rows appeared after pump selection");
    }

    let categories = navigator.list_categories().await;
    let category_label = categories
        .first()
        .cloned()
        .unwrap_or_else(|| "Hydraulic pump selection".to_owned());

    let context = GridContext {
        category: category_label,
        subcategory: "Pumps".to_owned(),
        country: country.display_name.to_owned(),
        max_products: max_products.unwrap_or(config.max_products_per_category),
    };
    let cancel = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    spawn_grid_cancel_handler(&cancel);

    Ok(extract_grid_products(driver, Some(fetcher), &context, &cancel).await)
}

pub async fn upload(
    config: &AppConfig,
    input: &Path,
    delay_ms: Option<u64>,
) -> anyhow::Result<()> {
    let records = read_records(input)?;
    let client = shopify_client(config)?;
    client
        .test_connection()
        .await
        .context("Shopify connection check failed")?;

    let payloads: Vec<_> = records.iter().map(transform).collect();
    let report = client
        .bulk_upload(&payloads, delay_ms.unwrap_or(config.upload_delay_ms))
        .await;

    println!(
        "Upload complete: {} created, {} skipped (already exist), {} failed, {} total.",
        report.created.len(),
        report.skipped.len(),
        report.failed.len(),
        report.total
    );
    for (title, error) in &report.failed {
        println!("  failed: {title}: {error}");
    }

    if report.created.is_empty() && !report.failed.is_empty() {
        anyhow::bail!("every product upload failed");
    }
    Ok(())
}

pub fn export(input: &Path, output: &Path) -> anyhow::Result<()> {
    let records = read_records(input)?;
    export::write_csv(output, &records)?;
    println!("Wrote {} records to {}.", records.len(), output.display());
    Ok(())
}

pub async fn check(config: &AppConfig) -> anyhow::Result<()> {
    let client = shopify_client(config)?;
    let shop = client.test_connection().await?;
    println!(
        "Connected to \"{}\" (id {}, domain {}).",
        shop.name,
        shop.id,
        shop.domain.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

fn resolve_country(config: &AppConfig, key: Option<&str>) -> anyhow::Result<&'static Country> {
    let key = key.unwrap_or(&config.country);
    country_by_key(key)
        .ok_or_else(|| anyhow::anyhow!("unknown country \"{key}\" (see PUMPCAT_COUNTRY)"))
}

fn shopify_client(config: &AppConfig) -> anyhow::Result<ShopifyClient> {
    let shop_url = config
        .shopify_shop_url
        .as_deref()
        .context("SHOPIFY_SHOP_URL is not set")?;
    let token = config
        .shopify_access_token
        .as_deref()
        .context("SHOPIFY_ACCESS_TOKEN is not set")?;
    Ok(ShopifyClient::new(
        shop_url,
        token,
        &config.shopify_api_version,
        config.http_timeout_secs,
        config.max_retries,
        config.retry_backoff_base_secs,
    )?)
}

fn read_records(input: &Path) -> anyhow::Result<Vec<ProductRecord>> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let records: Vec<ProductRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", input.display()))?;
    anyhow::ensure!(!records.is_empty(), "{} contains no records", input.display());
    Ok(records)
}

fn write_outputs(
    records: &[ProductRecord],
    output: &Path,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    export::write_json(output, records)?;
    if let Some(csv_path) = csv {
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        export::write_csv(csv_path, records)?;
    }
    Ok(())
}

/// Ctrl-C flips the traversal's cancel flag; a second Ctrl-C kills the process.
fn spawn_cancel_handler(scraper: &CatalogScraper<'_>) {
    let cancel = scraper.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current product then stopping");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}

fn spawn_grid_cancel_handler(cancel: &std::sync::Arc<std::sync::atomic::AtomicBool>) {
    let cancel = std::sync::Arc::clone(cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current row then stopping");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}
