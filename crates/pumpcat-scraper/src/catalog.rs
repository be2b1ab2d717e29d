//! Catalog traversal: cards → detail pages → product records.
//!
//! The flow is a linear walk over the catalog page's product cards. For each
//! card the scraper extracts the card-level fragments, opens the detail page,
//! extracts media and text fragments, builds a record, and navigates back.
//! Every extraction step has an independent fallback, so a bad card degrades
//! that record instead of aborting the run; only the initial catalog
//! navigation is allowed to fail the whole run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pumpcat_core::ProductRecord;

use crate::assets::{write_png, SpriteSheetFetcher};
use crate::builder::{build, ProductFragments};
use crate::dom::{BrowserError, ElementHandle, PageDriver};
use crate::resolve::{click_element, resolve, resolve_all, resolve_each, wait_for};
use crate::{sprite, strategies};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const NAVIGATION_ATTEMPTS: u32 = 3;

/// Traversal parameters, sliced out of the application config by the caller.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub catalog_url: String,
    /// Category label recorded on every product from this traversal.
    pub category: String,
    pub subcategory: String,
    pub country: String,
    pub max_products: usize,
    pub action_delay: Duration,
    pub wait_timeout: Duration,
    /// Directory for milestone screenshots; `None` disables them.
    pub screenshot_dir: Option<PathBuf>,
    /// Directory for cropped sprite tiles; `None` disables cropping.
    pub asset_dir: Option<PathBuf>,
}

/// Card-level fragments, extracted before opening the detail page.
struct CardData {
    name: Option<String>,
    image_url: Option<String>,
    link: Option<Box<dyn ElementHandle>>,
}

/// Walks the catalog and accumulates product records in traversal order.
pub struct CatalogScraper<'a> {
    driver: &'a dyn PageDriver,
    sprites: Option<&'a SpriteSheetFetcher>,
    config: CatalogConfig,
    cancel: Arc<AtomicBool>,
}

impl<'a> CatalogScraper<'a> {
    #[must_use]
    pub fn new(
        driver: &'a dyn PageDriver,
        sprites: Option<&'a SpriteSheetFetcher>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            driver,
            sprites,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cooperative cancellation flag. Setting it stops the traversal between
    /// cards; the record being built at that moment completes or is dropped
    /// whole, never appended half-populated.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Runs the traversal.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Navigation`] only when the catalog page itself
    /// stays unreachable after all attempts. Everything below that level is a
    /// per-card soft failure.
    pub async fn run(&self) -> Result<Vec<ProductRecord>, BrowserError> {
        self.navigate_to_catalog().await?;
        self.screenshot("catalog_initial").await;

        let cards_cascade = strategies::product_cards();
        if wait_for(self.driver, &cards_cascade, self.config.wait_timeout, POLL_INTERVAL)
            .await
            .is_none()
        {
            tracing::warn!(url = self.config.catalog_url, "no product cards found");
            return Ok(Vec::new());
        }

        let total = resolve_all(self.driver, &cards_cascade).await.len();
        let limit = total.min(self.config.max_products);
        tracing::info!(total, limit, "processing product cards");

        let mut records = Vec::with_capacity(limit);
        for index in 0..limit {
            if self.cancelled() {
                tracing::info!(processed = records.len(), "traversal cancelled");
                break;
            }

            match self.scrape_card(index).await {
                Some(record) => {
                    tracing::info!(index, name = record.name, "extracted product");
                    records.push(record);
                }
                None => tracing::warn!(index, "skipping card, no usable data"),
            }

            tokio::time::sleep(self.config.action_delay).await;
        }

        tracing::info!(count = records.len(), "catalog traversal complete");
        Ok(records)
    }

    async fn navigate_to_catalog(&self) -> Result<(), BrowserError> {
        let url = &self.config.catalog_url;
        let mut last_reason = String::new();
        for attempt in 1..=NAVIGATION_ATTEMPTS {
            match self.driver.navigate(url).await {
                Ok(()) => {
                    tokio::time::sleep(self.config.action_delay).await;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(url, attempt, error = %e, "catalog navigation failed");
                    last_reason = e.to_string();
                    tokio::time::sleep(self.config.action_delay).await;
                }
            }
        }
        Err(BrowserError::Navigation {
            url: url.clone(),
            reason: format!("gave up after {NAVIGATION_ATTEMPTS} attempts: {last_reason}"),
        })
    }

    /// Scrapes one card by index. Cards are re-resolved on every access: the
    /// back-navigation invalidates handles from the previous iteration.
    async fn scrape_card(&self, index: usize) -> Option<ProductRecord> {
        let cards = resolve_all(self.driver, &strategies::product_cards()).await;
        let card = cards.get(index)?;

        let card_data = self.extract_card_data(card.as_ref(), index).await;

        let opened = match &card_data.link {
            Some(link) => click_element(link.as_ref(), "card-link").await,
            None => false,
        };

        if !opened {
            tracing::warn!(index, "could not open detail page, keeping card-level data");
            let fragments = self.card_only_fragments(&card_data, index).await;
            return Some(build(fragments));
        }

        tokio::time::sleep(self.config.action_delay).await;
        self.screenshot(&format!("product_{index}")).await;

        let fragments = self.extract_detail_fragments(&card_data, index).await;
        let record = build(fragments);

        // The record is complete at this point; losing the way back only
        // costs the remaining cards, not this one.
        if let Err(e) = self.driver.back().await {
            tracing::warn!(index, error = %e, "back navigation failed, re-opening catalog");
            if let Err(e) = self.navigate_to_catalog().await {
                tracing::warn!(index, error = %e, "could not re-open catalog");
            }
        }
        tokio::time::sleep(self.config.action_delay).await;

        Some(record)
    }

    async fn extract_card_data(&self, card: &dyn ElementHandle, index: usize) -> CardData {
        let name = match resolve(card, &strategies::card_name(), false).await {
            Some(el) => el.text().await.ok().filter(|t| !t.is_empty()),
            None => {
                tracing::warn!(index, "no product name in card");
                None
            }
        };

        let image_url = match resolve(card, &strategies::card_image(), false).await {
            Some(el) => el
                .attribute("src")
                .await
                .ok()
                .flatten()
                .map(|src| absolutize_site_url(&src)),
            None => None,
        };

        let link = resolve(card, &strategies::card_link(), true).await;

        CardData {
            name,
            image_url,
            link,
        }
    }

    /// Fragments for a card whose detail page never opened.
    async fn card_only_fragments(&self, card_data: &CardData, index: usize) -> ProductFragments {
        ProductFragments {
            index,
            category: self.config.category.clone(),
            subcategory: self.config.subcategory.clone(),
            country: self.config.country.clone(),
            source_url: self.driver.current_url().await.unwrap_or_default(),
            name: card_data.name.clone(),
            card_image_url: card_data.image_url.clone(),
            specifications: self.specifications(card_data.name.as_deref()),
            ..ProductFragments::default()
        }
    }

    async fn extract_detail_fragments(
        &self,
        card_data: &CardData,
        index: usize,
    ) -> ProductFragments {
        let product_images = self.extract_images(card_data.name.as_deref(), index).await;
        let short_description = self.extract_short_description().await;
        let advantages = self.extract_advantages().await;
        let long_description = self.extract_long_description().await;

        ProductFragments {
            index,
            category: self.config.category.clone(),
            subcategory: self.config.subcategory.clone(),
            country: self.config.country.clone(),
            source_url: self.driver.current_url().await.unwrap_or_default(),
            name: card_data.name.clone(),
            short_description,
            advantages,
            long_description,
            specifications: self.specifications(card_data.name.as_deref()),
            card_image_url: card_data.image_url.clone(),
            product_images,
        }
    }

    /// Collects image URLs from every media strategy, plus the sprite path:
    /// a tile div whose style decodes to a sprite descriptor contributes its
    /// sheet URL, and (when an asset dir and fetcher are configured) a
    /// cropped PNG on disk. Crop failures only cost the cropped asset.
    async fn extract_images(&self, name: Option<&str>, index: usize) -> Vec<String> {
        let mut urls = Vec::new();

        for element in resolve_each(self.driver, &strategies::product_images()).await {
            if let Ok(Some(src)) = element.attribute("src").await {
                let src = absolutize_site_url(&src);
                if !src.is_empty() {
                    urls.push(src);
                }
            }
        }

        if let Some(tile) = resolve(self.driver, &strategies::sprite_tile(), false).await {
            if let Ok(Some(style)) = tile.attribute("style").await {
                if let Some(descriptor) = sprite::decode(&style) {
                    urls.push(descriptor.sheet_url.clone());
                    self.crop_sprite(&descriptor, name, index).await;
                }
            }
        }

        urls
    }

    async fn crop_sprite(
        &self,
        descriptor: &sprite::SpriteDescriptor,
        name: Option<&str>,
        index: usize,
    ) {
        let (Some(fetcher), Some(dir)) = (self.sprites, self.config.asset_dir.as_ref()) else {
            return;
        };
        match fetcher.get_sub_image(descriptor).await {
            Ok(tile) => {
                let stem = name.map_or_else(|| format!("product_{}", index + 1), safe_file_stem);
                let path = dir.join(format!("{stem}.png"));
                match write_png(&tile, &path) {
                    Ok(()) => tracing::debug!(path = %path.display(), "saved cropped sprite tile"),
                    Err(e) => tracing::warn!(error = %e, "could not save cropped sprite tile"),
                }
            }
            Err(e) => {
                // Keep the sheet URL in the record; only the cropped asset is lost.
                tracing::warn!(
                    sheet_url = descriptor.sheet_url,
                    error = %e,
                    "sprite crop failed"
                );
            }
        }
    }

    async fn extract_short_description(&self) -> Option<String> {
        let elements = resolve_all(self.driver, &strategies::short_description()).await;
        let mut paragraphs = Vec::new();
        for element in &elements {
            if let Ok(text) = element.text().await {
                if text.chars().count() > 20 {
                    paragraphs.push(text);
                }
            }
        }
        if paragraphs.is_empty() {
            None
        } else {
            Some(paragraphs.join(" "))
        }
    }

    async fn extract_advantages(&self) -> Vec<String> {
        let elements = resolve_all(self.driver, &strategies::advantages()).await;
        let mut items = Vec::new();
        for element in &elements {
            if let Ok(text) = element.text().await {
                if !text.is_empty() {
                    items.push(text);
                }
            }
        }
        items
    }

    async fn extract_long_description(&self) -> Option<String> {
        let elements = resolve_each(self.driver, &strategies::long_description()).await;
        let mut sections: Vec<String> = Vec::new();
        for element in &elements {
            if let Ok(text) = element.text().await {
                let normalized = normalize_whitespace(&text);
                if normalized.chars().count() > 50 && !sections.contains(&normalized) {
                    sections.push(normalized);
                }
            }
        }
        if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n\n"))
        }
    }

    fn specifications(&self, name: Option<&str>) -> BTreeMap<String, String> {
        let mut specs = BTreeMap::new();
        specs.insert("brand".to_owned(), "Wilo".to_owned());
        if let Some(name) = name {
            specs.insert("series".to_owned(), name.to_owned());
        }
        specs.insert("application".to_owned(), self.config.category.clone());
        specs.insert("type".to_owned(), self.config.subcategory.clone());
        specs
    }

    async fn screenshot(&self, label: &str) {
        let Some(dir) = self.config.screenshot_dir.as_ref() else {
            return;
        };
        let path = dir.join(format!("{label}.png"));
        if let Err(e) = self.driver.screenshot(&path).await {
            tracing::debug!(label, error = %e, "screenshot failed");
        }
    }
}

/// Converts protocol-relative and rooted image paths to absolute site URLs.
fn absolutize_site_url(src: &str) -> String {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else if src.starts_with('/') {
        format!("https://wilo.com{src}")
    } else {
        src.to_owned()
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives a filesystem-safe stem from a product name.
fn safe_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
