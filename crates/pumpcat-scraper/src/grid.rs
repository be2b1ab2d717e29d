//! Product extraction from the selection tool's result grid.
//!
//! The grid renders one product per row: a bold name span and a 64×64 tile
//! addressed into a shared sprite sheet via an inline style. Rows without a
//! usable name are skipped; rows without a decodable sprite still produce a
//! record (image-less, or with the plain `<img src>` fallback).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pumpcat_core::ProductRecord;

use crate::assets::SpriteSheetFetcher;
use crate::builder::{build, ProductFragments};
use crate::dom::{ElementHandle, PageDriver};
use crate::resolve::{resolve, resolve_all};
use crate::{sprite, strategies};

/// Context for one grid extraction pass (one category/subcategory view).
#[derive(Debug, Clone)]
pub struct GridContext {
    pub category: String,
    pub subcategory: String,
    pub country: String,
    pub max_products: usize,
}

/// Extracts all products visible in the current grid view.
///
/// Browser failures on individual rows are soft: the row is skipped and the
/// pass continues. The cancel flag is checked between rows.
pub async fn extract_grid_products(
    driver: &dyn PageDriver,
    sprites: Option<&SpriteSheetFetcher>,
    context: &GridContext,
    cancel: &Arc<AtomicBool>,
) -> Vec<ProductRecord> {
    let rows = resolve_all(driver, &strategies::grid_rows()).await;
    tracing::info!(
        subcategory = context.subcategory,
        rows = rows.len(),
        "extracting grid rows"
    );

    let source_url = driver.current_url().await.unwrap_or_default();
    let mut records = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if records.len() >= context.max_products {
            tracing::info!(
                cap = context.max_products,
                "per-category product cap reached"
            );
            break;
        }
        if cancel.load(Ordering::Relaxed) {
            tracing::info!(processed = records.len(), "grid extraction cancelled");
            break;
        }

        match extract_row(driver, sprites, context, row.as_ref(), index, &source_url).await {
            Some(record) => records.push(record),
            None => tracing::debug!(index, "skipping grid row without a product name"),
        }
    }

    let with_images = records
        .iter()
        .filter(|r| r.card_image_url.is_some() || !r.product_images.is_empty())
        .count();
    tracing::info!(
        subcategory = context.subcategory,
        total = records.len(),
        with_images,
        without_images = records.len() - with_images,
        "grid extraction summary"
    );

    records
}

async fn extract_row(
    driver: &dyn PageDriver,
    sprites: Option<&SpriteSheetFetcher>,
    context: &GridContext,
    row: &dyn ElementHandle,
    index: usize,
    source_url: &str,
) -> Option<ProductRecord> {
    // The name predicate already rejects decorative short matches; a row
    // without a name is grid chrome, not a product.
    let name = resolve(row, &strategies::grid_row_name(), false)
        .await?
        .text()
        .await
        .ok()
        .filter(|t| !t.is_empty())?;

    let mut product_images = Vec::new();
    let mut card_image_url = None;

    if let Some(tile) = resolve(row, &strategies::sprite_tile(), false).await {
        if let Ok(Some(style)) = tile.attribute("style").await {
            if let Some(descriptor) = sprite::decode(&style) {
                tracing::debug!(
                    name,
                    sheet_url = descriptor.sheet_url,
                    x = descriptor.offset.0,
                    y = descriptor.offset.1,
                    "sprite tile found"
                );
                card_image_url = Some(descriptor.sheet_url.clone());
                if let Some(fetcher) = sprites {
                    if let Err(e) = fetcher.get_sub_image(&descriptor).await {
                        // Sheet URL stays on the record either way.
                        tracing::warn!(name, error = %e, "sprite crop failed");
                    }
                }
            }
        }
    }

    if card_image_url.is_none() {
        // Independent fallback, unrelated to sprites: a plain <img> in the row.
        if let Some(img) = resolve(row, &strategies::card_image(), false).await {
            if let Ok(Some(src)) = img.attribute("src").await {
                if !src.trim().is_empty() {
                    product_images.push(src.trim().to_owned());
                }
            }
        }
    }

    let fragments = ProductFragments {
        index,
        category: context.category.clone(),
        subcategory: context.subcategory.clone(),
        country: context.country.clone(),
        source_url: source_url.to_owned(),
        name: Some(name),
        card_image_url,
        product_images,
        specifications: [
            ("brand".to_owned(), "Wilo".to_owned()),
            ("application".to_owned(), context.subcategory.clone()),
            ("category".to_owned(), context.category.clone()),
            ("type".to_owned(), "Pump".to_owned()),
        ]
        .into_iter()
        .collect(),
        ..ProductFragments::default()
    };

    Some(build(fragments))
}
