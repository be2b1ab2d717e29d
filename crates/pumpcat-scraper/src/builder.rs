//! Product record assembly with per-field fallbacks.
//!
//! `build` never fails and never produces a half-populated record: every
//! field has an independent fallback, and substitutions are recorded in the
//! record's provenance flags so degraded data stays distinguishable from
//! extracted data downstream.

use std::collections::BTreeMap;

use chrono::Utc;
use pumpcat_core::{fallback_description, FieldProvenance, ProductRecord, FALLBACK_ADVANTAGES};

/// Maximum number of product-page images kept per record.
const MAX_PRODUCT_IMAGES: usize = 5;

/// Whatever the resolver and decoder managed to extract for one product
/// card, plus the navigation context it was found under.
#[derive(Debug, Clone, Default)]
pub struct ProductFragments {
    /// Zero-based card index within the traversal, used for placeholder names.
    pub index: usize,
    pub category: String,
    pub subcategory: String,
    pub country: String,
    pub source_url: String,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub advantages: Vec<String>,
    pub long_description: Option<String>,
    pub specifications: BTreeMap<String, String>,
    pub card_image_url: Option<String>,
    pub product_images: Vec<String>,
}

/// Assembles a [`ProductRecord`] from extracted fragments.
///
/// Fallback policy:
/// - missing name → `"Product {index+1}"` (a record never has an empty name)
/// - missing short description → [`fallback_description`]
/// - missing advantages → [`FALLBACK_ADVANTAGES`] (logged as degraded data)
///
/// Images are de-duplicated by exact URL in encounter order; at most
/// [`MAX_PRODUCT_IMAGES`] product images are kept.
#[must_use]
pub fn build(fragments: ProductFragments) -> ProductRecord {
    let mut provenance = FieldProvenance::extracted();

    let name = match fragments
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        Some(name) => name.to_owned(),
        None => {
            provenance.name = false;
            let placeholder = format!("Product {}", fragments.index + 1);
            tracing::warn!(
                index = fragments.index,
                placeholder,
                "no product name extracted, using placeholder"
            );
            placeholder
        }
    };

    let short_description = match fragments
        .short_description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        Some(desc) => desc.to_owned(),
        None => {
            provenance.short_description = false;
            tracing::debug!(name, "no short description extracted, using generic text");
            fallback_description(&name, &fragments.category)
        }
    };

    let advantages: Vec<String> = fragments
        .advantages
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .collect();
    let advantages = if advantages.is_empty() {
        provenance.advantages = false;
        // Usually an extraction miss, not a genuinely advantage-less product.
        tracing::warn!(name, "no advantages extracted, substituting generic feature list");
        FALLBACK_ADVANTAGES.iter().map(|s| (*s).to_owned()).collect()
    } else {
        advantages
    };

    let card_image_url = fragments
        .card_image_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_owned);

    let mut product_images: Vec<String> = Vec::new();
    for url in &fragments.product_images {
        let url = url.trim();
        if url.is_empty() || product_images.iter().any(|seen| seen == url) {
            continue;
        }
        product_images.push(url.to_owned());
        if product_images.len() == MAX_PRODUCT_IMAGES {
            break;
        }
    }

    ProductRecord {
        name,
        category: fragments.category,
        subcategory: fragments.subcategory,
        country: fragments.country,
        short_description,
        advantages,
        long_description: fragments.long_description.unwrap_or_default(),
        specifications: fragments.specifications,
        card_image_url,
        product_images,
        source_url: fragments.source_url,
        extracted_at: Utc::now(),
        provenance,
    }
}
