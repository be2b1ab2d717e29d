//! Normalized product records produced by a scraping run.
//!
//! A [`ProductRecord`] is created once per detected product card, is immutable
//! after construction, and carries a [`FieldProvenance`] so that substituted
//! fallback content stays distinguishable from genuinely extracted content
//! (fallback text is otherwise identical to what the upload path sends).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic feature bullets substituted when the advantages section could not
/// be extracted. Substitution usually indicates an extraction miss rather
/// than a genuinely advantage-less product, so substituting callers log a
/// degraded-data warning and clear [`FieldProvenance::advantages`].
pub const FALLBACK_ADVANTAGES: [&str; 4] = [
    "High-quality German engineering",
    "Energy-efficient operation",
    "Reliable performance",
    "Professional grade components",
];

/// The generic description substituted when no short description is available.
#[must_use]
pub fn fallback_description(name: &str, category: &str) -> String {
    format!("Professional {name} from Wilo for {category} applications.")
}

/// A product extracted from the Wilo catalog or selection tool, normalized
/// for export and upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Display name. Never empty: extraction misses are replaced with a
    /// synthesized `"Product {n}"` placeholder (see [`FieldProvenance::name`]).
    pub name: String,
    /// Top-level application category, e.g. `"Industrial Heating"`.
    pub category: String,
    /// Subcategory / product type, e.g. `"Heating Pumps"`.
    pub subcategory: String,
    /// Country context the product was scraped under, e.g. `"Germany"`.
    pub country: String,
    /// Short description paragraph, verbatim from the product page, or the
    /// generic fallback sentence when nothing was extracted.
    pub short_description: String,
    /// "Your Advantages" bullet items in page order, or the fixed generic
    /// feature list when the section could not be extracted.
    pub advantages: Vec<String>,
    /// Longer free-text content sections, joined with blank lines. May be empty.
    pub long_description: String,
    /// Key/value specification pairs. `BTreeMap` keeps serialization ordering
    /// deterministic.
    pub specifications: BTreeMap<String, String>,
    /// Image shown on the overview card, if one was found.
    pub card_image_url: Option<String>,
    /// Up to five distinct carousel/product-page image URLs in encounter order.
    pub product_images: Vec<String>,
    /// URL of the product detail page the record was extracted from.
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
    pub provenance: FieldProvenance,
}

/// Per-field extraction provenance.
///
/// `true` means the field holds content read from the site; `false` means the
/// documented fallback was substituted. The substitution itself is also logged
/// as a degraded-data warning at build time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldProvenance {
    pub name: bool,
    pub short_description: bool,
    pub advantages: bool,
}

impl FieldProvenance {
    /// Provenance for a record whose fallback-able fields were all extracted.
    #[must_use]
    pub fn extracted() -> Self {
        Self {
            name: true,
            short_description: true,
            advantages: true,
        }
    }

    /// Returns `true` if any fallback-able field carries substituted content.
    #[must_use]
    pub fn any_fallback(&self) -> bool {
        !(self.name && self.short_description && self.advantages)
    }
}

impl ProductRecord {
    /// Returns all image URLs (card image first, then product images) in
    /// encounter order.
    #[must_use]
    pub fn all_image_urls(&self) -> Vec<&str> {
        self.card_image_url
            .iter()
            .map(String::as_str)
            .chain(self.product_images.iter().map(String::as_str))
            .collect()
    }
}
