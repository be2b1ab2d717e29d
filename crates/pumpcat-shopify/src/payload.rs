//! Admin API product-creation payload shapes and field synthesis.
//!
//! ## Observed constraints from the Admin REST API (2024-01)
//!
//! ### Images
//! `images[].src` must be a publicly fetchable `http(s)` URL with an image
//! extension somewhere in it; anything else fails the whole create call with
//! a 422. [`validate_image_url`] front-loads that check so one bad URL costs
//! that image, not the product (the previously observed all-or-nothing
//! failure mode).
//!
//! ### Tags
//! The create endpoint accepts tags as a single comma-separated string.
//!
//! ### Status
//! Always `"draft"` — scraped products are reviewed before publishing.

use serde::Serialize;

/// Longest URL accepted for an image `src`.
const MAX_IMAGE_URL_LEN: usize = 2048;

const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

/// Substrings that disqualify an image URL outright: alternate schemes the
/// CDN will not fetch, markup/quote characters, and fragments.
const DISALLOWED_FRAGMENTS: [&str; 9] = [
    "javascript:",
    "data:",
    "blob:",
    "file:",
    "mailto:",
    "tel:",
    "<",
    ">",
    "#",
];

/// Write-only projection of a product record into the create-product shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadPayload {
    pub title: String,
    pub body_html: String,
    pub vendor: String,
    pub product_type: String,
    /// Comma-separated tag list.
    pub tags: String,
    pub status: String,
    pub variants: Vec<UploadVariant>,
    pub options: Vec<UploadOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<UploadImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metafields: Vec<UploadMetafield>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadVariant {
    pub title: String,
    /// Decimal string. Always the `"0.00"` placeholder — the source site
    /// never exposes reliable prices; they are set manually after review.
    pub price: String,
    pub inventory_management: String,
    pub inventory_quantity: i64,
    pub requires_shipping: bool,
    pub taxable: bool,
    pub sku: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOption {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

/// Validates a candidate image URL for inclusion in an upload payload.
///
/// Rejects empty values, non-`http(s)` schemes, disallowed scheme/markup
/// fragments, quote and control characters, double-protocol strings, over-long
/// values, and URLs without a recognizable image extension anywhere in them.
#[must_use]
pub fn validate_image_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.len() > MAX_IMAGE_URL_LEN {
        return false;
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return false;
    }
    if url.contains('"') || url.contains('\'') || url.chars().any(char::is_control) {
        return false;
    }
    if DISALLOWED_FRAGMENTS.iter().any(|f| url.contains(f)) {
        return false;
    }
    if url.matches("http").count() > 1 {
        return false;
    }
    let lowered = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lowered.contains(ext))
}

/// Synthesizes a SKU from the product name: `WILO-` plus the name uppercased,
/// spaces turned into dashes, dots stripped, all other punctuation removed,
/// truncated to 20 characters.
#[must_use]
pub fn synthesize_sku(name: &str) -> String {
    let cleaned: String = name
        .to_uppercase()
        .replace(' ', "-")
        .replace('.', "")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(20)
        .collect();
    format!("WILO-{cleaned}")
}
