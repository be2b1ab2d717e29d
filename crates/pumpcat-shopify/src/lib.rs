pub mod client;
pub mod error;
pub mod payload;
mod rate_limit;
pub mod transform;

pub use client::{BulkUploadReport, CreatedProduct, ShopInfo, ShopifyClient};
pub use error::UploadError;
pub use payload::{
    synthesize_sku, validate_image_url, UploadImage, UploadMetafield, UploadOption, UploadPayload,
    UploadVariant,
};
pub use transform::{build_body_html, transform};
