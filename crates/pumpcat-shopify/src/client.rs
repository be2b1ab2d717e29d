//! HTTP client for the Shopify Admin REST API's product endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::payload::UploadPayload;
use crate::rate_limit::retry_with_backoff;

/// Default Retry-After applied when a 429 response omits the header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Admin API client for product creation.
///
/// Handles rate limiting (429), duplicate detection, and per-product bulk
/// upload accounting. Transient errors (429, network failures, 5xx) are
/// retried with exponential backoff up to `max_retries` additional attempts.
pub struct ShopifyClient {
    client: reqwest::Client,
    /// Versioned API base, e.g. `https://my-shop.myshopify.com/admin/api/2024-01`.
    base_url: String,
    shop: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

/// The subset of the created-product response callers need.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedProduct {
    pub id: i64,
    pub title: String,
}

/// Store identity returned by `test_connection`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Per-product outcome accounting for a bulk upload.
#[derive(Debug, Default)]
pub struct BulkUploadReport {
    pub total: usize,
    pub created: Vec<CreatedProduct>,
    /// Titles skipped because a product with the same title already exists.
    pub skipped: Vec<String>,
    /// `(title, error)` pairs for products whose creation failed.
    pub failed: Vec<(String, String)>,
}

#[derive(Serialize)]
struct ProductEnvelope<'a> {
    product: &'a UploadPayload,
}

#[derive(Deserialize)]
struct CreatedEnvelope {
    product: CreatedProduct,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<CreatedProduct>,
}

#[derive(Deserialize)]
struct ShopEnvelope {
    shop: ShopInfo,
}

impl ShopifyClient {
    /// Creates a client for the given store.
    ///
    /// `shop_url` may be a bare store handle (`"my-shop"`), a
    /// `*.myshopify.com` host, or a full `https://` URL; it is normalized to
    /// the versioned Admin API base.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., an invalid access-token header value).
    pub fn new(
        shop_url: &str,
        access_token: &str,
        api_version: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, UploadError> {
        let origin = normalize_shop_origin(shop_url);
        let base_url = format!("{origin}/admin/api/{api_version}");

        let mut headers = reqwest::header::HeaderMap::new();
        let mut token = reqwest::header::HeaderValue::from_str(access_token).map_err(|e| {
            UploadError::InvalidShopUrl {
                shop_url: shop_url.to_owned(),
                reason: format!("access token is not a valid header value: {e}"),
            }
        })?;
        token.set_sensitive(true);
        headers.insert("X-Shopify-Access-Token", token);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pumpcat/0.1")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            shop: origin,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Verifies credentials by fetching the shop resource.
    ///
    /// # Errors
    ///
    /// Propagates the same error taxonomy as [`Self::create_product`].
    pub async fn test_connection(&self) -> Result<ShopInfo, UploadError> {
        let url = format!("{}/shop.json", self.base_url);
        let envelope: ShopEnvelope = self.get_json(&url, "shop info").await?;
        tracing::info!(
            shop = envelope.shop.name,
            domain = envelope.shop.domain.as_deref().unwrap_or("unknown"),
            "connected to Shopify store"
        );
        Ok(envelope.shop)
    }

    /// Creates one product, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`UploadError::RateLimited`] — 429 after all retries exhausted.
    /// - [`UploadError::UnexpectedStatus`] — any other non-2xx status, with
    ///   the response body (422s carry field-level validation messages).
    /// - [`UploadError::Http`] — network failure after all retries.
    /// - [`UploadError::Deserialize`] — response body is not the expected JSON.
    pub async fn create_product(
        &self,
        payload: &UploadPayload,
    ) -> Result<CreatedProduct, UploadError> {
        let url = format!("{}/products.json", self.base_url);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(&url)
                    .json(&ProductEnvelope { product: payload })
                    .send()
                    .await?;

                let envelope: CreatedEnvelope = self
                    .handle_response(response, &url, &format!("create product \"{}\"", payload.title))
                    .await?;
                Ok(envelope.product)
            }
        })
        .await
        .inspect(|created| {
            tracing::info!(id = created.id, title = created.title, "created product");
        })
    }

    /// Looks up an existing product by exact title, used to skip duplicates
    /// during bulk uploads.
    ///
    /// # Errors
    ///
    /// Propagates the same error taxonomy as [`Self::create_product`].
    pub async fn find_by_title(&self, title: &str) -> Result<Option<CreatedProduct>, UploadError> {
        let mut url =
            reqwest::Url::parse(&format!("{}/products.json", self.base_url)).map_err(|e| {
                UploadError::InvalidShopUrl {
                    shop_url: self.shop.clone(),
                    reason: e.to_string(),
                }
            })?;
        url.query_pairs_mut()
            .append_pair("title", title)
            .append_pair("limit", "1");
        let url = url.to_string();

        let envelope: ProductsEnvelope = self.get_json(&url, "product lookup").await?;
        Ok(envelope.products.into_iter().next())
    }

    /// Uploads a batch of payloads, one at a time with `delay_ms` between
    /// requests. A product whose lookup or creation fails is recorded in the
    /// report and never aborts the rest of the batch.
    pub async fn bulk_upload(
        &self,
        payloads: &[UploadPayload],
        delay_ms: u64,
    ) -> BulkUploadReport {
        let mut report = BulkUploadReport {
            total: payloads.len(),
            ..BulkUploadReport::default()
        };

        for (i, payload) in payloads.iter().enumerate() {
            if i > 0 && delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            tracing::info!(
                current = i + 1,
                total = payloads.len(),
                title = payload.title,
                "uploading product"
            );

            match self.find_by_title(&payload.title).await {
                Ok(Some(existing)) => {
                    tracing::info!(id = existing.id, title = payload.title, "product already exists, skipping");
                    report.skipped.push(payload.title.clone());
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    // Lookup failure is not worth losing the upload over.
                    tracing::warn!(title = payload.title, error = %e, "duplicate check failed, attempting create");
                }
            }

            match self.create_product(payload).await {
                Ok(created) => report.created.push(created),
                Err(e) => {
                    tracing::error!(title = payload.title, error = %e, "product upload failed");
                    report.failed.push((payload.title.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            total = report.total,
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "bulk upload complete"
        );
        report
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, UploadError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            let context = context.to_owned();
            async move {
                let response = self.client.get(&url).send().await?;
                self.handle_response(response, &url, &context).await
            }
        })
        .await
    }

    /// Maps a response to the typed error taxonomy and deserializes the body.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        url: &str,
        context: &str,
    ) -> Result<T, UploadError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(UploadError::RateLimited {
                shop: self.shop.clone(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
                body: truncate(&body, 500),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|source| UploadError::Deserialize {
            context: context.to_owned(),
            source,
        })
    }
}

/// Normalizes a configured shop reference to an `https://` origin.
///
/// `"my-shop"` → `"https://my-shop.myshopify.com"`;
/// `"my-shop.myshopify.com"` → `"https://my-shop.myshopify.com"`;
/// full URLs pass through with any trailing slash removed.
fn normalize_shop_origin(shop_url: &str) -> String {
    let trimmed = shop_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_owned();
    }
    if trimmed.contains('.') {
        return format!("https://{trimmed}");
    }
    format!("https://{trimmed}.myshopify.com")
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_owned()
    } else {
        let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_handle_becomes_myshopify_origin() {
        assert_eq!(
            normalize_shop_origin("my-shop"),
            "https://my-shop.myshopify.com"
        );
    }

    #[test]
    fn dotted_host_gets_https_prefix() {
        assert_eq!(
            normalize_shop_origin("my-shop.myshopify.com"),
            "https://my-shop.myshopify.com"
        );
    }

    #[test]
    fn full_url_passes_through_without_trailing_slash() {
        assert_eq!(
            normalize_shop_origin("https://my-shop.myshopify.com/"),
            "https://my-shop.myshopify.com"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "äöü".repeat(300);
        let t = truncate(&s, 500);
        assert!(t.len() <= 504);
        assert!(t.ends_with('…'));
    }
}
