//! Sprite sheet download, caching, and tile cropping.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::DynamicImage;
use thiserror::Error;

use crate::sprite::SpriteDescriptor;

/// Errors from sprite sheet fetching or cropping. All of them are non-fatal
/// to a scraping run: callers keep the sheet URL and move on without the
/// cropped asset.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error fetching sprite sheet: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("could not decode sprite sheet from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "tile {w}x{h}@({x},{y}) does not fit sheet {sheet_w}x{sheet_h} from {url}"
    )]
    OutOfBounds {
        url: String,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        sheet_w: u32,
        sheet_h: u32,
    },

    #[error("could not write image to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Downloads sprite sheets and crops individual tiles out of them.
///
/// Sheets are cached in memory keyed by URL for the lifetime of the fetcher
/// (one scraping run). The cache is append-only and unbounded — acceptable at
/// run scope, where the site serves a handful of sheets; a long-lived service
/// would want an LRU here.
pub struct SpriteSheetFetcher {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, Arc<DynamicImage>>>,
}

impl SpriteSheetFetcher {
    /// Creates a fetcher with the given request timeout and User-Agent. The
    /// UA must look like a real browser — the site rejects bot-like agents.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Crops the tile addressed by `descriptor` out of its sprite sheet,
    /// fetching and caching the sheet on first use. Two descriptors sharing a
    /// `sheet_url` cause exactly one network fetch.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] / [`FetchError::UnexpectedStatus`] — download failed.
    /// - [`FetchError::Decode`] — response body is not a decodable image.
    /// - [`FetchError::OutOfBounds`] — the tile rectangle falls outside the sheet.
    pub async fn get_sub_image(
        &self,
        descriptor: &SpriteDescriptor,
    ) -> Result<DynamicImage, FetchError> {
        let sheet = self.sheet(&descriptor.sheet_url).await?;

        let (x, y) = descriptor.offset;
        let (w, h) = descriptor.size;
        if x.saturating_add(w) > sheet.width() || y.saturating_add(h) > sheet.height() {
            return Err(FetchError::OutOfBounds {
                url: descriptor.sheet_url.clone(),
                x,
                y,
                w,
                h,
                sheet_w: sheet.width(),
                sheet_h: sheet.height(),
            });
        }

        Ok(sheet.crop_imm(x, y, w, h))
    }

    /// Returns the decoded sheet for `url`, from cache or the network.
    async fn sheet(&self, url: &str) -> Result<Arc<DynamicImage>, FetchError> {
        if let Some(cached) = self.cache.lock().expect("cache lock poisoned").get(url) {
            tracing::debug!(url, "sprite sheet cache hit");
            return Ok(Arc::clone(cached));
        }

        tracing::debug!(url, "fetching sprite sheet");
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "image/webp,image/apng,image/*,*/*;q=0.8",
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let bytes = response.bytes().await?;
        let sheet = image::load_from_memory(&bytes).map_err(|source| FetchError::Decode {
            url: url.to_owned(),
            source,
        })?;

        tracing::debug!(url, width = sheet.width(), height = sheet.height(), "decoded sprite sheet");
        let sheet = Arc::new(sheet);
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .insert(url.to_owned(), Arc::clone(&sheet));
        Ok(sheet)
    }

    /// Number of distinct sheets currently cached.
    #[must_use]
    pub fn cached_sheet_count(&self) -> usize {
        self.cache.lock().expect("cache lock poisoned").len()
    }
}

/// Writes a cropped tile as a PNG file.
///
/// # Errors
///
/// Returns [`FetchError::Write`] if encoding or writing fails.
pub fn write_png(img: &DynamicImage, path: &Path) -> Result<(), FetchError> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| FetchError::Write {
            path: path.display().to_string(),
            source,
        })
}
