//! Image-fetch collaborator for background images.

use async_trait::async_trait;
use emojiart_core::Vec2;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Errors from fetching or decoding a background image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP layer failed (connection, timeout, non-success status).
    #[error("background fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The fetched bytes are not a decodable image.
    #[error("background decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Transport that retrieves background image bytes for a URL.
#[async_trait]
pub trait BackgroundFetcher: Send + Sync {
    /// Fetch the raw bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] when the transport fails.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// HTTP fetcher over [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create an HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the client fails to build.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("emojiart-document/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BackgroundFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// A decoded in-memory background image.
#[derive(Clone)]
pub struct BackgroundImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    rgba: Vec<u8>,
}

impl BackgroundImage {
    /// Decode fetched bytes into RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the bytes are not an image;
    /// callers treat that the same as a fetch failure.
    pub fn decode(bytes: &[u8]) -> Result<Self, FetchError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            rgba: decoded.into_raw(),
        })
    }

    /// Natural size as a vector, for fit-to-view math.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Raw RGBA8 pixel data, row-major.
    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
