//! End-to-end tests for the document lifecycle: persistence round trips,
//! background-fetch supersession, and the HTTP fetcher against a mock server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emojiart_core::Vec2;
use emojiart_document::{
    BackgroundFetcher, Document, DocumentStore, FetchError, FileStore, HttpFetcher, MemoryStore,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encode a blank PNG of the given size.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height))
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode fixture png");
    bytes.into_inner()
}

/// Fetcher with scripted per-URL delays and payloads.
struct StagedFetcher {
    responses: HashMap<String, (Duration, Vec<u8>)>,
}

impl StagedFetcher {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    fn stage(mut self, url: &str, delay: Duration, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), (delay, bytes));
        self
    }
}

#[async_trait]
impl BackgroundFetcher for StagedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let (delay, bytes) = self
            .responses
            .get(url.as_str())
            .cloned()
            .unwrap_or((Duration::ZERO, Vec::new()));
        tokio::time::sleep(delay).await;
        Ok(bytes)
    }
}

#[tokio::test]
async fn file_store_round_trip_across_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn DocumentStore> =
        Arc::new(FileStore::new(dir.path()).expect("file store"));
    let fetcher = Arc::new(StagedFetcher::new());

    {
        let mut doc = Document::open("vacation", Arc::clone(&store), fetcher.clone());
        doc.add_sticker("🍎", 10, -5, 40);
        doc.add_sticker("🥨", 3, 3, 64);
    }

    // Autosaves land on the blocking pool; let them settle before reopening.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let reopened = Document::open("vacation", store, fetcher);
    let texts: Vec<_> = reopened.stickers().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["🍎", "🥨"]);
}

#[tokio::test]
async fn superseding_fetch_publishes_only_newest() {
    let slow = "https://img.example/slow.png";
    let fast = "https://img.example/fast.png";
    let fetcher = Arc::new(
        StagedFetcher::new()
            .stage(slow, Duration::from_millis(150), png_bytes(200, 100))
            .stage(fast, Duration::from_millis(5), png_bytes(50, 50)),
    );
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    doc.set_background_url(Some(slow));
    doc.set_background_url(Some(fast));
    doc.await_background_fetch().await;

    // Outlast the superseded fetch before checking it stayed silent.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let image = doc.background_image().expect("newest image published");
    assert_eq!((image.width, image.height), (50, 50));
}

#[tokio::test]
async fn cancelled_fetch_never_publishes() {
    let slow = "https://img.example/slow.png";
    let fetcher = Arc::new(StagedFetcher::new().stage(
        slow,
        Duration::from_millis(100),
        png_bytes(200, 100),
    ));
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    doc.set_background_url(Some(slow));
    tokio::time::sleep(Duration::from_millis(10)).await;
    doc.new_document();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(doc.background_image().is_none());
}

/// A superseded fetch that has already finished downloading must still
/// stay silent: clearing the canvas right after setting a URL races the
/// in-flight task's completion against the clear, and the instant
/// fetcher keeps that window hot across many iterations.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completed_but_superseded_fetch_never_resurrects_background() {
    let url = "https://img.example/instant.png";
    let fetcher =
        Arc::new(StagedFetcher::new().stage(url, Duration::ZERO, png_bytes(8, 8)));
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    for _ in 0..500 {
        doc.set_background_url(Some(url));
        doc.new_document();
        tokio::task::yield_now().await;
        assert!(doc.background_image().is_none());
    }

    // Let any straggler task run to completion before the final check.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(doc.background_image().is_none());
}

#[tokio::test]
async fn undecodable_payload_clears_background() {
    let good = "https://img.example/good.png";
    let bad = "https://img.example/broken.png";
    let fetcher = Arc::new(
        StagedFetcher::new()
            .stage(good, Duration::ZERO, png_bytes(8, 8))
            .stage(bad, Duration::ZERO, b"not an image".to_vec()),
    );
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    doc.set_background_url(Some(good));
    doc.await_background_fetch().await;
    assert!(doc.background_image().is_some());

    doc.set_background_url(Some(bad));
    doc.await_background_fetch().await;
    assert!(doc.background_image().is_none());
}

#[tokio::test]
async fn fit_to_view_uses_fetched_image_size() {
    let url = "https://img.example/wide.png";
    let fetcher =
        Arc::new(StagedFetcher::new().stage(url, Duration::ZERO, png_bytes(200, 100)));
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    doc.set_background_url(Some(url));
    doc.await_background_fetch().await;

    doc.end_pan(Vec2::new(30.0, 30.0));
    doc.fit_to_view(Vec2::new(100.0, 100.0));
    assert!((doc.view().zoom - 0.5).abs() < f32::EPSILON);
    assert_eq!(doc.view().pan, Vec2::ZERO);

    // Degenerate viewport leaves the fit untouched.
    doc.fit_to_view(Vec2::ZERO);
    assert!((doc.view().zoom - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn http_fetcher_downloads_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bg.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(200, 100)))
        .mount(&server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new().expect("fetcher"));
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    doc.set_background_url(Some(&format!("{}/bg.png", server.uri())));
    doc.await_background_fetch().await;

    let image = doc.background_image().expect("fetched image");
    assert_eq!((image.width, image.height), (200, 100));
}

#[tokio::test]
async fn http_error_status_clears_background() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new().expect("fetcher"));
    let store = Arc::new(MemoryStore::new());

    let mut doc = Document::open("doc", store, fetcher);
    doc.set_background_url(Some(&format!("{}/missing.png", server.uri())));
    doc.await_background_fetch().await;

    assert!(doc.background_image().is_none());
}
