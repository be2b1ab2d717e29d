//! Integration tests for `SpriteSheetFetcher`.
//!
//! Uses `wiremock` to serve sprite sheets locally, so cache behavior can be
//! asserted as actual network-fetch counts.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pumpcat_scraper::{FetchError, SpriteDescriptor, SpriteSheetFetcher};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// A 128x64 sheet: left tile red, right tile blue.
fn two_tile_sheet_png() -> Vec<u8> {
    let buf = RgbaImage::from_fn(128, 64, |x, _| if x < 64 { RED } else { BLUE });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(buf)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("in-memory PNG encoding");
    bytes
}

fn descriptor(sheet_url: &str, x: u32, y: u32) -> SpriteDescriptor {
    SpriteDescriptor {
        sheet_url: sheet_url.to_owned(),
        offset: (x, y),
        size: (64, 64),
    }
}

fn test_fetcher() -> SpriteSheetFetcher {
    SpriteSheetFetcher::new(5, "pumpcat-test/0.1").expect("failed to build fetcher")
}

#[tokio::test]
async fn crops_the_addressed_tile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sheet.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(two_tile_sheet_png(), "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/sheet.png", server.uri());
    let fetcher = test_fetcher();

    let left = fetcher.get_sub_image(&descriptor(&url, 0, 0)).await.unwrap();
    assert_eq!((left.width(), left.height()), (64, 64));
    assert_eq!(*left.to_rgba8().get_pixel(0, 0), RED);

    let right = fetcher.get_sub_image(&descriptor(&url, 64, 0)).await.unwrap();
    assert_eq!(*right.to_rgba8().get_pixel(0, 0), BLUE);
}

#[tokio::test]
async fn same_sheet_url_is_fetched_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sheet.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(two_tile_sheet_png(), "image/png"))
        .expect(1) // two descriptors, one network fetch
        .mount(&server)
        .await;

    let url = format!("{}/sheet.png", server.uri());
    let fetcher = test_fetcher();

    fetcher
        .get_sub_image(&descriptor(&url, 0, 0))
        .await
        .expect("first crop");
    fetcher
        .get_sub_image(&descriptor(&url, 64, 0))
        .await
        .expect("second crop");

    assert_eq!(fetcher.cached_sheet_count(), 1);
    // MockServer verifies the expect(1) on drop.
}

#[tokio::test]
async fn distinct_sheet_urls_are_cached_separately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(two_tile_sheet_png(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(two_tile_sheet_png(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = test_fetcher();
    let a = format!("{}/a.png", server.uri());
    let b = format!("{}/b.png", server.uri());

    fetcher.get_sub_image(&descriptor(&a, 0, 0)).await.unwrap();
    fetcher.get_sub_image(&descriptor(&b, 0, 0)).await.unwrap();
    assert_eq!(fetcher.cached_sheet_count(), 2);
}

#[tokio::test]
async fn non_2xx_status_is_a_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.png", server.uri());
    let err = test_fetcher()
        .get_sub_image(&descriptor(&url, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::UnexpectedStatus { status: 404, .. }));
}

#[tokio::test]
async fn undecodable_body_is_a_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/not-an-image.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>bot check</html>"))
        .mount(&server)
        .await;

    let url = format!("{}/not-an-image.png", server.uri());
    let err = test_fetcher()
        .get_sub_image(&descriptor(&url, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn tile_outside_the_sheet_is_a_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sheet.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(two_tile_sheet_png(), "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/sheet.png", server.uri());
    let err = test_fetcher()
        .get_sub_image(&descriptor(&url, 128, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::OutOfBounds { .. }));
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.png"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(two_tile_sheet_png(), "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/flaky.png", server.uri());
    let fetcher = test_fetcher();

    let first = fetcher.get_sub_image(&descriptor(&url, 0, 0)).await;
    assert!(matches!(
        first,
        Err(FetchError::UnexpectedStatus { status: 503, .. })
    ));
    assert_eq!(fetcher.cached_sheet_count(), 0);

    // A later call for the same sheet succeeds; the failure left no entry behind.
    fetcher
        .get_sub_image(&descriptor(&url, 0, 0))
        .await
        .expect("second attempt");
    assert_eq!(fetcher.cached_sheet_count(), 1);
}
