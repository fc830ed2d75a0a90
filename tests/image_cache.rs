//! Image cache against a mock image host, with the real image backend.

use folio_build::cache::{ImageCache, ImageRequest, ImageSource};
use folio_build::imaging::RustBackend;
use image::{ImageEncoder, ImageFormat, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 200]));
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

fn cache(root: &Path, run_id: &str) -> ImageCache {
    ImageCache::new(
        reqwest::Client::new(),
        RustBackend::new(),
        root.join("public"),
        root,
        run_id,
    )
}

async fn serve(server: &MockServer, route: &str, body: Vec<u8>, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn remote_png_becomes_webp_of_requested_size() {
    let server = MockServer::start().await;
    serve(&server, "/launcher.png", png(120, 60), 1).await;
    let tmp = TempDir::new().unwrap();
    let cache = cache(tmp.path(), "r1");

    let url = format!("{}/launcher.png", server.uri());
    let request = ImageRequest::new(ImageSource::parse(&url), "YouTube Music Remote")
        .subdir("projects")
        .square(48);
    let public = cache.cache_image(&request).await;

    assert_eq!(public, "/images/cached/projects/YouTube_Music_Remote-r1.webp");
    let written = fs::read(tmp.path().join("public/images/cached/projects/YouTube_Music_Remote-r1.webp")).unwrap();
    let img = image::load_from_memory_with_format(&written, ImageFormat::WebP).unwrap();
    assert_eq!((img.width(), img.height()), (48, 48));
}

#[tokio::test]
async fn second_request_never_refetches() {
    let server = MockServer::start().await;
    // Verified on drop: exactly one fetch for two calls
    serve(&server, "/icon.png", png(16, 16), 1).await;
    let tmp = TempDir::new().unwrap();
    let cache = cache(tmp.path(), "r1");

    let url = format!("{}/icon.png", server.uri());
    let request = ImageRequest::new(ImageSource::parse(&url), "telegram").subdir("icons");
    let first = cache.cache_image(&request).await;
    let second = cache.cache_image(&request).await;

    assert_eq!(first, second);
    assert_eq!(cache.stats().writes, 1);
}

#[tokio::test]
async fn later_build_with_same_run_id_is_a_hit() {
    let server = MockServer::start().await;
    serve(&server, "/icon.png", png(16, 16), 1).await;
    let tmp = TempDir::new().unwrap();
    let url = format!("{}/icon.png", server.uri());
    let request = ImageRequest::new(ImageSource::parse(&url), "icon");

    let first = cache(tmp.path(), "r1").cache_image(&request).await;
    let again = cache(tmp.path(), "r1");
    let second = again.cache_image(&request).await;

    assert_eq!(first, second);
    assert_eq!(again.stats().hits, 1);
}

#[tokio::test]
async fn new_run_id_starts_a_fresh_generation() {
    let server = MockServer::start().await;
    serve(&server, "/icon.png", png(16, 16), 2).await;
    let tmp = TempDir::new().unwrap();
    let url = format!("{}/icon.png", server.uri());
    let request = ImageRequest::new(ImageSource::parse(&url), "icon");

    let first = cache(tmp.path(), "r1").cache_image(&request).await;
    let second = cache(tmp.path(), "r2").cache_image(&request).await;

    assert_eq!(first, "/images/cached/icon-r1.webp");
    assert_eq!(second, "/images/cached/icon-r2.webp");
}

#[tokio::test]
async fn concurrent_requests_fetch_once() {
    let server = MockServer::start().await;
    serve(&server, "/shared.png", png(32, 32), 1).await;
    let tmp = TempDir::new().unwrap();
    let cache = cache(tmp.path(), "r1");

    let url = format!("{}/shared.png", server.uri());
    let request = ImageRequest::new(ImageSource::parse(&url), "shared");
    let results = futures::future::join_all((0..5).map(|_| cache.cache_image(&request))).await;

    assert!(results.iter().all(|r| r == "/images/cached/shared-r1.webp"));
}

#[tokio::test]
async fn malformed_image_falls_back_to_url() {
    let server = MockServer::start().await;
    serve(&server, "/broken.png", b"<html>not an image</html>".to_vec(), 1).await;
    let tmp = TempDir::new().unwrap();
    let cache = cache(tmp.path(), "r1");

    let url = format!("{}/broken.png", server.uri());
    let public = cache
        .cache_image(&ImageRequest::new(ImageSource::parse(&url), "broken"))
        .await;

    assert_eq!(public, url);
    assert!(!tmp.path().join("public/images/cached/broken-r1.webp").exists());
    assert_eq!(cache.stats().failures, 1);
}

#[tokio::test]
async fn unreachable_image_falls_back_to_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let tmp = TempDir::new().unwrap();
    let cache = cache(tmp.path(), "r1");

    let url = format!("{}/missing.png", server.uri());
    let public = cache
        .cache_image(&ImageRequest::new(ImageSource::parse(&url), "missing"))
        .await;
    assert_eq!(public, url);
}

#[tokio::test]
async fn remote_svg_is_stored_verbatim() {
    let server = MockServer::start().await;
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"/>"#.to_vec();
    serve(&server, "/favicons/favicon-dark.svg", svg.clone(), 1).await;
    let tmp = TempDir::new().unwrap();
    let cache = cache(tmp.path(), "r1");

    let url = format!("{}/favicons/favicon-dark.svg", server.uri());
    let request = ImageRequest::new(ImageSource::parse(&url), "gitHub")
        .subdir("favicons")
        .square(120);
    let public = cache.cache_image(&request).await;

    assert_eq!(public, "/images/cached/favicons/gitHub-r1.svg");
    let written = fs::read(tmp.path().join("public/images/cached/favicons/gitHub-r1.svg")).unwrap();
    assert_eq!(written, svg);
}

#[tokio::test]
async fn favicon_combines_remote_base_and_local_badge() {
    let server = MockServer::start().await;
    serve(&server, "/launcher.png", png(100, 100), 1).await;
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("public")).unwrap();
    fs::write(tmp.path().join("public/favicon.png"), png(20, 20)).unwrap();
    let cache = cache(tmp.path(), "r1");

    let base = ImageSource::parse(&format!("{}/launcher.png", server.uri()));
    let badge = ImageSource::parse("public/favicon.png");
    let public = cache.cache_favicon(&base, &badge, "overlayer-favicon", 64).await;

    assert_eq!(public, "/images/cached/favicons/overlayer_favicon-r1.webp");
    let written = fs::read(tmp.path().join("public/images/cached/favicons/overlayer_favicon-r1.webp")).unwrap();
    let img = image::load_from_memory_with_format(&written, ImageFormat::WebP).unwrap();
    assert_eq!((img.width(), img.height()), (64, 64));
}
