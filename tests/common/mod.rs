#![allow(dead_code)]

use axum::{
    Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use textmark::Config;

pub const SOURCE_WIDTH: u32 = 400;
pub const SOURCE_HEIGHT: u32 = 300;

/// Encoded test image in the given format.
pub fn source_image_bytes(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(SOURCE_WIDTH, SOURCE_HEIGHT, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Serves fixtures the watermark service downloads from during tests.
pub async fn spawn_origin() -> SocketAddr {
    let app = Router::new()
        .route(
            "/image.png",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    source_image_bytes(ImageFormat::Png),
                )
            }),
        )
        .route(
            // JPEG bytes behind a misleading extension and content type
            "/photo.gif",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/octet-stream")],
                    source_image_bytes(ImageFormat::Jpeg),
                )
            }),
        )
        .route(
            "/page.html",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<!DOCTYPE html><html><body><h1>Not an image</h1></body></html>",
                )
            }),
        )
        .route(
            "/missing.png",
            get(|| async { (StatusCode::NOT_FOUND, "gone").into_response() }),
        )
        .route(
            "/slow.png",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                source_image_bytes(ImageFormat::Png)
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Config whose scratch space lives in `temp_dir`, rendering with the built-in face.
pub fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.fetch.temp_directory = temp_dir.path().join("scratch");
    config.fetch.timeout_secs = 2;
    config.watermark.font_path = temp_dir.path().join("no-such-font.ttf");
    std::fs::create_dir_all(&config.fetch.temp_directory).unwrap();
    config
}

pub fn scratch_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
