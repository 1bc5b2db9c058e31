mod common;

use common::{SOURCE_HEIGHT, SOURCE_WIDTH, create_test_config, scratch_entries, spawn_origin};
use tempfile::TempDir;
use textmark::{
    fetch::{FetchError, Fetcher},
    processor::{ImageProcessor, ProcessError, WatermarkRequest},
    watermark::{Position, RenderError},
};

#[tokio::test]
async fn test_fetch_decodes_and_releases_scratch_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let origin = spawn_origin().await;

    let fetcher = Fetcher::new(&config.fetch).unwrap();
    let download = fetcher
        .fetch(&format!("http://{origin}/image.png"))
        .await
        .unwrap();

    let scratch_path = download.scratch_path().to_path_buf();
    assert!(scratch_path.starts_with(&config.fetch.temp_directory));
    assert!(scratch_path.exists());
    assert_eq!(download.image.width(), SOURCE_WIDTH);
    assert_eq!(download.image.height(), SOURCE_HEIGHT);

    drop(download);
    assert!(!scratch_path.exists());
}

#[tokio::test]
async fn test_fetch_classifies_failures() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let origin = spawn_origin().await;
    let fetcher = Fetcher::new(&config.fetch).unwrap();

    let html = fetcher.fetch(&format!("http://{origin}/page.html")).await;
    assert!(matches!(&html, Err(e) if e.is_decode()));

    let missing = fetcher.fetch(&format!("http://{origin}/missing.png")).await;
    assert!(matches!(
        missing,
        Err(FetchError::Status { status, .. }) if status == reqwest::StatusCode::NOT_FOUND
    ));

    let refused = fetcher.fetch("http://127.0.0.1:1/image.png").await;
    assert!(matches!(refused, Err(FetchError::Network { .. })));

    assert_eq!(scratch_entries(&config.fetch.temp_directory), 0);
}

#[tokio::test]
async fn test_fetch_times_out() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    config.fetch.timeout_secs = 1;
    let origin = spawn_origin().await;

    let fetcher = Fetcher::new(&config.fetch).unwrap();
    let result = fetcher.fetch(&format!("http://{origin}/slow.png")).await;

    assert!(matches!(result, Err(FetchError::Timeout { secs: 1, .. })));
    assert_eq!(scratch_entries(&config.fetch.temp_directory), 0);
}

#[tokio::test]
async fn test_fetch_refuses_oversized_body() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    // Smaller than a PNG signature plus its header chunk
    config.fetch.max_download_bytes = 16;
    let origin = spawn_origin().await;

    let fetcher = Fetcher::new(&config.fetch).unwrap();
    let result = fetcher.fetch(&format!("http://{origin}/image.png")).await;

    assert!(matches!(result, Err(FetchError::TooLarge { limit: 16, .. })));
    assert_eq!(scratch_entries(&config.fetch.temp_directory), 0);
}

#[tokio::test]
async fn test_processor_propagates_typed_errors() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let origin = spawn_origin().await;
    let processor = ImageProcessor::new(&config).unwrap();

    let mut request = WatermarkRequest::new(format!("http://{origin}/page.html"), "Sample");
    assert!(matches!(
        processor.process_image_url(&request).await,
        Err(ProcessError::Fetch(_))
    ));

    request.image_url = format!("http://{origin}/image.png");
    request.text_color = Some("nope".to_string());
    assert!(matches!(
        processor.process_image_url(&request).await,
        Err(ProcessError::Render(_))
    ));

    request.text_color = None;
    request.font_size = Some(400_000);
    assert!(matches!(
        processor.process_image_url(&request).await,
        Err(ProcessError::Render(RenderError::FontSizeTooLarge { .. }))
    ));

    request.font_size = None;
    request.text_color = Some("black".to_string());
    request.position = Position::BottomCenter;
    let png = processor.process_image_url(&request).await.unwrap();
    let output = image::load_from_memory(&png).unwrap();
    assert_eq!((output.width(), output.height()), (SOURCE_WIDTH, SOURCE_HEIGHT));

    assert_eq!(scratch_entries(&config.fetch.temp_directory), 0);
}
