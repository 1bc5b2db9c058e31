use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub mod fetch;
pub mod processor;
pub mod startup_checks;
pub mod watermark;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub watermark: WatermarkConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Rendering defaults applied when a request does not override them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// TrueType/OpenType face tried first; the embedded face is used when it can't be loaded
    pub font_path: PathBuf,
    pub font_size: u32,
    /// Largest size a request may ask for; the rasterizer allocates per glyph by size
    pub max_font_size: u32,
    pub text_color: String,
    /// Margin in pixels between the text and the nearest edge
    pub padding: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Downloads larger than this many bytes are abandoned
    pub max_download_bytes: u64,
    /// Scratch space for downloaded originals
    pub temp_directory: PathBuf,
    /// Keep downloaded originals on disk instead of removing them after each request
    pub keep_downloads: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("Arial.ttf"),
            font_size: 24,
            max_font_size: 512,
            text_color: "white".to_string(),
            padding: 20,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_download_bytes: 50 * 1024 * 1024,
            temp_directory: PathBuf::from("temp"),
            keep_downloads: false,
        }
    }
}

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<processor::ImageProcessor>,
}

pub async fn create_app(config: Config) -> Result<Router, processor::ProcessError> {
    let processor = Arc::new(processor::ImageProcessor::new(&config)?);

    let app_state = AppState { processor };

    let router = Router::new()
        .route("/process-image", post(api::process_image_handler))
        .route("/health", get(api::health_handler))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state);

    Ok(router)
}
