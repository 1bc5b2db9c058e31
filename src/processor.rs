use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::Config;
use crate::fetch::{FetchError, Fetcher};
use crate::watermark::{Compositor, OverlayOptions, Position, RenderError, TextColor};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything needed to watermark one image.
#[derive(Debug, Clone)]
pub struct WatermarkRequest {
    pub image_url: String,
    pub text: String,
    pub position: Position,
    pub font_size: Option<u32>,
    pub text_color: Option<String>,
}

impl WatermarkRequest {
    pub fn new(image_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            text: text.into(),
            position: Position::default(),
            font_size: None,
            text_color: None,
        }
    }
}

/// Fetches an image and stamps it. Holds no per-request state, so one
/// instance serves every request concurrently.
pub struct ImageProcessor {
    fetcher: Fetcher,
    compositor: Arc<Compositor>,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Result<Self, ProcessError> {
        let fetcher = Fetcher::new(&config.fetch)?;
        let compositor = Compositor::new(&config.watermark)?;
        info!(
            "Watermark font resolved: {:?}",
            compositor.font_resolution()
        );

        Ok(Self {
            fetcher,
            compositor: Arc::new(compositor),
        })
    }

    /// Download, watermark and PNG-encode. All or nothing: no partial output
    /// is ever returned, and the download's scratch file is released whether
    /// or not rendering succeeds.
    pub async fn process_image_url(
        &self,
        request: &WatermarkRequest,
    ) -> Result<Vec<u8>, ProcessError> {
        let color = request
            .text_color
            .as_deref()
            .map(str::parse::<TextColor>)
            .transpose()
            .map_err(RenderError::from)?;
        self.compositor.checked_font_size(request.font_size)?;

        let (image, scratch) = self.fetcher.fetch(&request.image_url).await?.into_parts();
        debug!(
            "Fetched {}x{} image from {}",
            image.width(),
            image.height(),
            request.image_url
        );

        let options = OverlayOptions {
            text: request.text.clone(),
            position: request.position,
            font_size: request.font_size,
            color,
        };
        let compositor = Arc::clone(&self.compositor);
        let rendered =
            tokio::task::spawn_blocking(move || compositor.render(image, &options)).await;

        drop(scratch);

        Ok(rendered??)
    }
}
