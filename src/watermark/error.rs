use thiserror::Error;

use super::ColorParseError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Font error: {0}")]
    Font(String),

    #[error("Font size {requested} exceeds the maximum of {max}")]
    FontSizeTooLarge { requested: u32, max: u32 },

    #[error("Invalid text color: {0}")]
    InvalidColor(#[from] ColorParseError),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}
