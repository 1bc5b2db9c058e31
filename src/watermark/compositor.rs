use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Pixel, Rgba, codecs::png::PngEncoder};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use super::{FontResolution, Position, RenderError, TextColor, resolve_font};
use crate::WatermarkConfig;

/// Per-request overrides on top of the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct OverlayOptions {
    pub text: String,
    pub position: Position,
    pub font_size: Option<u32>,
    pub color: Option<TextColor>,
}

/// Where the text landed on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Draws watermark text onto decoded images. Built once at startup and shared
/// read-only between requests.
pub struct Compositor {
    font: FontArc,
    resolution: FontResolution,
    font_size: u32,
    max_font_size: u32,
    color: TextColor,
    padding: u32,
}

impl Compositor {
    pub fn new(config: &WatermarkConfig) -> Result<Self, RenderError> {
        let (font, resolution) = resolve_font(&config.font_path)?;
        let color = config.text_color.parse::<TextColor>()?;

        Ok(Self {
            font,
            resolution,
            font_size: config.font_size,
            max_font_size: config.max_font_size,
            color,
            padding: config.padding,
        })
    }

    pub fn font_resolution(&self) -> &FontResolution {
        &self.resolution
    }

    /// A zero override is treated the same as no override.
    pub fn effective_font_size(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|size| *size > 0)
            .unwrap_or(self.font_size)
    }

    /// Resolve the size to draw at, refusing anything above the configured
    /// ceiling. Glyph coverage buffers grow with the square of the size.
    pub fn checked_font_size(&self, requested: Option<u32>) -> Result<u32, RenderError> {
        let size = self.effective_font_size(requested);
        if size > self.max_font_size {
            return Err(RenderError::FontSizeTooLarge {
                requested: size,
                max: self.max_font_size,
            });
        }
        Ok(size)
    }

    pub fn effective_color(&self, requested: Option<TextColor>) -> TextColor {
        requested.unwrap_or(self.color)
    }

    /// Measure `text` with the resolved face and place it on an image of
    /// `image_size`.
    pub fn placement(
        &self,
        image_size: (u32, u32),
        text: &str,
        position: Position,
        font_size: u32,
    ) -> TextPlacement {
        let scale = PxScale::from(font_size as f32);
        let (width, height) = text_size(scale, &self.font, text);
        let (x, y) = position.origin(image_size, (width, height), self.padding);

        TextPlacement {
            x,
            y,
            width,
            height,
        }
    }

    /// Draw the text onto `image` in place and hand the image back.
    pub fn overlay(
        &self,
        mut image: DynamicImage,
        options: &OverlayOptions,
    ) -> Result<DynamicImage, RenderError> {
        let font_size = self.checked_font_size(options.font_size)?;
        let color = self.effective_color(options.color).rgba();
        let placement = self.placement(
            (image.width(), image.height()),
            &options.text,
            options.position,
            font_size,
        );

        debug!(
            "Drawing {:?} at ({}, {}) size {}x{} on {}x{} image",
            options.position,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
            image.width(),
            image.height()
        );

        self.draw(&mut image, color, placement, font_size, &options.text);
        Ok(image)
    }

    /// Overlay and encode as PNG.
    pub fn render(&self, image: DynamicImage, options: &OverlayOptions) -> Result<Vec<u8>, RenderError> {
        let watermarked = self.overlay(image, options)?;
        encode_png(&watermarked)
    }

    fn draw(
        &self,
        image: &mut DynamicImage,
        color: Rgba<u8>,
        placement: TextPlacement,
        font_size: u32,
        text: &str,
    ) {
        let scale = PxScale::from(font_size as f32);
        let (x, y) = (placement.x, placement.y);

        // Draw in the buffer's own pixel format where imageproc supports it
        match image {
            DynamicImage::ImageRgba8(buffer) => {
                draw_text_mut(buffer, color, x, y, scale, &self.font, text)
            }
            DynamicImage::ImageRgb8(buffer) => {
                draw_text_mut(buffer, color.to_rgb(), x, y, scale, &self.font, text)
            }
            DynamicImage::ImageLuma8(buffer) => {
                draw_text_mut(buffer, color.to_luma(), x, y, scale, &self.font, text)
            }
            DynamicImage::ImageLumaA8(buffer) => {
                draw_text_mut(buffer, color.to_luma_alpha(), x, y, scale, &self.font, text)
            }
            other => {
                let mut rgba = other.to_rgba8();
                draw_text_mut(&mut rgba, color, x, y, scale, &self.font, text);
                *other = DynamicImage::ImageRgba8(rgba);
            }
        }
    }
}

/// Encode an image as PNG in memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, RenderError> {
    let mut png_data = Vec::new();
    let encoder = PngEncoder::new(&mut png_data);
    image.write_with_encoder(encoder)?;
    Ok(png_data)
}
