use serde::{Deserialize, Serialize};

/// Named anchor for the watermark text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomCenter,
    TopCenter,
}

impl Position {
    /// Resolve a preset by name. Anything unrecognised anchors bottom-right.
    pub fn from_name(name: &str) -> Self {
        match name {
            "bottom_right" => Position::BottomRight,
            "bottom_center" => Position::BottomCenter,
            "top_center" => Position::TopCenter,
            _ => Position::BottomRight,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Position::BottomRight => "bottom_right",
            Position::BottomCenter => "bottom_center",
            Position::TopCenter => "top_center",
        }
    }

    /// Top-left pixel at which text of `text_size` is drawn on an image of
    /// `image_size`.
    ///
    /// No clamping: text larger than the image yields negative coordinates and
    /// the renderer clips whatever falls outside.
    pub fn origin(&self, image_size: (u32, u32), text_size: (u32, u32), padding: u32) -> (i32, i32) {
        let (width, height) = (i64::from(image_size.0), i64::from(image_size.1));
        let (text_width, text_height) = (i64::from(text_size.0), i64::from(text_size.1));
        let padding = i64::from(padding);

        // Floor division so odd or negative slack rounds the same way every time
        let centered_x = (width - text_width).div_euclid(2);

        let (x, y) = match self {
            Position::BottomRight => (width - text_width - padding, height - text_height - padding),
            Position::BottomCenter => (centered_x, height - text_height - padding),
            Position::TopCenter => (centered_x, padding),
        };

        (saturate(x), saturate(y))
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
