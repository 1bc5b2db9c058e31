use image::Rgba;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ColorParseError {
    #[error("unknown color name: {0}")]
    UnknownName(String),

    #[error("malformed hex color: {0}")]
    MalformedHex(String),

    #[error("malformed color function: {0}")]
    MalformedFunction(String),
}

/// Opaque-by-default RGBA text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextColor(pub Rgba<u8>);

impl TextColor {
    pub const WHITE: TextColor = TextColor(Rgba([255, 255, 255, 255]));

    pub fn rgba(&self) -> Rgba<u8> {
        self.0
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for TextColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();

        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::MalformedHex(s.to_string()));
        }

        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
        {
            return parse_function(args, value.starts_with("rgba("))
                .ok_or_else(|| ColorParseError::MalformedFunction(s.to_string()));
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, [r, g, b])| TextColor(Rgba([*r, *g, *b, 255])))
            .ok_or_else(|| ColorParseError::UnknownName(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<TextColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    let channels = match hex.len() {
        3 => [nibble(0)?, nibble(1)?, nibble(2)?, 255],
        4 => [nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?],
        6 => [byte(0)?, byte(2)?, byte(4)?, 255],
        8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
        _ => return None,
    };

    Some(TextColor(Rgba(channels)))
}

fn parse_function(args: &str, with_alpha: bool) -> Option<TextColor> {
    let parts: Vec<u8> = args
        .strip_suffix(')')?
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;

    match (parts.as_slice(), with_alpha) {
        ([r, g, b], false) => Some(TextColor(Rgba([*r, *g, *b, 255]))),
        ([r, g, b, a], true) => Some(TextColor(Rgba([*r, *g, *b, *a]))),
        _ => None,
    }
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("aqua", [0, 255, 255]),
    ("beige", [245, 245, 220]),
    ("black", [0, 0, 0]),
    ("blue", [0, 0, 255]),
    ("brown", [165, 42, 42]),
    ("chocolate", [210, 105, 30]),
    ("coral", [255, 127, 80]),
    ("crimson", [220, 20, 60]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkgrey", [169, 169, 169]),
    ("darkred", [139, 0, 0]),
    ("dimgray", [105, 105, 105]),
    ("dimgrey", [105, 105, 105]),
    ("fuchsia", [255, 0, 255]),
    ("gold", [255, 215, 0]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("grey", [128, 128, 128]),
    ("indigo", [75, 0, 130]),
    ("ivory", [255, 255, 240]),
    ("khaki", [240, 230, 140]),
    ("lavender", [230, 230, 250]),
    ("lightgray", [211, 211, 211]),
    ("lightgrey", [211, 211, 211]),
    ("lime", [0, 255, 0]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("navy", [0, 0, 128]),
    ("olive", [128, 128, 0]),
    ("orange", [255, 165, 0]),
    ("orangered", [255, 69, 0]),
    ("orchid", [218, 112, 214]),
    ("pink", [255, 192, 203]),
    ("plum", [221, 160, 221]),
    ("purple", [128, 0, 128]),
    ("red", [255, 0, 0]),
    ("royalblue", [65, 105, 225]),
    ("salmon", [250, 128, 114]),
    ("silver", [192, 192, 192]),
    ("skyblue", [135, 206, 235]),
    ("slategray", [112, 128, 144]),
    ("slategrey", [112, 128, 144]),
    ("steelblue", [70, 130, 180]),
    ("tan", [210, 180, 140]),
    ("teal", [0, 128, 128]),
    ("tomato", [255, 99, 71]),
    ("turquoise", [64, 224, 208]),
    ("violet", [238, 130, 238]),
    ("white", [255, 255, 255]),
    ("whitesmoke", [245, 245, 245]),
    ("yellow", [255, 255, 0]),
];
