// Watermark rendering - text placement, font resolution and PNG output
mod color;
mod compositor;
mod error;
mod font;
mod position;

pub use color::{ColorParseError, TextColor};
pub use compositor::{Compositor, OverlayOptions, TextPlacement, encode_png};
pub use error::RenderError;
pub use font::{FontResolution, builtin_font, resolve_font};
pub use position::Position;
