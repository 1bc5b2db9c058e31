use ab_glyph::FontArc;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::RenderError;

/// DejaVu Sans, compiled in so rendering never depends on the host's fonts.
static BUILTIN_FONT: &[u8] = include_bytes!("../../static/DejaVuSans.ttf");

/// Which face ended up being used, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontResolution {
    Configured(PathBuf),
    BuiltIn { reason: String },
}

impl FontResolution {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontResolution::BuiltIn { .. })
    }
}

/// Load the configured face, falling back to the built-in one if the file is
/// missing, unreadable or not a font. Only a broken built-in face is an error.
pub fn resolve_font(path: &Path) -> Result<(FontArc, FontResolution), RenderError> {
    match load_font_file(path) {
        Ok(font) => {
            debug!("Loaded watermark font from {:?}", path);
            Ok((font, FontResolution::Configured(path.to_path_buf())))
        }
        Err(reason) => {
            warn!(
                "Watermark font {:?} unavailable ({}), using built-in face",
                path, reason
            );
            let font = builtin_font()?;
            Ok((font, FontResolution::BuiltIn { reason }))
        }
    }
}

pub fn builtin_font() -> Result<FontArc, RenderError> {
    FontArc::try_from_slice(BUILTIN_FONT)
        .map_err(|e| RenderError::Font(format!("built-in face is invalid: {}", e)))
}

fn load_font_file(path: &Path) -> Result<FontArc, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(data).map_err(|e| e.to_string())
}
