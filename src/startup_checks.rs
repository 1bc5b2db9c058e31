use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create temp directory: {0}")]
    TempDirectoryCreationFailed(#[from] std::io::Error),

    #[error("Watermark font missing: {0}")]
    FontMissing(String),
}

impl StartupCheckError {
    /// Critical failures stop the server from starting.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::TempDirectoryCreationFailed(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let temp_dir = &config.fetch.temp_directory;
    if !temp_dir.exists() {
        info!("Temp directory does not exist, creating: {:?}", temp_dir);
        if let Err(e) = tokio::fs::create_dir_all(temp_dir).await {
            error!("Failed to create temp directory {:?}: {}", temp_dir, e);
            errors.push(StartupCheckError::TempDirectoryCreationFailed(e));
        } else {
            info!("Temp directory created successfully");
        }
    } else {
        info!("Temp directory exists: {:?}", temp_dir);
    }

    let font_path = &config.watermark.font_path;
    if font_path.exists() {
        info!("Watermark font found: {:?}", font_path);
    } else {
        warn!(
            "Watermark font {:?} not found, the built-in face will be used",
            font_path
        );
        errors.push(StartupCheckError::FontMissing(
            font_path.display().to_string(),
        ));
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
