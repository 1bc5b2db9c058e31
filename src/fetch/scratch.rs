use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};
use uuid::Uuid;

/// On-disk copy of a downloaded original.
///
/// The file is removed when the guard drops, on every path out of a request.
/// Guards created with `keep` set are persisted instead, for inspecting what a
/// request actually downloaded.
pub struct ScratchFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    pub fn create(directory: &Path, bytes: &[u8], keep: bool) -> std::io::Result<Self> {
        let mut file = Builder::new()
            .prefix(&scratch_prefix())
            .suffix(".download")
            .tempfile_in(directory)?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!("Spooled {} bytes to {:?}", bytes.len(), path);

        Ok(Self {
            file: Some(file),
            path,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        if self.keep {
            match file.keep() {
                Ok((_, path)) => debug!("Kept downloaded original at {:?}", path),
                Err(e) => warn!("Failed to keep scratch file {:?}: {}", self.path, e),
            }
        } else if let Err(e) = file.close() {
            warn!("Failed to remove scratch file {:?}: {}", self.path, e);
        }
    }
}

/// Timestamp plus a v4 UUID, unique across concurrent requests sharing a directory.
fn scratch_prefix() -> String {
    format!("{}-{}-", Local::now().format("%Y%m%d%H%M%S"), Uuid::new_v4())
}
