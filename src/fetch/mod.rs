// Fetcher - downloads source images and decodes them by content sniffing
mod error;
mod scratch;

pub use error::FetchError;
pub use scratch::ScratchFile;

use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::FetchConfig;

/// A decoded download together with the guard for its on-disk copy.
pub struct Download {
    pub image: DynamicImage,
    scratch: ScratchFile,
}

impl Download {
    pub fn scratch_path(&self) -> &std::path::Path {
        self.scratch.path()
    }

    /// Split into the image and the scratch guard; drop the guard once the
    /// request no longer needs the download.
    pub fn into_parts(self) -> (DynamicImage, ScratchFile) {
        (self.image, self.scratch)
    }
}

pub struct Fetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    max_download_bytes: u64,
    temp_directory: PathBuf,
    keep_downloads: bool,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
            max_download_bytes: config.max_download_bytes,
            temp_directory: config.temp_directory.clone(),
            keep_downloads: config.keep_downloads,
        })
    }

    /// Download `url` once, spool it to scratch space and decode it.
    ///
    /// The format is sniffed from the bytes, never from the URL. There are no
    /// retries; any failure ends the request.
    pub async fn fetch(&self, url: &str) -> Result<Download, FetchError> {
        let parsed = parse_image_url(url)?;
        info!("Downloading image from: {}", parsed);

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        if response
            .content_length()
            .is_some_and(|length| length > self.max_download_bytes)
        {
            return Err(self.too_large(url));
        }

        // Content-Length may be absent or wrong, so the cap is enforced while reading
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_error(url, e))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_download_bytes {
                return Err(self.too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        let directory = self.temp_directory.clone();
        let keep = self.keep_downloads;
        let owned_url = url.to_string();

        // Disk I/O and decoding are blocking; a decode failure drops the guard here
        tokio::task::spawn_blocking(move || {
            let scratch = ScratchFile::create(&directory, &bytes, keep)?;
            let image = decode_image(&bytes).map_err(|source| FetchError::Decode {
                url: owned_url,
                source,
            })?;
            Ok::<_, FetchError>(Download { image, scratch })
        })
        .await?
    }

    fn too_large(&self, url: &str) -> FetchError {
        FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_download_bytes,
        }
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// Only absolute http(s) URLs are fetched.
pub fn parse_image_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
}
