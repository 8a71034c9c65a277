//! Batch image downloads.
//!
//! Each image is two requests: the category endpoint for a random image URL,
//! then the image itself. Downloaded bytes are checked with the `image`
//! crate before they are written, and consecutive images are paced by one
//! [`BackoffCalculator`] per batch.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use rand::Rng;

use crate::category::Category;
use crate::client::{BackoffCalculator, BackoffConfig, Client};
use crate::config::settings::DEFAULT_PACING_BASE;
use crate::{Error, Result};

/// One image written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub index: usize,
    pub source_url: String,
    pub path: PathBuf,
    pub format: ImageFormat,
}

impl SavedImage {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// File names of the saved images, in download order.
    pub names: Vec<String>,
    /// Absolute path of the target directory.
    pub directory: PathBuf,
}

/// Progress callbacks for a batch. Every method defaults to doing nothing.
pub trait DownloadObserver {
    fn started(&self, _category: Category, _amount: usize) {}

    fn fetching(&self, _index: usize, _url: &str) {}

    fn saved(&self, _image: &SavedImage) {}

    fn skipped(&self, _index: usize, _error: &Error) {}

    fn finished(&self, _report: &DownloadReport) {}
}

impl DownloadObserver for () {}

#[derive(Debug)]
pub struct Downloader {
    client: Client,
    pacing: BackoffConfig,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            pacing: BackoffConfig::new(DEFAULT_PACING_BASE, 30.0),
        }
    }

    pub fn with_pacing(mut self, pacing: BackoffConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn pacing(&self) -> &BackoffConfig {
        &self.pacing
    }

    /// Download `amount` images of `category` into `directory`.
    ///
    /// Images whose URL lookup, validation, or write fails are skipped and
    /// reported to `observer`; a failed image transfer ends the batch.
    #[tracing::instrument(skip(self, observer))]
    pub async fn download(
        &self,
        category: Category,
        amount: usize,
        directory: &Path,
        observer: &dyn DownloadObserver,
    ) -> Result<DownloadReport> {
        if !tokio::fs::metadata(directory)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            return Err(Error::PathNotFound(directory.to_path_buf()));
        }
        let directory = tokio::fs::canonicalize(directory).await?;
        let mut pacing = BackoffCalculator::new(&self.pacing)?;

        tracing::info!(
            category = %category,
            amount,
            directory = %directory.display(),
            "Starting download"
        );
        observer.started(category, amount);

        let mut report = DownloadReport {
            names: Vec::with_capacity(amount),
            directory,
        };

        for index in 0..amount {
            match self.download_one(category, index, &report.directory, observer).await {
                Ok(saved) => {
                    tracing::info!(index, path = %saved.path.display(), "Saved image");
                    report.names.push(saved.file_name());
                    observer.saved(&saved);
                }
                Err(Step::Skip(e)) => {
                    observer.skipped(index, &e);
                }
                Err(Step::Abort(e)) => {
                    tracing::error!(index, error = %e, "Image transfer failed, aborting batch");
                    return Err(e);
                }
            }

            if index + 1 < amount {
                let delay = pacing.next_delay();
                tracing::debug!(delay_ms = delay.as_millis() as u64, "Pausing before next image");
                tokio::time::sleep(delay).await;
            }
        }

        observer.finished(&report);
        Ok(report)
    }

    async fn download_one(
        &self,
        category: Category,
        index: usize,
        directory: &Path,
        observer: &dyn DownloadObserver,
    ) -> std::result::Result<SavedImage, Step> {
        let url = self.client.fetch_image_url(category).await.map_err(|e| {
            tracing::error!(category = %category, error = %e, "Could not get an image URL, skipping");
            Step::Skip(e)
        })?;
        observer.fetching(index, &url);

        let bytes = self.client.fetch_image(&url).await.map_err(Step::Abort)?;

        let format = sniff_format(&url, &bytes).map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Failed to load image, skipping");
            Step::Skip(e)
        })?;

        let path = directory.join(file_name(category, format));
        tokio::fs::write(&path, &bytes).await.map_err(|source| {
            let e = Error::ImageSave {
                path: path.clone(),
                source,
            };
            tracing::error!(error = %e, "Could not write image, skipping");
            Step::Skip(e)
        })?;

        Ok(SavedImage {
            index,
            source_url: url,
            path,
            format,
        })
    }
}

enum Step {
    Skip(Error),
    Abort(Error),
}

/// Detect the format from the content and make sure its header decodes.
fn sniff_format(url: &str, bytes: &[u8]) -> Result<ImageFormat> {
    let invalid = |reason: String| Error::InvalidImage {
        url: url.to_string(),
        reason,
    };

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| invalid(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| invalid("unrecognized image format".into()))?;
    reader
        .into_dimensions()
        .map_err(|e| invalid(e.to_string()))?;
    Ok(format)
}

fn file_name(category: Category, format: ImageFormat) -> String {
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let tag: u32 = rand::rng().random();
    format!("{}-image-{:08x}.{}", category.name(), tag, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(2, 2, Rgb([255u8, 128, 0]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniff_png() {
        let format = sniff_format("http://x/cat.png", &png_bytes()).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_sniff_rejects_non_image() {
        let err = sniff_format("http://x/cat", b"<html>not an image</html>").unwrap_err();
        assert!(matches!(err, Error::InvalidImage { ref url, .. } if url == "http://x/cat"));
    }

    #[test]
    fn test_sniff_rejects_truncated_image() {
        let bytes = png_bytes();
        assert!(sniff_format("http://x/cat.png", &bytes[..12]).is_err());
    }

    #[test]
    fn test_file_name_shape() {
        let name = file_name(Category::RedPandas, ImageFormat::Jpeg);
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "jpg");
        let tag = stem.strip_prefix("redpandas-image-").unwrap();
        assert_eq!(tag.len(), 8);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_missing_directory_is_rejected_before_any_request() {
        let client = Client::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .await
            .unwrap();
        let downloader = Downloader::new(client);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = downloader
            .download(Category::Cats, 1, &missing, &())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound(ref p) if p == &missing));
    }

    #[test]
    fn test_default_pacing() {
        let config = BackoffConfig::new(DEFAULT_PACING_BASE, 30.0);
        assert_eq!(config.base, 0.05);
        assert_eq!(config.maximum_tries, Some(5));
    }
}
