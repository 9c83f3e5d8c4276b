//! The conversion run: selected pages → encoded images → zip archive.
//!
//! Pages are processed strictly one after another: page *k* is rendered,
//! encoded and added to the archive before page *k + 1* is requested from
//! the engine. Progress therefore only ever moves forward, one step per page,
//! and reaches exactly `total / total` before the archive is finalised.
//!
//! Any failure aborts the run. The partially built archive is dropped and
//! nothing is written.

use crate::config::ConversionConfig;
use crate::engine::DocumentHandle;
use crate::error::Pdf2ImgError;
use crate::pipeline::archive::{entry_name, ArchiveBuilder};
use crate::pipeline::encode::encode_image;
use crate::pipeline::output::save_archive;
use crate::progress::{ConversionProgressCallback, Progress};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// A finalised archive still held in memory.
#[derive(Debug, Clone)]
pub struct ConvertedArchive {
    /// Zip bytes.
    pub bytes: Vec<u8>,
    /// Entry names in processing order.
    pub entries: Vec<String>,
    pub stats: ConversionStats,
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub pages: usize,
    /// Encoded image bytes across all entries.
    pub image_bytes: u64,
    pub archive_bytes: u64,
    pub render_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Outcome of a successful run that was written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub archive_path: PathBuf,
    pub entries: Vec<String>,
    pub config: ConversionConfig,
    pub stats: ConversionStats,
}

/// Render, encode and archive `pages` in the given order.
///
/// `config` is used as given for the whole run; callers pass a snapshot.
pub async fn convert_pages(
    doc: &dyn DocumentHandle,
    pages: &[usize],
    config: &ConversionConfig,
    progress: &dyn ConversionProgressCallback,
) -> Result<ConvertedArchive, Pdf2ImgError> {
    let start = Instant::now();
    let total = pages.len();
    if total == 0 {
        return Err(Pdf2ImgError::EmptySelection);
    }
    let page_count = doc.page_count();
    if let Some(&bad) = pages.iter().find(|&&p| p == 0 || p > page_count) {
        return Err(Pdf2ImgError::PageOutOfRange {
            page: bad,
            total: page_count,
        });
    }

    info!(
        "Converting {} pages to {} (quality {}%, scale {}%)",
        total,
        config.format,
        config.quality_percent(),
        config.scale_percent()
    );
    progress.on_conversion_start(total);

    let mut archive = ArchiveBuilder::new();
    let mut stats = ConversionStats {
        pages: total,
        ..ConversionStats::default()
    };

    for (i, &page) in pages.iter().enumerate() {
        progress.on_page_start(page, i + 1, total);

        let render_start = Instant::now();
        let img = doc.render_page(page, config.scale).await?;
        stats.render_duration_ms += render_start.elapsed().as_millis() as u64;

        let encode_start = Instant::now();
        let bytes =
            encode_image(&img, config.format, config.quality).map_err(|e| Pdf2ImgError::EncodeFailed {
                page,
                format: config.format.to_string(),
                detail: e.to_string(),
            })?;
        stats.encode_duration_ms += encode_start.elapsed().as_millis() as u64;
        stats.image_bytes += bytes.len() as u64;

        let name = entry_name(page, config.format);
        archive.add(&name, &bytes)?;
        debug!("Added {} ({} bytes)", name, bytes.len());

        progress.on_progress(Progress {
            page,
            processed: i + 1,
            total,
        });
    }

    progress.on_finalizing(archive.len());
    let entries = archive.names().to_vec();
    let bytes = archive.finish()?;
    stats.archive_bytes = bytes.len() as u64;
    stats.total_duration_ms = start.elapsed().as_millis() as u64;

    Ok(ConvertedArchive {
        bytes,
        entries,
        stats,
    })
}

/// [`convert_pages`] followed by writing the archive into `out_dir`.
pub async fn convert_to_dir(
    doc: &dyn DocumentHandle,
    pages: &[usize],
    config: &ConversionConfig,
    out_dir: &Path,
    progress: &dyn ConversionProgressCallback,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let start = Instant::now();
    let converted = convert_pages(doc, pages, config, progress).await?;
    let archive_path = save_archive(converted.bytes, out_dir).await?;

    let mut stats = converted.stats;
    stats.total_duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} pages, {} bytes, {}ms → {}",
        stats.pages,
        stats.archive_bytes,
        stats.total_duration_ms,
        archive_path.display()
    );

    Ok(ConversionOutput {
        archive_path,
        entries: converted.entries,
        config: config.clone(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageFormat;
    use crate::engine::DocumentInfo;
    use crate::progress::NoopProgressCallback;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::sync::Mutex;

    struct Pages {
        info: DocumentInfo,
        rendered: Mutex<Vec<(usize, f32)>>,
    }

    impl Pages {
        fn new(n: usize) -> Self {
            Self {
                info: DocumentInfo::new("t.pdf", n),
                rendered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentHandle for Pages {
        fn info(&self) -> &DocumentInfo {
            &self.info
        }

        async fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage, Pdf2ImgError> {
            self.rendered.lock().unwrap().push((page, scale));
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                8,
                8,
                Rgba([200, 10, 10, 255]),
            )))
        }
    }

    #[tokio::test]
    async fn renders_in_given_order_with_snapshot_scale() {
        let doc = Pages::new(5);
        let config = ConversionConfig::builder()
            .format(ImageFormat::Jpeg)
            .scale_percent(200)
            .build()
            .unwrap();

        let out = convert_pages(&doc, &[4, 2], &config, &NoopProgressCallback)
            .await
            .unwrap();

        assert_eq!(out.entries, vec!["page-4.jpeg", "page-2.jpeg"]);
        assert_eq!(*doc.rendered.lock().unwrap(), vec![(4, 2.0), (2, 2.0)]);
        assert_eq!(out.stats.pages, 2);
        assert!(out.stats.image_bytes > 0);
        assert_eq!(out.stats.archive_bytes, out.bytes.len() as u64);
    }

    #[tokio::test]
    async fn empty_page_list_is_rejected() {
        let doc = Pages::new(2);
        let err = convert_pages(&doc, &[], &ConversionConfig::default(), &NoopProgressCallback)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::EmptySelection));
        assert!(doc.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_page_is_rejected_before_rendering() {
        let doc = Pages::new(2);
        let err = convert_pages(&doc, &[1, 3], &ConversionConfig::default(), &NoopProgressCallback)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::PageOutOfRange { page: 3, total: 2 }));
        assert!(doc.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn convert_to_dir_writes_zip() {
        let doc = Pages::new(1);
        let dir = tempfile::tempdir().unwrap();
        let out = convert_to_dir(
            &doc,
            &[1],
            &ConversionConfig::default(),
            dir.path(),
            &NoopProgressCallback,
        )
        .await
        .unwrap();
        assert!(out.archive_path.exists());
        assert_eq!(out.entries, vec!["page-1.png"]);
        assert_eq!(out.config.format, ImageFormat::Png);
    }
}
