//! Page thumbnails, produced lazily in page order.
//!
//! [`preview_stream`] yields one [`Preview`] per page, `1..=page_count`,
//! rendering each page only when the consumer asks for it. A render or
//! encode failure is yielded once and ends the stream: a preview set is
//! either complete or abandoned, never patchy.

use crate::config::ImageFormat;
use crate::engine::DocumentHandle;
use crate::error::Pdf2ImgError;
use crate::pipeline::encode::encode_image;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::debug;

/// Scale used for thumbnails, relative to the native page size.
pub const PREVIEW_SCALE: f32 = 0.5;

/// A PNG thumbnail of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// 1-indexed page number.
    pub page: usize,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded thumbnail.
    pub png: Vec<u8>,
}

impl Preview {
    /// `data:image/png;base64,…` URL for embedding the thumbnail directly.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            ImageFormat::Png.mime_type(),
            STANDARD.encode(&self.png)
        )
    }

    /// File name used when thumbnails are written to disk.
    pub fn file_name(&self) -> String {
        format!("preview-{}.png", self.page)
    }
}

/// A boxed stream of previews.
pub type PreviewStream = Pin<Box<dyn Stream<Item = Result<Preview, Pdf2ImgError>> + Send>>;

/// Lazily render thumbnails of every page in ascending order.
pub fn preview_stream(doc: Arc<dyn DocumentHandle>, scale: f32) -> PreviewStream {
    let total = doc.page_count();

    // State: (document, next page, failed already)
    let s = stream::unfold((doc, 1usize, false), move |(doc, page, failed)| async move {
        if failed || page > total {
            return None;
        }
        match render_preview(doc.as_ref(), page, scale).await {
            Ok(p) => Some((Ok(p), (doc, page + 1, false))),
            Err(e) => Some((Err(e), (doc, page + 1, true))),
        }
    });

    Box::pin(s)
}

/// Render every thumbnail, aborting on the first failure.
pub async fn render_previews(
    doc: Arc<dyn DocumentHandle>,
    scale: f32,
) -> Result<Vec<Preview>, Pdf2ImgError> {
    preview_stream(doc, scale).try_collect().await
}

/// Write thumbnails into `dir` as `preview-{n}.png`.
pub async fn write_previews(previews: &[Preview], dir: &Path) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    stream::iter(previews)
        .then(|p| async move {
            let path = dir.join(p.file_name());
            tokio::fs::write(&path, &p.png)
                .await
                .map_err(|e| Pdf2ImgError::OutputWriteFailed {
                    path: path.clone(),
                    source: e,
                })?;
            Ok::<_, Pdf2ImgError>(path)
        })
        .try_collect()
        .await
}

async fn render_preview(
    doc: &dyn DocumentHandle,
    page: usize,
    scale: f32,
) -> Result<Preview, Pdf2ImgError> {
    let img = doc.render_page(page, scale).await?;
    let png = encode_image(&img, ImageFormat::Png, 1.0).map_err(|e| Pdf2ImgError::EncodeFailed {
        page,
        format: ImageFormat::Png.to_string(),
        detail: e.to_string(),
    })?;
    debug!("Preview page {} → {}x{}", page, img.width(), img.height());
    Ok(Preview {
        page,
        width: img.width(),
        height: img.height(),
        png,
    })
}
