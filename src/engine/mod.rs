//! The PDF engine seam.
//!
//! Parsing and rasterisation are not done by this crate. [`PdfEngine`] turns
//! raw bytes into a [`DocumentHandle`], and the handle renders single pages
//! at a given scale. [`pdfium::PdfiumEngine`] is the production
//! implementation; tests substitute in-memory engines.

pub mod pdfium;

use crate::error::Pdf2ImgError;
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use self::pdfium::PdfiumEngine;

/// Document-level facts known right after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Name the document was loaded under (file name, not a path).
    pub name: String,
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub pdf_version: String,
}

impl DocumentInfo {
    /// Bare info for a document with `page_count` pages.
    pub fn new(name: impl Into<String>, page_count: usize) -> Self {
        Self {
            name: name.into(),
            page_count,
            ..Self::default()
        }
    }
}

/// A loaded, parsed PDF.
///
/// Callers must not issue overlapping `render_page` calls on one handle;
/// the pipeline and preview renderer always await each page before asking
/// for the next.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    fn info(&self) -> &DocumentInfo;

    fn page_count(&self) -> usize {
        self.info().page_count
    }

    /// Rasterise 1-indexed `page` at `scale` × the page's native size.
    async fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage, Pdf2ImgError>;
}

/// Parses PDF bytes into document handles.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn load(
        &self,
        name: &str,
        bytes: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Arc<dyn DocumentHandle>, Pdf2ImgError>;
}

/// Pixel size of a page of `width_pt` × `height_pt` points rendered at
/// `scale`, never smaller than 1 × 1.
pub fn scaled_size(width_pt: f32, height_pt: f32, scale: f32) -> (u32, u32) {
    let w = (width_pt * scale).round().max(1.0) as u32;
    let h = (height_pt * scale).round().max(1.0) as u32;
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_size_rounds_and_floors_at_one() {
        // US Letter at 100 %
        assert_eq!(scaled_size(612.0, 792.0, 1.0), (612, 792));
        // A4 thumbnail at 50 %
        assert_eq!(scaled_size(595.0, 842.0, 0.5), (298, 421));
        assert_eq!(scaled_size(1.0, 1.0, 0.1), (1, 1));
    }

    #[test]
    fn info_new_defaults() {
        let info = DocumentInfo::new("a.pdf", 3);
        assert_eq!(info.page_count, 3);
        assert_eq!(info.name, "a.pdf");
        assert!(info.title.is_none());
    }
}
