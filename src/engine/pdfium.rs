//! pdfium-backed [`PdfEngine`].
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and does CPU-heavy work. Every call runs on Tokio's blocking pool so
//! the async workers never stall on a render.
//!
//! Each blocking call binds pdfium and re-opens the document from the bytes
//! held by the handle. A handle is therefore plain data (`Send + Sync`) and
//! never carries a pdfium borrow across an `.await`.

use super::{scaled_size, DocumentHandle, DocumentInfo, PdfEngine};
use crate::error::Pdf2ImgError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or the directory
/// holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Loads documents through pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// Engine that binds the library named by `PDFIUM_LIB_PATH`, else one in
    /// the working directory, else the system library.
    pub fn new() -> Self {
        Self {
            library_path: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
        }
    }

    /// Engine bound to an explicit library file or directory.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Check that pdfium can be bound at all.
    pub async fn probe(&self) -> Result<(), Pdf2ImgError> {
        let lib = self.library_path.clone();
        tokio::task::spawn_blocking(move || bind_pdfium(lib.as_ref()).map(|_| ()))
            .await
            .map_err(|e| Pdf2ImgError::Internal(format!("Bind task panicked: {}", e)))?
    }
}

#[async_trait]
impl PdfEngine for PdfiumEngine {
    async fn load(
        &self,
        name: &str,
        bytes: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Arc<dyn DocumentHandle>, Pdf2ImgError> {
        let bytes = Arc::new(bytes);
        let lib = self.library_path.clone();
        let name_owned = name.to_string();
        let pwd = password.map(|s| s.to_string());
        let data = Arc::clone(&bytes);

        let info = tokio::task::spawn_blocking(move || {
            load_info_blocking(lib.as_ref(), &name_owned, &data, pwd.as_deref())
        })
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Load task panicked: {}", e)))??;

        info!("PDF loaded: '{}' ({} pages)", info.name, info.page_count);

        Ok(Arc::new(PdfiumDocument {
            info,
            bytes,
            password: password.map(|s| s.to_string()),
            library_path: self.library_path.clone(),
        }))
    }
}

/// A document opened through [`PdfiumEngine`].
pub struct PdfiumDocument {
    info: DocumentInfo,
    bytes: Arc<Vec<u8>>,
    password: Option<String>,
    library_path: Option<PathBuf>,
}

#[async_trait]
impl DocumentHandle for PdfiumDocument {
    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    async fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage, Pdf2ImgError> {
        let bytes = Arc::clone(&self.bytes);
        let pwd = self.password.clone();
        let lib = self.library_path.clone();
        let name = self.info.name.clone();

        tokio::task::spawn_blocking(move || {
            render_page_blocking(lib.as_ref(), &name, &bytes, pwd.as_deref(), page, scale)
        })
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Bind pdfium from an explicit path, the working directory, or the system.
fn bind_pdfium(library_path: Option<&PathBuf>) -> Result<Pdfium, Pdf2ImgError> {
    let bindings = match library_path {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(path)
            } else {
                path.clone()
            };
            Pdfium::bind_to_library(lib)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Map a pdfium open error to a load error, telling password problems apart.
fn open_error(name: &str, password: Option<&str>, e: PdfiumError) -> Pdf2ImgError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2ImgError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            Pdf2ImgError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        Pdf2ImgError::CorruptPdf {
            name: name.to_string(),
            detail: err_str,
        }
    }
}

fn load_info_blocking(
    library_path: Option<&PathBuf>,
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2ImgError> {
    let pdfium = bind_pdfium(library_path)?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| open_error(name, password, e))?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    let page_count = document.pages().len() as usize;
    if page_count == 0 {
        return Err(Pdf2ImgError::CorruptPdf {
            name: name.to_string(),
            detail: "document has no pages".into(),
        });
    }

    Ok(DocumentInfo {
        name: name.to_string(),
        page_count,
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        pdf_version: format!("{:?}", document.version()),
    })
}

fn render_page_blocking(
    library_path: Option<&PathBuf>,
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
    page: usize,
    scale: f32,
) -> Result<DynamicImage, Pdf2ImgError> {
    let pdfium = bind_pdfium(library_path)?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| open_error(name, password, e))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if page == 0 || page > total {
        return Err(Pdf2ImgError::PageOutOfRange { page, total });
    }

    let pdf_page = pages
        .get((page - 1) as u16)
        .map_err(|e| Pdf2ImgError::RasterisationFailed {
            page,
            detail: format!("{:?}", e),
        })?;

    let (width, height) = scaled_size(pdf_page.width().value, pdf_page.height().value, scale);
    let render_config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_target_height(height as i32);

    let bitmap = pdf_page
        .render_with_config(&render_config)
        .map_err(|e| Pdf2ImgError::RasterisationFailed {
            page,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} at {:.2}× → {}x{} px",
        page,
        scale,
        image.width(),
        image.height()
    );

    Ok(image)
}
