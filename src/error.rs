//! Error type for the pdf2img library.
//!
//! Every failure in this crate is terminal for the operation that raised it:
//! a bad file aborts the load, a bad page aborts the preview build or the
//! whole conversion run, and a failed archive write discards the archive.
//! There is no per-page "partial success" type: a run either produces a
//! complete archive or nothing at all.
//!
//! Each variant renders as a single human-readable line suitable for a
//! transient notice (see [`crate::notice`]).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file name or declared media type is not `application/pdf`.
    #[error("Please choose a PDF file ('{name}' is {declared})")]
    NotAPdf { name: String, declared: String },

    /// A conversion was requested with no pages selected.
    #[error("Select at least one page to convert")]
    EmptySelection,

    /// An operation needs a loaded document but none is installed.
    #[error("No PDF document is loaded")]
    NoDocument,

    /// A page number outside `1..=total` was used.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Load errors ───────────────────────────────────────────────────────
    /// The PDF engine could not parse the document.
    #[error("Failed to load PDF '{name}': {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Per-page errors ───────────────────────────────────────────────────
    /// The engine failed to rasterise a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rasterised page could not be encoded in the requested format.
    #[error("Encoding page {page} as {format} failed: {detail}")]
    EncodeFailed {
        page: usize,
        format: String,
        detail: String,
    },

    // ── Archive / output errors ───────────────────────────────────────────
    /// Adding an entry to or finalising the zip archive failed.
    #[error("Failed to build archive: {0}")]
    ArchiveFailed(String),

    /// Could not write the archive (or a preview) to disk.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Control errors ────────────────────────────────────────────────────
    /// A conversion run is already active.
    #[error("A conversion is already running")]
    ConversionInProgress,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for Pdf2ImgError {
    fn from(e: zip::result::ZipError) -> Self {
        Pdf2ImgError::ArchiveFailed(e.to_string())
    }
}

impl Pdf2ImgError {
    /// The page this error is attached to, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            Pdf2ImgError::PageOutOfRange { page, .. }
            | Pdf2ImgError::RasterisationFailed { page, .. }
            | Pdf2ImgError::EncodeFailed { page, .. } => Some(*page),
            _ => None,
        }
    }
}
