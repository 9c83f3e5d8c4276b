//! Input boundary: accept one file and hand its bytes to the engine.
//!
//! The check here is only on the declared type: the file name's extension
//! (or a caller-supplied media type) must say `application/pdf`. Content is
//! not sniffed; the engine reports a load error for anything it cannot
//! parse.

use crate::error::Pdf2ImgError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Media type every accepted input must declare.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A file accepted at the boundary, read into memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// File name (no directories), used in notices and errors.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Media type implied by a file name, or `None` if the extension is unknown.
pub fn declared_type(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first_raw()
        .map(|m| m.to_string())
}

/// Reject anything not declared as a PDF.
///
/// `media_type` wins when given (a drag-and-drop payload carries one);
/// otherwise the type is guessed from `name`.
pub fn check_declared_pdf(name: &str, media_type: Option<&str>) -> Result<(), Pdf2ImgError> {
    let declared = match media_type {
        Some(m) => Some(m.trim().to_ascii_lowercase()),
        None => declared_type(name),
    };
    match declared {
        Some(ref m) if m == PDF_MEDIA_TYPE => Ok(()),
        other => Err(Pdf2ImgError::NotAPdf {
            name: name.to_string(),
            declared: other.unwrap_or_else(|| "an unknown type".to_string()),
        }),
    }
}

/// Validate and read a local file.
pub async fn read_input(path: &Path) -> Result<InputFile, Pdf2ImgError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    check_declared_pdf(&name, None)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Pdf2ImgError::FileNotFound {
            path: PathBuf::from(path),
        },
        std::io::ErrorKind::PermissionDenied => Pdf2ImgError::PermissionDenied {
            path: PathBuf::from(path),
        },
        _ => Pdf2ImgError::Internal(format!("reading '{}': {}", path.display(), e)),
    })?;

    debug!("Read {} ({} bytes)", name, bytes.len());
    Ok(InputFile { name, bytes })
}
