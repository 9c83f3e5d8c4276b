//! In-memory zip archive of exported pages.
//!
//! Entries are stored without compression: PNG, JPEG and WebP payloads are
//! already compressed and deflating them again only costs time.

use crate::config::ImageFormat;
use crate::error::Pdf2ImgError;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive entry name for a page: `page-{n}.{ext}`.
pub fn entry_name(page: usize, format: ImageFormat) -> String {
    format!("page-{}.{}", page, format.extension())
}

/// Accumulates named entries and finalises them into one zip blob.
///
/// Dropping a builder without calling [`ArchiveBuilder::finish`] discards
/// everything added so far.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: Vec<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: Vec::new(),
        }
    }

    /// Append an entry. Names must be unique within one archive.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
        if self.names.iter().any(|n| n == name) {
            return Err(Pdf2ImgError::ArchiveFailed(format!(
                "duplicate entry '{name}'"
            )));
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.writer.start_file(name, options)?;
        self.writer
            .write_all(bytes)
            .map_err(|e| Pdf2ImgError::ArchiveFailed(format!("writing '{name}': {e}")))?;
        self.names.push(name.to_string());
        Ok(())
    }

    /// Entry names in the order they were added.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write the central directory and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, Pdf2ImgError> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}
