//! Pipeline stages for page export.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ encode ──▶ archive ──▶ output
//! (file)   (render)   (png/jpeg/  (zip)      (pdf-images-*.zip)
//!                      webp)
//! ```
//!
//! 1. [`input`]   — check the declared type and read the file
//! 2. rendering is delegated to [`crate::engine`]
//! 3. [`encode`]  — turn each raster into image-file bytes
//! 4. [`archive`] — collect named entries into a zip blob
//! 5. [`output`]  — write the blob under a unique timestamped name

pub mod archive;
pub mod encode;
pub mod input;
pub mod output;
