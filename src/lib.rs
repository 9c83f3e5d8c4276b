//! # pdf2img
//!
//! Preview the pages of a PDF, pick the ones you want, and export them as
//! PNG, JPEG or WebP images bundled into a zip archive.
//!
//! Parsing and rasterisation are delegated to pdfium (via `pdfium-render`),
//! image encoding to `image`, and archiving to `zip`. This crate owns the
//! parts in between: the page selection, the sequential conversion run with
//! its progress reporting, and the session state machine that ties them
//! together.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Load      declared-type check, pdfium parse (spawn_blocking)
//!  ├─ 2. Preview   0.5× thumbnails, page order, lazy stream
//!  ├─ 3. Select    toggle / select all / deselect all
//!  ├─ 4. Convert   per selected page: render → encode → add to zip
//!  └─ 5. Save      pdf-images-{timestamp}.zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{ImageFormat, NoopProgressCallback, PdfiumEngine, Session};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(PdfiumEngine::new());
//!     session.load_file(Path::new("document.pdf")).await?;
//!
//!     session.select_all();
//!     session.toggle(2)?; // everything but page 2
//!     session.set_format(ImageFormat::Jpeg);
//!     session.set_quality_percent(80);
//!
//!     let out = session.convert(Path::new("."), &NoopProgressCallback).await?;
//!     println!("{} images → {}", out.entries.len(), out.archive_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controls;
pub mod convert;
pub mod engine;
pub mod error;
pub mod notice;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod selection;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageFormat, PageSelection};
pub use controls::{control_state, progress_display, ControlState, ProgressDisplay};
pub use convert::{convert_pages, convert_to_dir, ConversionOutput, ConversionStats, ConvertedArchive};
pub use engine::{DocumentHandle, DocumentInfo, PdfEngine, PdfiumEngine};
pub use error::Pdf2ImgError;
pub use notice::{Notice, NoticeBoard, Severity, NOTICE_TTL};
pub use preview::{preview_stream, render_previews, Preview, PreviewStream, PREVIEW_SCALE};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, Progress};
pub use selection::Selection;
pub use session::{ConversionRun, PipelineState, RunStatus, Session, Settings};

/// Load a PDF from disk and report its metadata without rendering pages.
pub async fn inspect(
    engine: &dyn PdfEngine,
    path: &std::path::Path,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2ImgError> {
    let input = pipeline::input::read_input(path).await?;
    let doc = engine.load(&input.name, input.bytes, password).await?;
    Ok(doc.info().clone())
}
