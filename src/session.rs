//! The interactive session: one loaded document, its thumbnails, the page
//! selection, the user's export settings and the conversion state machine.
//!
//! ```text
//!            start_conversion()                 all pages archived
//!   Idle ───────────────────────▶ Running ───────────────────────▶ Finalizing
//!    ▲  (selection non-empty)       │                                  │
//!    │                              │ any error                        │ archive written
//!    │                              ▼                                  │
//!    └──────────────────────────  Failed ◀── write error ──────────────┤
//!    └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session owns everything; there is no ambient state. A run is started
//! with [`Session::start_conversion`], which snapshots the settings, the
//! selection order and the document into an owned [`ConversionRun`]. The run
//! does not borrow the session, so the session stays usable (selection,
//! settings) while the run executes; starting a second run, loading another
//! file or clearing the session is rejected until the run ends.
//!
//! Run state and progress are published on a `tokio::sync::watch` channel
//! ([`Session::subscribe`]).

use crate::config::{ConversionConfig, ImageFormat, PageSelection, MAX_SCALE_PERCENT, MIN_SCALE_PERCENT};
use crate::controls::{control_state, progress_display, ControlState, ProgressDisplay};
use crate::convert::{convert_pages, ConversionOutput};
use crate::engine::{DocumentHandle, DocumentInfo, PdfEngine};
use crate::error::Pdf2ImgError;
use crate::notice::{Notice, NoticeBoard};
use crate::pipeline::input::{check_declared_pdf, read_input};
use crate::pipeline::output::save_archive;
use crate::preview::{render_previews, Preview, PREVIEW_SCALE};
use crate::progress::{ConversionProgressCallback, Progress};
use crate::selection::Selection;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, warn};

/// Conversion pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    Finalizing,
    Failed,
}

/// Snapshot published on the status channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunStatus {
    pub state: PipelineState,
    pub progress: Progress,
}

impl RunStatus {
    /// Running or finalising.
    pub fn is_active(&self) -> bool {
        matches!(self.state, PipelineState::Running | PipelineState::Finalizing)
    }
}

/// User-adjustable export settings, as the controls show them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub format: ImageFormat,
    /// 1–100.
    pub quality_percent: u8,
    /// Percent of the native page size.
    pub scale_percent: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality_percent: 92,
            scale_percent: 100,
        }
    }
}

impl Settings {
    /// The [`ConversionConfig`] these settings describe.
    pub fn to_config(&self) -> Result<ConversionConfig, Pdf2ImgError> {
        ConversionConfig::builder()
            .format(self.format)
            .quality_percent(self.quality_percent)
            .scale_percent(self.scale_percent)
            .build()
    }
}

/// Owner of all session state.
pub struct Session {
    engine: Arc<dyn PdfEngine>,
    document: Option<Arc<dyn DocumentHandle>>,
    previews: Vec<Preview>,
    selection: Selection,
    settings: Settings,
    password: Option<String>,
    status: Arc<watch::Sender<RunStatus>>,
    notices: NoticeBoard,
}

impl Session {
    pub fn new(engine: impl PdfEngine + 'static) -> Self {
        Self::with_engine(Arc::new(engine))
    }

    pub fn with_engine(engine: Arc<dyn PdfEngine>) -> Self {
        let (status, _) = watch::channel(RunStatus::default());
        Self {
            engine,
            document: None,
            previews: Vec::new(),
            selection: Selection::default(),
            settings: Settings::default(),
            password: None,
            status: Arc::new(status),
            notices: NoticeBoard::default(),
        }
    }

    // ── Document lifecycle ───────────────────────────────────────────────

    /// Password used for the next load.
    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    /// Load a PDF from disk. See [`Session::load_bytes`].
    pub async fn load_file(&mut self, path: &Path) -> Result<&DocumentInfo, Pdf2ImgError> {
        self.ensure_idle()?;
        let input = match read_input(path).await {
            Ok(input) => input,
            Err(e) => return Err(self.fail(e)),
        };
        self.load_bytes(&input.name, None, input.bytes).await
    }

    /// Load a PDF from memory and build its thumbnails.
    ///
    /// The new document replaces the current one only once it has loaded
    /// and every thumbnail has rendered; on any failure the session is left
    /// as it was. A successful load always starts with an empty selection.
    pub async fn load_bytes(
        &mut self,
        name: &str,
        media_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<&DocumentInfo, Pdf2ImgError> {
        self.ensure_idle()?;
        if let Err(e) = check_declared_pdf(name, media_type) {
            return Err(self.fail(e));
        }

        self.notices.post(Notice::info("Loading PDF…"));
        let doc = match self.engine.load(name, bytes, self.password.as_deref()).await {
            Ok(doc) => doc,
            Err(e) => return Err(self.fail(e)),
        };

        self.notices.post(Notice::info("Generating previews…"));
        let previews = match render_previews(Arc::clone(&doc), PREVIEW_SCALE).await {
            Ok(p) => p,
            Err(e) => return Err(self.fail(e)),
        };

        let page_count = doc.page_count();
        self.previews = previews;
        self.selection.reset(page_count);
        self.status.send_replace(RunStatus::default());
        self.notices
            .post(Notice::info(format!("Loaded {page_count} pages")));

        Ok(self.document.insert(doc).info())
    }

    /// Unload the document, its thumbnails and the selection.
    pub fn clear(&mut self) -> Result<(), Pdf2ImgError> {
        self.ensure_idle()?;
        self.document = None;
        self.previews.clear();
        self.selection.clear();
        self.status.send_replace(RunStatus::default());
        info!("Session cleared");
        Ok(())
    }

    pub fn document_info(&self) -> Option<&DocumentInfo> {
        self.document.as_ref().map(|d| d.info())
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    // ── Selection ────────────────────────────────────────────────────────

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle(&mut self, page: usize) -> Result<bool, Pdf2ImgError> {
        self.selection.toggle(page)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Add the pages named by `expr`; returns how many were added.
    pub fn select(&mut self, expr: &PageSelection) -> usize {
        self.selection.apply(expr)
    }

    // ── Settings ─────────────────────────────────────────────────────────

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_format(&mut self, format: ImageFormat) {
        self.settings.format = format;
    }

    /// Clamped to 1–100.
    pub fn set_quality_percent(&mut self, percent: u8) {
        self.settings.quality_percent = percent.clamp(1, 100);
    }

    /// Clamped to the accepted scale range.
    pub fn set_scale_percent(&mut self, percent: u32) {
        self.settings.scale_percent = percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT);
    }

    // ── Observable state ─────────────────────────────────────────────────

    pub fn status(&self) -> RunStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.status().is_active()
    }

    pub fn controls(&self) -> ControlState {
        control_state(!self.selection.is_empty(), self.is_running())
    }

    pub fn progress_display(&self) -> ProgressDisplay {
        let status = self.status();
        progress_display(status.is_active(), status.progress)
    }

    /// Notices still visible now.
    pub fn notices(&mut self) -> &[Notice] {
        self.notices.active(Instant::now())
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.latest()
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Begin a run over the current selection.
    ///
    /// Rejected with [`Pdf2ImgError::EmptySelection`] when nothing is
    /// selected and [`Pdf2ImgError::ConversionInProgress`] while another run
    /// is active; neither changes the run state.
    pub fn start_conversion(&mut self) -> Result<ConversionRun, Pdf2ImgError> {
        self.ensure_idle()?;
        if self.selection.is_empty() {
            return Err(self.fail(Pdf2ImgError::EmptySelection));
        }
        let Some(doc) = self.document.clone() else {
            return Err(self.fail(Pdf2ImgError::NoDocument));
        };
        let config = match self.settings.to_config() {
            Ok(c) => c,
            Err(e) => return Err(self.fail(e)),
        };
        let pages = self.selection.pages();

        self.status.send_replace(RunStatus {
            state: PipelineState::Running,
            progress: Progress::start(pages.len()),
        });
        info!("Run started: {} pages", pages.len());

        Ok(ConversionRun {
            doc,
            pages,
            config,
            status: Arc::clone(&self.status),
            finished: false,
        })
    }

    /// Post the notice for a finished run.
    pub fn finish_conversion(&mut self, result: &Result<ConversionOutput, Pdf2ImgError>) {
        match result {
            Ok(out) => self.notices.post(Notice::info(format!(
                "Conversion complete: {} pages → {}",
                out.entries.len(),
                out.archive_path.display()
            ))),
            Err(e) => self
                .notices
                .post(Notice::error(format!("Conversion failed: {e}"))),
        }
    }

    /// Start, execute and report a run in one call.
    pub async fn convert(
        &mut self,
        out_dir: &Path,
        progress: &dyn ConversionProgressCallback,
    ) -> Result<ConversionOutput, Pdf2ImgError> {
        let run = self.start_conversion()?;
        let result = run.execute(out_dir, progress).await;
        self.finish_conversion(&result);
        result
    }

    fn ensure_idle(&mut self) -> Result<(), Pdf2ImgError> {
        if self.is_running() {
            warn!("Rejected: a conversion is running");
            return Err(self.fail(Pdf2ImgError::ConversionInProgress));
        }
        Ok(())
    }

    /// Post `e` as an error notice and hand it back.
    fn fail(&mut self, e: Pdf2ImgError) -> Pdf2ImgError {
        self.notices.post(Notice::error(e.to_string()));
        e
    }
}

/// One in-flight conversion, detached from the [`Session`] that started it.
///
/// Dropping a run before [`ConversionRun::execute`] completes returns the
/// session to Idle.
pub struct ConversionRun {
    doc: Arc<dyn DocumentHandle>,
    pages: Vec<usize>,
    config: ConversionConfig,
    status: Arc<watch::Sender<RunStatus>>,
    finished: bool,
}

impl ConversionRun {
    /// Pages this run will process, in order.
    pub fn pages(&self) -> &[usize] {
        &self.pages
    }

    /// The settings snapshot taken at start.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Process every page, then write the archive into `out_dir`.
    pub async fn execute(
        mut self,
        out_dir: &Path,
        progress: &dyn ConversionProgressCallback,
    ) -> Result<ConversionOutput, Pdf2ImgError> {
        let forward = StatusForwarder {
            status: &self.status,
            inner: progress,
        };

        let result = async {
            let converted =
                convert_pages(self.doc.as_ref(), &self.pages, &self.config, &forward).await?;
            let archive_path = save_archive(converted.bytes, out_dir).await?;
            Ok::<_, Pdf2ImgError>(ConversionOutput {
                archive_path,
                entries: converted.entries,
                config: self.config.clone(),
                stats: converted.stats,
            })
        }
        .await;

        match &result {
            Ok(out) => {
                info!("Run finished: {}", out.archive_path.display());
                progress.on_conversion_end(None);
            }
            Err(e) => {
                warn!("Run failed: {e}");
                self.status.send_modify(|s| s.state = PipelineState::Failed);
                progress.on_conversion_end(Some(e.to_string().as_str()));
            }
        }

        self.status.send_modify(|s| s.state = PipelineState::Idle);
        self.finished = true;
        result
    }
}

impl Drop for ConversionRun {
    fn drop(&mut self) {
        if !self.finished {
            self.status.send_modify(|s| s.state = PipelineState::Idle);
        }
    }
}

/// Mirrors pipeline events onto the status channel before passing them on.
struct StatusForwarder<'a> {
    status: &'a watch::Sender<RunStatus>,
    inner: &'a dyn ConversionProgressCallback,
}

impl ConversionProgressCallback for StatusForwarder<'_> {
    fn on_conversion_start(&self, total_pages: usize) {
        self.status.send_modify(|s| s.progress = Progress::start(total_pages));
        self.inner.on_conversion_start(total_pages);
    }

    fn on_page_start(&self, page_num: usize, index: usize, total: usize) {
        self.inner.on_page_start(page_num, index, total);
    }

    fn on_progress(&self, progress: Progress) {
        self.status.send_modify(|s| s.progress = progress);
        self.inner.on_progress(progress);
    }

    fn on_finalizing(&self, entries: usize) {
        self.status.send_modify(|s| s.state = PipelineState::Finalizing);
        self.inner.on_finalizing(entries);
    }
}
