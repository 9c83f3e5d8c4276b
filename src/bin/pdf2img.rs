//! CLI binary for pdf2img.
//!
//! A thin shim over [`pdf2img::Session`]: load one PDF, optionally dump its
//! thumbnails, select pages from flags, and export them to a zip archive.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2img::preview::write_previews;
use pdf2img::{
    inspect, ConversionProgressCallback, ImageFormat, NoopProgressCallback, PageSelection,
    PdfiumEngine, Progress, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(0); // length set in on_conversion_start
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            page_started: Mutex::new(None),
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {percent:>3}%  {pos}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Exporting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _index: usize, _total: usize) {
        *self.page_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_progress(&self, progress: Progress) {
        let elapsed_ms = self
            .page_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}  {:<5}  {}",
            green("✓"),
            progress.page,
            dim(&format!("{:>3}%", progress.percent())),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.set_position(progress.processed as u64);
    }

    fn on_finalizing(&self, entries: usize) {
        self.bar.set_prefix("Finalizing");
        self.bar.set_message(format!("writing {entries} entries"));
    }

    fn on_conversion_end(&self, error: Option<&str>) {
        self.bar.finish_and_clear();
        if let Some(e) = error {
            let msg = if e.chars().count() > 80 {
                format!("{}\u{2026}", e.chars().take(79).collect::<String>())
            } else {
                e.to_string()
            };
            eprintln!("{} {}", red("✘"), red(&msg));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page as PNG at native size, archive in the current directory
  pdf2img document.pdf

  # Pages 1 and 3 as JPEG at 80% quality
  pdf2img --pages 1,3 --format jpeg --quality 80 document.pdf

  # All pages except page 2, doubled resolution, into ./out
  pdf2img --pages all --exclude 2 --scale 200 -o out document.pdf

  # Write thumbnails only (no export)
  pdf2img --previews thumbs --pages none document.pdf

  # Inspect PDF metadata
  pdf2img --inspect-only document.pdf

  # JSON summary of the run
  pdf2img --json document.pdf > run.json

OUTPUT:
  One archive per run, named pdf-images-<unix-millis>.zip, holding one
  image per selected page: page-<n>.<png|jpeg|webp>.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override the log filter
"#;

/// Export selected PDF pages as images in a zip archive.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Export selected PDF pages as PNG/JPEG/WebP images in a zip archive",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to load.
    input: PathBuf,

    /// Directory the archive is written to.
    #[arg(short, long, env = "PDF2IMG_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Output image format: png, jpeg (or jpg), webp.
    #[arg(short, long, env = "PDF2IMG_FORMAT", default_value = "png",
          value_parser = parse_format)]
    format: ImageFormat,

    /// Encoder quality in percent (JPEG and WebP; PNG ignores it).
    #[arg(long, env = "PDF2IMG_QUALITY", default_value_t = 92,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Render scale in percent of the native page size.
    #[arg(long, env = "PDF2IMG_SCALE", default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(10..=500))]
    scale: u32,

    /// Pages to select: all, none, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2IMG_PAGES", default_value = "all")]
    pages: String,

    /// Pages to deselect afterwards (same syntax as --pages).
    #[arg(long, env = "PDF2IMG_EXCLUDE")]
    exclude: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Write page thumbnails (preview-<n>.png) into this directory.
    #[arg(long, env = "PDF2IMG_PREVIEWS")]
    previews: Option<PathBuf>,

    /// pdfium library file or directory (overrides PDFIUM_LIB_PATH).
    #[arg(long)]
    pdfium_lib: Option<PathBuf>,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary instead of human-readable output.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

fn parse_format(s: &str) -> Result<ImageFormat, String> {
    s.parse().map_err(|_| {
        let known: Vec<&str> = ImageFormat::ALL.iter().map(|f| f.extension()).collect();
        format!("expected one of: {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives all the feedback that matters; keep library
    // INFO logs out of its way unless -v was given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── PDF engine ───────────────────────────────────────────────────────
    let engine = match cli.pdfium_lib {
        Some(ref path) => PdfiumEngine::with_library(path),
        None => PdfiumEngine::new(),
    };
    engine.probe().await.context("PDFium engine unavailable")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&engine, &cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Load ─────────────────────────────────────────────────────────────
    let mut session = Session::new(engine);
    session.set_password(cli.password.clone());
    session.set_format(cli.format);
    session.set_quality_percent(cli.quality);
    session.set_scale_percent(cli.scale);

    let page_count = session
        .load_file(&cli.input)
        .await
        .context("Failed to load PDF")?
        .page_count;
    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold(&cli.input.display().to_string()),
            dim(&format!("{page_count} pages"))
        );
    }

    if let Some(ref dir) = cli.previews {
        let written = write_previews(session.previews(), dir)
            .await
            .context("Failed to write previews")?;
        if !cli.quiet && !cli.json {
            eprintln!(
                "{} {} previews → {}",
                green("✔"),
                written.len(),
                bold(&dir.display().to_string())
            );
        }
    }

    // ── Select ───────────────────────────────────────────────────────────
    let pages = cli.pages.trim().to_lowercase();
    if pages == "none" {
        return Ok(());
    }
    let selection: PageSelection = pages.parse().context("Invalid --pages")?;
    session.select(&selection);

    if let Some(ref exclude) = cli.exclude {
        let excluded: PageSelection = exclude.parse().context("Invalid --exclude")?;
        for page in excluded.to_pages(page_count) {
            if session.selection().contains(page) {
                session.toggle(page)?;
            }
        }
    }

    // ── Convert ──────────────────────────────────────────────────────────
    let cli_progress;
    let progress: &dyn ConversionProgressCallback = if show_progress {
        cli_progress = CliProgressCallback::new();
        &cli_progress
    } else {
        &NoopProgressCallback
    };

    let output = session
        .convert(&cli.output_dir, progress)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}  {}ms  →  {}",
            green("✔"),
            output.entries.len(),
            output.config.format,
            output.stats.total_duration_ms,
            bold(&output.archive_path.display().to_string()),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::try_parse_from(["pdf2img", "doc.pdf"]).unwrap();
        assert_eq!(cli.quality, 92);
        assert_eq!(cli.scale, 100);
        assert_eq!(cli.pages, "all");
        assert_eq!(cli.format, ImageFormat::Png);
    }

    #[test]
    fn cli_rejects_out_of_range_quality() {
        assert!(Cli::try_parse_from(["pdf2img", "--quality", "0", "doc.pdf"]).is_err());
        assert!(Cli::try_parse_from(["pdf2img", "--scale", "5", "doc.pdf"]).is_err());
    }

    #[test]
    fn jpg_alias() {
        let cli = Cli::try_parse_from(["pdf2img", "-f", "jpg", "doc.pdf"]).unwrap();
        assert_eq!(cli.format, ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_format_lists_every_choice() {
        let err = Cli::try_parse_from(["pdf2img", "-f", "tiff", "doc.pdf"]).unwrap_err();
        let msg = err.to_string();
        for format in ImageFormat::ALL {
            assert!(msg.contains(format.extension()), "{msg}");
        }
    }
}
