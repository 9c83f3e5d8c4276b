//! End-to-end integration tests against a real pdfium library.
//!
//! The pdfium-backed tests are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless a pdfium library is available.
//! The PDFs are generated in the test, so no fixture files are needed.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use pdf2img::{
    inspect, ImageFormat, NoopProgressCallback, Pdf2ImgError, PdfiumEngine, Session,
    PREVIEW_SCALE,
};
use std::io::Read;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_tracing();
    }};
}

/// Route library logs to the test harness; RUST_LOG=debug shows per-page events.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A valid PDF with `pages` blank pages of 200 × 100 pt and a title.
fn minimal_pdf(pages: usize) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 4)).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages
    ));
    objects.push("<< /Title (Fixture) /Producer (pdf2img tests) >>".to_string());
    for _ in 0..pages {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >>".to_string());
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 3 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}

fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).unwrap();
    buf
}

// ── Boundary checks (no pdfium needed) ───────────────────────────────────────

#[tokio::test]
async fn test_inspect_rejects_non_pdf_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "notes.txt", b"hello");

    let err = inspect(&PdfiumEngine::new(), &path, None).await.unwrap_err();
    assert!(matches!(err, Pdf2ImgError::NotAPdf { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    let err = inspect(&PdfiumEngine::new(), Path::new("/no/such/file.pdf"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2ImgError::FileNotFound { .. }), "got {err:?}");
}

// ── pdfium-backed ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_minimal_pdf() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "fixture.pdf", &minimal_pdf(3));

    let info = inspect(&PdfiumEngine::new(), &path, None).await.unwrap();
    assert_eq!(info.page_count, 3);
    assert_eq!(info.name, "fixture.pdf");
    assert_eq!(info.title.as_deref(), Some("Fixture"));
}

#[tokio::test]
async fn test_load_garbage_is_a_load_error() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "garbage.pdf", b"definitely not a pdf");

    let mut session = Session::new(PdfiumEngine::new());
    let err = session.load_file(&path).await.unwrap_err();
    assert!(matches!(err, Pdf2ImgError::CorruptPdf { .. }), "got {err:?}");
    assert!(session.document_info().is_none());
}

#[tokio::test]
async fn test_previews_are_half_size() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "fixture.pdf", &minimal_pdf(2));

    let mut session = Session::new(PdfiumEngine::new());
    session.load_file(&path).await.unwrap();

    let previews = session.previews();
    assert_eq!(previews.len(), 2);
    let expected = ((200.0 * PREVIEW_SCALE) as u32, (100.0 * PREVIEW_SCALE) as u32);
    for p in previews {
        assert_eq!((p.width, p.height), expected);
        assert!(p.png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}

#[tokio::test]
async fn test_convert_selected_pages_at_double_scale() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "fixture.pdf", &minimal_pdf(3));
    let out_dir = dir.path().join("out");

    let mut session = Session::new(PdfiumEngine::new());
    session.load_file(&path).await.unwrap();
    session.toggle(1).unwrap();
    session.toggle(3).unwrap();
    session.set_scale_percent(200);

    let out = session
        .convert(&out_dir, &NoopProgressCallback)
        .await
        .unwrap();
    assert_eq!(out.entries, vec!["page-1.png", "page-3.png"]);
    assert!(out.archive_path.starts_with(&out_dir));

    let png = read_entry(&out.archive_path, "page-3.png");
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (400, 200));
}

#[tokio::test]
async fn test_convert_every_format() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "fixture.pdf", &minimal_pdf(1));

    let mut session = Session::new(PdfiumEngine::new());
    session.load_file(&path).await.unwrap();
    session.select_all();

    for format in ImageFormat::ALL {
        session.set_format(format);
        session.set_quality_percent(70);
        let out = session
            .convert(dir.path(), &NoopProgressCallback)
            .await
            .unwrap();

        let name = format!("page-1.{}", format.extension());
        assert_eq!(out.entries, vec![name.clone()]);

        let bytes = read_entry(&out.archive_path, &name);
        let guessed = image::guess_format(&bytes).unwrap();
        let expected = match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Webp => image::ImageFormat::WebP,
        };
        assert_eq!(guessed, expected, "{format}");
    }
}

#[tokio::test]
async fn test_output_is_json_serialisable() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "fixture.pdf", &minimal_pdf(2));

    let mut session = Session::new(PdfiumEngine::new());
    session.load_file(&path).await.unwrap();
    session.select_all();
    let out = session
        .convert(dir.path(), &NoopProgressCallback)
        .await
        .unwrap();

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["stats"]["pages"], 2);
    assert_eq!(json["config"]["format"], "png");
    assert_eq!(json["entries"][1], "page-2.png");
}
