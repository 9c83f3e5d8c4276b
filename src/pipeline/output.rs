//! Delivering a finished archive: write it to disk under a unique,
//! timestamped name.
//!
//! The bytes go to a [`tempfile::NamedTempFile`] in the destination
//! directory first and are then persisted without clobbering. If anything
//! fails the temp file is removed when it drops, so no half-written archive
//! is ever left behind.

use crate::error::Pdf2ImgError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Archive file name for a run finished at `millis` since the Unix epoch.
///
/// `attempt` 0 gives `pdf-images-{millis}.zip`; later attempts add a
/// `-{attempt}` suffix.
pub fn archive_file_name(millis: i64, attempt: usize) -> String {
    if attempt == 0 {
        format!("pdf-images-{millis}.zip")
    } else {
        format!("pdf-images-{millis}-{attempt}.zip")
    }
}

/// Write `bytes` into `dir` under a fresh timestamped name.
pub async fn save_archive(bytes: Vec<u8>, dir: &Path) -> Result<PathBuf, Pdf2ImgError> {
    let dir = dir.to_path_buf();
    let millis = chrono::Utc::now().timestamp_millis();

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: dir.clone(),
            source: e,
        })?;

    let path = tokio::task::spawn_blocking(move || save_blocking(&bytes, &dir, millis))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Save task panicked: {}", e)))??;

    info!("Archive written to {}", path.display());
    Ok(path)
}

fn save_blocking(bytes: &[u8], dir: &Path, millis: i64) -> Result<PathBuf, Pdf2ImgError> {
    let write_err = |path: &Path, source: std::io::Error| Pdf2ImgError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(dir, e))?;
    tmp.write_all(bytes).map_err(|e| write_err(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| write_err(tmp.path(), e))?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let target = dir.join(archive_file_name(millis, attempt));
        match tmp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(write_err(&target, e.error)),
        }
    }

    Err(Pdf2ImgError::OutputWriteFailed {
        path: dir.join(archive_file_name(millis, 0)),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free archive name",
        ),
    })
}
