//! Transient status messages.
//!
//! Every user-visible outcome (file loaded, conversion finished, any error)
//! is posted as a [`Notice`] that expires [`NOTICE_TTL`] after it was
//! posted. Hosts poll [`NoticeBoard::active`] to show the live ones.

use serde::Serialize;
use std::time::{Duration, Instant};

/// How long a notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Visual severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// A single status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub posted_at: Instant,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            posted_at: Instant::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Whether the notice should have been dismissed by `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.posted_at) >= NOTICE_TTL
    }
}

/// Posted notices, oldest first.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn post(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Info => tracing::info!("{}", notice.message),
            Severity::Error => tracing::warn!("{}", notice.message),
        }
        self.notices.push(notice);
    }

    /// Drop expired notices and return the ones still visible at `now`.
    pub fn active(&mut self, now: Instant) -> &[Notice] {
        self.notices.retain(|n| !n.is_expired(now));
        &self.notices
    }

    /// The most recently posted notice, expired or not.
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_expire_after_ttl() {
        let n = Notice::info("loaded 3 pages");
        assert!(!n.is_expired(n.posted_at));
        assert!(!n.is_expired(n.posted_at + Duration::from_millis(2999)));
        assert!(n.is_expired(n.posted_at + NOTICE_TTL));
    }

    #[test]
    fn board_prunes_expired() {
        let mut board = NoticeBoard::default();
        board.post(Notice::error("conversion failed"));
        let posted = board.latest().unwrap().posted_at;

        assert_eq!(board.active(posted).len(), 1);
        assert!(board.active(posted).first().unwrap().is_error());
        assert!(board.active(posted + Duration::from_secs(4)).is_empty());
        assert!(board.latest().is_none());
    }
}
