//! Trigger enablement and progress display as pure functions of state.
//!
//! No presentation layer is consulted: whether the convert / export
//! triggers are live depends only on the selection and the run state.

use crate::progress::Progress;
use serde::Serialize;

/// Enabled state of the user-facing triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    /// "Convert" button.
    pub convert: bool,
    /// "Download zip" button (same run, second call site).
    pub download: bool,
    /// Load / clear document.
    pub load: bool,
}

/// Triggers are live only with a non-empty selection and no active run.
pub fn control_state(has_selection: bool, running: bool) -> ControlState {
    let can_run = has_selection && !running;
    ControlState {
        convert: can_run,
        download: can_run,
        load: !running,
    }
}

/// What a progress indicator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProgressDisplay {
    Hidden,
    Visible { percent: u8 },
}

/// Hidden while idle, live percentage while a run is active.
pub fn progress_display(running: bool, progress: Progress) -> ProgressDisplay {
    if running {
        ProgressDisplay::Visible {
            percent: progress.percent(),
        }
    } else {
        ProgressDisplay::Hidden
    }
}
