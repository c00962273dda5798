//! Upload progress reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicI16, Ordering};

/// Callback receiving integer percentages (0-100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

const NOTHING_REPORTED: i16 = -1;

/// Forwards checkpoints to an optional callback while keeping the reported
/// sequence non-decreasing and capped at 100.
///
/// A backend that falls back after a remote attempt restarts its own
/// checkpoints from zero; the reporter swallows those regressions so the
/// caller never sees progress move backwards.
///
/// # Examples
///
/// ```
/// use medialib_core::ProgressReporter;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let reporter = ProgressReporter::new(Some(Arc::new(move |p: u8| sink.lock().unwrap().push(p))));
///
/// reporter.report(10);
/// reporter.report(70);
/// reporter.report(0);   // regression, dropped
/// reporter.report(50);  // regression, dropped
/// reporter.complete();
///
/// assert_eq!(*seen.lock().unwrap(), vec![10, 70, 100]);
/// ```
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressFn>,
    high_water: Arc<AtomicI16>,
}

impl ProgressReporter {
    /// Wrap an optional callback.
    pub fn new(callback: Option<ProgressFn>) -> Self {
        Self {
            callback,
            high_water: Arc::new(AtomicI16::new(NOTHING_REPORTED)),
        }
    }

    /// A reporter that only tracks the high-water mark.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Report a checkpoint. Values above 100 are clamped; values at or below
    /// the last reported value are dropped.
    pub fn report(&self, percent: u8) {
        let percent = i16::from(percent.min(100));
        let previous = self.high_water.fetch_max(percent, Ordering::SeqCst);
        if percent <= previous {
            return;
        }
        tracing::trace!(percent, "Upload progress");
        if let Some(callback) = &self.callback {
            callback(percent as u8);
        }
    }

    /// Report completion.
    pub fn complete(&self) {
        self.report(100);
    }

    /// Highest value reported so far.
    pub fn last_reported(&self) -> Option<u8> {
        match self.high_water.load(Ordering::SeqCst) {
            NOTHING_REPORTED => None,
            value => Some(value as u8),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .field("last_reported", &self.last_reported())
            .finish()
    }
}
