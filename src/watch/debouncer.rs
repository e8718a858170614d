//! Watch ledger for debouncing file writes
//!
//! Every write to a watched path refreshes that path's timestamp. The
//! first write of a burst also starts one delayed action; the action
//! settles the entry once no write has arrived for the quiet period, so a
//! burst of writes collapses into a single action. Acknowledging a path
//! drops its entry, which cancels the pending action.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of settling a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Quiet period elapsed; the entry was removed and the action should run
    Ready,
    /// Written again recently; check again after this long
    Wait(Duration),
    /// Acknowledged in the meantime; nothing to do
    Gone,
}

/// Path -> time of the last write seen for it
#[derive(Debug)]
pub struct WatchLedger {
    quiet: Duration,
    entries: Mutex<HashMap<PathBuf, Instant>>,
}

impl WatchLedger {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a write to `path` now.
    ///
    /// Returns true when the path had no entry, i.e. the caller should
    /// start a delayed action for it.
    pub fn record(&self, path: &Path) -> bool {
        self.record_at(path, Instant::now())
    }

    pub fn record_at(&self, path: &Path, at: Instant) -> bool {
        self.entries().insert(path.to_path_buf(), at).is_none()
    }

    /// Forget any pending write to `path`
    pub fn acknowledge(&self, path: &Path) {
        self.entries().remove(path);
    }

    pub fn settle(&self, path: &Path) -> Settle {
        self.settle_at(path, Instant::now())
    }

    pub fn settle_at(&self, path: &Path, now: Instant) -> Settle {
        let mut entries = self.entries();
        let Some(&last) = entries.get(path) else {
            return Settle::Gone;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.quiet {
            entries.remove(path);
            Settle::Ready
        } else {
            Settle::Wait(self.quiet - elapsed)
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.entries().contains_key(path)
    }
}
