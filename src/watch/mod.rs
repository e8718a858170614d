//! Live synchronization of the index with the files on disk

pub mod debouncer;
pub mod watcher;

pub use debouncer::{Settle, WatchLedger};
pub use watcher::{ChangeHandler, DEFAULT_QUIET_MS, WatchTarget, Watcher, WatcherHandle};
