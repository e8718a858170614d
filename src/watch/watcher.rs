//! File system watcher keeping the index in sync with external edits
//!
//! A single loop thread drains `notify` events. Each write to a document
//! or template records the path in the [`WatchLedger`]; the first write of
//! a burst spawns a short-lived thread that waits for the path to go quiet
//! and then hands the change to a [`ChangeHandler`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::index::corpus::{Corpus, is_hidden};
use crate::index::types::TEMPLATE_EXTENSION;
use crate::watch::debouncer::{Settle, WatchLedger};

/// Default quiet period in milliseconds
pub const DEFAULT_QUIET_MS: u64 = 1000;

/// How often the loop checks the shutdown flag while idle
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a changed path refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// A document, by name
    Document(String),
    /// A template file, by full path
    Template(PathBuf),
}

/// Receives settled changes from the watcher
pub trait ChangeHandler: Send + Sync + 'static {
    /// The document's file changed or disappeared
    fn document_changed(&self, name: &str);

    /// A template file changed or disappeared
    fn template_changed(&self, path: &Path);
}

/// State shared by the loop thread and the delayed action threads
struct Dispatch {
    corpus: Corpus,
    ledger: Arc<WatchLedger>,
    handler: Arc<dyn ChangeHandler>,
    shutdown: Arc<AtomicBool>,
}

impl Dispatch {
    fn classify(&self, rel: &Path) -> Option<WatchTarget> {
        let ext = rel.extension()?;
        if ext == TEMPLATE_EXTENSION {
            // Templates live directly in the root
            if rel.components().count() != 1 || is_hidden(rel) {
                return None;
            }
            return Some(WatchTarget::Template(self.corpus.root().join(rel)));
        }
        self.corpus.name_for(rel).map(WatchTarget::Document)
    }

    fn notify_write(self: &Arc<Self>, rel: &Path) -> bool {
        let Some(target) = self.classify(rel) else {
            return false;
        };
        if !self.ledger.record(rel) {
            debug!(path = %rel.display(), "write coalesced");
            return false;
        }

        let dispatch = Arc::clone(self);
        let key = rel.to_path_buf();
        let spawned = thread::Builder::new()
            .name("pagesift-settle".to_string())
            .spawn(move || dispatch.settle(&key, target));
        if let Err(err) = spawned {
            warn!(path = %rel.display(), error = %err, "failed to schedule change");
            self.ledger.acknowledge(rel);
            return false;
        }
        true
    }

    /// Wait for `rel` to go quiet, then act on it once
    fn settle(&self, rel: &Path, target: WatchTarget) {
        let mut wait = self.ledger.quiet_period();
        loop {
            thread::sleep(wait);
            match self.ledger.settle(rel) {
                Settle::Ready => break,
                Settle::Wait(rest) => wait = rest,
                Settle::Gone => {
                    debug!(path = %rel.display(), "change already acknowledged");
                    return;
                }
            }
        }
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }

        match &target {
            WatchTarget::Document(name) => {
                debug!(name, "document changed on disk");
                self.handler.document_changed(name);
            }
            WatchTarget::Template(path) => {
                debug!(path = %path.display(), "template changed on disk");
                self.handler.template_changed(path);
            }
        }
    }

    fn handle_event(self: &Arc<Self>, event: Event) {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }
        for path in &event.paths {
            if let Some(rel) = self.corpus.relative(path) {
                self.notify_write(&rel);
            }
        }
    }

    /// Event loop; returns on shutdown or when the event source goes away
    fn run(self: &Arc<Self>, events: Receiver<notify::Result<Event>>) {
        while !self.shutdown.load(Ordering::SeqCst) {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => self.handle_event(event),
                Ok(Err(err)) => warn!(error = %err, "file watcher reported an error"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!(error = %Error::WatcherChannelClosed, "live sync stopped");
                    break;
                }
            }
        }
        debug!("watch loop exited");
    }
}

/// Watches a corpus and reports settled changes to a handler
pub struct Watcher {
    dispatch: Arc<Dispatch>,
}

impl Watcher {
    pub fn new(corpus: Corpus, ledger: Arc<WatchLedger>, handler: Arc<dyn ChangeHandler>) -> Self {
        Self {
            dispatch: Arc::new(Dispatch {
                corpus,
                ledger,
                handler,
                shutdown: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    pub fn ledger(&self) -> &Arc<WatchLedger> {
        &self.dispatch.ledger
    }

    /// What a root-relative path refers to, if the watcher cares about it
    pub fn classify(&self, rel: &Path) -> Option<WatchTarget> {
        self.dispatch.classify(rel)
    }

    /// Report a write to a root-relative path.
    ///
    /// Returns true when this write started a new delayed action, false
    /// when it was ignored or folded into a pending one.
    pub fn notify_write(&self, rel: &Path) -> bool {
        self.dispatch.notify_write(rel)
    }

    /// Start watching the corpus root on a background thread
    pub fn start(self) -> Result<WatcherHandle> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;

        let root = self.dispatch.corpus.watch_root().to_path_buf();
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "watching for changes");

        let dispatch = self.dispatch;
        let shutdown = Arc::clone(&dispatch.shutdown);
        let thread = thread::Builder::new()
            .name("pagesift-watch".to_string())
            .spawn(move || {
                // The notify watcher lives exactly as long as the loop
                let _watcher = watcher;
                dispatch.run(rx);
            })?;

        Ok(WatcherHandle::new(shutdown, thread, root))
    }
}

/// Handle to a running watcher thread
pub struct WatcherHandle {
    shutdown: Arc<AtomicBool>,
    /// Wrapped in Option to allow taking on shutdown
    thread: Option<JoinHandle<()>>,
    root_path: PathBuf,
}

impl WatcherHandle {
    fn new(shutdown: Arc<AtomicBool>, thread: JoinHandle<()>, root_path: PathBuf) -> Self {
        Self {
            shutdown,
            thread: Some(thread),
            root_path,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Signal the watcher to stop and wait for the loop to exit
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("watch loop panicked");
            }
        }
    }

    /// Check if the watcher is still running
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
