//! The two write paths into the index: explicit saves and watcher events
//!
//! Both share one [`IndexStore`] and one [`WatchLedger`]. A save writes the
//! file, updates the index and then acknowledges the path, so the watcher
//! event caused by that same write does not reindex the document again.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::index::store::{IndexStore, Update};
use crate::templates::TemplateCache;
use crate::watch::{ChangeHandler, WatchLedger, Watcher};

pub struct LiveSync {
    store: Arc<IndexStore>,
    ledger: Arc<WatchLedger>,
    templates: Arc<TemplateCache>,
}

impl LiveSync {
    pub fn new(
        store: Arc<IndexStore>,
        ledger: Arc<WatchLedger>,
        templates: Arc<TemplateCache>,
    ) -> Self {
        Self {
            store,
            ledger,
            templates,
        }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<WatchLedger> {
        &self.ledger
    }

    pub fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    /// Persist a document and bring the index up to date.
    ///
    /// Empty content deletes the document.
    pub fn save_document(&self, name: &str, content: &str) -> Result<Update> {
        let rel = self.store.corpus().save_document(name, content)?;
        let update = self.store.update_index(name, content);
        self.ledger.acknowledge(&rel);
        Ok(update)
    }

    /// A watcher reporting changes back to this instance
    pub fn watcher(self: &Arc<Self>) -> Watcher {
        let handler: Arc<dyn ChangeHandler> = Arc::clone(self) as Arc<dyn ChangeHandler>;
        Watcher::new(
            self.store.corpus().clone(),
            Arc::clone(&self.ledger),
            handler,
        )
    }
}

impl ChangeHandler for LiveSync {
    fn document_changed(&self, name: &str) {
        match self.store.corpus().load_document(name) {
            Ok(content) => {
                self.store.update_index(name, &content);
            }
            Err(Error::NotFound(_)) => {
                self.store.remove_document(name);
            }
            Err(err) => warn!(name, error = %err, "could not reindex changed document"),
        }
    }

    fn template_changed(&self, path: &Path) {
        match self.templates.reload(path) {
            Ok(()) => debug!(path = %path.display(), "template refreshed"),
            Err(err) => warn!(path = %path.display(), error = %err, "could not reload template"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Corpus;
    use std::time::Duration;

    fn live() -> (tempfile::TempDir, Arc<LiveSync>) {
        let dir = tempfile::Builder::new().prefix("corpus").tempdir().unwrap();
        let store = Arc::new(IndexStore::new(Corpus::new(dir.path())));
        store.load().unwrap();
        let live = LiveSync::new(
            store,
            Arc::new(WatchLedger::new(Duration::from_millis(50))),
            Arc::new(TemplateCache::new(dir.path())),
        );
        (dir, Arc::new(live))
    }

    #[test]
    fn test_save_updates_index_and_acknowledges() {
        let (dir, live) = live();
        live.ledger().record(Path::new("cats.md"));

        let update = live.save_document("cats", "# Cats\nThey purr").unwrap();
        assert!(matches!(update, Update::Added(_)));
        assert!(dir.path().join("cats.md").exists());
        assert_eq!(live.store().title_of("cats").as_deref(), Some("Cats"));
        assert!(!live.ledger().is_pending(Path::new("cats.md")));
    }

    #[test]
    fn test_save_empty_removes() {
        let (dir, live) = live();
        live.save_document("cats", "meow").unwrap();
        let update = live.save_document("cats", "").unwrap();
        assert!(matches!(update, Update::Removed(_)));
        assert!(!dir.path().join("cats.md").exists());
        assert!(!live.store().contains("cats"));
    }

    #[test]
    fn test_save_rejects_bad_names() {
        let (_dir, live) = live();
        assert!(matches!(
            live.save_document("../outside", "x"),
            Err(Error::InvalidName(_))
        ));
        assert!(live.store().is_empty());
    }

    #[test]
    fn test_document_changed_follows_disk() {
        let (dir, live) = live();
        std::fs::write(dir.path().join("dog.md"), "# Dog\nwoof").unwrap();
        live.document_changed("dog");
        assert_eq!(live.store().title_of("dog").as_deref(), Some("Dog"));

        std::fs::remove_file(dir.path().join("dog.md")).unwrap();
        live.document_changed("dog");
        assert!(!live.store().contains("dog"));
    }

    #[test]
    fn test_template_changed_reloads() {
        let (dir, live) = live();
        let path = dir.path().join("view.html");
        std::fs::write(&path, "<main></main>").unwrap();
        live.template_changed(&path);
        assert_eq!(live.templates().get("view").as_deref(), Some("<main></main>"));
    }
}
