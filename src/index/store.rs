//! The synchronized index store
//!
//! One `RwLock` guards the trigram postings together with the maps that
//! give DocIDs their meaning (DocID to name, name to DocID, name to title)
//! and the last indexed content of every document. Writers mutate all of
//! them in a single lock hold; readers take the lock for lookups only and
//! do their file I/O and scoring afterwards.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::index::corpus::Corpus;
use crate::index::trigram_index::TrigramIndex;
use crate::index::types::{DocId, Document, title_of};
use crate::utils::hashtags;

/// What an incremental update did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Added(DocId),
    Updated(DocId),
    Removed(DocId),
    /// Content identical to what is indexed, or removal of an unknown name
    Unchanged,
}

/// A candidate document resolved to its name and title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Default)]
struct IndexState {
    trigrams: TrigramIndex,
    names: FxHashMap<DocId, String>,
    ids: FxHashMap<String, DocId>,
    titles: FxHashMap<String, String>,
    /// Last indexed content, needed to retire a document's postings
    contents: FxHashMap<DocId, String>,
}

impl IndexState {
    fn starting_at(next_id: DocId) -> Self {
        Self {
            trigrams: TrigramIndex::starting_at(next_id),
            ..Self::default()
        }
    }

    /// Index a new document under a fresh DocID; `None` once ids run out
    fn add(&mut self, name: String, title: String, content: String) -> Option<DocId> {
        let doc = self.trigrams.add_document(&content)?;
        self.bind(doc, name, title, content);
        Some(doc)
    }

    /// Index a document under the DocID it already had before a rebuild
    fn restore(&mut self, doc: DocId, name: String, title: String, content: String) {
        self.trigrams.insert(doc, &content);
        self.bind(doc, name, title, content);
    }

    fn bind(&mut self, doc: DocId, name: String, title: String, content: String) {
        self.names.insert(doc, name.clone());
        self.titles.insert(name.clone(), title);
        self.ids.insert(name, doc);
        self.contents.insert(doc, content);
    }

    fn clear(&mut self) {
        self.trigrams.clear();
        self.names.clear();
        self.ids.clear();
        self.titles.clear();
        self.contents.clear();
    }

    fn upsert(&mut self, name: &str, content: &str) -> Update {
        let title = title_of(name, content);
        let Some(doc) = self.ids.get(name).copied() else {
            return match self.add(name.to_string(), title, content.to_string()) {
                Some(doc) => Update::Added(doc),
                None => {
                    warn!(name = %name, "document ids exhausted, page not indexed");
                    Update::Unchanged
                }
            };
        };

        let old = self.contents.remove(&doc).unwrap_or_default();
        if old == content {
            self.contents.insert(doc, old);
            return Update::Unchanged;
        }
        self.trigrams.delete(doc, &old);
        self.titles.remove(name);

        self.trigrams.insert(doc, content);
        self.titles.insert(name.to_string(), title);
        self.contents.insert(doc, content.to_string());
        Update::Updated(doc)
    }

    fn remove(&mut self, name: &str) -> Option<DocId> {
        let doc = self.ids.remove(name)?;
        let old = self.contents.remove(&doc).unwrap_or_default();
        self.trigrams.delete(doc, &old);
        self.names.remove(&doc);
        self.titles.remove(name);
        Some(doc)
    }

    fn page(&self, doc: DocId) -> Option<CandidatePage> {
        let name = self.names.get(&doc)?;
        let title = self.titles.get(name)?;
        Some(CandidatePage {
            name: name.clone(),
            title: title.clone(),
        })
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let live = self.trigrams.len();
        live == self.names.len()
            && live == self.ids.len()
            && live == self.titles.len()
            && live == self.contents.len()
            && self.names.iter().all(|(doc, name)| {
                self.trigrams.contains(*doc)
                    && self.ids.get(name) == Some(doc)
                    && self.titles.contains_key(name)
                    && self.contents.contains_key(doc)
            })
    }
}

/// The index together with the corpus it is built from
#[derive(Debug)]
pub struct IndexStore {
    corpus: Corpus,
    state: RwLock<IndexState>,
}

impl IndexStore {
    /// Create an empty store; call [`load`](Self::load) to fill it
    pub fn new(corpus: Corpus) -> Self {
        Self {
            corpus,
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the whole index from the corpus.
    ///
    /// The write lock is held for the whole rebuild, corpus read included,
    /// so an update can never land on a state that is about to be replaced.
    /// Documents keep the DocID their name already had. On failure the
    /// store is left empty and the error returned. Returns the document
    /// count.
    pub fn load(&self) -> Result<usize> {
        let started = Instant::now();
        let mut state = self.write();
        let documents = match self.corpus.read_all() {
            Ok(documents) => documents,
            Err(err) => {
                warn!(error = %err, "corpus load failed, index reset");
                state.clear();
                return Err(err);
            }
        };

        let mut fresh = IndexState::starting_at(state.trigrams.next_id());
        for Document {
            name, title, body, ..
        } in documents
        {
            match state.ids.get(&name).copied() {
                Some(doc) => fresh.restore(doc, name, title, body),
                None => {
                    if fresh.add(name.clone(), title, body).is_none() {
                        warn!(name = %name, "document ids exhausted, page not indexed");
                    }
                }
            }
        }
        let count = fresh.trigrams.len();
        let trigram_count = fresh.trigrams.trigram_count();
        *state = fresh;
        drop(state);

        info!(
            documents = count,
            trigrams = trigram_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            root = %self.corpus.root().display(),
            "index loaded"
        );
        Ok(count)
    }

    /// Drop every document; DocIDs are not reused afterwards
    pub fn reset(&self) {
        self.write().clear();
    }

    /// Bring one document up to date with `content`.
    ///
    /// Empty content removes the document. Postings of the previously
    /// indexed content are retired before the new ones are added, all in
    /// one write-lock hold.
    pub fn update_index(&self, name: &str, content: &str) -> Update {
        if content.is_empty() {
            return self.remove_document(name);
        }
        let update = self.write().upsert(name, content);
        debug!(name, ?update, "index updated");
        update
    }

    /// Retire a document's postings and forget its name and title
    pub fn remove_document(&self, name: &str) -> Update {
        let removed = self.write().remove(name);
        match removed {
            Some(doc) => {
                debug!(name, doc, "document removed from index");
                Update::Removed(doc)
            }
            None => Update::Unchanged,
        }
    }

    /// Candidate DocIDs for the given query terms
    pub fn search_candidates<S: AsRef<str>>(&self, terms: &[S]) -> RoaringBitmap {
        self.read().trigrams.candidates(terms)
    }

    /// Candidates resolved to names and titles from a single snapshot
    pub fn candidate_pages<S: AsRef<str>>(&self, terms: &[S]) -> Vec<CandidatePage> {
        let state = self.read();
        state
            .trigrams
            .candidates(terms)
            .iter()
            .filter_map(|doc| state.page(doc))
            .collect()
    }

    pub fn name_of(&self, doc: DocId) -> Option<String> {
        self.read().names.get(&doc).cloned()
    }

    pub fn title_of(&self, name: &str) -> Option<String> {
        self.read().titles.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().ids.contains_key(name)
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.read().trigrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All names with their titles, sorted by name
    pub fn titles(&self) -> BTreeMap<String, String> {
        self.read()
            .titles
            .iter()
            .map(|(name, title)| (name.clone(), title.clone()))
            .collect()
    }

    /// How many documents use each hashtag, most used first
    pub fn hashtag_counts(&self) -> Vec<(String, usize)> {
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        {
            let state = self.read();
            for content in state.contents.values() {
                for tag in hashtags(content) {
                    *counts.entry(tag).or_default() += 1;
                }
            }
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.read().is_consistent()
    }
}
