//! In-memory trigram inverted index
//!
//! Maps every trigram of a document's lower-cased content to a roaring
//! bitmap of the DocIDs that contain it. The index knows nothing about
//! names or titles; [`IndexStore`](crate::index::IndexStore) keeps those
//! in step with the postings.

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

use crate::index::types::{DocId, Trigram};
use crate::utils::text_trigrams;

#[derive(Debug, Default, Clone)]
pub struct TrigramIndex {
    postings: FxHashMap<Trigram, RoaringBitmap>,
    /// Every DocID with currently indexed content
    live: RoaringBitmap,
    next_id: DocId,
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index that allocates DocIDs starting at `next_id`.
    ///
    /// Rebuilds continue the previous allocation so an id handed out before
    /// the rebuild never names a different document afterwards.
    pub fn starting_at(next_id: DocId) -> Self {
        Self {
            next_id,
            ..Self::default()
        }
    }

    /// Allocate a fresh DocID for `content` and index it.
    ///
    /// Returns `None` once the id space is used up; nothing is indexed then.
    pub fn add_document(&mut self, content: &str) -> Option<DocId> {
        let doc = self.next_id;
        self.next_id = doc.checked_add(1)?;
        self.insert(doc, content);
        Some(doc)
    }

    /// Drop every posting and live document, keeping the id allocation
    pub fn clear(&mut self) {
        self.postings.clear();
        self.live.clear();
    }

    /// Add postings for `doc` from the trigrams of `content`
    pub fn insert(&mut self, doc: DocId, content: &str) {
        self.live.insert(doc);
        for trigram in text_trigrams(content) {
            self.postings.entry(trigram).or_default().insert(doc);
        }
    }

    /// Remove `doc` from the postings of every trigram of `content`.
    ///
    /// `content` must be what was last inserted for `doc`; trigrams that
    /// only the new content has would be missed and stale postings kept.
    pub fn delete(&mut self, doc: DocId, content: &str) {
        self.live.remove(doc);
        for trigram in text_trigrams(content) {
            if let Some(docs) = self.postings.get_mut(&trigram) {
                docs.remove(doc);
                if docs.is_empty() {
                    self.postings.remove(&trigram);
                }
            }
        }
    }

    /// Candidate documents for a set of query terms.
    ///
    /// A term selects the documents holding all of its trigrams; the
    /// per-term sets are unioned. Terms too short to have trigrams (and an
    /// empty term list) select every live document.
    pub fn candidates<S: AsRef<str>>(&self, terms: &[S]) -> RoaringBitmap {
        if terms.is_empty() {
            return self.live.clone();
        }

        let mut result = RoaringBitmap::new();
        for term in terms {
            let trigrams = text_trigrams(term.as_ref());
            if trigrams.is_empty() {
                result |= &self.live;
                continue;
            }
            if let Some(docs) = self.docs_with_all(&trigrams) {
                result |= docs;
            }
        }
        result
    }

    /// Intersect the postings of `trigrams`, rarest first
    fn docs_with_all(&self, trigrams: &[Trigram]) -> Option<RoaringBitmap> {
        let mut lists = Vec::with_capacity(trigrams.len());
        for trigram in trigrams {
            lists.push(self.postings.get(trigram)?);
        }
        lists.sort_by_key(|docs| docs.len());

        let (first, rest) = lists.split_first()?;
        let mut docs = (*first).clone();
        for other in rest {
            if docs.is_empty() {
                break;
            }
            docs &= *other;
        }
        Some(docs)
    }

    /// Whether `doc` has indexed content
    pub fn contains(&self, doc: DocId) -> bool {
        self.live.contains(doc)
    }

    /// Number of documents with indexed content
    pub fn len(&self) -> usize {
        self.live.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of distinct trigrams with a non-empty posting list
    pub fn trigram_count(&self) -> usize {
        self.postings.len()
    }

    /// The id the next `add_document` will hand out
    pub fn next_id(&self) -> DocId {
        self.next_id
    }

    /// Whether any posting list still mentions `doc`
    #[cfg(test)]
    pub(crate) fn mentions(&self, doc: DocId) -> bool {
        self.postings.values().any(|docs| docs.contains(doc))
    }
}
