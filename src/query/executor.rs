use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::index::store::{CandidatePage, IndexStore};
use crate::query::highlight::{Highlighter, MAX_TEXT_LEN, truncate};
use crate::query::scorer::Scorer;
use crate::utils::tokens;

/// Results per page when the caller asks for 0
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One ranked document of a result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub title: String,
    pub score: u32,
    /// Highlighted excerpt of the body
    pub snippet: String,
}

/// A page of ranked results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    /// Whether later pages hold more results
    pub has_more: bool,
    /// Number of matching documents over all pages
    pub total: usize,
    /// 1-based page number actually served
    pub page: usize,
}

/// A scored candidate whose snippet has not been rendered yet
struct Ranked {
    page: CandidatePage,
    body: String,
    score: u32,
}

/// Query executor
pub struct QueryExecutor<'a> {
    store: &'a IndexStore,
    page_size: usize,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a IndexStore) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(store: &'a IndexStore, page_size: usize) -> Self {
        Self {
            store,
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Execute a query and return the requested 1-based page
    pub fn execute(&self, query: &str, page: usize) -> SearchPage {
        let start = Instant::now();
        let page = page.max(1);
        let terms = tokens(query);

        // Names and titles come from one snapshot; the lock is released
        // before any file is read
        let candidates = self.store.candidate_pages(&terms);
        let candidate_count = candidates.len();

        let scorer = Scorer::new(query);
        let corpus = self.store.corpus();
        let mut ranked: Vec<Ranked> = candidates
            .into_par_iter()
            .filter_map(|page| {
                let body = match corpus.load_document(&page.name) {
                    Ok(body) => body,
                    Err(err) => {
                        debug!(name = %page.name, error = %err, "skipping candidate");
                        return None;
                    }
                };
                let score = scorer.score(&page.title) + scorer.score(&body);
                (score > 0).then_some(Ranked { page, body, score })
            })
            .collect();

        ranked.sort_by(compare_ranked);
        let total = ranked.len();

        let offset = (page - 1).saturating_mul(self.page_size);
        let visible: Vec<Ranked> = ranked
            .into_iter()
            .skip(offset)
            .take(self.page_size)
            .collect();
        let results = self.summarize(query, visible);

        debug!(
            query,
            candidates = candidate_count,
            total,
            page,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );

        SearchPage {
            results,
            has_more: total > page.saturating_mul(self.page_size),
            total,
            page,
        }
    }

    /// Render snippets for the visible page only
    fn summarize(&self, query: &str, visible: Vec<Ranked>) -> Vec<SearchResult> {
        let highlighter = Highlighter::new(query)
            .map_err(|err| debug!(query, error = %err, "snippets fall back to truncation"))
            .ok();

        visible
            .into_iter()
            .map(|ranked| {
                let snippet = render_snippet(highlighter.as_ref(), &ranked.body);
                SearchResult {
                    name: ranked.page.name,
                    title: ranked.page.title,
                    score: ranked.score,
                    snippet,
                }
            })
            .collect()
    }
}

/// Excerpt of `body`, plain truncation when the query did not compile
fn render_snippet(highlighter: Option<&Highlighter>, body: &str) -> String {
    match highlighter {
        Some(highlighter) => highlighter.snippets(body),
        None => truncate(body, MAX_TEXT_LEN).to_string(),
    }
}

/// Highest score first, ties by name
fn compare_ranked(a: &Ranked, b: &Ranked) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.page.name.cmp(&b.page.name))
}

/// Run `query` against `store` and return one page of results
pub fn search(store: &IndexStore, query: &str, page: usize, page_size: usize) -> SearchPage {
    QueryExecutor::with_page_size(store, page_size).execute(query, page)
}
