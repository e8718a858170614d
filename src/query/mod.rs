//! Query side: scoring, highlighting and the search pipeline

pub mod executor;
pub mod highlight;
pub mod scorer;

pub use executor::{DEFAULT_PAGE_SIZE, QueryExecutor, SearchPage, SearchResult, search};
pub use highlight::{Highlighter, highlight, snippets};
pub use scorer::{Scorer, score};
