//! # pagesift - search for a directory of Markdown pages
//!
//! Pages are plain `.md` files under a root directory. pagesift keeps a
//! trigram index of them in memory, ranks matches with a small integer
//! scoring heuristic and renders highlighted excerpts. A file watcher keeps
//! the index in step with edits made by other programs.
//!
//! ## Architecture
//!
//! - [`index`] - the corpus on disk, the trigram index and the locked store
//! - [`query`] - scoring, highlighting and the paginated search pipeline
//! - [`watch`] - debounced file watching
//! - [`live`] - explicit saves and watcher events feeding one index
//! - [`templates`] - page templates reloaded on change
//! - [`config`], [`output`], [`utils`] - configuration, CLI output, text helpers
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagesift::index::{Corpus, IndexStore};
//! use pagesift::query::search;
//!
//! let store = IndexStore::new(Corpus::new("/srv/wiki"));
//! store.load()?;
//!
//! let page = search(&store, "trigram index", 1, 20);
//! for result in &page.results {
//!     println!("* [{}]({}) ({})", result.title, result.name, result.score);
//! }
//! # Ok::<(), pagesift::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod live;
pub mod output;
pub mod query;
pub mod templates;
pub mod utils;
pub mod watch;

pub use error::{Error, Result};
