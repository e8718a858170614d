use std::path::PathBuf;

/// Errors surfaced by the index, the query pipeline and the watcher
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Traversing or reading the corpus failed during a full load
    #[error("failed to index corpus at {}: {source}", root.display())]
    CorpusWalk {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document exists but could not be read
    #[error("failed to load document {name}: {source}")]
    DocumentLoad {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid query pattern: {0}")]
    PatternCompile(#[from] regex::Error),

    #[error("file watcher event channel closed")]
    WatcherChannelClosed,

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid document name: {0:?}")]
    InvalidName(String),

    #[error("invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
