//! The document tree on disk
//!
//! A document named `notes/cats` lives at `<root>/notes/cats.md`. Hidden
//! files and directories are never part of the corpus.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::index::types::{DOCUMENT_EXTENSION, Document};

#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    /// Canonical form of `root`, when it existed at construction
    canonical_root: Option<PathBuf>,
}

impl Corpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let canonical_root = fs::canonicalize(&root).ok();
        Self {
            root,
            canonical_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The root to hand to a filesystem watcher
    pub fn watch_root(&self) -> &Path {
        self.canonical_root.as_deref().unwrap_or(&self.root)
    }

    /// File path of a document relative to the root, e.g. `notes/cats.md`
    pub fn file_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(PathBuf::from(format!("{name}.{DOCUMENT_EXTENSION}")))
    }

    /// Full path of a document on disk
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(self.file_for(name)?))
    }

    /// Strip the corpus root from a path reported by the OS.
    ///
    /// Returns `None` for paths outside the corpus and for hidden entries.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        let rel = self
            .canonical_root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .or_else(|| path.strip_prefix(&self.root).ok())?;
        if rel.as_os_str().is_empty() || is_hidden(rel) {
            return None;
        }
        Some(rel.to_path_buf())
    }

    /// Document name for a relative file path, if it is a document
    pub fn name_for(&self, rel: &Path) -> Option<String> {
        if rel.extension()? != DOCUMENT_EXTENSION || is_hidden(rel) {
            return None;
        }
        let stem = rel.with_extension("");
        let mut parts = Vec::new();
        for component in stem.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    /// Read a document's raw content
    pub fn load_document(&self, name: &str) -> Result<String> {
        let path = self.path_of(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(name.to_string()))
            }
            Err(source) => Err(Error::DocumentLoad {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Persist a document; empty content deletes it.
    ///
    /// Returns the document's path relative to the root.
    pub fn save_document(&self, name: &str, content: &str) -> Result<PathBuf> {
        let rel = self.file_for(name)?;
        let path = self.root.join(&rel);
        if content.is_empty() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(name, "deleted document"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            return Ok(rel);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        debug!(name, bytes = content.len(), "saved document");
        Ok(rel)
    }

    /// Names and full paths of every document, sorted by path
    pub fn walk(&self) -> Result<Vec<(String, PathBuf)>> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut documents = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| self.walk_error(into_io_error(err)))?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.into_path();
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            if let Some(name) = self.name_for(rel) {
                documents.push((name, path));
            }
        }
        Ok(documents)
    }

    /// Walk the tree and read every document in parallel
    pub fn read_all(&self) -> Result<Vec<Document>> {
        self.walk()?
            .into_par_iter()
            .map(|(name, path)| {
                fs::read(&path)
                    .map(|bytes| Document::new(name, String::from_utf8_lossy(&bytes)))
                    .map_err(|source| self.walk_error(source))
            })
            .collect()
    }

    fn walk_error(&self, source: io::Error) -> Error {
        Error::CorpusWalk {
            root: self.root.clone(),
            source,
        }
    }
}

fn into_io_error(err: ignore::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| io::Error::other(message))
}

pub(crate) fn is_hidden(rel: &Path) -> bool {
    rel.components().any(|component| match component {
        Component::Normal(part) => part.to_str().is_some_and(|s| s.starts_with('.')),
        _ => false,
    })
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.contains('\\')
        && name
            .split('/')
            .all(|part| !part.is_empty() && !part.starts_with('.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}
