//! In-memory cache of the page templates stored next to the documents
//!
//! Only the sources are kept here; rendering happens elsewhere.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::Result;
use crate::index::types::TEMPLATE_EXTENSION;

/// Template name (file stem) -> source
#[derive(Debug)]
pub struct TemplateCache {
    root: PathBuf,
    sources: RwLock<BTreeMap<String, String>>,
}

impl TemplateCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sources: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every template directly under the root, replacing the cache
    pub fn load_dir(&self) -> Result<usize> {
        let mut sources = BTreeMap::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let Some(name) = template_name(&path) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            sources.insert(name, fs::read_to_string(&path)?);
        }

        let count = sources.len();
        *self.write() = sources;
        info!(templates = count, root = %self.root.display(), "loaded templates");
        Ok(count)
    }

    /// Re-read one template file; a missing file drops it from the cache
    pub fn reload(&self, path: &Path) -> Result<()> {
        let Some(name) = template_name(path) else {
            return Ok(());
        };
        match fs::read_to_string(path) {
            Ok(source) => {
                debug!(template = %name, "reloaded template");
                self.write().insert(name, source);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(template = %name, "template removed");
                self.write().remove(&name);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.sources.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `view` for `<root>/view.html`; `None` for other files and hidden ones
fn template_name(path: &Path) -> Option<String> {
    if path.extension()? != TEMPLATE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}
