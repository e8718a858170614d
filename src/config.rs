//! Runtime configuration
//!
//! Values are resolved with priority: environment variables > config file
//! > defaults. The config file is TOML and lives at
//! `<config dir>/pagesift/config.toml` (e.g. `~/.config/pagesift/config.toml`
//! on Linux):
//!
//! ```toml
//! root = "/srv/wiki"
//!
//! [watcher]
//! quiet_ms = 500
//!
//! [search]
//! page_size = 10
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::query::DEFAULT_PAGE_SIZE;
use crate::watch::DEFAULT_QUIET_MS;

const APP_NAME: &str = "pagesift";
const CONFIG_FILE: &str = "config.toml";

pub const ENV_ROOT: &str = "PAGESIFT_ROOT";
pub const ENV_QUIET_MS: &str = "PAGESIFT_QUIET_MS";
pub const ENV_PAGE_SIZE: &str = "PAGESIFT_PAGE_SIZE";

/// Configuration file format (TOML)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Corpus root directory
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub watcher: WatcherConfigFile,
    #[serde(default)]
    pub search: SearchConfigFile,
}

/// `[watcher]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatcherConfigFile {
    /// Quiet period in milliseconds before a changed file is reindexed
    pub quiet_ms: Option<u64>,
}

/// `[search]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfigFile {
    pub page_size: Option<usize>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub quiet_ms: u64,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            quiet_ms: DEFAULT_QUIET_MS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_ms)
    }

    /// Location of the config file, if the platform has a config directory
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load config with priority: environment variables > config file > defaults.
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = Self::config_path() {
            if let Some(file) = Self::read_file(&path)? {
                config.apply_file(file);
            }
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file; `Ok(None)` when it does not exist
    pub fn read_file(path: &Path) -> Result<Option<ConfigFile>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Self::parse_file(&content)
            .map(Some)
            .map_err(|message| Error::Config {
                path: path.to_path_buf(),
                message,
            })
    }

    fn parse_file(content: &str) -> std::result::Result<ConfigFile, String> {
        toml::from_str(content).map_err(|err| err.to_string())
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(root) = file.root {
            self.root = root;
        }
        if let Some(quiet_ms) = file.watcher.quiet_ms {
            self.quiet_ms = quiet_ms;
        }
        if let Some(page_size) = file.search.page_size {
            self.page_size = page_size;
        }
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(ms) = lookup(ENV_QUIET_MS).and_then(|v| v.trim().parse().ok()) {
            self.quiet_ms = ms;
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE).and_then(|v| v.trim().parse().ok()) {
            self.page_size = size;
        }
    }
}
