//! File-backed cache for built stability maps.
//!
//! A stability map is expensive to build (hundreds of thousands of
//! tokenizations) and fully determined by the model, prefix, and mode, so
//! the result is persisted as plain JSON under a key derived from those
//! three plus a schema version. Read failures of any kind degrade silently
//! to a cache miss; write failures are reported to the caller, who should
//! log and continue rather than abort a successful build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::contexts::CACHE_VERSION;
use super::map::StabilityMap;

/// Errors raised when persisting a stability map.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The parameters a cached map is keyed by.
#[derive(Debug, Clone, Copy)]
pub struct CacheParams<'a> {
    pub model: &'a str,
    pub prefix: &'a str,
    pub long: bool,
}

/// Replace every character outside `[A-Za-z0-9_-]` with `-`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Directory of cached stability maps.
pub struct MapCache {
    dir: PathBuf,
}

impl MapCache {
    /// Cache rooted at an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache rooted at the platform cache directory (falling back to the
    /// temp directory when none is known).
    pub fn default_dir() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("ephemid"))
    }

    /// The cache root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a set of cache parameters.
    ///
    /// Parts joined by `--`: sanitized model (with `/` collapsed to `--`),
    /// `prefix-<p>` when non-empty, `long-true` in long mode, and the
    /// schema version.
    pub fn file_name(params: &CacheParams) -> String {
        let mut parts = vec![format!("model-{}", sanitize(&params.model.replace('/', "--")))];
        if !params.prefix.is_empty() {
            parts.push(format!("prefix-{}", sanitize(params.prefix)));
        }
        if params.long {
            parts.push("long-true".to_string());
        }
        parts.push(format!("v{CACHE_VERSION}"));
        parts.join("--") + ".json"
    }

    fn file_path(&self, params: &CacheParams) -> PathBuf {
        self.dir.join(Self::file_name(params))
    }

    /// Load a cached map, or `None` on any miss or read/parse failure.
    pub fn load(&self, params: &CacheParams) -> Option<StabilityMap> {
        let path = self.file_path(params);
        let data = fs::read(&path).ok()?;
        match serde_json::from_slice(&data) {
            Ok(map) => {
                debug!(path = %path.display(), "id map cache hit");
                Some(map)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unreadable id map cache");
                None
            }
        }
    }

    /// Persist a map under the derived key, creating the cache directory.
    pub fn save(&self, params: &CacheParams, map: &StabilityMap) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.file_path(params);
        fs::write(&path, serde_json::to_vec_pretty(map)?)?;
        debug!(path = %path.display(), starters = map.len(), "saved id map cache");
        Ok(())
    }
}
