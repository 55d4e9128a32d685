//! File cache for memoizing JSON-producing computations
//!
//! Provides a `FileCache` that stores each value as a JSON file whose name
//! embeds the key and the Unix time of the write. Freshness is decided from
//! that timestamp alone; the payload carries no envelope.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::key::effective_key;
use super::options::{CacheConfig, CacheOptions, KeyShape};
use super::CacheError;

/// A cache entry as found in a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Name of the file holding the entry
    pub file_name: String,
    /// Key recovered from the file name
    pub key: String,
    /// Unix time the entry was written
    pub timestamp: i64,
}

/// Reads and writes cached JSON values in a directory on disk
///
/// Each key has at most one file, named after the key and the time it was
/// written. A fresh file is returned as-is; a stale or missing one causes the
/// supplied computation to run and its result to replace the old file.
/// Expired files are never swept, only overwritten.
#[derive(Debug, Clone)]
pub struct FileCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl Default for FileCache {
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

impl FileCache {
    /// Creates a FileCache in `jsoncache` under the system temporary directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a FileCache in the per-user cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn user_cache() -> Option<Self> {
        CacheConfig::user_cache().map(Self::with_config)
    }

    /// Creates a FileCache whose cache directories live under `root`
    pub fn with_dir(root: impl Into<PathBuf>) -> Self {
        Self::with_config(CacheConfig::with_root(root))
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used to stamp and age entries
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached value for `key`, or computes and caches it
    ///
    /// The computation runs at most once, and only when there is no fresh
    /// entry. Its error is returned unchanged and nothing is written. A result
    /// that cannot be serialized is returned without being cached. An entry
    /// that exists but cannot be parsed as `T` counts as a miss and is replaced.
    ///
    /// On a miss the freshly computed value is returned, so `options.key_shape`
    /// only affects values read back from disk.
    ///
    /// # Example
    /// ```no_run
    /// use jsoncache::{CacheError, CacheOptions, FileCache};
    /// use serde_json::{json, Value};
    ///
    /// let cache = FileCache::new();
    /// let match_info: Value = cache.cache("match1234567890", &CacheOptions::default().ttl(120), || {
    ///     Ok::<_, CacheError>(json!({"hello": "world"}))
    /// })?;
    /// # Ok::<(), CacheError>(())
    /// ```
    pub fn cache<T, E, F>(&self, key: &str, options: &CacheOptions, computation: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        let key = effective_key(key);
        let dir = self.cache_dir(options.directory.as_deref())?;

        if let Some(file_name) = self.find_entry(&dir, key)? {
            let timestamp = self.config.scheme.timestamp(&file_name, key);
            if options.is_fresh(timestamp, self.clock.now()) {
                match read_entry(&dir.join(&file_name), options.key_shape) {
                    Ok(value) => {
                        debug!(key, file = %file_name, "cache hit");
                        return Ok(value);
                    }
                    Err(err) if err.is_corrupt_entry() => {
                        warn!(key, error = %err, "discarding unreadable cache entry");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        debug!(key, ttl = options.ttl, "cache miss");
        let result = computation()?;
        self.store(key, &result, options)?;
        Ok(result)
    }

    /// Whether `key` has an entry that is fresh under `options.ttl`
    pub fn cached(&self, key: &str, options: &CacheOptions) -> Result<bool, CacheError> {
        let timestamp = self.timestamp_from_key(key, options.directory.as_deref())?;
        Ok(options.is_fresh(timestamp, self.clock.now()))
    }

    /// Reads the entry for `key` regardless of its age
    ///
    /// # Returns
    /// * `Ok(None)` if there is no entry for `key`
    /// * `Err(CacheError::Deserialize)` if the entry is not valid JSON for `T`
    pub fn retrieve_cache<T: DeserializeOwned>(
        &self,
        key: &str,
        options: &CacheOptions,
    ) -> Result<Option<T>, CacheError> {
        let key = effective_key(key);
        let dir = self.cache_dir(options.directory.as_deref())?;
        match self.find_entry(&dir, key)? {
            Some(file_name) => read_entry(&dir.join(file_name), options.key_shape).map(Some),
            None => Ok(None),
        }
    }

    /// Writes `value` as the entry for `key`, replacing any previous entry
    ///
    /// The new file is written under a hidden temporary name and renamed into
    /// place once the old entry is gone.
    ///
    /// # Returns
    /// * `Ok(true)` if the entry was written
    /// * `Ok(false)` if `value` could not be serialized and nothing was written
    pub fn store<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: &CacheOptions,
    ) -> Result<bool, CacheError> {
        let key = effective_key(key);
        let content = match serde_json::to_string(value) {
            Ok(content) => content,
            Err(err) => {
                warn!(key, error = %err, "value is not representable as JSON; not caching");
                return Ok(false);
            }
        };

        let dir = self.cache_dir(options.directory.as_deref())?;
        let existing = self.find_entry(&dir, key)?;
        let file_name = self.config.scheme.file_name(key, self.clock.now());
        let path = dir.join(&file_name);
        let staging = dir.join(format!(".{file_name}.tmp"));

        fs::write(&staging, content).map_err(|source| CacheError::Write {
            path: staging.clone(),
            source,
        })?;

        let old = existing.map(|file_name| dir.join(file_name));
        if let Err(err) = swap_in(old.as_deref(), &staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(err);
        }

        debug!(key, path = %path.display(), "cache entry written");
        Ok(true)
    }

    /// Resolves a cache directory under the root, creating it if needed
    ///
    /// `None` selects the configured default. The name is joined to the root
    /// as-is and must come from a trusted source.
    pub fn cache_dir(&self, directory: Option<&str>) -> Result<PathBuf, CacheError> {
        let path = self
            .config
            .root
            .join(directory.unwrap_or(&self.config.directory));
        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|source| CacheError::CreateDir {
                path: path.clone(),
                source,
            })?;
        }
        Ok(path)
    }

    /// Name of the first file in the cache directory that belongs to `key`
    pub fn filename_from_key(
        &self,
        key: &str,
        directory: Option<&str>,
    ) -> Result<Option<String>, CacheError> {
        let key = effective_key(key);
        let dir = self.cache_dir(directory)?;
        self.find_entry(&dir, key)
    }

    /// Unix time the entry for `key` was written, or 0 if there is none
    pub fn timestamp_from_key(&self, key: &str, directory: Option<&str>) -> Result<i64, CacheError> {
        let key = effective_key(key);
        Ok(self
            .filename_from_key(key, directory)?
            .map(|file_name| self.config.scheme.timestamp(&file_name, key))
            .unwrap_or(0))
    }

    /// Every entry in a cache directory, sorted by file name
    pub fn list_entries(&self, directory: Option<&str>) -> Result<Vec<EntryInfo>, CacheError> {
        let dir = self.cache_dir(directory)?;
        let mut entries: Vec<EntryInfo> = entry_names(&dir)?
            .into_iter()
            .filter_map(|file_name| {
                let (key, timestamp) = self.config.scheme.parse(&file_name)?;
                Some(EntryInfo {
                    file_name,
                    key,
                    timestamp,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }

    fn find_entry(&self, dir: &Path, key: &str) -> Result<Option<String>, CacheError> {
        Ok(entry_names(dir)?
            .into_iter()
            .find(|file_name| self.config.scheme.matches(file_name, key)))
    }
}

/// Visible file names in `dir`, in directory order
///
/// Hidden files, which include in-flight writes, and subdirectories are skipped.
fn entry_names(dir: &Path) -> Result<Vec<String>, CacheError> {
    let read_dir_err = |source: io::Error| CacheError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    Ok(names)
}

fn read_entry<T: DeserializeOwned>(path: &Path, key_shape: KeyShape) -> Result<T, CacheError> {
    let content = fs::read(path).map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let deserialize_err = |source: serde_json::Error| CacheError::Deserialize {
        path: path.to_path_buf(),
        source,
    };
    let value: Value = serde_json::from_slice(&content).map_err(deserialize_err)?;
    serde_json::from_value(key_shape.apply(value)).map_err(deserialize_err)
}

/// Removes the previous entry, then moves the staged file into place
fn swap_in(old: Option<&Path>, staging: &Path, path: &Path) -> Result<(), CacheError> {
    if let Some(old) = old {
        remove_if_present(old)?;
    }
    fs::rename(staging, path).map_err(|source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Deletes `path`, treating an already-missing file as success
fn remove_if_present(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CacheError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
