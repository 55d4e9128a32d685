//! Cache configuration and per-call options

use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde_json::{Map, Value};

use super::key::FilenameScheme;

/// Default name of the cache directory under the cache root
pub const DEFAULT_DIRECTORY: &str = "jsoncache";

/// Per-instance configuration for a [`FileCache`](super::FileCache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory that holds the named cache directories
    pub root: PathBuf,
    /// Cache directory used when a call does not name one
    pub directory: String,
    /// How entry filenames are laid out and matched
    pub scheme: FilenameScheme,
}

impl Default for CacheConfig {
    /// `jsoncache` under the system temporary directory, delimited filenames
    fn default() -> Self {
        Self {
            root: std::env::temp_dir(),
            directory: DEFAULT_DIRECTORY.to_string(),
            scheme: FilenameScheme::default(),
        }
    }
}

impl CacheConfig {
    /// Configuration rooted at a specific directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Configuration rooted at the per-user cache directory
    ///
    /// Uses `~/.cache/jsoncache/` on Linux, or the equivalent platform path.
    /// Returns `None` if there is no home directory.
    pub fn user_cache() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", DEFAULT_DIRECTORY)?;
        Some(Self::with_root(project_dirs.cache_dir()))
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn scheme(mut self, scheme: FilenameScheme) -> Self {
        self.scheme = scheme;
        self
    }
}

/// Shape of object keys in values read back from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyShape {
    /// Keys exactly as stored
    #[default]
    Plain,
    /// Keys rewritten to `snake_case` identifiers (`Content-Type` -> `content_type`)
    ///
    /// Sibling keys that would become the same identifier are left as stored.
    Identifier,
}

impl KeyShape {
    /// Applies this shape to every object key in `value`, recursively
    pub fn apply(self, value: Value) -> Value {
        match self {
            KeyShape::Plain => value,
            KeyShape::Identifier => identifier_keys(value),
        }
    }
}

/// Rewrites object keys recursively
///
/// Keys whose identifier form is shared with a sibling key keep their original
/// text, so no field is lost.
fn identifier_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut shared: HashMap<String, usize> = HashMap::new();
            for key in map.keys() {
                *shared.entry(to_identifier(key)).or_default() += 1;
            }
            Value::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let identifier = to_identifier(&k);
                        let key = if shared[&identifier] > 1 { k } else { identifier };
                        (key, identifier_keys(v))
                    })
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(identifier_keys).collect()),
        other => other,
    }
}

/// Converts a JSON object key into a `snake_case` identifier
///
/// Camel-case boundaries and any run of non-alphanumeric characters become a
/// single underscore. A leading digit gets an underscore prefix. Keys with no
/// alphanumeric characters are left alone.
pub fn to_identifier(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower_or_digit = false;
    let mut pending_sep = false;

    for c in key.chars() {
        if c.is_alphanumeric() {
            let boundary = c.is_uppercase() && prev_lower_or_digit;
            if (pending_sep || boundary) && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
            prev_lower_or_digit = c.is_lowercase() || c.is_numeric();
        } else {
            pending_sep = true;
            prev_lower_or_digit = false;
        }
    }

    if out.is_empty() {
        return key.to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Options for a single cache call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheOptions {
    /// Freshness window in seconds: 0 never expires, negative is always stale
    pub ttl: i64,
    /// Cache directory name, overriding the instance default
    pub directory: Option<String>,
    /// Shape of object keys in values read back from the cache
    pub key_shape: KeyShape,
}

impl CacheOptions {
    pub fn ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn key_shape(mut self, key_shape: KeyShape) -> Self {
        self.key_shape = key_shape;
        self
    }

    /// Whether an entry written at `timestamp` is fresh at `now`
    ///
    /// A timestamp of 0 means there is no usable entry.
    pub fn is_fresh(&self, timestamp: i64, now: i64) -> bool {
        if timestamp == 0 || self.ttl < 0 {
            false
        } else if self.ttl == 0 {
            true
        } else {
            now - timestamp < self.ttl
        }
    }
}
