//! Wrapping a function so its results go through a [`FileCache`]

use serde::{de::DeserializeOwned, Serialize};

use super::key::key_from_args;
use super::{CacheError, CacheOptions, FileCache};

/// Wraps `f` in a function that caches its results on disk
///
/// Every call derives a key from `name` and the call's arguments (see
/// [`key_from_args`]), then behaves like [`FileCache::cache`]: a fresh entry
/// is returned without calling `f`, otherwise `f` runs and its result is stored.
///
/// # Example
/// ```no_run
/// use jsoncache::{memoize, CacheError, CacheOptions, FileCache};
/// use serde_json::{json, Value};
///
/// let mut match_details = memoize(
///     FileCache::new(),
///     "match",
///     CacheOptions::default().ttl(120),
///     |id: u64| Ok::<Value, CacheError>(json!({"id": id})),
/// );
/// let details = match_details(1234567890)?;
/// # Ok::<(), CacheError>(())
/// ```
pub fn memoize<A, T, E, F>(
    cache: FileCache,
    name: impl Into<String>,
    options: CacheOptions,
    mut f: F,
) -> impl FnMut(A) -> Result<T, E>
where
    A: Serialize,
    T: Serialize + DeserializeOwned,
    E: From<CacheError>,
    F: FnMut(A) -> Result<T, E>,
{
    let name = name.into();
    move |args: A| {
        let key = key_from_args(&(&name, &args))?;
        cache.cache(&key, &options, || f(args))
    }
}
