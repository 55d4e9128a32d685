//! Cache module for memoizing JSON-producing computations on disk
//!
//! This module provides a file cache that persists values as JSON files whose
//! names carry the key and the Unix time of the write. A configurable TTL
//! (time-to-live) decides whether an entry is fresh; stale entries are simply
//! recomputed and overwritten.

mod clock;
mod error;
mod key;
mod manager;
mod memoize;
mod options;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CacheError;
pub use key::{key_from_args, normalize_key, FilenameScheme, FALLBACK_KEY};
pub use manager::{EntryInfo, FileCache};
pub use memoize::memoize;
pub use options::{to_identifier, CacheConfig, CacheOptions, KeyShape, DEFAULT_DIRECTORY};
