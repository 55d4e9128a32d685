//! JSON file cache
//!
//! Memoizes expensive JSON-producing calls, such as API requests, by persisting
//! their results to disk with an optional time-to-live.

pub mod cache;
pub mod cli;

pub use cache::{
    key_from_args, memoize, normalize_key, CacheConfig, CacheError, CacheOptions, FileCache,
    FilenameScheme, KeyShape,
};
