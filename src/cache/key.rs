//! Cache keys and the on-disk filename scheme
//!
//! A cache entry is a single file whose name carries both the key and the Unix
//! timestamp of the write. [`FilenameScheme`] decides how those two parts are
//! laid out and how a directory listing is matched back to a key.

use serde::Serialize;

use super::CacheError;

/// Key used when a key is empty, or normalizes to nothing
pub const FALLBACK_KEY: &str = "jsoncache";

/// Width of a Unix timestamp in seconds until the year 2286
const LEGACY_TIMESTAMP_DIGITS: usize = 10;

/// File extension of every cache entry
const EXTENSION: &str = ".json";

/// Characters stripped from keys before they are used in a filename
const STRIPPED_CHARS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '<', '>', '.', '"', '\'', '=', '+', ':', '/', '\\', '?', '~',
    '`', '!', '@', '#', '$', '%', '^', '&', '*', '|', ';', ',', ' ',
];

/// Turns an arbitrary string into a filesystem-safe cache key
///
/// Removes punctuation, brackets, path separators and spaces. The mapping is
/// lossy: distinct inputs can normalize to the same key.
pub fn normalize_key(raw: &str) -> String {
    let key: String = raw.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    if key.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        key
    }
}

/// Builds a cache key from call arguments
///
/// The arguments are rendered as compact JSON and then normalized, so
/// `("match", 1234567890)` becomes `match1234567890`.
pub fn key_from_args<A: Serialize + ?Sized>(args: &A) -> Result<String, CacheError> {
    let rendered = serde_json::to_string(args).map_err(CacheError::KeyArgs)?;
    Ok(normalize_key(&rendered))
}

/// Substitutes [`FALLBACK_KEY`] for an empty key
pub(crate) fn effective_key(key: &str) -> &str {
    if key.is_empty() {
        FALLBACK_KEY
    } else {
        key
    }
}

/// Layout of cache entry filenames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameScheme {
    /// `<key>.<timestamp>.json`, matched exactly on the key
    #[default]
    Delimited,
    /// `<key><timestamp>.json`, matched by substring containment
    ///
    /// Compatible with caches written by older tools. A key that is a substring
    /// of another key's filename (`match123` vs `match1234567890`) will match
    /// the wrong entry. A remainder too long for an `i64` reads as timestamp 0,
    /// so such a collision is a miss rather than a hit.
    Legacy,
}

impl FilenameScheme {
    /// Filename for `key` written at `timestamp`
    pub fn file_name(&self, key: &str, timestamp: i64) -> String {
        match self {
            FilenameScheme::Delimited => format!("{key}.{timestamp}{EXTENSION}"),
            FilenameScheme::Legacy => format!("{key}{timestamp}{EXTENSION}"),
        }
    }

    /// Whether `file_name` is an entry for `key`
    pub fn matches(&self, file_name: &str, key: &str) -> bool {
        match self {
            FilenameScheme::Delimited => {
                parse_delimited(file_name).is_some_and(|(found, _)| found == key)
            }
            FilenameScheme::Legacy => file_name.contains(key),
        }
    }

    /// Timestamp embedded in `file_name`, read relative to `key`
    ///
    /// Returns 0 when the name does not carry a readable timestamp.
    pub fn timestamp(&self, file_name: &str, key: &str) -> i64 {
        match self {
            FilenameScheme::Delimited => match parse_delimited(file_name) {
                Some((found, timestamp)) if found == key => timestamp,
                _ => 0,
            },
            FilenameScheme::Legacy => {
                let Some(start) = file_name.find(key) else {
                    return 0;
                };
                let rest = &file_name[start + key.len()..];
                let rest = rest.strip_suffix(EXTENSION).unwrap_or(rest);
                lenient_int(rest)
            }
        }
    }

    /// Splits `file_name` into its key and timestamp, if it looks like an entry
    ///
    /// Legacy names have no separator, so the timestamp is taken to be the
    /// trailing digits, at most ten of them. A key that
    /// ends in digits followed by a short timestamp is split in the wrong place.
    pub fn parse(&self, file_name: &str) -> Option<(String, i64)> {
        match self {
            FilenameScheme::Delimited => {
                parse_delimited(file_name).map(|(key, ts)| (key.to_string(), ts))
            }
            FilenameScheme::Legacy => {
                let stem = file_name.strip_suffix(EXTENSION)?;
                let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
                let run = stem.len() - prefix.len();
                if run == 0 {
                    return None;
                }
                let split = stem.len() - run.min(LEGACY_TIMESTAMP_DIGITS);
                let (key, digits) = stem.split_at(split);
                let timestamp = digits.parse().ok()?;
                Some((key.to_string(), timestamp))
            }
        }
    }
}

fn parse_delimited(file_name: &str) -> Option<(&str, i64)> {
    let stem = file_name.strip_suffix(EXTENSION)?;
    let (key, digits) = stem.rsplit_once('.')?;
    if key.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let timestamp = digits.parse().ok()?;
    Some((key, timestamp))
}

/// Parses a leading integer, yielding 0 when there is none
fn lenient_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
