//! Command-line interface for inspecting a JSON file cache
//!
//! This module handles parsing of CLI arguments using clap and running the
//! inspection commands against a [`FileCache`]. Output goes to the writers
//! passed in so commands can be exercised without spawning the binary.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::cache::{
    key_from_args, CacheConfig, CacheError, CacheOptions, FileCache, FilenameScheme, KeyShape,
};

/// Error types for CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// `--user-cache` was given but the platform has no per-user cache directory
    #[error("cannot determine a per-user cache directory")]
    NoUserCacheDir,

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to render cache entry: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// jsoncache - inspect cached JSON responses on disk
#[derive(Parser, Debug)]
#[command(name = "jsoncache")]
#[command(about = "Inspect a JSON file cache")]
#[command(version)]
pub struct Cli {
    /// Directory holding the cache directories (defaults to the system temp dir)
    #[arg(long, env = "JSONCACHE_ROOT", value_name = "PATH", conflicts_with = "user_cache")]
    pub root: Option<PathBuf>,

    /// Use the per-user cache directory as the root
    #[arg(long)]
    pub user_cache: bool,

    /// Name of the cache directory under the root
    #[arg(long, env = "JSONCACHE_DIR", value_name = "NAME")]
    pub dir: Option<String>,

    /// Read entries named `<key><timestamp>.json` instead of `<key>.<timestamp>.json`
    #[arg(long)]
    pub legacy: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the cache directory, creating it if needed
    Path,
    /// List every entry as `key<TAB>timestamp<TAB>file`
    List,
    /// Report whether a key has a fresh entry (exits 1 on a miss)
    Status {
        key: String,
        /// Freshness window in seconds: 0 never expires, negative is always stale
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        ttl: i64,
    },
    /// Print the cached payload for a key (exits 1 if there is none)
    Get {
        key: String,
        /// Rewrite object keys to snake_case identifiers
        #[arg(long)]
        identifier_keys: bool,
    },
    /// Print the cache key derived from the given arguments
    Key {
        #[arg(required = true)]
        args: Vec<String>,
    },
}

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The key had no usable entry
    Miss,
}

impl Cli {
    /// Builds the cache described by the global flags
    pub fn file_cache(&self) -> Result<FileCache, CliError> {
        let mut config = if self.user_cache {
            CacheConfig::user_cache().ok_or(CliError::NoUserCacheDir)?
        } else if let Some(root) = &self.root {
            CacheConfig::with_root(root)
        } else {
            CacheConfig::default()
        };
        if let Some(dir) = &self.dir {
            config = config.directory(dir);
        }
        if self.legacy {
            config = config.scheme(FilenameScheme::Legacy);
        }
        Ok(FileCache::with_config(config))
    }
}

/// Runs the parsed command, writing results to `out` and diagnostics to `err`
pub fn run(cli: &Cli, out: &mut impl Write, err: &mut impl Write) -> Result<Outcome, CliError> {
    let cache = || cli.file_cache();
    match &cli.command {
        Command::Key { args } => {
            writeln!(out, "{}", key_from_args(args)?)?;
        }
        Command::Path => {
            writeln!(out, "{}", cache()?.cache_dir(None)?.display())?;
        }
        Command::List => {
            for entry in cache()?.list_entries(None)? {
                writeln!(out, "{}\t{}\t{}", entry.key, entry.timestamp, entry.file_name)?;
            }
        }
        Command::Status { key, ttl } => {
            let cache = cache()?;
            let options = CacheOptions::default().ttl(*ttl);
            let timestamp = cache.timestamp_from_key(key, None)?;
            if timestamp == 0 {
                writeln!(out, "miss: no entry for {key}")?;
                return Ok(Outcome::Miss);
            }
            let fresh = cache.cached(key, &options)?;
            let state = if fresh { "hit" } else { "miss" };
            writeln!(out, "{state}: {key} {}", describe_age(timestamp, Utc::now()))?;
            if !fresh {
                return Ok(Outcome::Miss);
            }
        }
        Command::Get {
            key,
            identifier_keys,
        } => {
            let key_shape = if *identifier_keys {
                KeyShape::Identifier
            } else {
                KeyShape::Plain
            };
            let options = CacheOptions::default().key_shape(key_shape);
            match cache()?.retrieve_cache::<Value>(key, &options)? {
                Some(value) => writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?,
                None => {
                    writeln!(err, "no entry for {key}")?;
                    return Ok(Outcome::Miss);
                }
            }
        }
    }
    Ok(Outcome::Success)
}

/// Renders when an entry was written and how long ago
fn describe_age(timestamp: i64, now: DateTime<Utc>) -> String {
    let age = now.timestamp() - timestamp;
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(written) => format!("written {} ({age}s ago)", written.to_rfc3339()),
        None => format!("written at {timestamp} ({age}s ago)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn run_with(args: &[&str]) -> (Result<Outcome, CliError>, String, String) {
        let cli = Cli::try_parse_from(args).expect("arguments should parse");
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = run(&cli, &mut out, &mut err);
        (
            outcome,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_cli_parse_status_with_negative_ttl() {
        let cli = Cli::try_parse_from(["jsoncache", "status", "abc", "--ttl", "-1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Status {
                key: "abc".to_string(),
                ttl: -1
            }
        );
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "jsoncache", "--root", "/var/cache", "--dir", "test", "--legacy", "list",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/var/cache")));
        assert_eq!(cli.dir.as_deref(), Some("test"));
        assert!(cli.legacy);
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn test_cli_root_conflicts_with_user_cache() {
        let result = Cli::try_parse_from(["jsoncache", "--root", "/x", "--user-cache", "path"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_key_requires_args() {
        assert!(Cli::try_parse_from(["jsoncache", "key"]).is_err());
    }

    #[test]
    fn test_file_cache_from_flags() {
        let cli = Cli::try_parse_from([
            "jsoncache", "--root", "/var/cache", "--dir", "test", "--legacy", "list",
        ])
        .unwrap();
        let cache = cli.file_cache().unwrap();
        assert_eq!(cache.config().root, PathBuf::from("/var/cache"));
        assert_eq!(cache.config().directory, "test");
        assert_eq!(cache.config().scheme, FilenameScheme::Legacy);
    }

    #[test]
    fn test_run_key_normalizes_args() {
        let (outcome, out, _) = run_with(&[
            "jsoncache",
            "key",
            "https://na.api.pvp.net/match/",
            "1234567890",
        ]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        assert_eq!(out, "httpsnaapipvpnetmatch1234567890\n");
    }

    #[test]
    fn test_run_path_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        let (outcome, out, _) = run_with(&["jsoncache", "--root", root, "--dir", "test", "path"]);

        assert_eq!(outcome.unwrap(), Outcome::Success);
        let expected = temp_dir.path().join("test");
        assert_eq!(out.trim_end(), expected.display().to_string());
        assert!(expected.is_dir());
    }

    #[test]
    fn test_run_get_and_status() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        FileCache::with_dir(temp_dir.path())
            .store("abc123", &json!({"helloWorld": 1}), &CacheOptions::default())
            .unwrap();

        let (outcome, out, _) = run_with(&["jsoncache", "--root", root, "get", "abc123"]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        let printed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(printed, json!({"helloWorld": 1}));

        let (_, out, _) = run_with(&[
            "jsoncache", "--root", root, "get", "abc123", "--identifier-keys",
        ]);
        let printed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(printed, json!({"hello_world": 1}));

        let (outcome, out, _) = run_with(&["jsoncache", "--root", root, "status", "abc123"]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        assert!(out.starts_with("hit: abc123 written "));

        let (outcome, out, _) =
            run_with(&["jsoncache", "--root", root, "status", "abc123", "--ttl", "-1"]);
        assert_eq!(outcome.unwrap(), Outcome::Miss);
        assert!(out.starts_with("miss: abc123 written "));
    }

    #[test]
    fn test_run_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        let (outcome, out, err) = run_with(&["jsoncache", "--root", root, "get", "missingkey"]);

        assert_eq!(outcome.unwrap(), Outcome::Miss);
        assert!(out.is_empty());
        assert_eq!(err, "no entry for missingkey\n");
    }

    #[test]
    fn test_run_list() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        let cache = FileCache::with_dir(temp_dir.path());
        cache.store("alpha", &json!(1), &CacheOptions::default()).unwrap();
        let file_name = cache.filename_from_key("alpha", None).unwrap().unwrap();
        let timestamp = cache.timestamp_from_key("alpha", None).unwrap();

        let (outcome, out, _) = run_with(&["jsoncache", "--root", root, "list"]);
        assert_eq!(outcome.unwrap(), Outcome::Success);
        assert_eq!(out, format!("alpha\t{timestamp}\t{file_name}\n"));
    }

    #[test]
    fn test_describe_age() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_100, 0).unwrap();
        assert_eq!(
            describe_age(1_700_000_000, now),
            "written 2023-11-14T22:13:20+00:00 (100s ago)"
        );
    }
}
