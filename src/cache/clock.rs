//! Time source used to stamp and age cache entries

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of the current time in Unix seconds
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to
///
/// Public as a testing aid: pass it to [`FileCache::with_clock`](super::FileCache::with_clock)
/// to exercise expiry in your own tests without sleeping.
///
/// ```
/// use std::sync::Arc;
/// use jsoncache::cache::{Clock, ManualClock};
/// use jsoncache::{CacheOptions, FileCache};
///
/// let clock = Arc::new(ManualClock::new(1_700_000_000));
/// let cache = FileCache::new().with_clock(clock.clone());
/// clock.advance(60);
/// assert_eq!(clock.now(), 1_700_000_060);
/// # let _ = (cache, CacheOptions::default());
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_near_chrono_now() {
        let before = Utc::now().timestamp();
        let now = SystemClock.now();
        let after = Utc::now().timestamp();
        assert!(now >= before && now <= after);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);
        clock.advance(20);
        assert_eq!(clock.now(), 120);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }
}
