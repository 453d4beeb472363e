//! Time source injection
//!
//! Everything that stamps a value with the current time (bundle description, log
//! date range, upload filename) takes a [`Clock`] so tests can pin the time.

use chrono::{DateTime, SecondsFormat, Utc};

/// A provider of the current time
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// RFC 3339 rendering with whole seconds and a `Z` suffix, e.g. `2020-12-03T22:10:00Z`
pub fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar date, e.g. `2020-12-03`
pub fn date(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d").to_string()
}

/// Name of the uploaded archive, e.g. `SB-20201203-221000Z.zip`
pub fn upload_filename(t: DateTime<Utc>) -> String {
    format!("SB-{}.zip", t.format("%Y%m%d-%H%M%SZ"))
}
