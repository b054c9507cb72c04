//! Freshness tokens stored in token lock files.
//!
//! A token is the decimal number of seconds since the Unix epoch at which the
//! holder created the lock file. Tokens are written with nanosecond fractional
//! digits (`1760000000.123456789`), so two acquisitions within the same second
//! still produce different tokens. Plain integers are accepted when reading.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Number of fractional digits written after the seconds.
const FRACTION_DIGITS: usize = 9;

/// A parsed lock token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockToken {
    /// The exact text of the token, as found in (or written to) the file.
    raw: String,

    /// The instant the token stands for.
    created_at: DateTime<Utc>,
}

impl LockToken {
    /// Create a token for the current instant.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a token for a given instant.
    pub fn from_datetime(created_at: DateTime<Utc>) -> Self {
        let raw = format!(
            "{}.{:0width$}",
            created_at.timestamp(),
            created_at.timestamp_subsec_nanos(),
            width = FRACTION_DIGITS
        );
        Self { raw, created_at }
    }

    /// Parse lock file content.
    ///
    /// Returns `None` for empty or non-numeric content, which marks the lock
    /// file as unverifiable.
    pub fn parse(content: &str) -> Option<Self> {
        let raw = content.trim();
        let (secs, fraction) = match raw.split_once('.') {
            Some((secs, fraction)) => (secs, fraction),
            None => (raw, ""),
        };

        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let secs: i64 = secs.parse().ok()?;
        let nanos = parse_nanos(fraction);
        let created_at = DateTime::from_timestamp(secs, nanos)?;

        Some(Self {
            raw: raw.to_string(),
            created_at,
        })
    }

    /// The exact token text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Calculate the age of the token. Negative for tokens from the future.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Whether the token is older than `timeout_secs`.
    pub fn is_stale(&self, timeout_secs: u64) -> bool {
        let timeout = i64::try_from(timeout_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        self.age() > timeout
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if seconds < 0 {
            "in the future".to_string()
        } else if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Turn fractional-second digits into nanoseconds, ignoring digits past 9.
fn parse_nanos(fraction: &str) -> u32 {
    fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(FRACTION_DIGITS)
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
}
