//! Time-range parsing.
//!
//! Turns a human-entered string such as `"0:10-0:25,1:02-1:30"` into an
//! ordered [`RangeList`]. Each comma-separated token must look like
//! `mm:ss-mm:ss`; minutes and seconds are unbounded non-negative integers, so
//! `90:00` means ninety minutes and `0:75` means seventy-five seconds.
//!
//! Ranges are kept in caller order. Overlapping ranges and ranges past the end
//! of the source are not rejected here; the extraction step decides.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

const TOKEN_PATTERN: &str = r"^(\d+):(\d+)-(\d+):(\d+)$";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("range token pattern is valid"))
}

/// Why a range string was rejected. Both variants name the offending token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The token does not match `mm:ss-mm:ss`.
    #[error("malformed range `{token}` (expected mm:ss-mm:ss)")]
    Malformed { token: String },

    /// The token parsed but its end is not after its start.
    #[error("invalid range `{token}`: end must be after start")]
    Invalid { token: String },
}

/// A half-open interval of the source media, measured from its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    #[serde(with = "secs")]
    start: Duration,
    #[serde(with = "secs")]
    end: Duration,
}

impl TimeRange {
    /// Build a range, returning `None` unless `end > start`.
    pub fn new(start: Duration, end: Duration) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Build a range from whole seconds.
    pub fn from_secs(start: u64, end: u64) -> Option<Self> {
        Self::new(Duration::from_secs(start), Duration::from_secs(end))
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn end(&self) -> Duration {
        self.end
    }

    /// Length of the range; always non-zero.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s, e) = (self.start.as_secs(), self.end.as_secs());
        write!(f, "{}:{:02}-{}:{:02}", s / 60, s % 60, e / 60, e % 60)
    }
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// Non-empty, caller-ordered list of [`TimeRange`]s. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RangeList(Vec<TimeRange>);

impl RangeList {
    /// Parse a comma-separated list of `mm:ss-mm:ss` tokens.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Malformed`] if any token (including an empty one)
    ///   fails the pattern or overflows.
    /// - [`RangeError::Invalid`] if any token has `end <= start`.
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        input
            .split(',')
            .map(|part| parse_token(part.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: a parsed list holds at least one range.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeRange> {
        self.0.iter()
    }

    /// Sum of every range's duration.
    pub fn total_duration(&self) -> Duration {
        self.0.iter().map(TimeRange::duration).sum()
    }
}

impl<'a> IntoIterator for &'a RangeList {
    type Item = &'a TimeRange;
    type IntoIter = std::slice::Iter<'a, TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::str::FromStr for RangeList {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_token(token: &str) -> Result<TimeRange, RangeError> {
    let malformed = || RangeError::Malformed {
        token: token.to_string(),
    };

    let caps = token_regex().captures(token).ok_or_else(malformed)?;
    let field = |i: usize| -> Result<u64, RangeError> {
        caps[i].parse::<u64>().map_err(|_| malformed())
    };
    let to_secs = |m: u64, s: u64| m.checked_mul(60).and_then(|m| m.checked_add(s));

    let start = to_secs(field(1)?, field(2)?).ok_or_else(malformed)?;
    let end = to_secs(field(3)?, field(4)?).ok_or_else(malformed)?;

    TimeRange::from_secs(start, end).ok_or_else(|| RangeError::Invalid {
        token: token.to_string(),
    })
}
