//! Timestamps and their fractional-seconds text form

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, opt},
    sequence::{preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Maximum number of fractional digits a timestamp carries
pub const MAX_PRECISION: usize = 9;

/// Timestamp representing a point in time with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch
    nanos: i64,
}

impl Timestamp {
    /// Create a timestamp from nanoseconds since Unix epoch
    pub fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    /// Create a timestamp from microseconds since Unix epoch.
    ///
    /// Nanoseconds in an `i64` span roughly the years 1677 to 2262; inputs
    /// beyond that saturate at the nearest representable instant. Use
    /// [`Timestamp::checked_from_micros`] to detect it.
    pub fn from_micros(micros: i64) -> Self {
        Self {
            nanos: micros.saturating_mul(1_000),
        }
    }

    /// Create a timestamp from milliseconds since Unix epoch, saturating like
    /// [`Timestamp::from_micros`]
    pub fn from_millis(millis: i64) -> Self {
        Self {
            nanos: millis.saturating_mul(1_000_000),
        }
    }

    /// Create a timestamp from seconds since Unix epoch, saturating like
    /// [`Timestamp::from_micros`]
    pub fn from_secs(secs: i64) -> Self {
        Self {
            nanos: secs.saturating_mul(NANOS_PER_SEC as i64),
        }
    }

    pub fn checked_from_micros(micros: i64) -> Option<Self> {
        micros.checked_mul(1_000).map(Self::from_nanos)
    }

    pub fn checked_from_millis(millis: i64) -> Option<Self> {
        millis.checked_mul(1_000_000).map(Self::from_nanos)
    }

    pub fn checked_from_secs(secs: i64) -> Option<Self> {
        secs.checked_mul(NANOS_PER_SEC as i64).map(Self::from_nanos)
    }

    /// Create a timestamp from fractional seconds, rounded to the nearest nanosecond
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        let nanos = (secs * NANOS_PER_SEC as f64).round();
        if !nanos.is_finite() || nanos < i64::MIN as f64 || nanos >= i64::MAX as f64 {
            return Err(Error::Parse(format!(
                "timestamp {secs} is outside the representable range"
            )));
        }
        Ok(Self {
            nanos: nanos as i64,
        })
    }

    /// Get current timestamp
    pub fn now() -> Self {
        // The clock only leaves the i64 nanosecond range after 2262.
        Self::try_from(Utc::now()).unwrap_or(Self { nanos: i64::MAX })
    }

    /// Get nanoseconds since Unix epoch
    pub fn as_nanos(&self) -> i64 {
        self.nanos
    }

    /// Get fractional seconds since Unix epoch
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_SEC as f64
    }

    /// Convert to chrono DateTime, if chrono can represent the instant
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.nanos.div_euclid(NANOS_PER_SEC as i64);
        let subsec = self.nanos.rem_euclid(NANOS_PER_SEC as i64) as u32;
        DateTime::from_timestamp(secs, subsec)
    }

    /// Render as decimal seconds with exactly `precision` fractional digits.
    ///
    /// Digits beyond `precision` are truncated. `precision` is capped at 9.
    pub fn to_fractional(&self, precision: usize) -> String {
        let precision = precision.min(MAX_PRECISION);
        let sign = if self.nanos < 0 { "-" } else { "" };
        let magnitude = self.nanos.unsigned_abs();
        let secs = magnitude / NANOS_PER_SEC;
        if precision == 0 {
            return format!("{sign}{secs}");
        }
        let frac = (magnitude % NANOS_PER_SEC) / 10u64.pow((MAX_PRECISION - precision) as u32);
        format!("{sign}{secs}.{frac:0width$}", width = precision)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "{}", self.to_fractional(MAX_PRECISION)),
        }
    }
}

impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = Error;

    fn try_from(dt: DateTime<Utc>) -> Result<Self> {
        dt.timestamp_nanos_opt()
            .map(Self::from_nanos)
            .ok_or_else(|| Error::Parse(format!("{dt} is outside the nanosecond timestamp range")))
    }
}

fn fractional_secs(input: &str) -> IResult<&str, (Option<char>, &str, Option<&str>)> {
    tuple((opt(char('-')), digit1, opt(preceded(char('.'), digit1))))(input)
}

impl FromStr for Timestamp {
    type Err = Error;

    /// Parse `-?DIGITS(.DIGITS)?` decimal seconds with at most 9 fractional digits
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| Error::Parse(format!("invalid timestamp {s:?}: {why}"));

        let (_, (negative, whole, frac)) = all_consuming(fractional_secs)(s)
            .map_err(|_| invalid("expected decimal seconds"))?;

        let secs: i128 = whole.parse().map_err(|_| invalid("seconds out of range"))?;
        let frac_nanos: i128 = match frac {
            None => 0,
            Some(digits) if digits.len() > MAX_PRECISION => {
                return Err(invalid("more than 9 fractional digits"));
            }
            Some(digits) => {
                let value: i128 = digits
                    .parse()
                    .map_err(|_| invalid("bad fractional part"))?;
                value * 10i128.pow((MAX_PRECISION - digits.len()) as u32)
            }
        };

        let magnitude = secs
            .checked_mul(NANOS_PER_SEC as i128)
            .and_then(|n| n.checked_add(frac_nanos))
            .ok_or_else(|| invalid("seconds out of range"))?;
        let nanos = if negative.is_some() {
            -magnitude
        } else {
            magnitude
        };
        let nanos = i64::try_from(nanos).map_err(|_| invalid("seconds out of range"))?;
        Ok(Self { nanos })
    }
}
