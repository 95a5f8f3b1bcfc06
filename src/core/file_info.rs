//! Capture file metadata: the header record of a segment and the name of
//! the merged file built from it.
//!
//! A header record is a single line of JSON with a fixed key order:
//!
//! ```text
//! {"start":"100.000000000","end":"102.000000000","capture_id":"…","node_id":"ET0001","sample_rate":20000.0}
//! ```
//!
//! Times are kept as fractional-second strings with nanosecond precision so
//! that parsing a generated header yields exactly the original value.

use crate::core::temporal::{Timestamp, MAX_PRECISION};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

/// Extension of merged capture files
pub const CAPTURE_FILE_EXTENSION: &str = "hbcap";

/// Metadata describing one segment of a capture session
///
/// Fields are only reachable through [`CaptureFileInfo::new`] and
/// [`CaptureFileInfo::parse_metadata`], both of which validate them.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureFileInfo {
    start: Timestamp,
    end: Timestamp,
    capture_id: Uuid,
    node_id: String,
    /// Samples per second
    sample_rate: f64,
}

/// Wire form of a header record. Field order is the on-disk key order.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeaderRecord {
    start: String,
    end: String,
    capture_id: Uuid,
    node_id: String,
    sample_rate: f64,
}

impl CaptureFileInfo {
    /// Create validated capture metadata
    pub fn new(
        start: Timestamp,
        end: Timestamp,
        capture_id: Uuid,
        node_id: impl Into<String>,
        sample_rate: f64,
    ) -> Result<Self> {
        let info = Self {
            start,
            end,
            capture_id,
            node_id: node_id.into(),
            sample_rate,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn capture_id(&self) -> Uuid {
        self.capture_id
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Samples per second
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(Error::Parse(format!(
                "start {} is after end {}",
                self.start.to_fractional(MAX_PRECISION),
                self.end.to_fractional(MAX_PRECISION)
            )));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::Parse(format!(
                "sample rate must be a positive number, got {}",
                self.sample_rate
            )));
        }
        if self.node_id.is_empty() {
            return Err(Error::Parse("node id is empty".to_string()));
        }
        Ok(())
    }

    /// Serialize into one header record (no trailing line terminator)
    pub fn generate_header(&self) -> Result<String> {
        let record = HeaderRecord {
            start: self.start.to_fractional(MAX_PRECISION),
            end: self.end.to_fractional(MAX_PRECISION),
            capture_id: self.capture_id,
            node_id: self.node_id.clone(),
            sample_rate: self.sample_rate,
        };
        serde_json::to_string(&record).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse header text back into metadata.
    ///
    /// Header files gain one record per finalization, so the last non-blank
    /// line is the one that counts.
    pub fn parse_metadata(text: &str) -> Result<Self> {
        let line = text
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| Error::Parse("header text is empty".to_string()))?;

        let record: HeaderRecord = serde_json::from_str(line)
            .map_err(|e| Error::Parse(format!("malformed header record: {e}")))?;

        let info = Self {
            start: record.start.parse()?,
            end: record.end.parse()?,
            capture_id: record.capture_id,
            node_id: record.node_id,
            sample_rate: record.sample_rate,
        };
        info.validate()?;
        Ok(info)
    }

    /// Canonical name of the merged capture file:
    /// `{node}_{capture_id}_{start}_{end}.hbcap`.
    ///
    /// Bytes of `node_id` outside `[A-Za-z0-9-]` are percent-encoded, which
    /// keeps the name filesystem-safe and the `_` separators unambiguous.
    pub fn filename(&self) -> String {
        format!(
            "{}_{}_{}_{}.{}",
            encode_component(&self.node_id),
            self.capture_id.hyphenated(),
            self.start.to_fractional(MAX_PRECISION),
            self.end.to_fractional(MAX_PRECISION),
            CAPTURE_FILE_EXTENSION
        )
    }

    /// Duration covered by the segment, in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.end.as_nanos() as i128 - self.start.as_nanos() as i128) as f64 / 1e9
    }
}

fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
