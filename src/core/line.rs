//! Capture lines: one timestamped reading per line of a data file

use crate::core::temporal::Timestamp;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Fractional digits used for the timestamp column of a data line
pub const LINE_TIME_PRECISION: usize = 6;

/// One timestamped reading and its samples.
///
/// Renders as `timestamp,sample_1,...,sample_n` with the timestamp in
/// fractional seconds. `samples` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureLine {
    time: Timestamp,
    samples: Vec<i64>,
}

impl CaptureLine {
    /// Create a line, rejecting an empty sample payload
    pub fn new(time: Timestamp, samples: Vec<i64>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidLine(format!(
                "line at {} carries no samples",
                time.to_fractional(LINE_TIME_PRECISION)
            )));
        }
        Ok(Self { time, samples })
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn samples(&self) -> &[i64] {
        &self.samples
    }

    /// Render the line without a terminator
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Parse one rendered data line (a trailing line terminator is tolerated)
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.split(',');

        let time: Timestamp = fields
            .next()
            .unwrap_or_default()
            .parse()?;

        let samples = fields
            .map(|field| {
                field.parse::<i64>().map_err(|_| {
                    Error::Parse(format!("invalid sample {field:?} in line {line:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if samples.is_empty() {
            return Err(Error::Parse(format!("line {line:?} has no samples")));
        }
        Ok(Self { time, samples })
    }
}

impl fmt::Display for CaptureLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.to_fractional(LINE_TIME_PRECISION))?;
        for sample in &self.samples {
            write!(f, ",{sample}")?;
        }
        Ok(())
    }
}

impl FromStr for CaptureLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
