//! Command line interface: argument definitions and command handlers

pub mod commands;

pub use commands::*;

use crate::config::CaptureConfig;
use crate::core::file_info::CaptureFileInfo;
use crate::core::line::CaptureLine;
use crate::error::{Error, Result};
use crate::storage::{CapturePackager, CaptureWriter, PackagedSegment, SegmentPair};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use tracing::info;
use uuid::Uuid;

/// Outcome of a `record` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub capture_id: Uuid,
    pub segments: usize,
    pub lines: u64,
}

/// Record every line of the input into a capture session
pub fn record(args: &RecordArgs) -> Result<RecordSummary> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::from_file(path)?,
        None => CaptureConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(Error::file(path))?)),
        None => Box::new(io::stdin().lock()),
    };
    record_from(&config, input)
}

/// Feed data lines from `input` through a writer built from `config`.
///
/// Blank lines are skipped. With `roll_every` set, a new segment starts
/// before the line that would exceed the limit.
pub fn record_from<R: BufRead>(config: &CaptureConfig, input: R) -> Result<RecordSummary> {
    let mut writer = CaptureWriter::from_config(config)?;
    let roll_every = config.roll_every;

    let lines = writer.with_session(|w| {
        let mut total = 0u64;
        let mut in_segment = 0u64;
        for (number, text) in input.lines().enumerate() {
            let text = text?;
            if text.trim().is_empty() {
                continue;
            }
            let line = CaptureLine::parse(&text)
                .map_err(|e| Error::Parse(format!("input line {}: {e}", number + 1)))?;
            if roll_every == Some(in_segment) {
                w.roll_segment()?;
                in_segment = 0;
            }
            w.append(&line)?;
            in_segment += 1;
            total += 1;
        }
        Ok(total)
    })?;

    let summary = RecordSummary {
        capture_id: writer.capture_id(),
        segments: writer.segments().filter(|s| s.line_count() > 0).count(),
        lines,
    };
    info!(capture_id = %summary.capture_id, segments = summary.segments, lines = summary.lines, "recording finished");
    Ok(summary)
}

/// Package a capture into merged files
pub fn package(args: &CaptureArgs) -> Result<Vec<PackagedSegment>> {
    CapturePackager::new(&args.root, args.capture_id).package()
}

/// Discover a capture's segments and parse their headers
pub fn segments(args: &CaptureArgs) -> Result<Vec<(SegmentPair, CaptureFileInfo)>> {
    let packager = CapturePackager::new(&args.root, args.capture_id);
    packager
        .discover()?
        .into_iter()
        .map(|pair| {
            let text = fs::read_to_string(&pair.header_path).map_err(Error::file(&pair.header_path))?;
            let info = CaptureFileInfo::parse_metadata(&text)?;
            Ok((pair, info))
        })
        .collect()
}
