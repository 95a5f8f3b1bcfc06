//! Capture writer: appends lines to rolling segment files and finalizes
//! each segment with a header record.
//!
//! Every segment is a pair of files in the root directory, a DATA file with
//! one rendered [`CaptureLine`] per line and a HEADER file holding the
//! [`CaptureFileInfo`] of the segment. Each append and each header write is a
//! complete open-write-close cycle; no file handle outlives a call.

use crate::config::{validate_source, CaptureConfig};
use crate::core::file_info::CaptureFileInfo;
use crate::core::line::CaptureLine;
use crate::core::temporal::Timestamp;
use crate::error::{Error, Result};
use crate::storage::naming::SegmentName;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Lifecycle of a writer: `Unopened -> Open -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Unopened,
    Open,
    Closed,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "unopened",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Bookkeeping for one segment of a capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureWriterSegment {
    capture_id: Uuid,
    index: u64,
    line_count: u64,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
}

impl CaptureWriterSegment {
    fn new(capture_id: Uuid, index: u64) -> Self {
        Self {
            capture_id,
            index,
            line_count: 0,
            start_time: None,
            end_time: None,
        }
    }

    pub fn capture_id(&self) -> Uuid {
        self.capture_id
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    /// Time of the first line written to this segment
    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    /// Time of the most recently written line (not the maximum)
    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn data_filename(&self) -> String {
        SegmentName::data(self.capture_id, self.index).to_string()
    }

    pub fn header_filename(&self) -> String {
        SegmentName::header(self.capture_id, self.index).to_string()
    }

    fn record(&mut self, time: Timestamp) {
        if self.line_count == 0 {
            self.start_time = Some(time);
        }
        self.end_time = Some(time);
        self.line_count += 1;
    }
}

/// Stateful capture session writing segment files under a root directory
pub struct CaptureWriter {
    root_dir: PathBuf,
    capture_id: Uuid,
    node_id: String,
    sample_rate: f64,
    created: Timestamp,
    state: WriterState,
    /// Segments already rolled over, oldest first
    finished: Vec<CaptureWriterSegment>,
    /// The only segment that still receives lines
    active: CaptureWriterSegment,
}

impl CaptureWriter {
    /// Create a writer for a new capture session.
    ///
    /// A fresh capture id is generated for every writer when none is given.
    /// Nothing touches the filesystem until [`CaptureWriter::open`]. An
    /// unusable sample rate or node id is rejected here, since no header
    /// could be written for it later.
    pub fn new<P: AsRef<Path>>(
        root_dir: P,
        sample_rate: f64,
        capture_id: Option<Uuid>,
        node_id: impl Into<String>,
    ) -> Result<Self> {
        let node_id = node_id.into();
        validate_source(&node_id, sample_rate)?;
        let capture_id = capture_id.unwrap_or_else(Uuid::new_v4);
        Ok(Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            capture_id,
            node_id,
            sample_rate,
            created: Timestamp::now(),
            state: WriterState::Unopened,
            finished: Vec::new(),
            active: CaptureWriterSegment::new(capture_id, 0),
        })
    }

    /// Create a writer from validated configuration
    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            &config.root_dir,
            config.sample_rate,
            config.capture_id,
            config.node_id.clone(),
        )
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn capture_id(&self) -> Uuid {
        self.capture_id
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// When this writer was constructed
    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// All segments of the session, oldest first; the last one is active.
    pub fn segments(&self) -> impl Iterator<Item = &CaptureWriterSegment> {
        self.finished.iter().chain(std::iter::once(&self.active))
    }

    pub fn active_segment(&self) -> &CaptureWriterSegment {
        &self.active
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.state == WriterState::Open {
            Ok(())
        } else {
            Err(Error::State {
                operation,
                state: self.state,
            })
        }
    }

    /// Create the root directory if needed and start accepting lines
    pub fn open(&mut self) -> Result<()> {
        if self.state != WriterState::Unopened {
            return Err(Error::State {
                operation: "open",
                state: self.state,
            });
        }

        info!(root_dir = %self.root_dir.display(), capture_id = %self.capture_id, "opening capture writer");
        if self.root_dir.is_dir() {
            info!(root_dir = %self.root_dir.display(), "root directory already exists");
        } else {
            fs::create_dir_all(&self.root_dir).map_err(Error::file(&self.root_dir))?;
        }

        self.state = WriterState::Open;
        Ok(())
    }

    /// Append one line to the active segment's data file
    pub fn append(&mut self, line: &CaptureLine) -> Result<()> {
        self.ensure_open("append")?;

        let path = self.root_dir.join(self.active.data_filename());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(Error::file(&path))?;
        writeln!(file, "{line}").map_err(Error::file(&path))?;
        file.flush().map_err(Error::file(&path))?;

        self.active.record(line.time());
        Ok(())
    }

    /// Finalize the active segment and start the next one
    pub fn roll_segment(&mut self) -> Result<()> {
        self.ensure_open("roll segment")?;
        self.finalize_if_written()?;

        let next = CaptureWriterSegment::new(self.capture_id, self.active.index + 1);
        let done = std::mem::replace(&mut self.active, next);
        debug!(
            capture_id = %self.capture_id,
            finished = done.index,
            lines = done.line_count,
            active = self.active.index,
            "rolled segment"
        );
        self.finished.push(done);
        Ok(())
    }

    /// Append a header record for the active segment to its header file.
    ///
    /// Every call appends another record; the packager reads the last one.
    /// Callers that also `close` or `roll_segment` afterwards get a second
    /// record for the same segment.
    pub fn finalize_header(&mut self) -> Result<CaptureFileInfo> {
        self.ensure_open("finalize header")?;

        let info = self.segment_info(&self.active)?;
        let path = self.root_dir.join(self.active.header_filename());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(Error::file(&path))?;
        let record = info.generate_header()?;
        writeln!(file, "{record}").map_err(Error::file(&path))?;
        file.sync_all().map_err(Error::file(&path))?;

        info!(
            header = %path.display(),
            lines = self.active.line_count,
            start = %info.start(),
            end = %info.end(),
            "finalized segment header"
        );
        Ok(info)
    }

    /// Finalize the active segment and stop accepting lines.
    ///
    /// Closing a writer that is not open is a no-op, so this is safe to call
    /// from every exit path.
    pub fn close(&mut self) -> Result<()> {
        if self.state != WriterState::Open {
            return Ok(());
        }
        let result = self.finalize_if_written();
        // Closed even if the header write failed; a retry would append twice.
        self.state = WriterState::Closed;
        info!(capture_id = %self.capture_id, segments = self.finished.len() + 1, "closed capture writer");
        result
    }

    /// Open the writer, run `f`, and close on every exit path.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn with_session<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.open()?;
        let outcome = f(self);
        let closed = self.close();
        let value = outcome?;
        closed?;
        Ok(value)
    }

    fn segment_info(&self, segment: &CaptureWriterSegment) -> Result<CaptureFileInfo> {
        match (segment.start_time, segment.end_time) {
            (Some(start), Some(end)) => {
                // Out-of-order input can leave the last line before the first.
                let (start, end) = if start <= end { (start, end) } else { (end, start) };
                CaptureFileInfo::new(start, end, self.capture_id, self.node_id.clone(), self.sample_rate)
            }
            _ => Err(Error::EmptySegment {
                index: segment.index,
            }),
        }
    }

    fn finalize_if_written(&mut self) -> Result<()> {
        if self.active.line_count == 0 {
            debug!(segment = self.active.index, "segment has no lines, skipping header");
            return Ok(());
        }
        self.finalize_header().map(|_| ())
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(capture_id = %self.capture_id, error = %e, "failed to finalize capture on drop");
        }
    }
}
