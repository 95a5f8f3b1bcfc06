//! hbcapture: segmented heartbeat capture files
//!
//! Records a time-ordered stream of sensor readings to disk as rolling
//! segments and later reassembles each segment into a self-describing file.
//!
//! # Core Concepts
//!
//! - **Capture lines**: one timestamped reading with its integer samples
//! - **Segments**: a DATA file of lines plus a HEADER file describing them
//! - **Capture session**: all segments sharing one capture id
//! - **Packaging**: merging a segment's header and data into one file
//!
//! # Example
//!
//! ```no_run
//! use hbcapture::prelude::*;
//!
//! # fn example() -> hbcapture::error::Result<()> {
//! let mut writer = CaptureWriter::new("captures", 20000.0, None, "ET0001")?;
//! writer.with_session(|w| {
//!     w.append(&CaptureLine::new(Timestamp::from_secs(100), vec![512, 512, 512])?)?;
//!     w.roll_segment()?;
//!     w.append(&CaptureLine::new(Timestamp::from_secs(101), vec![510, 514, 512])?)
//! })?;
//!
//! for packaged in CapturePackager::from_writer(&writer).package()? {
//!     println!("{}", packaged.output_path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::CaptureConfig;
    pub use crate::core::*;
    pub use crate::error::{Error, Result};
    pub use crate::storage::*;
}
