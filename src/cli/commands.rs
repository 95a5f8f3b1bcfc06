//! CLI commands

use crate::config::CaptureConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// hbcapture CLI
#[derive(Parser)]
#[command(name = "hbcapture")]
#[command(about = "Record heartbeat captures into segments and package them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record data lines from a file or stdin into segment files
    Record(RecordArgs),
    /// Merge each segment of a capture into a self-describing file
    Package(CaptureArgs),
    /// List the segments of a capture and their time ranges
    Segments(CaptureArgs),
}

#[derive(Args)]
pub struct RecordArgs {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory for segment files
    #[arg(short, long)]
    pub root: Option<PathBuf>,
    /// Node identifier
    #[arg(short, long)]
    pub node: Option<String>,
    /// Samples per second
    #[arg(short, long)]
    pub sample_rate: Option<f64>,
    /// Capture id (generated when omitted)
    #[arg(long)]
    pub capture_id: Option<Uuid>,
    /// Start a new segment after this many lines
    #[arg(long)]
    pub roll_every: Option<u64>,
    /// Read lines from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl RecordArgs {
    /// Overlay command line flags on a loaded configuration
    pub fn apply(&self, config: &mut CaptureConfig) {
        if let Some(root) = &self.root {
            config.root_dir = root.clone();
        }
        if let Some(node) = &self.node {
            config.node_id = node.clone();
        }
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if self.capture_id.is_some() {
            config.capture_id = self.capture_id;
        }
        if self.roll_every.is_some() {
            config.roll_every = self.roll_every;
        }
    }
}

#[derive(Args)]
pub struct CaptureArgs {
    /// Directory holding the segment files
    #[arg(short, long)]
    pub root: PathBuf,
    /// Capture id to package
    #[arg(short, long)]
    pub capture_id: Uuid,
}
