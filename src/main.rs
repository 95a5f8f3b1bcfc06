//! hbcapture: main entry point

use anyhow::Context;
use clap::Parser;
use hbcapture::cli::{self, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record(args) => {
            let summary = cli::record(&args).context("recording failed")?;
            println!("{}", summary.capture_id);
        }
        Commands::Package(args) => {
            let packaged = cli::package(&args)
                .with_context(|| format!("packaging capture {} failed", args.capture_id))?;
            for segment in packaged {
                println!("{}", segment.output_path.display());
            }
        }
        Commands::Segments(args) => {
            let listed = cli::segments(&args)
                .with_context(|| format!("listing capture {} failed", args.capture_id))?;
            for (pair, info) in listed {
                println!(
                    "{}\t{}\t{}\t{:.3}s\t{}",
                    pair.index,
                    info.start(),
                    info.end(),
                    info.duration_secs(),
                    pair.data_path.display()
                );
            }
        }
    }
    Ok(())
}
