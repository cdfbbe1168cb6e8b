//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::outline::OutlineStrategy;

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
}

#[derive(Debug, Parser)]
#[command(
    name = "frame-outline",
    version,
    about = "Extract outlines from sampled video frames and keep the ones with content"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract outlines and keep frames with enough content
    Filter(FilterArgs),

    /// Print the white fraction and content decision for one image
    Density(DensityArgs),

    /// Show version and config file locations
    Info,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Frame image or directory of frames
    pub input: PathBuf,

    /// Output directory for outlines
    #[arg(short, long, default_value = "outlines")]
    pub output: PathBuf,

    /// Outline extraction strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<OutlineStrategy>,

    /// White fraction at or above which a frame is dropped
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Full-scale pixel value
    #[arg(long)]
    pub max_val: Option<f64>,

    /// Allowed difference between outline channels
    #[arg(long)]
    pub channel_tolerance: Option<u8>,

    /// Worker threads (default: one per CPU)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Also write outlines of rejected frames to <output>/rejected
    #[arg(long)]
    pub write_rejected: bool,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Show what would be processed without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl FilterArgs {
    /// Only values the user actually passed
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            strategy: self.strategy,
            threshold: self.threshold,
            max_val: self.max_val,
            channel_tolerance: self.channel_tolerance,
            threads: self.threads,
            write_rejected: self.write_rejected.then_some(true),
        }
    }
}

#[derive(Debug, Args)]
pub struct DensityArgs {
    /// Image to measure
    pub image: PathBuf,

    /// White fraction at or above which the image has no content
    #[arg(short, long, default_value_t = crate::density::DEFAULT_CONTENT_THRESHOLD)]
    pub threshold: f64,

    /// Full-scale pixel value
    #[arg(long, default_value_t = crate::density::DEFAULT_MAX_VAL)]
    pub max_val: f64,

    /// Extract the outline first with this strategy
    #[arg(long, value_enum)]
    pub outline: Option<OutlineStrategy>,
}
