//! frame-outline - outline extraction and content filtering for video frames
//!
//! CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use frame_outline::{
    collect_frame_files, exit_codes, AsArrayView, Cli, Commands, Config, ContentDensityEvaluator,
    DensityArgs, DensityOptions, FilterArgs, FilterConfig, FilterError, FrameFilter, FrameProgress,
    OutlineExtractor, OutputMode,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter(args) => {
            init_logging(args.verbose, args.quiet);
            run_filter(&args)
        }
        Commands::Density(args) => {
            init_logging(0, false);
            run_density(&args)
        }
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

/// Log level follows verbosity unless RUST_LOG is set
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("frame_outline={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<FilterError>() {
        Some(FilterError::InputNotFound(_)) => exit_codes::INPUT_NOT_FOUND,
        Some(FilterError::Density(_)) | Some(FilterError::Outline(_)) => exit_codes::INVALID_ARGS,
        _ => exit_codes::GENERAL_ERROR,
    }
}

// ============ Filter Command ============

fn run_filter(args: &FilterArgs) -> Result<()> {
    let start_time = Instant::now();

    let frames = collect_frame_files(&args.input)?;
    if frames.is_empty() {
        return Err(FilterError::InputNotFound(args.input.clone()))
            .context("no frame images (png/jpg/jpeg/bmp) in input");
    }

    let file_config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable config file");
            Config::default()
        }),
    };
    let config = file_config.merge_with_cli(&args.overrides());
    let config_json = config
        .to_json()
        .context("failed to serialize effective configuration")?;
    tracing::debug!(config = %config_json, "effective configuration");

    if args.dry_run {
        print_execution_plan(args, &frames, &config);
        return Ok(());
    }

    let output_mode = if args.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::from_verbosity(args.verbose)
    };
    let progress = FrameProgress::new(output_mode);

    let filter = FrameFilter::new(config);
    let report = filter.process_paths_with_progress(&frames, &args.output, &progress)?;

    if let Some(report_path) = &args.report {
        report
            .save_json(report_path)
            .with_context(|| format!("failed to write report {}", report_path.display()))?;
    }

    if output_mode.should_show(OutputMode::Normal) {
        FrameProgress::print_summary(
            report.frames.len(),
            report.kept,
            report.rejected,
            report.errors,
        );
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    if report.errors > 0 {
        anyhow::bail!("{} frame(s) failed to process", report.errors);
    }

    Ok(())
}

/// Print execution plan for dry-run mode
fn print_execution_plan(args: &FilterArgs, frames: &[PathBuf], config: &FilterConfig) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!("Frames to process: {}", frames.len());
    println!();
    println!("Filter Configuration:");
    println!("  Strategy: {}", config.strategy);
    println!("  Content threshold: {}", config.density.threshold);
    println!("  Max value: {}", config.density.max_val);
    println!("  Channel tolerance: {}", config.density.channel_tolerance);
    println!("  Threads: {}", config.effective_threads());
    println!(
        "  Write rejected: {}",
        if config.write_rejected { "YES" } else { "NO" }
    );
    println!();
    println!("Frames:");
    for (i, frame) in frames.iter().enumerate() {
        println!("  {}. {}", i + 1, frame.display());
    }
}

// ============ Density Command ============

fn run_density(args: &DensityArgs) -> Result<()> {
    if !args.image.is_file() {
        return Err(FilterError::InputNotFound(args.image.clone()).into());
    }

    let img = image::open(&args.image)
        .map_err(FilterError::from)
        .with_context(|| format!("failed to decode {}", args.image.display()))?;

    let evaluator = ContentDensityEvaluator::new(
        DensityOptions::builder()
            .threshold(args.threshold)
            .max_val(args.max_val)
            .build(),
    );

    let result = match args.outline {
        Some(strategy) => {
            let outline = strategy
                .extract(&img.to_rgb8())
                .map_err(FilterError::from)?;
            let view = outline.as_array_view().map_err(|e| FilterError::Density(e.into()))?;
            evaluator.evaluate(view).map_err(FilterError::from)?
        }
        None => {
            // Channels are checked for agreement before channel 0 is counted
            let rgb = img.to_rgb8();
            let view = rgb.as_array_view().map_err(|e| FilterError::Density(e.into()))?;
            evaluator.evaluate(view).map_err(FilterError::from)?
        }
    };

    println!("{}", args.image.display());
    println!("  White fraction: {:.4}", result.fraction_white);
    println!(
        "  Has content:    {} (threshold {})",
        if result.has_content { "YES" } else { "NO" },
        evaluator.options().threshold
    );

    Ok(())
}

// ============ Info Command ============

fn run_info() -> Result<()> {
    println!("frame-outline v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("Defaults:");
    let defaults = FilterConfig::default();
    println!("  Strategy: {}", defaults.strategy);
    println!("  Content threshold: {}", defaults.density.threshold);
    println!("  Max value: {}", defaults.density.max_val);

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let status = if path.is_file() { "found" } else { "not found" };
        println!("  {} ({})", path.display(), status);
    }

    Ok(())
}
