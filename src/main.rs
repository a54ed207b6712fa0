use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use webp_batch::{
    config::{Config, ConversionOptions},
    progress::ConsoleProgressReporter,
    scan_directory, write_report, BatchConverter, BatchOutcome, BatchReport, SpaceValidator,
    format_bytes, format_duration, format_signed_bytes,
};

/// webp-batch - Batch image to WebP converter
///
/// Converts every JPEG, PNG and BMP image in a directory to a lossy WebP file
/// next to the original, optionally scaling each so its shorter side matches a target size
#[derive(Parser)]
#[command(name = "webp-batch")]
#[command(about = "webp-batch - Batch image to WebP converter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory containing the images to convert
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Short edge size in pixels (longer edge scales automatically; omit to keep original size)
    #[arg(short, long, value_name = "PIXELS", value_parser = clap::value_parser!(i32).range(1..))]
    pub size: Option<i32>,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use a predefined configuration profile
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Verbose output mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (results only)
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write a JSON report of the batch
    #[arg(long)]
    pub report: bool,

    /// Where to write the JSON report
    #[arg(long, value_name = "FILE")]
    pub report_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let options = build_options(&args, &config)?;

    // Initialize logging
    if options.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else if !options.quiet {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    if options.input_dir.as_os_str().is_empty() {
        bail!("No input directory given (use --input or set general.input_dir in the config file)");
    }

    let files = scan_directory(&options.input_dir)?;
    if files.is_empty() {
        println!(
            "No supported image files found in {}",
            options.input_dir.display()
        );
        return Ok(());
    }

    let validation = SpaceValidator::new().validate(&files, &options.input_dir);
    if !validation.is_valid() {
        bail!("{}", validation.message());
    }

    let start_time = Instant::now();
    let start_time_utc = Utc::now();
    let total_files = files.len();

    let reporter: Box<dyn webp_batch::ProgressReporter> = if options.quiet {
        Box::new(webp_batch::progress::NoOpProgressReporter)
    } else {
        Box::new(ConsoleProgressReporter::new())
    };

    let handle = BatchConverter::new(options.clone()).spawn(files, reporter)?;
    let outcome = handle.join()?;

    if options.generate_report {
        let report = BatchReport {
            start_time: start_time_utc,
            end_time: Utc::now(),
            duration: start_time.elapsed(),
            input_dir: options.input_dir.clone(),
            short_edge_size: options.short_edge_size,
            state: outcome.state,
            total_files,
            result: outcome.result.clone(),
        };
        write_report(&report, &options.report_path)?;
        if !options.quiet {
            println!("Report saved to: {}", options.report_path.display());
        }
    }

    if options.quiet {
        for error in &outcome.result.errors {
            eprintln!("{error}");
        }
    } else {
        print_results_summary(&outcome, total_files, start_time.elapsed());
    }

    Ok(())
}

/// Defaults, then the config file, then the profile, then command-line flags
fn build_options(args: &Args, config: &Config) -> Result<ConversionOptions> {
    let mut options = ConversionOptions::default().apply_config(config);

    if let Some(name) = &args.profile {
        let profile = config
            .profile(name)
            .context("Check the [profiles] section of your config file")?;
        options = options.apply_profile(profile);
    }

    if let Some(input) = &args.input {
        options.input_dir = input.clone();
    }
    if let Some(size) = args.size {
        options = options.with_short_edge_size(size);
    }
    if args.verbose {
        options = options.with_verbose(true).with_quiet(false);
    }
    if args.quiet {
        options = options.with_quiet(true).with_verbose(false);
    }
    if args.report {
        options = options.with_report(true);
    }
    if let Some(path) = &args.report_path {
        options = options.with_report_path(path.clone());
    }

    Ok(options)
}

fn print_results_summary(outcome: &BatchOutcome, total_files: usize, elapsed: std::time::Duration) {
    let result = &outcome.result;

    println!("\n🎉 Conversion {}!", outcome.state);
    println!("📊 Results Summary:");
    println!("  📁 Total files: {}", result.total_count());
    println!("  ✅ Converted: {} files", result.success_count);
    if result.fail_count > 0 {
        println!("  ❌ Failed: {} files", result.fail_count);
    }
    let skipped = total_files - result.total_count();
    if skipped > 0 {
        println!("  ⏭️ Not attempted: {} files", skipped);
    }

    if result.space_saved > 0 {
        println!("\n💾 Space saved: {}", format_signed_bytes(result.space_saved));
    } else if result.space_saved < 0 {
        println!(
            "\n💾 Output grew by: {}",
            format_bytes(result.space_saved.unsigned_abs())
        );
    }

    println!("\n⏱️ Duration: {}", format_duration(elapsed));

    if !result.errors.is_empty() {
        println!("\n❌ Errors:");
        for error in &result.errors {
            println!("  • {}", error);
        }
    }
}
