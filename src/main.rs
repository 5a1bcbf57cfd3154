use anyhow::Context;
use clap::Parser;
use feedlint::{validate_directory, ValidationOptions};
use log::info;
use std::path::PathBuf;

/// Validates an unpacked GTFS feed directory and prints a JSON report
/// of every notice found.
#[derive(Parser, Debug)]
#[command(name = "feedlint", version, about)]
struct Args {
    /// Path to the unpacked feed directory
    feed_dir: PathBuf,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Feed files to leave out of the run; everything depending on an
    /// excluded file is excluded with it
    #[arg(long = "exclude", value_name = "FILE")]
    excluded: Vec<String>,

    /// Rows processed per file before truncation
    #[arg(long, default_value_t = 2_000_000)]
    max_rows_per_file: u64,

    /// Notices of one code retained in detail in the report
    #[arg(long, default_value_t = 100)]
    max_notices_per_code: usize,

    /// Buffer in meters around a trip shape within which its stops
    /// must lie
    #[arg(long, default_value_t = 100.0)]
    shape_buffer_meters: f64,

    /// Ceiling in km/h on travel speed between consecutive stops
    #[arg(long, default_value_t = 150.0)]
    max_travel_speed_kmh: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut options = ValidationOptions::default()
        .max_rows_per_file(args.max_rows_per_file)
        .max_notices_per_code(args.max_notices_per_code)
        .shape_buffer_meters(args.shape_buffer_meters)
        .max_travel_speed_kmh(args.max_travel_speed_kmh);
    for file_name in &args.excluded {
        options = options.exclude_file(file_name);
    }

    let report = validate_directory(&args.feed_dir, options)
        .with_context(|| format!("validating {}", args.feed_dir.display()))?;
    info!(
        "{} notice(s), {} error(s)",
        report.notices.total(),
        report.notices.error_count()
    );

    let json = serde_json::to_string_pretty(&report.notices.export_json())
        .context("serializing report")?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{}", json),
    }

    if report.notices.error_count() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
