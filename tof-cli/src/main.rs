//! ToF Decoder CLI Application
//!
//! This is the command-line interface for the ToF raw data decoder.
//! It uses the tof-decoder library and adds:
//! - Argument and configuration file handling
//! - Console reporting of the STOP limit, ignored lines and counts
//! - Sequential or parallel processing of one raw data file
//! - A JSON run summary

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tof_decoder::config::STOP_LIMIT_CEILING_NS;
use tof_decoder::{output_path_for, Decoder, StopLimit};

mod config;
mod report;
mod runner;

/// ToF Decoder - Convert raw detector records into time-of-flight values
#[derive(Parser, Debug)]
#[command(name = "tof-decode")]
#[command(about = "Decode ToF raw data and filter STOPs above a limit", long_about = None)]
#[command(version)]
struct Args {
    /// Raw data file to decode
    #[arg(value_name = "RAWDATA")]
    input: PathBuf,

    /// STOP limit in ns (default 3700; values >= 3926 fall back to 3700)
    #[arg(value_name = "STOP_LIMIT", value_parser = parse_limit)]
    stop_limit: Option<f64>,

    /// Output file (default: OUT<input name> next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write ToF values with this many significant digits
    #[arg(long, value_name = "DIGITS", value_parser = clap::value_parser!(u16).range(1..=17))]
    precision: Option<u16>,

    /// Decode lines in parallel (output order is unchanged)
    #[arg(long)]
    parallel: bool,

    /// Worker threads for --parallel
    #[arg(
        long,
        value_name = "COUNT",
        requires = "parallel",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    threads: Option<u16>,

    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_limit(value: &str) -> std::result::Result<f64, String> {
    let limit: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !limit.is_finite() {
        return Err(format!("'{}' is not a finite number", value));
    }
    Ok(limit)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("ToF Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", tof_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let decoder_config =
        app_config.decoder_config(args.stop_limit, args.precision.map(usize::from));
    let decoder = Decoder::new(decoder_config).context("Invalid decoder configuration")?;
    report_stop_limit(&decoder.stop_limit());

    let output = match (&args.output, &app_config.output.directory) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => {
            let default = output_path_for(&args.input)?;
            match default.file_name() {
                Some(name) => dir.join(name),
                None => default,
            }
        }
        (None, None) => output_path_for(&args.input)?,
    };

    let options = runner::RunOptions {
        input: args.input.clone(),
        output,
        parallel: args.parallel || app_config.processing.parallel,
        threads: args
            .threads
            .map(usize::from)
            .or(app_config.processing.threads),
    };

    if !options.parallel && options.threads.is_some() {
        log::warn!("processing.threads is set but parallel processing is off; ignoring it");
    }

    let summary = runner::run(&decoder, &options)?;
    summary.print();

    if let Some(path) = args.summary_json.or(app_config.output.summary_json) {
        summary.write_json(&path)?;
    }

    Ok(())
}

/// Tell the operator which STOP limit is in effect
///
/// Printed to stdout so that `-q` does not hide a clamped limit.
fn report_stop_limit(limit: &StopLimit) {
    let notice = stop_limit_notice(limit);
    println!("{}", notice);
    if limit.clamped {
        log::debug!("Requested STOP limit {:?}ns was clamped", limit.requested_ns);
    }
}

fn stop_limit_notice(limit: &StopLimit) -> String {
    if limit.clamped {
        format!(
            "STOP limit must be < {}ns, STOP limit set to {}ns.",
            STOP_LIMIT_CEILING_NS, limit.effective_ns
        )
    } else {
        format!(
            "STOP limit set to {}ns, STOPs above {}ns will be ignored.",
            limit.effective_ns, limit.effective_ns
        )
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
