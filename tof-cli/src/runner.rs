//! Processing loop
//!
//! Reads the input, feeds every line through the decoder, writes accepted
//! values and owns the run counters. Parallel runs decode lines on a rayon
//! pool but write and count strictly in input order.

use crate::report::RunSummary;
use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tof_decoder::{open_input, Decoder, LineOutcome, RawLines, RunCounters, ToFWriter};

/// Where to read, where to write and how to schedule
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub parallel: bool,
    pub threads: Option<usize>,
}

/// Count the lines of the input file
pub fn count_lines(path: &Path) -> Result<usize> {
    let reader = BufReader::new(open_input(path)?);
    let mut count = 0;
    for line in RawLines::new(reader) {
        line.with_context(|| format!("Failed to read {:?}", path))?;
        count += 1;
    }
    Ok(count)
}

/// Decode one input file into its output file
pub fn run(decoder: &Decoder, options: &RunOptions) -> Result<RunSummary> {
    let started_at = Utc::now();

    // Fails before the output file is created
    let lines = count_lines(&options.input)?;
    log::info!("Lines: {}", lines);

    let mut writer = ToFWriter::create(&options.output, decoder.config().precision)?;
    let mut counters = RunCounters::new();

    if options.parallel {
        let outcomes = decode_parallel(decoder, &options.input, options.threads)?;
        for outcome in &outcomes {
            handle_outcome(outcome, &mut writer, &mut counters)?;
        }
    } else {
        for outcome in decoder.decode_file(&options.input)? {
            let outcome = outcome.with_context(|| format!("Failed to read {:?}", options.input))?;
            handle_outcome(&outcome, &mut writer, &mut counters)?;
        }
    }

    let written = writer.written();
    writer.finish().context("Failed to flush output file")?;

    Ok(RunSummary {
        input: options.input.clone(),
        output: options.output.clone(),
        lines,
        stop_limit: decoder.stop_limit(),
        counters,
        written,
        parallel: options.parallel,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Decode all lines on a worker pool; the result is in input order
fn decode_parallel(
    decoder: &Decoder,
    input: &Path,
    threads: Option<usize>,
) -> Result<Vec<LineOutcome>> {
    let reader = BufReader::new(open_input(input)?);
    let lines = RawLines::new(reader)
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read {:?}", input))?;

    let decode = || -> Vec<LineOutcome> {
        lines
            .par_iter()
            .map(|line| decoder.process_line(line))
            .collect()
    };

    match threads {
        Some(n) => {
            log::debug!("Decoding {} lines on {} threads", lines.len(), n);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("Failed to build worker pool")?;
            Ok(pool.install(decode))
        }
        None => Ok(decode()),
    }
}

/// Report, write and count one outcome
fn handle_outcome<W: Write>(
    outcome: &LineOutcome,
    writer: &mut ToFWriter<W>,
    counters: &mut RunCounters,
) -> Result<()> {
    match outcome {
        LineOutcome::Accepted { tof_ns, .. } => {
            writer.write_tof(*tof_ns).context("Failed to write output")?;
        }
        LineOutcome::Rejected {
            line_number,
            tof_ns,
        } => {
            log::trace!("Line {}: STOP out of range ({}ns)", line_number, tof_ns);
        }
        LineOutcome::Malformed {
            line_number,
            content,
        } => {
            log::warn!("Ignored line {} >>> {}", line_number, content);
        }
        LineOutcome::Failed {
            line_number,
            content,
            error,
        } => {
            log::error!(
                "{} on line {}: {} >>> {}",
                error.kind(),
                line_number,
                error,
                content
            );
        }
    }
    counters.record(outcome);
    Ok(())
}
