//! Run report
//!
//! Collects what the operator sees at the end of a run and optionally
//! stores it as JSON next to the output.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tof_decoder::{RunCounters, StopLimit};

/// Summary of one decoding run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Lines read from the input
    pub lines: usize,
    pub stop_limit: StopLimit,
    pub counters: RunCounters,
    /// Values actually written to the output file
    pub written: usize,
    pub parallel: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Wall-clock duration of the run in milliseconds
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Print the end-of-run counts to stdout
    pub fn print(&self) {
        println!("\n=== RUN SUMMARY ===");
        println!("Input:  {:?}", self.input);
        println!("Output: {:?}", self.output);
        println!("Lines: {}", self.lines);
        println!("STOP limit: {}ns", self.stop_limit.effective_ns);
        println!("Ignored lines: {}", self.counters.malformed_count);
        println!("Decode errors: {}", self.counters.error_count);
        println!("STOPs out of range: {}", self.counters.rejected_count);
        println!("STOPs in range: {}", self.counters.accepted_count);
        log::debug!("Run finished in {} ms", self.elapsed_ms());
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write run summary: {:?}", path))?;
        log::info!("Run summary written to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        let started_at = Utc::now();
        RunSummary {
            input: PathBuf::from("run.txt"),
            output: PathBuf::from("OUTrun.txt"),
            lines: 4,
            stop_limit: StopLimit::default(),
            counters: RunCounters {
                accepted_count: 2,
                rejected_count: 1,
                malformed_count: 1,
                error_count: 0,
            },
            written: 2,
            parallel: false,
            started_at,
            finished_at: started_at + chrono::Duration::milliseconds(15),
        }
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(summary().elapsed_ms(), 15);
    }

    #[test]
    fn test_json_roundtrip_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["lines"], 4);
        assert_eq!(value["counters"]["accepted_count"], 2);
        assert_eq!(value["counters"]["malformed_count"], 1);
        assert_eq!(value["stop_limit"]["effective_ns"], 3700.0);
        assert_eq!(value["stop_limit"]["clamped"], false);
    }
}
