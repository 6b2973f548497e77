//! ToF Decoder Library
//!
//! A stateless, reusable library for decoding the text records written by the
//! time-of-flight detector's acquisition electronics.
//!
//! # Architecture
//!
//! Every input line goes through the same three steps:
//! - `RecordDecoder` validates the line and rebuilds the time and calibration
//!   counters from their byte-weighted tokens
//! - `ToFComputer` converts the counters into nanoseconds
//! - `Classifier` compares the result against the STOP limit
//!
//! The result of each line is a `LineOutcome`. The library does NOT:
//! - Print anything to the console
//! - Keep counters between lines (see `RunCounters`, owned by the caller)
//! - Decide how runs are scheduled or parallelised
//!
//! All of that lives in the application layer (tof-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use tof_decoder::{Decoder, DecoderConfig, RunCounters, ToFWriter, output_path_for};
//! use std::path::Path;
//!
//! let input = Path::new("run042.txt");
//! let decoder = Decoder::new(DecoderConfig::new().with_stop_limit(3500.0)).unwrap();
//! let mut writer = ToFWriter::create(&output_path_for(input).unwrap(), None).unwrap();
//! let mut counters = RunCounters::new();
//!
//! for outcome in decoder.decode_file(input).unwrap() {
//!     let outcome = outcome.unwrap();
//!     if let Some(tof) = outcome.accepted_tof() {
//!         writer.write_tof(tof).unwrap();
//!     }
//!     counters.record(&outcome);
//! }
//! writer.finish().unwrap();
//! println!("STOPs in range: {}", counters.accepted_count);
//! ```

// Public modules
pub mod classifier;
pub mod config;
pub mod decoder;
pub mod output;
pub mod record;
pub mod tof;
pub mod types;

// Re-export main types for convenience
pub use classifier::{Classifier, RunCounters, StopLimit};
pub use config::{DecoderConfig, DetectorConfig};
pub use decoder::{open_input, Decoder, DecodingIterator, RawLines};
pub use output::{format_tof, output_path_for, ToFWriter};
pub use record::RecordDecoder;
pub use tof::ToFComputer;
pub use types::{
    DecoderError, ErrorKind, LineOutcome, Measurement, RawLine, Result, ToFResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
