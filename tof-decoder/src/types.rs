//! Core types for the ToF decoder library
//!
//! This module defines the values that flow through the per-line pipeline:
//! the raw input line, the reconstructed counters, the derived ToF result and
//! the outcome the decoder emits for every line. The decoder is stateless and
//! only emits outcomes - counting and writing happen in the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// A single line of input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line content without the trailing newline
    pub content: String,
    /// 0-based index of the line in the input
    pub line_number: usize,
}

impl RawLine {
    pub fn new(line_number: usize, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            line_number,
        }
    }
}

/// Counters reconstructed from one well-formed line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Time counter (clock ticks between START and STOP)
    pub time: f64,
    /// First calibration counter
    pub cal1: f64,
    /// Second calibration counter
    pub cal2: f64,
}

/// ToF value of one record together with its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToFResult {
    /// Time of flight in nanoseconds
    pub tof_ns: f64,
    /// True if `tof_ns` is within the STOP limit
    pub accepted: bool,
}

/// What happened to one input line - the primary output of the decoder
#[derive(Debug, PartialEq)]
pub enum LineOutcome {
    /// ToF computed and within the STOP limit
    Accepted {
        line_number: usize,
        tof_ns: f64,
    },

    /// ToF computed but above the STOP limit
    Rejected {
        line_number: usize,
        tof_ns: f64,
    },

    /// Line failed the character-class check and was never decoded
    Malformed {
        line_number: usize,
        content: String,
    },

    /// Line passed the character check but decoding or ToF computation failed
    Failed {
        line_number: usize,
        content: String,
        error: DecoderError,
    },
}

impl LineOutcome {
    /// Get the 0-based input line index of this outcome
    pub fn line_number(&self) -> usize {
        match self {
            LineOutcome::Accepted { line_number, .. } => *line_number,
            LineOutcome::Rejected { line_number, .. } => *line_number,
            LineOutcome::Malformed { line_number, .. } => *line_number,
            LineOutcome::Failed { line_number, .. } => *line_number,
        }
    }

    /// Get the ToF value if one was computed
    pub fn tof_ns(&self) -> Option<f64> {
        match self {
            LineOutcome::Accepted { tof_ns, .. } | LineOutcome::Rejected { tof_ns, .. } => {
                Some(*tof_ns)
            }
            _ => None,
        }
    }

    /// Get the ToF value only if the record was accepted
    pub fn accepted_tof(&self) -> Option<f64> {
        match self {
            LineOutcome::Accepted { tof_ns, .. } => Some(*tof_ns),
            _ => None,
        }
    }

    /// Convert a classified outcome into a `ToFResult`
    pub fn to_result(&self) -> Option<ToFResult> {
        match self {
            LineOutcome::Accepted { tof_ns, .. } => Some(ToFResult {
                tof_ns: *tof_ns,
                accepted: true,
            }),
            LineOutcome::Rejected { tof_ns, .. } => Some(ToFResult {
                tof_ns: *tof_ns,
                accepted: false,
            }),
            _ => None,
        }
    }
}

/// Error taxonomy used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Input or output file could not be opened
    File,
    /// Line failed the character-class precondition
    MalformedLine,
    /// Line could not be split into nine numeric tokens
    Format,
    /// ToF computation is undefined for the record
    Arithmetic,
    /// Read/write failure while processing
    Io,
    /// Invalid limit or detector configuration
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::File => write!(f, "FileError"),
            ErrorKind::MalformedLine => write!(f, "MalformedLineError"),
            ErrorKind::Format => write!(f, "FormatError"),
            ErrorKind::Arithmetic => write!(f, "ArithmeticError"),
            ErrorKind::Io => write!(f, "IoError"),
            ErrorKind::Config => write!(f, "ConfigError"),
        }
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to open {path:?}: {source}")]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line_number}: {content:?}")]
    MalformedLine { line_number: usize, content: String },

    #[error("Insufficient fields: found {found} tokens, expected {expected}")]
    InsufficientFields { found: usize, expected: usize },

    #[error("Invalid numeric token {token:?} at position {index}")]
    InvalidNumericToken { index: usize, token: String },

    #[error("Zero calibration interval (cal1 = cal2 = {cal1})")]
    ZeroCalibrationInterval { cal1: f64, cal2: f64 },

    #[error("ToF is not a finite number: {0}")]
    NonFiniteToF(f64),

    #[error("Invalid STOP limit: {0}")]
    InvalidLimit(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecoderError {
    /// Classify this error into the reporting taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecoderError::FileError { .. } => ErrorKind::File,
            DecoderError::MalformedLine { .. } => ErrorKind::MalformedLine,
            DecoderError::InsufficientFields { .. } | DecoderError::InvalidNumericToken { .. } => {
                ErrorKind::Format
            }
            DecoderError::ZeroCalibrationInterval { .. } | DecoderError::NonFiniteToF(_) => {
                ErrorKind::Arithmetic
            }
            DecoderError::InvalidLimit(_) | DecoderError::InvalidConfig(_) => ErrorKind::Config,
            DecoderError::IoError(_) => ErrorKind::Io,
        }
    }

    /// True for errors that only affect a single record
    pub fn is_record_level(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedLine | ErrorKind::Format | ErrorKind::Arithmetic
        )
    }
}

// Outcomes are compared in tests; io::Error has no PartialEq, so compare by
// variant and message.
impl PartialEq for DecoderError {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.to_string() == other.to_string()
    }
}
