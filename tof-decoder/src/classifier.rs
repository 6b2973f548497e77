//! STOP-limit classification and run counters

use crate::config::{DEFAULT_STOP_LIMIT_NS, STOP_LIMIT_CEILING_NS};
use crate::types::{DecoderError, LineOutcome, Result};
use serde::{Deserialize, Serialize};

/// Effective STOP limit after applying the dead-time ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLimit {
    /// Limit actually used for classification, in ns
    pub effective_ns: f64,
    /// Limit the operator asked for, if any
    pub requested_ns: Option<f64>,
    /// True if the requested limit was at or above the ceiling and was replaced
    pub clamped: bool,
}

impl StopLimit {
    /// Resolve the operator's request into an effective limit
    ///
    /// No request gives the default. A request at or above the ceiling is
    /// replaced by the default and flagged as clamped.
    pub fn resolve(requested_ns: Option<f64>) -> Result<Self> {
        match requested_ns {
            None => Ok(Self {
                effective_ns: DEFAULT_STOP_LIMIT_NS,
                requested_ns: None,
                clamped: false,
            }),
            Some(limit) if !limit.is_finite() => Err(DecoderError::InvalidLimit(limit)),
            Some(limit) if limit >= STOP_LIMIT_CEILING_NS => {
                log::debug!(
                    "Requested STOP limit {}ns is at or above the {}ns ceiling",
                    limit,
                    STOP_LIMIT_CEILING_NS
                );
                Ok(Self {
                    effective_ns: DEFAULT_STOP_LIMIT_NS,
                    requested_ns: Some(limit),
                    clamped: true,
                })
            }
            Some(limit) => Ok(Self {
                effective_ns: limit,
                requested_ns: Some(limit),
                clamped: false,
            }),
        }
    }
}

impl Default for StopLimit {
    fn default() -> Self {
        Self {
            effective_ns: DEFAULT_STOP_LIMIT_NS,
            requested_ns: None,
            clamped: false,
        }
    }
}

/// Buckets ToF values against a STOP limit
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    limit: StopLimit,
}

impl Classifier {
    pub fn new(limit: StopLimit) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> StopLimit {
        self.limit
    }

    /// True if `tof_ns` is within the limit (inclusive)
    pub fn classify(&self, tof_ns: f64) -> bool {
        classify(tof_ns, self.limit.effective_ns)
    }
}

/// Inclusive comparison against a limit
pub fn classify(tof_ns: f64, limit_ns: f64) -> bool {
    tof_ns <= limit_ns
}

/// Per-run accumulator, owned by the processing loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Records within the STOP limit
    pub accepted_count: usize,
    /// Records decoded but above the STOP limit
    pub rejected_count: usize,
    /// Lines failing the character-class check
    pub malformed_count: usize,
    /// Lines that passed the check but failed decoding or ToF computation
    pub error_count: usize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one line outcome
    pub fn record(&mut self, outcome: &LineOutcome) {
        match outcome {
            LineOutcome::Accepted { .. } => self.accepted_count += 1,
            LineOutcome::Rejected { .. } => self.rejected_count += 1,
            LineOutcome::Malformed { .. } => self.malformed_count += 1,
            LineOutcome::Failed { .. } => self.error_count += 1,
        }
    }

    /// Number of lines accounted for
    pub fn total(&self) -> usize {
        self.accepted_count + self.rejected_count + self.malformed_count + self.error_count
    }
}
