//! Decoder configuration types
//!
//! This module defines the detector constants and run options needed by the
//! decoder library. Every constant has a default matching the current
//! acquisition board, so `DecoderConfig::new()` is enough for ordinary runs;
//! other hardware generations override the fields they need.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Acquisition clock frequency in Hz
pub const DEFAULT_CLOCK_HZ: f64 = 8_000_000.0;

/// Divisor applied to the calibration counter difference
pub const DEFAULT_CALIBRATION_DIVISOR: f64 = 9.0;

/// Field separator (ASCII 32)
pub const DEFAULT_SEPARATOR: char = ' ';

/// Lines of this length or shorter are malformed
pub const DEFAULT_MIN_LINE_LENGTH: usize = 10;

/// STOP limit used when none is requested, in ns
pub const DEFAULT_STOP_LIMIT_NS: f64 = 3700.0;

/// Requested limits at or above this value fall back to the default (dead time)
pub const STOP_LIMIT_CEILING_NS: f64 = 3926.0;

/// Fixed parameters of the acquisition hardware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Time counter clock in Hz
    #[serde(default = "default_clock_hz")]
    pub clock_hz: f64,

    /// Calibration interval divisor
    #[serde(default = "default_calibration_divisor")]
    pub calibration_divisor: f64,

    /// Token separator
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Lines must be strictly longer than this to be decoded
    #[serde(default = "default_min_line_length")]
    pub min_line_length: usize,
}

fn default_clock_hz() -> f64 {
    DEFAULT_CLOCK_HZ
}

fn default_calibration_divisor() -> f64 {
    DEFAULT_CALIBRATION_DIVISOR
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

fn default_min_line_length() -> usize {
    DEFAULT_MIN_LINE_LENGTH
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            calibration_divisor: DEFAULT_CALIBRATION_DIVISOR,
            separator: DEFAULT_SEPARATOR,
            min_line_length: DEFAULT_MIN_LINE_LENGTH,
        }
    }
}

impl DetectorConfig {
    /// Check that the constants describe a usable detector
    pub fn validate(&self) -> Result<()> {
        if !self.clock_hz.is_finite() || self.clock_hz <= 0.0 {
            return Err(DecoderError::InvalidConfig(format!(
                "clock_hz must be a positive number, got {}",
                self.clock_hz
            )));
        }
        if !self.calibration_divisor.is_finite() || self.calibration_divisor == 0.0 {
            return Err(DecoderError::InvalidConfig(format!(
                "calibration_divisor must be finite and non-zero, got {}",
                self.calibration_divisor
            )));
        }
        if self.separator.is_ascii_digit() {
            return Err(DecoderError::InvalidConfig(format!(
                "separator cannot be a digit, got {:?}",
                self.separator
            )));
        }
        Ok(())
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Detector constants
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Operator-requested STOP limit in ns (None = default)
    #[serde(default)]
    pub stop_limit_ns: Option<f64>,

    /// Significant digits for written ToF values (None = shortest round-trip)
    #[serde(default)]
    pub precision: Option<usize>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: request a STOP limit
    pub fn with_stop_limit(mut self, limit_ns: f64) -> Self {
        self.stop_limit_ns = Some(limit_ns);
        self
    }

    /// Builder method: override the clock frequency
    pub fn with_clock_hz(mut self, clock_hz: f64) -> Self {
        self.detector.clock_hz = clock_hz;
        self
    }

    /// Builder method: override the calibration divisor
    pub fn with_calibration_divisor(mut self, divisor: f64) -> Self {
        self.detector.calibration_divisor = divisor;
        self
    }

    /// Builder method: override the token separator
    pub fn with_separator(mut self, separator: char) -> Self {
        self.detector.separator = separator;
        self
    }

    /// Builder method: write ToF values with `digits` significant digits
    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if let Some(limit) = self.stop_limit_ns {
            if !limit.is_finite() {
                return Err(DecoderError::InvalidLimit(limit));
            }
        }
        if self.precision == Some(0) {
            return Err(DecoderError::InvalidConfig(
                "precision must be at least 1 significant digit".to_string(),
            ));
        }
        Ok(())
    }
}
