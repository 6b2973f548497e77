//! ToF computation
//!
//! Converts the reconstructed counters of a record into a time of flight:
//!
//! ```text
//! calcount = (cal2 - cal1) / calibration_divisor
//! tof_ns   = time / clock_hz / calcount * 1e9
//! ```

use crate::config::DetectorConfig;
use crate::types::{DecoderError, Measurement, Result};

const NS_PER_SECOND: f64 = 1e9;

/// Pure converter from counters to nanoseconds
#[derive(Debug, Clone)]
pub struct ToFComputer {
    clock_hz: f64,
    calibration_divisor: f64,
}

impl ToFComputer {
    pub fn new(detector: &DetectorConfig) -> Self {
        Self {
            clock_hz: detector.clock_hz,
            calibration_divisor: detector.calibration_divisor,
        }
    }

    /// Calibration interval of a record (may be zero or negative)
    pub fn calcount(&self, m: &Measurement) -> f64 {
        (m.cal2 - m.cal1) / self.calibration_divisor
    }

    /// Compute the ToF in nanoseconds
    ///
    /// Fails with an arithmetic error when the calibration counters are equal
    /// or the result is otherwise not finite.
    pub fn compute(&self, m: &Measurement) -> Result<f64> {
        let calcount = self.calcount(m);
        if calcount == 0.0 {
            return Err(DecoderError::ZeroCalibrationInterval {
                cal1: m.cal1,
                cal2: m.cal2,
            });
        }

        let tof_ns = (m.time * (1.0 / self.clock_hz) / calcount) * NS_PER_SECOND;
        if !tof_ns.is_finite() {
            return Err(DecoderError::NonFiniteToF(tof_ns));
        }

        Ok(tof_ns)
    }
}

impl Default for ToFComputer {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_unit_calcount() {
        let computer = ToFComputer::default();
        let m = Measurement {
            time: 100.0,
            cal1: 0.0,
            cal2: 9.0,
        };
        assert_eq!(computer.calcount(&m), 1.0);
        assert!(approx_eq(computer.compute(&m).unwrap(), 12500.0));

        let m = Measurement { time: 1.0, ..m };
        assert!(approx_eq(computer.compute(&m).unwrap(), 125.0));
    }

    #[test]
    fn test_calibration_scales_result() {
        let computer = ToFComputer::default();
        // 18 calibration units -> calcount 2 -> half the uncalibrated ToF
        let m = Measurement {
            time: 100.0,
            cal1: 10.0,
            cal2: 28.0,
        };
        assert!(approx_eq(computer.compute(&m).unwrap(), 6250.0));
    }

    #[test]
    fn test_zero_calibration_interval() {
        let computer = ToFComputer::default();
        let m = Measurement {
            time: 100.0,
            cal1: 42.0,
            cal2: 42.0,
        };
        let err = computer.compute(&m).unwrap_err();
        assert!(matches!(err, DecoderError::ZeroCalibrationInterval { .. }));
    }

    #[test]
    fn test_custom_hardware_constants() {
        let detector = DetectorConfig {
            clock_hz: 10_000_000.0,
            calibration_divisor: 10.0,
            ..DetectorConfig::default()
        };
        let computer = ToFComputer::new(&detector);
        let m = Measurement {
            time: 1.0,
            cal1: 0.0,
            cal2: 10.0,
        };
        assert!(approx_eq(computer.compute(&m).unwrap(), 100.0));
    }

    #[test]
    fn test_negative_interval_passes_through() {
        let computer = ToFComputer::default();
        let m = Measurement {
            time: 1.0,
            cal1: 9.0,
            cal2: 0.0,
        };
        assert!(approx_eq(computer.compute(&m).unwrap(), -125.0));
    }
}
