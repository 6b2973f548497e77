//! Configuration loading and parsing
//!
//! All sections are optional; a missing file section falls back to the
//! detector defaults compiled into the decoder library.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tof_decoder::{DecoderConfig, DetectorConfig};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// STOP limit in ns, overridden by the positional argument
    pub stop_limit_ns: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for `OUT<name>` files (default: next to the input)
    pub directory: Option<PathBuf>,
    /// Significant digits for written values
    pub precision: Option<usize>,
    /// Write the run summary as JSON to this file
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub parallel: bool,
    /// Worker threads for parallel decoding (default: rayon's choice)
    pub threads: Option<usize>,
}

impl AppConfig {
    /// Build the decoder configuration; command-line values take precedence
    pub fn decoder_config(
        &self,
        stop_limit_ns: Option<f64>,
        precision: Option<usize>,
    ) -> DecoderConfig {
        DecoderConfig {
            detector: self.detector.clone(),
            stop_limit_ns: stop_limit_ns.or(self.limits.stop_limit_ns),
            precision: precision.or(self.output.precision),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .detector
        .validate()
        .with_context(|| format!("Invalid detector section in {:?}", path))?;

    if config.processing.threads == Some(0) {
        anyhow::bail!("processing.threads must be at least 1 in {:?}", path);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [detector]
            clock_hz = 10000000.0
            calibration_divisor = 10.0

            [limits]
            stop_limit_ns = 3500.0

            [output]
            precision = 6

            [processing]
            parallel = true
            threads = 4
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.detector.clock_hz, 10_000_000.0);
        assert_eq!(config.detector.calibration_divisor, 10.0);
        assert_eq!(config.detector.separator, ' ');
        assert_eq!(config.limits.stop_limit_ns, Some(3500.0));
        assert_eq!(config.output.precision, Some(6));
        assert!(config.processing.parallel);
        assert_eq!(config.processing.threads, Some(4));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.detector, DetectorConfig::default());
        assert!(!config.processing.parallel);

        let decoder_config = config.decoder_config(None, None);
        assert_eq!(decoder_config.stop_limit_ns, None);
        assert_eq!(decoder_config.precision, None);
    }

    #[test]
    fn test_command_line_overrides_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [limits]
            stop_limit_ns = 3500.0
            [output]
            precision = 8
            "#,
        )
        .unwrap();

        let decoder_config = config.decoder_config(Some(2000.0), None);
        assert_eq!(decoder_config.stop_limit_ns, Some(2000.0));
        assert_eq!(decoder_config.precision, Some(8));

        let decoder_config = config.decoder_config(None, Some(4));
        assert_eq!(decoder_config.stop_limit_ns, Some(3500.0));
        assert_eq!(decoder_config.precision, Some(4));
    }

    #[test]
    fn test_load_rejects_bad_detector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[detector]\ncalibration_divisor = 0.0\n").unwrap();
        assert!(load_config(&path).is_err());

        let path = dir.path().join("good.toml");
        fs::write(&path, "[detector]\nclock_hz = 8000000.0\n").unwrap();
        assert!(load_config(&path).is_ok());
    }
}
