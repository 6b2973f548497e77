//! Output of accepted ToF values
//!
//! Accepted values are written one per line, in the order they are handed
//! to the writer. Formatting is either Rust's shortest round-trip
//! representation or, when a precision is configured, the `%g` style used by
//! C streams (N significant digits, trailing zeros removed).

use crate::types::{DecoderError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Prefix added to the input file name to form the output file name
pub const OUTPUT_PREFIX: &str = "OUT";

/// Derive the output path for an input file: `OUT<name>` in the same directory
pub fn output_path_for(input: &Path) -> Result<PathBuf> {
    let name = input.file_name().ok_or_else(|| {
        DecoderError::InvalidConfig(format!("input path has no file name: {:?}", input))
    })?;

    let mut out_name = std::ffi::OsString::from(OUTPUT_PREFIX);
    out_name.push(name);
    Ok(input.with_file_name(out_name))
}

/// Format a ToF value for the output file
pub fn format_tof(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(digits) => format_general(value, digits),
        None => format!("{}", value),
    }
}

/// `%g`-style formatting with `precision` significant digits
fn format_general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = match exponent.parse() {
        Ok(e) => e,
        Err(_) => return scientific,
    };

    if exponent < -4 || exponent >= precision as i32 {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Order-preserving writer of accepted ToF values
pub struct ToFWriter<W: Write> {
    writer: W,
    precision: Option<usize>,
    written: usize,
}

impl ToFWriter<BufWriter<File>> {
    /// Create (truncate) the output file
    pub fn create(path: &Path, precision: Option<usize>) -> Result<Self> {
        log::info!("Writing accepted ToF values to {:?}", path);
        let file = File::create(path).map_err(|source| DecoderError::FileError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), precision))
    }
}

impl<W: Write> ToFWriter<W> {
    pub fn new(writer: W, precision: Option<usize>) -> Self {
        Self {
            writer,
            precision,
            written: 0,
        }
    }

    /// Append one value as its own line
    pub fn write_tof(&mut self, tof_ns: f64) -> Result<()> {
        writeln!(self.writer, "{}", format_tof(tof_ns, self.precision))?;
        self.written += 1;
        Ok(())
    }

    /// Number of values written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path_for(Path::new("run042.txt")).unwrap(),
            PathBuf::from("OUTrun042.txt")
        );
        assert_eq!(
            output_path_for(Path::new("data/2024/run042.txt")).unwrap(),
            PathBuf::from("data/2024/OUTrun042.txt")
        );
        assert!(output_path_for(Path::new("/")).is_err());
    }

    #[test]
    fn test_default_formatting() {
        assert_eq!(format_tof(125.0, None), "125");
        assert_eq!(format_tof(12500.0, None), "12500");
        assert_eq!(format_tof(62.5, None), "62.5");
    }

    #[test]
    fn test_general_formatting() {
        assert_eq!(format_tof(125.0, Some(6)), "125");
        assert_eq!(format_tof(1250.0 / 9.0, Some(6)), "138.889");
        assert_eq!(format_tof(3699.99999, Some(6)), "3700");
        assert_eq!(format_tof(1_000_000.0, Some(6)), "1e+06");
        assert_eq!(format_tof(0.0000125, Some(6)), "1.25e-05");
        assert_eq!(format_tof(0.5, Some(6)), "0.5");
        assert_eq!(format_tof(-125.0, Some(6)), "-125");
        assert_eq!(format_tof(0.0, Some(6)), "0");
    }

    #[test]
    fn test_writer_preserves_order() {
        let mut writer = ToFWriter::new(Vec::new(), None);
        for value in [125.0, 62.5, 3700.0] {
            writer.write_tof(value).unwrap();
        }
        assert_eq!(writer.written(), 3);

        let bytes = writer.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "125\n62.5\n3700\n");
    }
}
