//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The `Decoder` struct wires the record decoder, the ToF computer and the
//! classifier together and turns input lines into `LineOutcome`s.

use crate::classifier::{Classifier, StopLimit};
use crate::config::DecoderConfig;
use crate::record::RecordDecoder;
use crate::tof::ToFComputer;
use crate::types::{DecoderError, LineOutcome, RawLine, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
///
/// A `Decoder` holds no per-run state, so a single instance can be shared
/// across threads and reused for several files.
#[derive(Debug, Clone)]
pub struct Decoder {
    config: DecoderConfig,
    record_decoder: RecordDecoder,
    tof_computer: ToFComputer,
    classifier: Classifier,
}

impl Decoder {
    /// Create a decoder from a configuration
    ///
    /// # Arguments
    /// * `config` - Detector constants and requested STOP limit
    ///
    /// # Returns
    /// * `Result<Decoder>` - Err if the configuration or the limit is invalid
    ///
    /// # Example
    /// ```
    /// use tof_decoder::{Decoder, DecoderConfig};
    ///
    /// let decoder = Decoder::new(DecoderConfig::new().with_stop_limit(2500.0)).unwrap();
    /// assert_eq!(decoder.stop_limit().effective_ns, 2500.0);
    /// ```
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        let limit = StopLimit::resolve(config.stop_limit_ns)?;

        Ok(Self {
            record_decoder: RecordDecoder::new(&config.detector),
            tof_computer: ToFComputer::new(&config.detector),
            classifier: Classifier::new(limit),
            config,
        })
    }

    /// Configuration this decoder was built from
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Effective STOP limit
    pub fn stop_limit(&self) -> StopLimit {
        self.classifier.limit()
    }

    /// Run one line through the whole pipeline
    ///
    /// Record-level problems never escape as errors; they become
    /// `Malformed` or `Failed` outcomes so that sibling lines are unaffected.
    pub fn process_line(&self, line: &RawLine) -> LineOutcome {
        let measurement = match self.record_decoder.decode(line) {
            Ok(m) => m,
            Err(DecoderError::MalformedLine { .. }) => {
                log::trace!("Line {} failed the character check", line.line_number);
                return LineOutcome::Malformed {
                    line_number: line.line_number,
                    content: line.content.clone(),
                };
            }
            Err(error) => return failed(line, error),
        };

        let tof_ns = match self.tof_computer.compute(&measurement) {
            Ok(tof) => tof,
            Err(error) => return failed(line, error),
        };

        if self.classifier.classify(tof_ns) {
            LineOutcome::Accepted {
                line_number: line.line_number,
                tof_ns,
            }
        } else {
            LineOutcome::Rejected {
                line_number: line.line_number,
                tof_ns,
            }
        }
    }

    /// Decode every line of a reader, lazily and in order
    ///
    /// The iterator yields `Err` only for read failures; record-level
    /// problems, including bytes that are not valid UTF-8, are reported
    /// through the outcome.
    pub fn decode_reader<R: BufRead>(&self, reader: R) -> DecodingIterator<'_, R> {
        DecodingIterator::new(RawLines::new(reader), self)
    }

    /// Open a file and decode it line by line
    ///
    /// # Example
    /// ```no_run
    /// use tof_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new(DecoderConfig::new()).unwrap();
    /// for outcome in decoder.decode_file(Path::new("run042.txt")).unwrap() {
    ///     println!("{:?}", outcome.unwrap());
    /// }
    /// ```
    pub fn decode_file(&self, path: &Path) -> Result<DecodingIterator<'_, BufReader<File>>> {
        log::info!("Decoding raw data file: {:?}", path);
        let file = open_input(path)?;
        Ok(self.decode_reader(BufReader::new(file)))
    }
}

/// Open an input file, mapping failures to `FileError`
pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| DecoderError::FileError {
        path: path.to_path_buf(),
        source,
    })
}

fn failed(line: &RawLine, error: DecoderError) -> LineOutcome {
    log::debug!("Line {}: {}", line.line_number, error);
    LineOutcome::Failed {
        line_number: line.line_number,
        content: line.content.clone(),
        error,
    }
}

/// Iterator over the raw lines of a reader
///
/// Lines are split on `\n` at the byte level, so invalid UTF-8 never stops
/// the stream: such bytes become U+FFFD and the line fails the character
/// check. A trailing `\r\n` or `\n` is stripped. Every line read consumes
/// one line number.
pub struct RawLines<R> {
    reader: R,
    next_line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> RawLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            next_line: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = io::Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let line = RawLine::new(self.next_line, String::from_utf8_lossy(&self.buf));
                self.next_line += 1;
                Some(Ok(line))
            }
            Err(e) => {
                self.next_line += 1;
                Some(Err(e))
            }
        }
    }
}

/// Iterator that decodes input lines into outcomes
pub struct DecodingIterator<'a, R> {
    lines: RawLines<R>,
    decoder: &'a Decoder,
}

impl<'a, R: BufRead> DecodingIterator<'a, R> {
    fn new(lines: RawLines<R>, decoder: &'a Decoder) -> Self {
        Self { lines, decoder }
    }
}

impl<'a, R: BufRead> Iterator for DecodingIterator<'a, R> {
    type Item = Result<LineOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.lines.next()? {
            Ok(line) => Some(Ok(self.decoder.process_line(&line))),
            Err(e) => Some(Err(DecoderError::IoError(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn default_decoder() -> Decoder {
        Decoder::new(DecoderConfig::new()).unwrap()
    }

    #[test]
    fn test_rejected_above_default_limit() {
        let decoder = default_decoder();
        let outcome = decoder.process_line(&RawLine::new(0, "0 0 100 0 0 0 0 0 9"));
        match outcome {
            LineOutcome::Rejected {
                line_number,
                tof_ns,
            } => {
                assert_eq!(line_number, 0);
                assert!((tof_ns - 12500.0).abs() < 1e-6);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_accepted_within_limit() {
        let decoder = default_decoder();
        let outcome = decoder.process_line(&RawLine::new(7, "0 0 1 0 0 0 0 0 9"));
        let tof = outcome.accepted_tof().unwrap();
        assert!((tof - 125.0).abs() < 1e-9);
        assert_eq!(outcome.line_number(), 7);
    }

    #[test]
    fn test_zero_interval_is_failure() {
        let decoder = default_decoder();
        let outcome = decoder.process_line(&RawLine::new(0, "0 0 1 0 0 9 0 0 9"));
        match outcome {
            LineOutcome::Failed { error, .. } => {
                assert!(matches!(error, DecoderError::ZeroCalibrationInterval { .. }))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_line_outcome() {
        let decoder = default_decoder();
        let outcome = decoder.process_line(&RawLine::new(2, "# header"));
        assert_eq!(
            outcome,
            LineOutcome::Malformed {
                line_number: 2,
                content: "# header".to_string()
            }
        );
    }

    #[test]
    fn test_decode_reader_numbers_lines() {
        let decoder = default_decoder();
        let input = "0 0 1 0 0 0 0 0 9\nbad\n0 0 100 0 0 0 0 0 9\n";
        let outcomes: Vec<LineOutcome> = decoder
            .decode_reader(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], LineOutcome::Accepted { line_number: 0, .. }));
        assert!(matches!(outcomes[1], LineOutcome::Malformed { line_number: 1, .. }));
        assert!(matches!(outcomes[2], LineOutcome::Rejected { line_number: 2, .. }));
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed() {
        let decoder = default_decoder();
        let input: &[u8] = b"0 0 1 0 0 0 0 0 9\n0 0 1 0 \xff 0 0 0 9\n0 0 2 0 0 0 0 0 9\n";
        let outcomes: Vec<LineOutcome> = decoder
            .decode_reader(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], LineOutcome::Accepted { line_number: 0, .. }));
        assert!(matches!(outcomes[1], LineOutcome::Malformed { line_number: 1, .. }));
        assert!(matches!(outcomes[2], LineOutcome::Accepted { line_number: 2, .. }));
        assert_eq!(outcomes[2].accepted_tof(), Some(250.0));
    }

    #[test]
    fn test_raw_lines_strip_terminators() {
        let input: &[u8] = b"first\r\nsecond\nlast";
        let lines: Vec<RawLine> = RawLines::new(Cursor::new(input))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                RawLine::new(0, "first"),
                RawLine::new(1, "second"),
                RawLine::new(2, "last"),
            ]
        );
    }

    #[test]
    fn test_clamped_limit() {
        let decoder = Decoder::new(DecoderConfig::new().with_stop_limit(4000.0)).unwrap();
        let limit = decoder.stop_limit();
        assert_eq!(limit.effective_ns, 3700.0);
        assert!(limit.clamped);
    }

    #[test]
    fn test_missing_file() {
        let decoder = default_decoder();
        let err = decoder
            .decode_file(Path::new("definitely/not/here.txt"))
            .err()
            .unwrap();
        assert!(matches!(err, DecoderError::FileError { .. }));
    }
}
