//! Record decoder
//!
//! Turns one raw text line into a `Measurement`. A record is nine decimal
//! tokens separated by a single separator character:
//!
//! ```text
//! t0 t1 t2  c0 c1 c2  d0 d1 d2
//! \______/  \______/  \______/
//!   time      cal1      cal2
//! ```
//!
//! Each group of three is a big-endian byte-weighted value:
//! `x0 * 2^16 + x1 * 2^8 + x2`.

use crate::config::DetectorConfig;
use crate::types::{DecoderError, Measurement, RawLine, Result};

/// Number of tokens per counter
pub const TOKENS_PER_FIELD: usize = 3;

/// Number of counters per record (time, cal1, cal2)
pub const FIELDS_PER_RECORD: usize = 3;

/// Number of tokens a record must provide
pub const TOKENS_PER_RECORD: usize = TOKENS_PER_FIELD * FIELDS_PER_RECORD;

/// Weight of each token within a counter, most significant first
const BYTE_WEIGHTS: [f64; TOKENS_PER_FIELD] = [65536.0, 256.0, 1.0];

/// Decoder for the space-separated record format
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    separator: char,
    min_line_length: usize,
}

impl RecordDecoder {
    pub fn new(detector: &DetectorConfig) -> Self {
        Self {
            separator: detector.separator,
            min_line_length: detector.min_line_length,
        }
    }

    /// Check the character-class precondition
    ///
    /// The line must be longer than the minimum length and every character
    /// except the last must be an ASCII digit or the separator. The last
    /// character is exempt so that a stray terminator (`\r`) does not reject
    /// the record.
    pub fn validate(&self, line: &RawLine) -> Result<()> {
        let content = &line.content;
        let malformed = || DecoderError::MalformedLine {
            line_number: line.line_number,
            content: content.clone(),
        };

        if content.chars().count() <= self.min_line_length {
            return Err(malformed());
        }

        let body_len = content.chars().count() - 1;
        if content
            .chars()
            .take(body_len)
            .any(|c| !c.is_ascii_digit() && c != self.separator)
        {
            return Err(malformed());
        }

        Ok(())
    }

    /// Split a validated line into its tokens, preserving order
    ///
    /// A final character that is neither a digit nor the separator is a
    /// record terminator and is dropped. Empty tokens (from doubled or
    /// leading separators) are kept so the parser can report them.
    pub fn tokenize<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let body = match content.chars().last() {
            Some(last) if !last.is_ascii_digit() && last != self.separator => {
                &content[..content.len() - last.len_utf8()]
            }
            _ => content,
        };
        body.split(self.separator).collect()
    }

    /// Decode one line into its three counters
    pub fn decode(&self, line: &RawLine) -> Result<Measurement> {
        self.validate(line)?;

        let tokens = self.tokenize(&line.content);
        if tokens.len() < TOKENS_PER_RECORD {
            return Err(DecoderError::InsufficientFields {
                found: tokens.len(),
                expected: TOKENS_PER_RECORD,
            });
        }

        let mut values = [0.0f64; TOKENS_PER_RECORD];
        for (index, (slot, token)) in values.iter_mut().zip(&tokens).enumerate() {
            *slot = parse_token(index, token)?;
        }

        if tokens.len() > TOKENS_PER_RECORD {
            log::trace!(
                "Line {}: ignoring {} trailing token(s)",
                line.line_number,
                tokens.len() - TOKENS_PER_RECORD
            );
        }

        Ok(Measurement {
            time: reconstruct(&values[0..3]),
            cal1: reconstruct(&values[3..6]),
            cal2: reconstruct(&values[6..9]),
        })
    }
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

/// Parse one decimal token; fractional values are allowed
fn parse_token(index: usize, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecoderError::InvalidNumericToken {
            index,
            token: token.to_string(),
        })
}

/// Combine three byte-weighted components into one counter value
pub fn reconstruct(components: &[f64]) -> f64 {
    components
        .iter()
        .zip(BYTE_WEIGHTS.iter())
        .map(|(value, weight)| value * weight)
        .sum()
}
