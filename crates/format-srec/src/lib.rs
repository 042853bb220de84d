//! Motorola S-record format parser.
//!
//! Record grammar: `Stllaa..aadd..ddcc` — type digit, byte count,
//! address (16/24/32 bits depending on type), data, and a one's-
//! complement checksum.
//!
//! | Type | Meaning                               |
//! |------|---------------------------------------|
//! | S0   | Header (ignored)                      |
//! | S1   | Data, 16-bit address                  |
//! | S2   | Data, 24-bit address                  |
//! | S3   | Data, 32-bit address                  |
//! | S5   | Record count (informational)          |
//! | S7   | Entry point, 32-bit address           |
//! | S8   | Entry point, 24-bit address           |
//! | S9   | Entry point, 16-bit address           |
//!
//! Parsing is pure: the result is a list of address/data chunks plus
//! an optional entry point for the caller to apply. Checksum
//! mismatches are collected as warnings.

use std::fmt;

/// A run of contiguous bytes at an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub address: u32,
    pub data: Vec<u8>,
}

/// Non-fatal problems encountered while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrecWarning {
    /// Stored checksum disagrees with the computed one.
    ChecksumMismatch { line: usize, stored: u8, computed: u8 },
    /// Record type outside the supported set.
    UnknownRecordType { line: usize, kind: char },
}

impl fmt::Display for SrecWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumMismatch {
                line,
                stored,
                computed,
            } => write!(
                f,
                "line {line}: checksum mismatch (stored {stored:02X}, computed {computed:02X})"
            ),
            Self::UnknownRecordType { line, kind } => {
                write!(f, "line {line}: unknown record type S{kind}")
            }
        }
    }
}

/// Fatal parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrecError {
    /// A record line does not start with 'S'.
    MissingRecordMark { line: usize },
    /// A non-hex character where hex digits were expected.
    InvalidHexDigit { line: usize },
    /// The line ends inside the record, or the count is shorter than
    /// the address plus checksum.
    TruncatedRecord { line: usize },
}

impl fmt::Display for SrecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRecordMark { line } => {
                write!(f, "line {line}: record does not start with 'S'")
            }
            Self::InvalidHexDigit { line } => write!(f, "line {line}: invalid hex digit"),
            Self::TruncatedRecord { line } => write!(f, "line {line}: truncated record"),
        }
    }
}

impl std::error::Error for SrecError {}

/// A parsed S-record image.
#[derive(Debug, Clone, Default)]
pub struct SrecFile {
    /// Data chunks in file order.
    pub chunks: Vec<DataChunk>,
    /// Entry point from an S7/S8/S9 record, if present.
    pub entry_point: Option<u32>,
    /// Non-fatal problems, in file order.
    pub warnings: Vec<SrecWarning>,
}

impl SrecFile {
    /// Parse S-record text.
    pub fn parse(text: &str) -> Result<Self, SrecError> {
        let mut file = Self::default();

        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw_line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let mut chars = trimmed.chars();
            if !matches!(chars.next(), Some('S' | 's')) {
                return Err(SrecError::MissingRecordMark { line });
            }
            let Some(kind) = chars.next() else {
                return Err(SrecError::TruncatedRecord { line });
            };

            let bytes = hex_bytes(chars.as_str(), line)?;
            if bytes.is_empty() {
                return Err(SrecError::TruncatedRecord { line });
            }

            let byte_count = usize::from(bytes[0]);
            if bytes.len() != byte_count + 1 {
                return Err(SrecError::TruncatedRecord { line });
            }

            // Checksum: one's complement of the sum of count, address
            // and data bytes.
            let stored = bytes[byte_count];
            let sum: u8 = bytes[..byte_count]
                .iter()
                .fold(0u8, |acc, &b| acc.wrapping_add(b));
            let computed = !sum;
            if computed != stored {
                file.warnings.push(SrecWarning::ChecksumMismatch {
                    line,
                    stored,
                    computed,
                });
            }

            let address_len = match kind {
                '0' | '1' | '5' | '9' => 2,
                '2' | '8' => 3,
                '3' | '7' => 4,
                other => {
                    file.warnings
                        .push(SrecWarning::UnknownRecordType { line, kind: other });
                    continue;
                }
            };
            if byte_count < address_len + 1 {
                return Err(SrecError::TruncatedRecord { line });
            }

            let address = bytes[1..1 + address_len]
                .iter()
                .fold(0u32, |acc, &b| acc << 8 | u32::from(b));
            let data = &bytes[1 + address_len..byte_count];

            match kind {
                // Header and record count are informational
                '0' | '5' => {}
                '1' | '2' | '3' => {
                    file.chunks.push(DataChunk {
                        address,
                        data: data.to_vec(),
                    });
                }
                '7' | '8' | '9' => {
                    file.entry_point = Some(address);
                }
                _ => unreachable!(),
            }
        }

        Ok(file)
    }

    /// Total data byte count across all chunks.
    #[must_use]
    pub fn byte_count(&self) -> usize {
        self.chunks.iter().map(|c| c.data.len()).sum()
    }
}

fn hex_bytes(record: &str, line: usize) -> Result<Vec<u8>, SrecError> {
    let record = record.trim_end();
    if record.len() % 2 != 0 {
        return Err(SrecError::TruncatedRecord { line });
    }
    record
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = hex_digit(pair[0]).ok_or(SrecError::InvalidHexDigit { line })?;
            let lo = hex_digit(pair[1]).ok_or(SrecError::InvalidHexDigit { line })?;
            Ok(hi << 4 | lo)
        })
        .collect()
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
