// SPDX-License-Identifier: MIT
//
// Cursor position report parsing.
//
// After `ESC[6n` the terminal answers `ESC [ <row> ; <col> R`, with row and
// column as 1-based ASCII decimals. This is the one place the core consumes
// bytes a terminal generated on its own, so the parser is strict and bounded:
// it is fed one byte at a time, refuses to grow past its limit, and rejects
// anything that is not exactly the report grammar.

use crate::error::ReportError;

/// Default bound on a report's length, terminator included.
///
/// The longest legal report (`ESC[65535;65535R`) is 15 bytes.
pub const DEFAULT_LIMIT: usize = 32;

/// A decoded cursor position report. Both values are 1-based and nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorReport {
    pub row: u16,
    pub col: u16,
}

impl CursorReport {
    /// Parse a complete report, `ESC` through `R`.
    ///
    /// # Errors
    ///
    /// Returns the first grammar violation found.
    pub fn parse(bytes: &[u8]) -> Result<Self, ReportError> {
        if bytes.is_empty() {
            return Err(ReportError::Empty);
        }
        let Some(body) = bytes.strip_prefix(b"\x1b[") else {
            return Err(ReportError::MissingPrefix);
        };
        let Some(body) = body.strip_suffix(b"R") else {
            return Err(ReportError::MissingTerminator);
        };

        let Some(sep) = body.iter().position(|&b| b == b';') else {
            return Err(ReportError::MissingSeparator);
        };

        let row = decimal(&body[..sep])?;
        let col = decimal(&body[sep + 1..])?;

        if row == 0 || col == 0 {
            return Err(ReportError::ZeroCoordinate);
        }
        Ok(Self { row, col })
    }
}

/// Parse a non-empty run of ASCII digits that fits in a `u16`.
fn decimal(digits: &[u8]) -> Result<u16, ReportError> {
    if digits.is_empty() {
        return Err(ReportError::InvalidNumber);
    }
    digits.iter().try_fold(0u16, |acc, &b| {
        if !b.is_ascii_digit() {
            return Err(ReportError::InvalidNumber);
        }
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(u16::from(b - b'0')))
            .ok_or(ReportError::InvalidNumber)
    })
}

// ─── Incremental parser ──────────────────────────────────────────────────────

/// What [`ReportParser::feed`] made of the byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Keep reading.
    Pending,
    /// The terminator arrived and the report is valid.
    Complete(CursorReport),
}

/// Byte-at-a-time report accumulator with a hard length bound.
#[derive(Debug)]
pub struct ReportParser {
    bytes: Vec<u8>,
    limit: usize,
}

impl ReportParser {
    /// A parser that gives up after `limit` bytes without a terminator.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(limit.min(DEFAULT_LIMIT)),
            limit,
        }
    }

    /// Bytes accepted so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Accept one byte.
    ///
    /// # Errors
    ///
    /// Fails as soon as the prefix is wrong, when the terminator completes a
    /// malformed report, or when the limit is reached without a terminator.
    pub fn feed(&mut self, byte: u8) -> Result<Feed, ReportError> {
        let expected = match self.bytes.len() {
            0 => Some(0x1b),
            1 => Some(b'['),
            _ => None,
        };
        if expected.is_some_and(|e| e != byte) {
            return Err(ReportError::MissingPrefix);
        }

        self.bytes.push(byte);

        if byte == b'R' {
            return CursorReport::parse(&self.bytes).map(Feed::Complete);
        }
        if self.bytes.len() >= self.limit {
            return Err(ReportError::TooLong(self.limit));
        }
        Ok(Feed::Pending)
    }

    /// The input stopped before a terminator arrived.
    ///
    /// # Errors
    ///
    /// Always: [`ReportError::Empty`] if nothing was fed, otherwise
    /// [`ReportError::MissingTerminator`].
    pub fn finish(self) -> Result<CursorReport, ReportError> {
        if self.bytes.is_empty() {
            Err(ReportError::Empty)
        } else {
            Err(ReportError::MissingTerminator)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
