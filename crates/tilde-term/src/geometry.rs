// SPDX-License-Identifier: MIT
//
// Screen geometry resolution.
//
// Fast path: ask the OS (`TIOCGWINSZ`). Some transports (serial lines, a few
// remote shells) answer with zeros or not at all, so the fallback asks the
// terminal itself: shove the cursor into the bottom-right corner, request a
// cursor position report, and read the coordinates back. The reply is parsed
// by `report::ReportParser`, which bounds how many bytes we are willing to
// wait for.

use std::io;

use tracing::debug;

use crate::ansi;
use crate::device::Device;
use crate::error::{GeometryError, ReportError, Result};
use crate::report::{Feed, ReportParser};

// ─── ScreenGeometry ──────────────────────────────────────────────────────────

/// Terminal dimensions in character cells. Both are nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    rows: u16,
    cols: u16,
}

impl ScreenGeometry {
    /// `None` if either dimension is zero.
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Option<Self> {
        if rows == 0 || cols == 0 {
            None
        } else {
            Some(Self { rows, cols })
        }
    }

    /// Number of rows (height in character cells).
    #[inline]
    #[must_use]
    pub const fn rows(self) -> u16 {
        self.rows
    }

    /// Number of columns (width in character cells).
    #[inline]
    #[must_use]
    pub const fn cols(self) -> u16 {
        self.cols
    }

    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Determine the screen size, probing the cursor if the OS can't say.
///
/// `probe_limit` bounds the cursor report length, terminator included.
///
/// # Errors
///
/// [`Error::Geometry`](crate::Error::Geometry) if the probe cannot be written,
/// its reply cannot be read, or the reply is malformed.
pub fn resolve(device: &mut impl Device, probe_limit: usize) -> Result<ScreenGeometry> {
    match device.window_size() {
        Ok((rows, cols)) => {
            if let Some(geometry) = ScreenGeometry::new(rows, cols) {
                debug!(rows, cols, "window size from ioctl");
                return Ok(geometry);
            }
            debug!(rows, cols, "ioctl reported an empty window, probing");
        }
        Err(e) => debug!(error = %e, "window size ioctl failed, probing"),
    }

    probe(device, probe_limit)
}

/// The cursor-report fallback.
fn probe(device: &mut impl Device, limit: usize) -> Result<ScreenGeometry> {
    device
        .write_all(ansi::CURSOR_TO_MAX)
        .map_err(GeometryError::Probe)?;
    device
        .write_all(ansi::REQUEST_CURSOR_POSITION)
        .map_err(GeometryError::Probe)?;

    let mut parser = ReportParser::new(limit);
    let mut byte = [0u8; 1];

    let report = loop {
        match device.read(&mut byte) {
            Ok(1) => match parser.feed(byte[0]).map_err(GeometryError::Report)? {
                Feed::Pending => {}
                Feed::Complete(report) => break report,
            },
            // Timed out mid-report.
            Ok(_) => break parser.finish().map_err(GeometryError::Report)?,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(GeometryError::Probe(e).into()),
        }
    };

    debug!(rows = report.row, cols = report.col, "window size from cursor report");

    // The parser rejects zero coordinates.
    ScreenGeometry::new(report.row, report.col)
        .ok_or_else(|| GeometryError::Report(ReportError::ZeroCoordinate).into())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
