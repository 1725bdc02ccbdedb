// SPDX-License-Identifier: MIT
//
// Error taxonomy for the terminal core.
//
// Every failure here is fatal to the session except two, which never become
// an `Error` at all: an output-buffer allocation shortfall (the fragment is
// dropped) and a failed restore during shutdown (logged, not escalated).
//
// Display strings follow the `call: os error` shape so the binary can print
// them straight to stderr and the user sees which syscall broke.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal terminal-session failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the terminal attributes failed (`tcgetattr`).
    #[error("tcgetattr: {0}")]
    TerminalQuery(#[source] io::Error),

    /// Applying terminal attributes failed (`tcsetattr`).
    #[error("tcsetattr: {0}")]
    TerminalConfig(#[source] io::Error),

    /// The screen size could not be determined.
    #[error("window size: {0}")]
    Geometry(#[from] GeometryError),

    /// A read from the terminal failed for a reason other than a timeout.
    #[error("read: {0}")]
    Read(#[source] io::Error),

    /// Writing to the terminal failed.
    #[error("write: {0}")]
    Write(#[source] io::Error),
}

/// Why the window size could not be resolved.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The cursor probe could not be sent or its reply could not be read.
    #[error("cursor probe failed: {0}")]
    Probe(#[source] io::Error),

    /// The terminal answered the probe with something unusable.
    #[error("bad cursor position report: {0}")]
    Report(#[from] ReportError),
}

/// A malformed cursor position report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("no bytes received")]
    Empty,

    #[error("missing ESC [ prefix")]
    MissingPrefix,

    #[error("missing R terminator")]
    MissingTerminator,

    #[error("missing ; separator")]
    MissingSeparator,

    #[error("row or column is not a decimal number")]
    InvalidNumber,

    #[error("row or column is zero")]
    ZeroCoordinate,

    #[error("report longer than {0} bytes")]
    TooLong(usize),
}

// ─── Tests ───────────────────────────────────────────────────────────────────
