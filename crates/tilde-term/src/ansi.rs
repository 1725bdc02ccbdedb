// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`, plus the
// fixed sequences as byte constants for the places that can't go through a
// writer (the panic hook writes straight to fd 1).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).

use std::io::{self, Write};

/// Erase the whole display (ED 2).
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Move the cursor to the top-left cell (CUP with no parameters).
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// [`CLEAR_SCREEN`] followed by [`CURSOR_HOME`]: what the user is left
/// looking at after quitting or a fatal error.
pub const CLEAR_AND_HOME: &[u8] = b"\x1b[2J\x1b[H";

/// Device Status Report 6: ask the terminal where the cursor is.
///
/// The reply is `ESC [ <row> ; <col> R`, see [`crate::report`].
pub const REQUEST_CURSOR_POSITION: &[u8] = b"\x1b[6n";

/// Push the cursor as far right and down as it goes.
///
/// CUF and CUD stop at the screen edge, so 999 of each lands on the
/// bottom-right cell of any realistic terminal.
pub const CURSOR_TO_MAX: &[u8] = b"\x1b[999C\x1b[999B";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to the top-left cell.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

/// Request a cursor position report (DSR 6).
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(REQUEST_CURSOR_POSITION)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2). The cursor does not move.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR_SCREEN)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
