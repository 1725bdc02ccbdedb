// SPDX-License-Identifier: MIT
//
// Single-byte key reads.
//
// Raw mode sets VMIN=0 and VTIME to the idle timeout, so a read on the
// terminal returns either one byte or, once the timeout elapses with nothing
// typed, zero bytes and no error. Those are different outcomes from a failed
// read and are kept apart here: a timeout loops back for another read, a
// failure ends the session.
//
// Bytes are returned one at a time. Escape sequences (arrow keys and the like)
// are several bytes long and are assembled by whoever calls this.

use std::io;

use tracing::trace;

use crate::device::Device;
use crate::error::{Error, Result};

/// The byte a terminal sends for Ctrl + `key`.
///
/// Control strips bits 5 and 6, so `ctrl(b'q')` is `0x11` and matches both
/// `q` and `Q`.
#[inline]
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1f
}

/// Ctrl-Q.
pub const QUIT_KEY: u8 = ctrl(b'q');

/// Block until one key byte arrives.
///
/// Idle timeouts, `EAGAIN` and `EINTR` are retried. Each call consumes
/// exactly one byte of input.
///
/// # Errors
///
/// [`Error::Read`] if the read itself fails.
pub fn read_key(device: &mut impl Device) -> Result<u8> {
    let mut byte = [0u8; 1];
    loop {
        match device.read(&mut byte) {
            Ok(1) => return Ok(byte[0]),
            Ok(_) => trace!("read timed out, retrying"),
            Err(e) if is_transient(&e) => trace!(error = %e, "read interrupted, retrying"),
            Err(e) => return Err(Error::Read(e)),
        }
    }
}

/// Errors that mean "nothing yet" rather than "broken".
///
/// Some platforms report a VTIME expiry as `EAGAIN` instead of a zero-length
/// read.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
