// SPDX-License-Identifier: MIT
//
// Frame output buffering.
//
// A frame is built up in memory (escape sequences and content alike) and
// handed to the device in one `write_all`. A terminal that receives a redraw
// as dozens of small writes paints the intermediate states, which the user
// sees as flicker and tearing; one write per frame avoids that.

use std::io::{self, Write};

use tracing::warn;

use crate::device::Device;
use crate::error::{Error, Result};

/// A byte buffer that accumulates one frame for a single write.
///
/// Default capacity: 16 KB, enough for most frames without reallocation.
/// The buffer is cleared after each flush and its capacity reused.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Allocated capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `bytes` to the frame.
    ///
    /// If the buffer cannot grow, the append is dropped and the frame goes
    /// out without it. Callers that cannot tolerate a missing fragment should
    /// compare [`len`](Self::len) before and after.
    pub fn append(&mut self, bytes: &[u8]) {
        if let Err(e) = self.buf.try_reserve(bytes.len()) {
            warn!(len = bytes.len(), error = %e, "output buffer full, fragment dropped");
            return;
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write the whole frame to `device` in one call, then clear.
    ///
    /// An empty buffer writes nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Write`] if the device rejects the write. The buffer is left
    /// intact in that case.
    pub fn flush_to(&mut self, device: &mut impl Device) -> Result<()> {
        if !self.buf.is_empty() {
            device.write_all(&self.buf).map_err(Error::Write)?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    /// Appends and reports the full length, even if the append was dropped.
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
