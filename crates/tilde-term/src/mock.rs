// SPDX-License-Identifier: MIT
//
// Recording terminal double for tests.
//
// `MockDevice` holds a current attribute set, a scripted input queue and a
// log of everything written, so tests can check what reached the "terminal"
// and in how many writes, and what attribute state it was left in.

use std::collections::VecDeque;
use std::io;

use crate::attributes::{
    CONTROL_CHARS, ControlFlags, InputFlags, LocalFlags, OutputFlags, TerminalAttributes, sys,
};
use crate::device::Device;

/// A typical cooked-mode terminal: line discipline, echo and signals on.
pub fn cooked_attributes() -> TerminalAttributes {
    let mut control_chars = [0u8; CONTROL_CHARS];
    control_chars[sys::VMIN] = 1;
    control_chars[sys::VTIME] = 0;

    TerminalAttributes {
        input: InputFlags::BRKINT | InputFlags::ICRNL | InputFlags::IXON,
        output: OutputFlags::OPOST,
        control: ControlFlags::CS8,
        local: LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG,
        control_chars,
    }
}

/// One scripted outcome of a `read` call.
#[derive(Debug, Clone, Copy)]
pub enum ReadStep {
    Byte(u8),
    Timeout,
    Fail(io::ErrorKind),
}

#[derive(Debug)]
pub struct MockDevice {
    attributes: TerminalAttributes,
    get_fails: bool,
    /// Set calls with an index at or past this fail.
    set_fails_from: Option<usize>,
    set_calls: Vec<TerminalAttributes>,
    window: Option<(u16, u16)>,
    input: VecDeque<ReadStep>,
    read_calls: usize,
    writes: Vec<Vec<u8>>,
    write_fails: bool,
    armed: Option<TerminalAttributes>,
}

impl MockDevice {
    /// A cooked 24×80 terminal with no input.
    pub fn new() -> Self {
        Self {
            attributes: cooked_attributes(),
            get_fails: false,
            set_fails_from: None,
            set_calls: Vec::new(),
            window: Some((24, 80)),
            input: VecDeque::new(),
            read_calls: 0,
            writes: Vec::new(),
            write_fails: false,
            armed: None,
        }
    }

    // ── Builders ──────────────────────────────────────────────────

    pub const fn with_window_size(mut self, rows: u16, cols: u16) -> Self {
        self.window = Some((rows, cols));
        self
    }

    pub const fn with_window_size_error(mut self) -> Self {
        self.window = None;
        self
    }

    pub fn with_input(mut self, bytes: &[u8]) -> Self {
        self.input.extend(bytes.iter().map(|&b| ReadStep::Byte(b)));
        self
    }

    pub fn with_step(mut self, step: ReadStep) -> Self {
        self.input.push_back(step);
        self
    }

    pub const fn with_get_error(mut self) -> Self {
        self.get_fails = true;
        self
    }

    /// Every set call from the `n`th (0-based) on fails.
    pub const fn with_set_error_from(mut self, n: usize) -> Self {
        self.set_fails_from = Some(n);
        self
    }

    pub const fn with_write_error(mut self) -> Self {
        self.write_fails = true;
        self
    }

    // ── Inspection ────────────────────────────────────────────────

    /// The attribute set the terminal currently holds.
    pub const fn attributes(&self) -> TerminalAttributes {
        self.attributes
    }

    /// Every attribute set applied, in order (failed calls excluded).
    pub fn set_calls(&self) -> &[TerminalAttributes] {
        &self.set_calls
    }

    /// Every successful write, one entry per call.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All written bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    pub const fn read_calls(&self) -> usize {
        self.read_calls
    }

    /// Scripted reads not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// The fallback attributes the panic hook would use, if armed.
    pub const fn armed(&self) -> Option<TerminalAttributes> {
        self.armed
    }
}

impl Device for MockDevice {
    fn get_attributes(&mut self) -> io::Result<TerminalAttributes> {
        if self.get_fails {
            return Err(io::Error::from_raw_os_error(25)); // ENOTTY
        }
        Ok(self.attributes)
    }

    fn set_attributes(&mut self, attrs: &TerminalAttributes) -> io::Result<()> {
        if self
            .set_fails_from
            .is_some_and(|n| self.set_calls.len() >= n)
        {
            return Err(io::Error::other("terminal detached"));
        }
        self.attributes = *attrs;
        self.set_calls.push(*attrs);
        Ok(())
    }

    fn window_size(&mut self) -> io::Result<(u16, u16)> {
        self.window
            .ok_or_else(|| io::Error::from(io::ErrorKind::Unsupported))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_calls += 1;
        if buf.is_empty() {
            return Ok(0);
        }
        match self.input.pop_front() {
            Some(ReadStep::Byte(b)) => {
                buf[0] = b;
                Ok(1)
            }
            Some(ReadStep::Timeout) => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(io::Error::from(kind)),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "mock input exhausted",
            )),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.write_fails {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn arm_panic_restore(&mut self, original: &TerminalAttributes) {
        self.armed = Some(*original);
    }

    fn disarm_panic_restore(&mut self) {
        self.armed = None;
    }
}
