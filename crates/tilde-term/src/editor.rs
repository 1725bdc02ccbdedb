// SPDX-License-Identifier: MIT
//
// The render loop.
//
// One thread, one terminal, three phases:
//
//   Startup       enter raw mode (capturing the original attributes first),
//                 resolve the screen size
//   Running       build a frame, flush it in one write, block for a key,
//                 dispatch it; repeat
//   ShuttingDown  clear the screen, then restore the terminal
//
// Every path out, whether the quit key or a fatal error, ends in
// ShuttingDown, and restoration is the last thing that happens there: the
// `RawMode` guard is dropped after the final clear. Fatal errors take the die
// path, which clears the screen best-effort so the user isn't left looking at
// half a frame, then hand the error back up for the binary to report.
//
// What goes on each row is up to the `App`. The core only ships
// `Placeholder`, which draws a `~` per row.

use tracing::{debug, error};

use crate::ansi;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::geometry::ScreenGeometry;
use crate::input::read_key;
use crate::output::OutputBuffer;
use crate::session::Session;

/// Marker drawn at the start of every row with no content.
pub const ROW_MARKER: &[u8] = b"~";

/// Row separator. Raw mode turns off `\n` → `\r\n` translation, so the
/// carriage return has to be explicit.
pub const LINE_BREAK: &[u8] = b"\r\n";

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Leave the loop cleanly.
    Quit,
}

/// Content provider for the render loop.
pub trait App {
    /// Append this frame's rows to `out`.
    ///
    /// The loop has already cleared the screen and homed the cursor, and
    /// homes it again afterwards. Rows are separated by [`LINE_BREAK`]; the
    /// last row must not be followed by one, or the terminal scrolls.
    fn draw_rows(&mut self, geometry: ScreenGeometry, out: &mut OutputBuffer);

    /// Handle one key byte. The quit key never reaches this method.
    fn on_key(&mut self, _key: u8) -> Action {
        Action::Continue
    }
}

/// Draws a [`ROW_MARKER`] on every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct Placeholder;

impl App for Placeholder {
    fn draw_rows(&mut self, geometry: ScreenGeometry, out: &mut OutputBuffer) {
        let rows = geometry.rows();
        for y in 0..rows {
            out.append(ROW_MARKER);
            if y + 1 < rows {
                out.append(LINE_BREAK);
            }
        }
    }
}

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Where the loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Startup,
    Running,
    ShuttingDown,
}

// ─── Editor ──────────────────────────────────────────────────────────────────

/// The render loop, driving an [`App`] over a [`Session`].
#[derive(Debug)]
pub struct Editor<A: App> {
    app: A,
    frame: OutputBuffer,
    phase: Phase,
}

impl<A: App> Editor<A> {
    #[must_use]
    pub fn new(app: A) -> Self {
        Self {
            app,
            frame: OutputBuffer::new(),
            phase: Phase::Startup,
        }
    }

    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub const fn app(&self) -> &A {
        &self.app
    }

    /// Run until the quit key or a fatal error.
    ///
    /// On return the screen has been cleared and, if raw mode was entered,
    /// the original attributes restored.
    ///
    /// # Errors
    ///
    /// Any fatal [`Error`]: capture or raw-mode failure, geometry failure,
    /// a failed read, or a failed write.
    pub fn run<D: Device>(&mut self, session: &mut Session<D>) -> Result<()> {
        self.set_phase(Phase::Startup);
        let result = self.run_raw(session);

        if self.phase != Phase::ShuttingDown {
            // Raw mode was never entered, so there is nothing to restore.
            self.set_phase(Phase::ShuttingDown);
            return result.map_err(|e| die(session.device_mut(), e));
        }
        result
    }

    /// Everything that happens while raw mode is held. The guard drops on
    /// the way out, after the final clear.
    fn run_raw<D: Device>(&mut self, session: &mut Session<D>) -> Result<()> {
        let mut raw = session.enter_raw_mode()?;

        let result = self.run_inner(&mut *raw);

        self.set_phase(Phase::ShuttingDown);
        let device = raw.device_mut();
        match result {
            Ok(()) => device.write_all(ansi::CLEAR_AND_HOME).map_err(Error::Write),
            Err(e) => Err(die(device, e)),
        }
    }

    /// Resolve the size, then loop frames and keys.
    fn run_inner<D: Device>(&mut self, session: &mut Session<D>) -> Result<()> {
        let geometry = session.resolve_geometry()?;
        let quit_key = session.config().quit_key;
        self.set_phase(Phase::Running);

        loop {
            self.refresh_screen(session.device_mut(), geometry)?;

            let key = read_key(session.device_mut())?;
            if key == quit_key {
                debug!("quit key pressed");
                return Ok(());
            }
            if self.app.on_key(key) == Action::Quit {
                debug!(key, "app requested quit");
                return Ok(());
            }
        }
    }

    /// Draw one frame and write it in a single call.
    ///
    /// Frame layout: clear screen, cursor home, the app's rows, cursor home.
    ///
    /// # Errors
    ///
    /// [`Error::Write`] if the device rejects the frame.
    pub fn refresh_screen(
        &mut self,
        device: &mut impl Device,
        geometry: ScreenGeometry,
    ) -> Result<()> {
        self.frame.clear();
        self.frame.append(ansi::CLEAR_SCREEN);
        self.frame.append(ansi::CURSOR_HOME);
        self.app.draw_rows(geometry, &mut self.frame);
        self.frame.append(ansi::CURSOR_HOME);
        self.frame.flush_to(device)
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "phase change");
        }
        self.phase = phase;
    }
}

/// The die path: clear the screen best-effort and pass the error on.
///
/// A failure to clear is ignored; the original error is what gets reported.
pub fn die(device: &mut impl Device, err: Error) -> Error {
    error!(error = %err, "fatal terminal error");
    let _ = device.write_all(ansi::CLEAR_AND_HOME);
    err
}

// ─── Tests ───────────────────────────────────────────────────────────────────
