// SPDX-License-Identifier: MIT
//
// Terminal session control: capture, raw mode, and guaranteed restore.
//
// A `Session` owns the device for the life of the program. It captures the
// terminal's attributes once, derives and applies raw mode from them, and
// puts the original back when raw mode is released. The original snapshot is
// never modified after capture.
//
// Raw mode is held through a `RawMode` guard. Dropping the guard restores the
// terminal, so every way out of the scope that entered raw mode (normal
// return, `?`, an unwinding panic) leaves the user's shell usable. Aborting
// panics don't run destructors; for those the device's panic hook (armed on
// entry, disarmed on restore) does the same job.
//
// Restore is idempotent. A failed restore is reported but never escalated:
// by the time it runs the program is on its way out anyway.

use std::ops::{Deref, DerefMut};

use tracing::{debug, error};

use crate::attributes::TerminalAttributes;
use crate::config::Config;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::geometry::{self, ScreenGeometry};

// ─── Session ─────────────────────────────────────────────────────────────────

/// Exclusive owner of a terminal device and its attribute state.
#[derive(Debug)]
pub struct Session<D: Device> {
    device: D,
    config: Config,
    /// Captured before raw mode, restored verbatim after.
    original: Option<TerminalAttributes>,
    /// Whether the device currently holds our raw attributes.
    raw: bool,
    /// Resolved once, then fixed for the session.
    geometry: Option<ScreenGeometry>,
}

impl<D: Device> Session<D> {
    /// Create a session with the default configuration.
    ///
    /// Touches nothing on the device until [`capture_original`] or
    /// [`enter_raw_mode`] is called.
    ///
    /// [`capture_original`]: Self::capture_original
    /// [`enter_raw_mode`]: Self::enter_raw_mode
    #[must_use]
    pub fn new(device: D) -> Self {
        Self::with_config(device, Config::default())
    }

    #[must_use]
    pub const fn with_config(device: D, config: Config) -> Self {
        Self {
            device,
            config,
            original: None,
            raw: false,
            geometry: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub const fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Give the device back. Does not restore; release any [`RawMode`]
    /// guard first.
    #[must_use]
    pub fn into_device(self) -> D {
        self.device
    }

    /// The captured original attributes, if captured.
    #[inline]
    #[must_use]
    pub const fn original(&self) -> Option<&TerminalAttributes> {
        self.original.as_ref()
    }

    /// Whether raw mode is currently applied.
    #[inline]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.raw
    }

    /// The resolved screen size, once [`resolve_geometry`](Self::resolve_geometry)
    /// has succeeded.
    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> Option<ScreenGeometry> {
        self.geometry
    }

    /// Read and keep the terminal's current attributes.
    ///
    /// Only the first successful call touches the device; later calls return
    /// the same snapshot.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalQuery`] if the attributes cannot be read.
    pub fn capture_original(&mut self) -> Result<TerminalAttributes> {
        if let Some(original) = self.original {
            return Ok(original);
        }
        let original = self.device.get_attributes().map_err(Error::TerminalQuery)?;
        self.original = Some(original);
        debug!("terminal attributes captured");
        Ok(original)
    }

    /// Switch the terminal to raw mode and return the guard that undoes it.
    ///
    /// Captures the original first if that hasn't happened yet. Calling this
    /// while raw mode is already applied doesn't touch the device again.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalQuery`] if the capture fails,
    /// [`Error::TerminalConfig`] if raw mode cannot be applied. No guard is
    /// returned in either case and the device is left as it was.
    pub fn enter_raw_mode(&mut self) -> Result<RawMode<'_, D>> {
        let original = self.capture_original()?;

        if !self.raw {
            let raw = self.config.raw_mode.derive(&original);

            self.device.arm_panic_restore(&original);
            if let Err(e) = self.device.set_attributes(&raw) {
                self.device.disarm_panic_restore();
                return Err(Error::TerminalConfig(e));
            }

            self.raw = true;
            debug!(
                min_bytes = raw.min_bytes(),
                timeout_ds = raw.timeout_deciseconds(),
                "raw mode entered"
            );
        }

        Ok(RawMode { session: self })
    }

    /// Put the original attributes back.
    ///
    /// No-op unless raw mode is applied, so calling it any number of times
    /// leaves the terminal in the same state as calling it once.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalConfig`] if the device refuses the attributes
    /// (typically because the terminal went away). The session still counts
    /// as restored afterwards; there is no second attempt.
    pub fn restore(&mut self) -> Result<()> {
        if !self.raw {
            return Ok(());
        }
        self.raw = false;

        let Some(original) = self.original else {
            return Ok(());
        };
        let result = self.device.set_attributes(&original);
        // Disarm on failure too; the session counts as restored.
        self.device.disarm_panic_restore();
        result.map_err(Error::TerminalConfig)?;

        debug!("terminal attributes restored");
        Ok(())
    }

    /// Determine the screen size, once.
    ///
    /// # Errors
    ///
    /// [`Error::Geometry`] if neither the OS nor the terminal can say.
    pub fn resolve_geometry(&mut self) -> Result<ScreenGeometry> {
        if let Some(geometry) = self.geometry {
            return Ok(geometry);
        }
        let geometry = geometry::resolve(&mut self.device, self.config.probe_limit)?;
        self.geometry = Some(geometry);
        Ok(geometry)
    }
}

// ─── RawMode ─────────────────────────────────────────────────────────────────

/// Raw mode held for a scope. Dereferences to the [`Session`].
///
/// The original attributes are restored when the guard is dropped.
#[derive(Debug)]
pub struct RawMode<'a, D: Device> {
    session: &'a mut Session<D>,
}

impl<D: Device> RawMode<'_, D> {
    /// Restore now instead of at drop, and see whether it worked.
    ///
    /// # Errors
    ///
    /// As [`Session::restore`].
    pub fn release(mut self) -> Result<()> {
        // Drop runs afterwards and finds nothing left to do.
        self.session.restore()
    }
}

impl<D: Device> Deref for RawMode<'_, D> {
    type Target = Session<D>;

    fn deref(&self) -> &Session<D> {
        self.session
    }
}

impl<D: Device> DerefMut for RawMode<'_, D> {
    fn deref_mut(&mut self) -> &mut Session<D> {
        self.session
    }
}

impl<D: Device> Drop for RawMode<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.session.restore() {
            error!(error = %e, "failed to restore terminal attributes");
            eprintln!("failed to restore terminal: {e}");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
