// SPDX-License-Identifier: MIT
//
// Terminal attribute snapshots and the raw-mode derivation.
//
// `TerminalAttributes` is a platform-neutral copy of the four termios flag
// words plus the control-character array. Flag words keep every bit the OS
// reported, including ones we never name, so restoring the captured original
// puts the terminal back exactly as it was. Only the flags raw mode touches
// get names.
//
// `RawModeConfig` is the recipe: it takes the original and produces the
// working copy that turns off line discipline, echo, signals and output
// post-processing, and sets the VMIN/VTIME read policy. The derived copy is
// handed to the device and dropped; nothing keeps it around.

use bitflags::bitflags;

/// Length of the control-character array we carry.
///
/// Large enough for every platform's `NCCS` (Linux 32, BSD/macOS 20).
pub const CONTROL_CHARS: usize = 32;

/// Flag values and control-character slots.
///
/// On unix these are the platform's own termios constants. Elsewhere there is
/// no termios, so the Linux values stand in and only tests ever see them.
#[cfg(unix)]
#[allow(clippy::cast_lossless, clippy::unnecessary_cast)]
pub(crate) mod sys {
    pub const BRKINT: u64 = libc::BRKINT as u64;
    pub const ICRNL: u64 = libc::ICRNL as u64;
    pub const INPCK: u64 = libc::INPCK as u64;
    pub const ISTRIP: u64 = libc::ISTRIP as u64;
    pub const IXON: u64 = libc::IXON as u64;

    pub const OPOST: u64 = libc::OPOST as u64;

    pub const CS8: u64 = libc::CS8 as u64;

    pub const ECHO: u64 = libc::ECHO as u64;
    pub const ICANON: u64 = libc::ICANON as u64;
    pub const IEXTEN: u64 = libc::IEXTEN as u64;
    pub const ISIG: u64 = libc::ISIG as u64;

    pub const VMIN: usize = libc::VMIN as usize;
    pub const VTIME: usize = libc::VTIME as usize;
}

#[cfg(not(unix))]
pub(crate) mod sys {
    pub const BRKINT: u64 = 0o000_002;
    pub const ICRNL: u64 = 0o000_400;
    pub const INPCK: u64 = 0o000_020;
    pub const ISTRIP: u64 = 0o000_040;
    pub const IXON: u64 = 0o002_000;

    pub const OPOST: u64 = 0o000_001;

    pub const CS8: u64 = 0o000_060;

    pub const ECHO: u64 = 0o000_010;
    pub const ICANON: u64 = 0o000_002;
    pub const IEXTEN: u64 = 0o100_000;
    pub const ISIG: u64 = 0o000_001;

    pub const VMIN: usize = 6;
    pub const VTIME: usize = 5;
}

// ─── Flag words ──────────────────────────────────────────────────────────────

bitflags! {
    /// Input mode flags (`c_iflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputFlags: u64 {
        /// Break condition sends SIGINT.
        const BRKINT = sys::BRKINT;
        /// Translate carriage return to newline.
        const ICRNL = sys::ICRNL;
        /// Input parity checking.
        const INPCK = sys::INPCK;
        /// Strip the eighth bit.
        const ISTRIP = sys::ISTRIP;
        /// Software flow control (Ctrl-S / Ctrl-Q).
        const IXON = sys::IXON;

        const _ = !0;
    }

    /// Output mode flags (`c_oflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputFlags: u64 {
        /// Output post-processing (`\n` → `\r\n`).
        const OPOST = sys::OPOST;

        const _ = !0;
    }

    /// Control mode flags (`c_cflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlFlags: u64 {
        /// Eight bits per character.
        const CS8 = sys::CS8;

        const _ = !0;
    }

    /// Local mode flags (`c_lflag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LocalFlags: u64 {
        /// Echo typed characters.
        const ECHO = sys::ECHO;
        /// Canonical (line-buffered) input.
        const ICANON = sys::ICANON;
        /// Extended input processing (Ctrl-V).
        const IEXTEN = sys::IEXTEN;
        /// Generate signals for Ctrl-C / Ctrl-Z.
        const ISIG = sys::ISIG;

        const _ = !0;
    }
}

// ─── TerminalAttributes ──────────────────────────────────────────────────────

/// A snapshot of the terminal's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalAttributes {
    pub input: InputFlags,
    pub output: OutputFlags,
    pub control: ControlFlags,
    pub local: LocalFlags,
    /// `c_cc`, zero-padded to [`CONTROL_CHARS`].
    pub control_chars: [u8; CONTROL_CHARS],
}

impl TerminalAttributes {
    /// Minimum bytes a read waits for (`VMIN`).
    #[inline]
    #[must_use]
    pub const fn min_bytes(&self) -> u8 {
        self.control_chars[sys::VMIN]
    }

    /// Read timeout in tenths of a second (`VTIME`).
    #[inline]
    #[must_use]
    pub const fn timeout_deciseconds(&self) -> u8 {
        self.control_chars[sys::VTIME]
    }

    /// Whether these attributes describe raw mode as [`RawModeConfig`]
    /// produces it (flag-wise; the read policy is not checked).
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        !self.input.intersects(RAW_INPUT_OFF)
            && !self.output.intersects(OutputFlags::OPOST)
            && self.control.contains(ControlFlags::CS8)
            && !self.local.intersects(RAW_LOCAL_OFF)
    }
}

impl Default for TerminalAttributes {
    fn default() -> Self {
        Self {
            input: InputFlags::empty(),
            output: OutputFlags::empty(),
            control: ControlFlags::empty(),
            local: LocalFlags::empty(),
            control_chars: [0; CONTROL_CHARS],
        }
    }
}

// ─── RawModeConfig ───────────────────────────────────────────────────────────

const RAW_INPUT_OFF: InputFlags = InputFlags::BRKINT
    .union(InputFlags::ICRNL)
    .union(InputFlags::INPCK)
    .union(InputFlags::ISTRIP)
    .union(InputFlags::IXON);

const RAW_LOCAL_OFF: LocalFlags = LocalFlags::ECHO
    .union(LocalFlags::ICANON)
    .union(LocalFlags::IEXTEN)
    .union(LocalFlags::ISIG);

/// Read policy applied on top of the raw flag changes.
///
/// The defaults (`VMIN = 0`, `VTIME = 15`) make every read return after at
/// most 1.5 seconds, with zero bytes if nothing was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawModeConfig {
    /// `VMIN`: bytes a read waits for before returning.
    pub min_bytes: u8,
    /// `VTIME`: idle timeout in tenths of a second.
    pub timeout_deciseconds: u8,
}

impl Default for RawModeConfig {
    fn default() -> Self {
        Self {
            min_bytes: 0,
            timeout_deciseconds: 15,
        }
    }
}

impl RawModeConfig {
    /// Derive the raw working copy from `original`. The original is untouched.
    #[must_use]
    pub fn derive(self, original: &TerminalAttributes) -> TerminalAttributes {
        let mut raw = *original;

        raw.input.remove(RAW_INPUT_OFF);
        raw.output.remove(OutputFlags::OPOST);
        raw.control.insert(ControlFlags::CS8);
        raw.local.remove(RAW_LOCAL_OFF);

        raw.control_chars[sys::VMIN] = self.min_bytes;
        raw.control_chars[sys::VTIME] = self.timeout_deciseconds;

        raw
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::cooked_attributes;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_read_policy() {
        let config = RawModeConfig::default();
        assert_eq!(config.min_bytes, 0);
        assert_eq!(config.timeout_deciseconds, 15);
    }

    #[test]
    fn derive_clears_line_discipline() {
        let raw = RawModeConfig::default().derive(&cooked_attributes());

        assert!(!raw.input.contains(InputFlags::ICRNL));
        assert!(!raw.input.contains(InputFlags::IXON));
        assert!(!raw.input.contains(InputFlags::BRKINT));
        assert!(!raw.input.contains(InputFlags::INPCK));
        assert!(!raw.input.contains(InputFlags::ISTRIP));
        assert!(!raw.output.contains(OutputFlags::OPOST));
        assert!(raw.control.contains(ControlFlags::CS8));
        assert!(!raw.local.contains(LocalFlags::ECHO));
        assert!(!raw.local.contains(LocalFlags::ICANON));
        assert!(!raw.local.contains(LocalFlags::ISIG));
        assert!(!raw.local.contains(LocalFlags::IEXTEN));
        assert!(raw.is_raw());
    }

    #[test]
    fn derive_sets_read_policy() {
        let config = RawModeConfig {
            min_bytes: 0,
            timeout_deciseconds: 3,
        };
        let raw = config.derive(&cooked_attributes());
        assert_eq!(raw.min_bytes(), 0);
        assert_eq!(raw.timeout_deciseconds(), 3);
    }

    #[test]
    fn derive_leaves_original_untouched() {
        let original = cooked_attributes();
        let before = original;
        let _ = RawModeConfig::default().derive(&original);
        assert_eq!(original, before);
        assert!(!original.is_raw());
    }

    #[test]
    fn derive_keeps_unnamed_bits() {
        let mut original = cooked_attributes();
        let foreign = 1 << 40;
        original.input = InputFlags::from_bits_retain(original.input.bits() | foreign);
        original.local = LocalFlags::from_bits_retain(original.local.bits() | foreign);

        let raw = RawModeConfig::default().derive(&original);
        assert_eq!(raw.input.bits() & foreign, foreign);
        assert_eq!(raw.local.bits() & foreign, foreign);
    }

    #[test]
    fn derive_keeps_other_control_chars() {
        let mut original = cooked_attributes();
        original.control_chars[0] = 0x03;
        let raw = RawModeConfig::default().derive(&original);
        assert_eq!(raw.control_chars[0], 0x03);
    }

    #[test]
    fn derive_is_stable() {
        let config = RawModeConfig::default();
        let once = config.derive(&cooked_attributes());
        let twice = config.derive(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn default_attributes_are_not_raw() {
        // No CS8 set.
        assert!(!TerminalAttributes::default().is_raw());
    }
}
