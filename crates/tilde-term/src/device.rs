// SPDX-License-Identifier: MIT
//
// The terminal device boundary.
//
// Safety: the real device necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), read(2) and a raw write(2) on the panic
// path. These are the POSIX terminal interfaces; each unsafe block is minimal.
#![allow(unsafe_code)]
//
// Everything above this module talks to a `Device`: the session controller
// gets and sets attributes, the geometry resolver asks for the window size
// and probes the cursor, the input reader pulls single bytes, and the output
// buffer pushes a whole frame in one `write_all`. Tests swap in a recording
// mock; the binary uses `StdioDevice`.
//
// The panic hook is the one piece of process-wide state. It keeps a backup of
// the original attributes behind a `Mutex` so a panic anywhere (including
// with `panic = "abort"`, where no destructor runs) still clears the screen
// and restores the terminal before the panic message is printed.

use std::io;
#[cfg(unix)]
use std::sync::{Mutex, Once};

#[cfg(unix)]
use crate::ansi;
use crate::attributes::TerminalAttributes;

// ─── Device ──────────────────────────────────────────────────────────────────

/// A terminal the session can drive.
pub trait Device {
    /// Read the current attribute set.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the attributes cannot be read.
    fn get_attributes(&mut self) -> io::Result<TerminalAttributes>;

    /// Apply an attribute set, flushing pending input first.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the attributes cannot be applied.
    fn set_attributes(&mut self, attrs: &TerminalAttributes) -> io::Result<()>;

    /// Ask the OS for the window size as `(rows, cols)`.
    ///
    /// Either value may be zero when the transport doesn't know.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the query itself fails.
    fn window_size(&mut self) -> io::Result<(u16, u16)>;

    /// Read up to `buf.len()` bytes. `Ok(0)` means the read timed out.
    ///
    /// # Errors
    ///
    /// Returns the OS error on a failed read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `bytes` as a single operation and flush.
    ///
    /// # Errors
    ///
    /// Returns the OS error if any byte could not be written.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Called once raw mode is applied, with the attributes to fall back to if
    /// the process panics before the session restores them.
    fn arm_panic_restore(&mut self, _original: &TerminalAttributes) {}

    /// Called after the original attributes have been restored.
    fn disarm_panic_restore(&mut self) {}
}

// ─── StdioDevice ─────────────────────────────────────────────────────────────

/// The process's controlling terminal: attributes and reads on stdin, size
/// and writes on stdout.
#[derive(Debug, Default)]
pub struct StdioDevice {
    _private: (),
}

impl StdioDevice {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(not(unix))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "terminal control requires a unix termios device",
    )
}

#[cfg(unix)]
mod termios {
    use std::io;

    use crate::attributes::{
        CONTROL_CHARS, ControlFlags, InputFlags, LocalFlags, OutputFlags, TerminalAttributes,
    };

    pub fn get(fd: libc::c_int) -> io::Result<libc::termios> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(termios)
        }
    }

    pub fn set(fd: libc::c_int, termios: &libc::termios) -> io::Result<()> {
        unsafe {
            if libc::tcsetattr(fd, libc::TCSAFLUSH, termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    #[allow(clippy::useless_conversion)] // tcflag_t is u32 on Linux, u64 on macOS.
    pub fn snapshot(termios: &libc::termios) -> TerminalAttributes {
        let mut control_chars = [0u8; CONTROL_CHARS];
        let n = termios.c_cc.len().min(CONTROL_CHARS);
        control_chars[..n].copy_from_slice(&termios.c_cc[..n]);

        TerminalAttributes {
            input: InputFlags::from_bits_retain(u64::from(termios.c_iflag)),
            output: OutputFlags::from_bits_retain(u64::from(termios.c_oflag)),
            control: ControlFlags::from_bits_retain(u64::from(termios.c_cflag)),
            local: LocalFlags::from_bits_retain(u64::from(termios.c_lflag)),
            control_chars,
        }
    }

    /// Write `attrs` over `base`. Line speeds and anything else we don't
    /// carry stay as they are in `base`.
    #[allow(clippy::cast_possible_truncation)] // Bits came from tcflag_t.
    pub fn overlay(base: &mut libc::termios, attrs: &TerminalAttributes) {
        base.c_iflag = attrs.input.bits() as libc::tcflag_t;
        base.c_oflag = attrs.output.bits() as libc::tcflag_t;
        base.c_cflag = attrs.control.bits() as libc::tcflag_t;
        base.c_lflag = attrs.local.bits() as libc::tcflag_t;

        let n = base.c_cc.len().min(CONTROL_CHARS);
        base.c_cc[..n].copy_from_slice(&attrs.control_chars[..n]);
    }

    pub fn apply(fd: libc::c_int, attrs: &TerminalAttributes) -> io::Result<()> {
        let mut current = get(fd)?;
        overlay(&mut current, attrs);
        set(fd, &current)
    }
}

/// write(2) straight to `fd` until every byte is out.
///
/// `io::stdout()` is line buffered and would split a frame at its last
/// `\n`, so frames go to the descriptor directly. Only a short write or
/// EINTR leads to a second call.
#[cfg(unix)]
fn write_fd(fd: libc::c_int, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        let n = unsafe { libc::write(fd, bytes.as_ptr().cast::<libc::c_void>(), bytes.len()) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        #[allow(clippy::cast_sign_loss)] // n > 0 checked above.
        let n = n as usize;
        bytes = &bytes[n..];
    }
    Ok(())
}

#[cfg(unix)]
impl Device for StdioDevice {
    fn get_attributes(&mut self) -> io::Result<TerminalAttributes> {
        termios::get(libc::STDIN_FILENO).map(|t| termios::snapshot(&t))
    }

    fn set_attributes(&mut self, attrs: &TerminalAttributes) -> io::Result<()> {
        termios::apply(libc::STDIN_FILENO, attrs)
    }

    fn window_size(&mut self) -> io::Result<(u16, u16)> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok((ws.ws_row, ws.ws_col))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        let n = n as usize;
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_fd(libc::STDOUT_FILENO, bytes)
    }

    fn arm_panic_restore(&mut self, original: &TerminalAttributes) {
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(*original);
        }
        install_panic_hook();
    }

    fn disarm_panic_restore(&mut self) {
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }
    }
}

#[cfg(not(unix))]
impl Device for StdioDevice {
    fn get_attributes(&mut self) -> io::Result<TerminalAttributes> {
        Err(unsupported())
    }

    fn set_attributes(&mut self, _attrs: &TerminalAttributes) -> io::Result<()> {
        Err(unsupported())
    }

    fn window_size(&mut self) -> io::Result<(u16, u16)> {
        Err(unsupported())
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        use std::io::Write;

        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }
}

// ─── Panic-Safe Terminal Restore ─────────────────────────────────────────────

/// Original attributes for the panic hook, set while raw mode is active.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<TerminalAttributes>> = Mutex::new(None);

/// Set once the restore hook is installed.
#[cfg(unix)]
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that clears the screen and restores the terminal
/// before the original hook prints the panic message.
#[cfg(unix)]
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            original(info);
        }));
    });
}

/// Clear the screen straight to fd 1 and reapply the backed-up attributes.
///
/// Bypasses `io::stdout()`'s lock: the panic may have happened mid-flush
/// while the lock was held.
#[cfg(unix)]
fn emergency_restore() {
    let Ok(guard) = TERMIOS_BACKUP.lock() else {
        return;
    };
    let Some(ref original) = *guard else {
        return;
    };

    let _ = write_fd(libc::STDOUT_FILENO, ansi::CLEAR_AND_HOME);
    let _ = termios::apply(libc::STDIN_FILENO, original);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_window_size_does_not_panic() {
        let _ = StdioDevice::new().window_size();
    }

    #[cfg(unix)]
    #[test]
    fn stdio_attributes_fail_without_tty() {
        if unsafe { libc::isatty(libc::STDIN_FILENO) } != 0 {
            return;
        }
        assert!(StdioDevice::new().get_attributes().is_err());
    }

    /// Read every packet from an `O_DIRECT` pipe: one per write(2).
    #[cfg(target_os = "linux")]
    fn packets(fd: libc::c_int) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                return out;
            }
            out.push(buf[..n as usize].to_vec());
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn multi_line_frame_is_one_write() {
        let frame = b"\x1b[2J\x1b[H~\r\n~\r\n~\x1b[H";

        let mut fds: [libc::c_int; 2] = [0; 2];
        assert_eq!(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_DIRECT) }, 0);
        let [read_end, write_end] = fds;

        write_fd(write_end, frame).unwrap();
        unsafe { libc::close(write_end) };
        let got = packets(read_end);
        unsafe { libc::close(read_end) };

        assert_eq!(got, vec![frame.to_vec()]);
    }

    #[cfg(unix)]
    #[test]
    fn write_to_read_only_descriptor_fails() {
        let mut fds: [libc::c_int; 2] = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let [read_end, write_end] = fds;

        assert!(write_fd(read_end, b"~").is_err());
        unsafe {
            libc::close(read_end);
            libc::close(write_end);
        }
    }

    #[test]
    fn disarm_without_arm_is_harmless() {
        StdioDevice::new().disarm_panic_restore();
    }

    #[cfg(unix)]
    #[test]
    fn termios_snapshot_overlay_round_trip() {
        use crate::attributes::RawModeConfig;

        let mut base: libc::termios = unsafe { std::mem::zeroed() };
        base.c_iflag = libc::ICRNL | libc::IXON;
        base.c_oflag = libc::OPOST;
        base.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG;
        base.c_cc[libc::VMIN] = 1;

        let original = termios::snapshot(&base);
        let raw = RawModeConfig::default().derive(&original);

        let mut applied = base;
        termios::overlay(&mut applied, &raw);
        assert_eq!(applied.c_iflag & libc::ICRNL, 0);
        assert_eq!(applied.c_lflag & libc::ECHO, 0);
        assert_eq!(applied.c_cc[libc::VMIN], 0);
        assert_eq!(applied.c_cc[libc::VTIME], 15);

        termios::overlay(&mut applied, &original);
        assert_eq!(termios::snapshot(&applied), original);
    }
}
