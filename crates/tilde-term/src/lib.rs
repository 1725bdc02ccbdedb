// SPDX-License-Identifier: MIT
//
// tilde-term — terminal control core for the tilde editor.
//
// Takes exclusive control of a terminal, switches it to raw mode, works out
// how big it is, and draws full-screen frames with one write each. Whatever
// happens (quit key, read failure, a terminal that never answers the size
// probe, a panic) the terminal is handed back to the shell the way it was
// found.
//
// Everything talks to the terminal through the `Device` trait, so the whole
// lifecycle runs against a recording mock in tests. The real device is raw
// termios and ioctl on stdin/stdout via libc.
//
// Layers, bottom up:
//
//   ansi, attributes, report   pure encoding, flag math, reply parsing
//   device                     the terminal boundary
//   output, input, geometry    frame buffer, key reads, size discovery
//   session                    capture / raw mode / restore
//   editor                     the render loop

pub mod ansi;
pub mod attributes;
pub mod config;
pub mod device;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod output;
pub mod report;
pub mod session;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use device::{Device, StdioDevice};
pub use editor::{Action, App, Editor, Phase, Placeholder};
pub use error::{Error, Result};
pub use geometry::ScreenGeometry;
pub use session::{RawMode, Session};
