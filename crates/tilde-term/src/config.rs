// SPDX-License-Identifier: MIT
//
// Session configuration.
//
// Built in code only. The core reads no files, flags or environment variables;
// anything like that belongs to whatever embeds it.

use crate::attributes::RawModeConfig;
use crate::input::QUIT_KEY;
use crate::report;

/// Knobs for a terminal session and its render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Read policy applied when entering raw mode.
    pub raw_mode: RawModeConfig,
    /// Longest cursor position report accepted during the size probe,
    /// terminator included.
    pub probe_limit: usize,
    /// The key that ends the render loop.
    pub quit_key: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_mode: RawModeConfig::default(),
            probe_limit: report::DEFAULT_LIMIT,
            quit_key: QUIT_KEY,
        }
    }
}
