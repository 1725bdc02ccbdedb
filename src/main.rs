// SPDX-License-Identifier: MIT
//
// tilde — a minimal raw-mode screen editor.
//
// This binary wires tilde-term to the process: it handles the two
// informational flags, optionally sets up file logging, runs the render loop
// on the real terminal, and turns the outcome into an exit code.
//
//   0  the user quit
//   1  something fatal happened; the cause is on stderr
//
// Logging never goes to the terminal (it's in raw mode and full of frames).
// Set TILDE_LOG to a file path to get a log; RUST_LOG filters it.

use std::env;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::process;
use std::sync::Mutex;

use tilde_term::{Editor, Placeholder, Session, StdioDevice};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Version string from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the log file.
const LOG_ENV: &str = "TILDE_LOG";

// ─── Command line ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run,
    Help,
    Version,
    Unknown(String),
}

fn parse_args(args: &[String]) -> Command {
    match args.first().map(String::as_str) {
        None => Command::Run,
        Some("-h" | "--help") => Command::Help,
        Some("-V" | "--version") => Command::Version,
        Some(other) => Command::Unknown(other.to_string()),
    }
}

fn print_help() {
    eprintln!("tilde {VERSION} - a minimal raw-mode screen editor");
    eprintln!();
    eprintln!("Usage: tilde [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -V, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Ctrl+Q                Quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {LOG_ENV}             Append logs to this file");
    eprintln!("  RUST_LOG              Log filter (error, warn, info, debug, trace)");
}

// ─── Logging ────────────────────────────────────────────────────────────────

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a file logger if `TILDE_LOG` names a writable file.
fn init_logging(path: Option<OsString>) {
    let Some(path) = path else {
        return;
    };

    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("tilde: cannot open log file {}: {e}", path.to_string_lossy());
            return;
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    match parse_args(&args) {
        Command::Run => {}
        Command::Help => {
            print_help();
            return;
        }
        Command::Version => {
            println!("tilde {VERSION}");
            return;
        }
        Command::Unknown(arg) => {
            eprintln!("tilde: unexpected argument '{arg}'");
            eprintln!("Try 'tilde --help' for more information.");
            process::exit(1);
        }
    }

    init_logging(env::var_os(LOG_ENV));
    info!(version = VERSION, "tilde starting");

    let mut session = Session::new(StdioDevice::new());
    if let Err(e) = Editor::new(Placeholder).run(&mut session) {
        eprintln!("tilde: {e}");
        process::exit(1);
    }

    info!("tilde exiting");
}

// ─── Tests ──────────────────────────────────────────────────────────────────
