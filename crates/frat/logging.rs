//! Process-level logging sink, configured once from the environment
//! (`spec.md` §6.4, §9 "Global state").
//!
//! `FRAT_LEVEL` selects the minimum level (`error`/`warn`/`info`/`debug`,
//! case-insensitive, default `info`); `FRAT_APPENDER` names a file to
//! write to instead of stderr, falling back silently to stderr if it
//! can't be opened. Library code never calls this itself — only
//! `frat-cli`'s `main` does, once, at startup.

use std::fs::OpenOptions;
use std::io::Write;

const LEVEL_VAR: &str = "FRAT_LEVEL";
const APPENDER_VAR: &str = "FRAT_APPENDER";

/// Initializes the global logger. Safe to call more than once per process
/// (tests do); later calls are no-ops, matching `env_logger`'s own
/// idempotent `try_init`.
pub fn init() {
    let level = std::env::var(LEVEL_VAR)
        .ok()
        .and_then(|v| v.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);

    if let Ok(path) = std::env::var(APPENDER_VAR) {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(_) => {
                // Fall back silently to stderr, per spec.
            }
        }
    }

    let _ = builder.try_init();
}

/// Writes a final diagnostic line directly, bypassing the level filter —
/// used by the CLI to guarantee user-facing parse/semantic errors are
/// always seen regardless of `FRAT_LEVEL`.
pub fn error_line(message: &str) {
    log::error!("{message}");
    let _ = std::io::stderr().flush();
}
