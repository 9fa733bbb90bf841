use std::env;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub const LOG_ENV: &str = "MEMSIM_LOG";

/// Writes `[LEVEL target] message` lines to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Each `-v` raises the default `warn` level by one step
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the stderr logger. `MEMSIM_LOG` wins over the verbosity flag.
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| level_for(verbosity));

    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
