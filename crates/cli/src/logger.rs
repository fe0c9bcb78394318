//! Stderr logging through `env_logger`, with the level set by `-v`.

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Level for a `-v` count: warnings by default, up to trace at `-vvv`.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the stderr logger. A second call keeps the first logger.
pub fn init(verbosity: u8) {
    let installed = Builder::new()
        .filter_level(level_for(verbosity))
        .target(Target::Stderr)
        .format_timestamp(None)
        .try_init();
    if installed.is_ok() {
        log::debug!("logging at {}", level_for(verbosity));
    }
}
