//! Shared plumbing for the `zonar` and `zonar-srv` binaries: argument
//! parsing, mount-to-device resolution, signal handling, and the local
//! `info` summary.

pub mod cli;
pub mod info;
pub mod mountinfo;
pub mod signals;

/// Initializes `env_logger` at `Debug` if `verbose`, `Info` otherwise.
pub fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).format_timestamp_millis().init();
}
