//! Installs the process-wide abort flag that the server dispatch loop
//! polls between requests.
//!
//! `ctrlc` only intercepts `SIGINT`; `SIGTERM` and `SIGPIPE` are
//! additionally wired through `signal-hook` directly, since relying on
//! `SIGPIPE`'s default disposition (process termination) would defeat
//! exiting the loop cleanly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use signal_hook::consts::{SIGPIPE, SIGTERM};
use signal_hook::flag;

/// Installs INT/TERM/PIPE handlers that flip a shared abort flag, and
/// returns it.
pub fn install() -> Result<Arc<AtomicBool>, std::io::Error> {
    let abort = Arc::new(AtomicBool::new(false));

    {
        let abort = abort.clone();
        ctrlc::set_handler(move || {
            info!("received SIGINT, shutting down");
            abort.store(true, Ordering::Relaxed);
        })
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }

    flag::register(SIGTERM, abort.clone())?;
    flag::register(SIGPIPE, abort.clone())?;

    Ok(abort)
}
