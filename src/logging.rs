//! Tracing subscriber setup for the `ccdb` binary
//!
//! The library only emits events; installing a subscriber is the binary's job.
//! Output goes to stderr so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`; `verbose` forces `debug`.
/// Calling this twice is harmless, the second install is ignored.
pub fn init(default_level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
