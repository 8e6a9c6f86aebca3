//! Diagnostic logging.
//!
//! Library code logs through `tracing`; the CLI's user-facing lines go
//! through the colored macros in the crate root instead. Diagnostics are
//! written to stderr so they never mix with command output.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise spotsel logs at info (debug with
/// `verbose`) and everything else at warn.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "spotsel=debug,warn"
        } else {
            "spotsel=info,warn"
        })
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
