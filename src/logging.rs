//! Logging setup for the `strata` binary.
//!
//! Logs go to stderr so stdout carries only the report.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Level precedence:
/// 1. `verbose`: debug for strata
/// 2. `quiet`: errors only
/// 3. `RUST_LOG`
/// 4. info for strata
///
/// Calling this more than once keeps the first subscriber.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = log_filter(verbose, quiet);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn log_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("strata=debug")
    } else if quiet {
        EnvFilter::new("strata=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strata=info"))
    }
}
