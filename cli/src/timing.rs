//! Tracing setup and latency profiling for the CLI.
//!
//! Functions annotated with `#[instrument]` log their duration when the span
//! closes if `--timing` is passed. Log records emitted by `keyhole-business`
//! through the `log` facade are picked up by the same subscriber.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Lowest level shown when `RUST_LOG` does not say otherwise.
fn default_level(verbose: bool, timing: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if timing {
        // Span close events are logged at INFO.
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

fn span_events(timing: bool) -> FmtSpan {
    if timing { FmtSpan::CLOSE } else { FmtSpan::NONE }
}

/// Initialize the global tracing subscriber, writing to stderr.
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, timing).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events(timing))
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
