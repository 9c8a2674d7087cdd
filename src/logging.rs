/// Process-wide `tracing` setup.
///
/// `RUST_LOG` takes the usual `EnvFilter` directives; without it only this
/// crate's `info` and above are printed.
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "sketch_studio=info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
