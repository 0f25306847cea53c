use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr subscriber. `level` is any `EnvFilter` directive
/// ("warn", "debug", "catsales=trace"); an invalid directive falls back to "warn".
pub fn setup_logging(level: &str) {
    let filter = EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
