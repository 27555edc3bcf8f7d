use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise each `-v` raises the level one step
/// from `warn`.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore the error when a subscriber is already installed (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
