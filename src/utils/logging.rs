// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber for the binary.
/// `RUST_LOG` takes precedence; otherwise `default_level` (e.g. "info") applies to this crate
/// while dependencies stay at "warn" so HTTP internals don't drown the pipeline output.
pub fn setup_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sec_statements={}", default_level)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout is reserved for the rendered dataset
        .init();

    tracing::debug!("Logging setup complete.");
}
