//! Structured logging setup
//!
//! One JSON object per line on stdout.

use tracing::Level;

/// Install the global JSON subscriber at `level`
pub fn init(level: Level) {
    tracing_subscriber::fmt()
        .json()
        .with_max_level(level)
        .with_writer(std::io::stdout)
        .with_current_span(false)
        .init();
}
