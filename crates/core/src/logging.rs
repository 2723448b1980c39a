use tracing::Level;

use crate::config::{LogFormat, LoggingConfig};

/// Installs the global `tracing` subscriber. Output goes to stderr so command
/// output on stdout stays machine-readable. Calling it twice is a no-op.
pub fn init(config: &LoggingConfig) {
    let log_level = config.logging_level();

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

impl LoggingConfig {
    pub fn logging_level(&self) -> Level {
        self.level.trim().parse::<Level>().unwrap_or(Level::INFO)
    }
}
