use mydms_core::config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize tracing: compact console output plus an optional plain log file.
///
/// `RUST_LOG` overrides the configured log level.
pub fn init_telemetry(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );

    let file_layer = match config.file_path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    let level = config.log_level.to_lowercase();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mydms={level},tower_http=debug").into()),
        )
        .with(console_fmt)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_level = %level,
        log_file = config.file_path.as_deref().unwrap_or("-"),
        "Tracing initialized"
    );
    Ok(())
}
