use anyhow::Context;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` directives take precedence over `level`.
pub fn setup_logging(level: &str, file_info: bool) -> anyhow::Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("invalid log level '{}'", level))?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_file(file_info)
        .with_line_number(file_info)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
