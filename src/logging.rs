use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable selecting a log level when `--verbose` is not given.
pub const LOG_LEVEL_ENV: &str = "OCR_LINE_EDITOR_LOG";

/// Installs the stderr subscriber. Stdout stays reserved for the review output.
pub fn init(verbose: bool) -> Result<()> {
    let requested = std::env::var(LOG_LEVEL_ENV).ok();
    let Some(level) = log_level(verbose, requested.as_deref())? else {
        return Ok(());
    };
    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn log_level(verbose: bool, requested: Option<&str>) -> Result<Option<Level>> {
    if verbose {
        return Ok(Some(Level::DEBUG));
    }
    match requested.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse::<Level>()
            .map(Some)
            .with_context(|| format!("invalid {} value: {}", LOG_LEVEL_ENV, value)),
        None => Ok(None),
    }
}
