use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use crossterm::{execute, terminal::LeaveAlternateScreen, terminal::disable_raw_mode};
use tracing_subscriber::EnvFilter;

/// Send logs to `log_file`, or nowhere if `None`
///
/// The terminal belongs to the game, so logs never go to stdout or stderr.
pub fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    // RUST_LOG=wrap_snake=trace
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("Failed to install tracing subscriber")
}

/// Restore the terminal and log the panic before the default hook prints it
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stderr(), LeaveAlternateScreen);

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");

        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".to_string());

        tracing::error!(%location, %payload, "panic");
        default_hook(info);
    }));
}
