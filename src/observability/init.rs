//! Tracing initialization and subscriber setup.

use super::console_writer::ConsoleMakeWriter;
use crate::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// # Parameters
///
/// * `config` - Configuration containing the `trace_level` option
///
/// # Trace Level Resolution
///
/// Level is determined by:
/// 1. `config.trace_level` if set and a valid filter directive
/// 2. Default: `"info"`
///
/// # Initialization Behavior
///
/// - Lines carry no timestamp and no ANSI colors; the browser console adds its own
/// - Idempotent: Safe to call multiple times (only first call takes effect)
pub fn init_tracing(config: &Config) {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .with_writer(ConsoleMakeWriter);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);

    let _ = subscriber.try_init();
}
