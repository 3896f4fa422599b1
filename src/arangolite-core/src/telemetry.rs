//! Tracing setup for applications embedding the client
//!
//! The library only emits `tracing` events. Binaries call [`init_tracing`]
//! once at startup to get them printed.

use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "arangolite=info,arangolite_core=info,arangolite_rs=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable console output
    Pretty,
    /// One JSON object per event
    Json,
}

/// Installs a global subscriber honouring `RUST_LOG`.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(false),
            )
            .try_init()?,
    }

    tracing::info!("Tracing initialized ({:?})", format);
    Ok(())
}
