use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{
    error::LogError,
    settings::{LogFormat, LogSettings},
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber. Call once, before any runtime threads exist.
pub fn init(settings: &LogSettings) -> Result<(), LogError> {
    let filter = filter(&settings.filter)?;
    let layer = layer(settings).with_filter(filter);

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}

fn filter(directive: &str) -> Result<EnvFilter, LogError> {
    EnvFilter::try_new(directive).map_err(|e| LogError::InvalidFilter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

fn layer(settings: &LogSettings) -> BoxedLayer {
    let timer = OffsetTime::new(settings.offset, Rfc3339);
    match settings.format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(settings.ansi)
            .with_timer(timer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_current_span(false)
            .with_timer(timer)
            .boxed(),
    }
}
