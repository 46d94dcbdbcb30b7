use std::{fmt, io::IsTerminal, str::FromStr};

use time::UtcOffset;

use crate::error::LogError;

/// Shape of the stderr diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, colored on a terminal.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `warn` or `mproc.core.pool=trace`.
    pub filter: String,
    pub format: LogFormat,
    /// Escape codes in text output. Ignored for JSON.
    pub ansi: bool,
    /// Offset for event timestamps; the orchestrator's journal uses the same one.
    pub offset: UtcOffset,
}

impl LogSettings {
    /// Quiet text output at `warn`, colored only when stderr is a terminal.
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            filter: "warn".to_string(),
            format: LogFormat::Text,
            ansi: std::io::stderr().is_terminal(),
            offset,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}
