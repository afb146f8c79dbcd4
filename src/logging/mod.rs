use error_stack::{Result, ResultExt};
use std::fmt::Display;
use std::io::IsTerminal;
use std::str::FromStr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

mod formatter;

use self::formatter::Formatter;

/// Environment variable selecting the console output style.
pub const LOG_STYLE_VAR: &str = "HOSPITAL_LOG_STYLE";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStyle {
    Compact,
    #[default]
    Full,
    Pretty,
    Json,
}

impl Display for LogStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compact => f.write_str("compact"),
            Self::Full => f.write_str("full"),
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown {0:?} logging style")]
pub struct InvalidLogStyle(String);

impl FromStr for LogStyle {
    type Err = InvalidLogStyle;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_lowercase();
        match s.as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(InvalidLogStyle(s)),
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to initialize tracing")]
pub struct TracingInitError;

/// Installs the global subscriber. Targets come from `RUST_LOG`
/// and default to `info`.
pub fn init() -> Result<(), TracingInitError> {
    let style = match std::env::var(LOG_STYLE_VAR) {
        Ok(value) => value
            .parse::<LogStyle>()
            .change_context(TracingInitError)
            .attach_printable_lazy(|| format!("invalid value of {LOG_STYLE_VAR}"))?,
        Err(..) => LogStyle::default(),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let ansi = std::io::stderr().is_terminal();
    let console = match Formatter::from_style(style, ansi) {
        Some(formatter) => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .event_format(formatter)
            .boxed(),
        None => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .boxed(),
    };

    let registry = Registry::default()
        .with(console.with_filter(filter))
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(registry)
        .change_context(TracingInitError)
        .attach_printable("already initialized tracing")?;

    Ok(())
}
