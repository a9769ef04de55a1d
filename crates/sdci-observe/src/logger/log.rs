use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Everything outside sdci only reports problems unless asked otherwise.
const DEPENDENCY_LEVEL: &str = "warn";

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    if tracing::dispatcher::has_been_set() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let filter = mk_filter(&cfg.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    match cfg.format {
        LoggerFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(cfg.use_color)
                    .with_timer(mk_timer()),
            )
            .try_init()?,
        LoggerFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_ansi(false)
                    .with_timer(mk_timer()),
            )
            .try_init()?,
        LoggerFormat::Journald => install_journald(registry)?,
    }
    Ok(())
}

/// `debug` becomes `warn,sdci=debug`; anything else is taken as a full directive.
fn directive(level: &str) -> String {
    let level = level.trim();
    match level.parse::<Level>() {
        Ok(_) => format!("{DEPENDENCY_LEVEL},sdci={level}"),
        Err(_) => level.to_string(),
    }
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    let directive = directive(level);
    EnvFilter::try_new(&directive)
        .map_err(|source| LoggerError::InvalidFilter { directive, source })
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn install_journald<S>(registry: S) -> Result<(), LoggerError>
where
    S: tracing::Subscriber
        + for<'a> tracing_subscriber::registry::LookupSpan<'a>
        + Send
        + Sync
        + 'static,
{
    let journald = tracing_journald::layer()
        .map_err(LoggerError::Journald)?
        .with_syslog_identifier("sdci".to_string());
    registry.with(journald).try_init()?;
    Ok(())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn install_journald<S>(_registry: S) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_scopes_to_sdci() {
        assert_eq!(directive("debug"), "warn,sdci=debug");
        assert_eq!(directive(" INFO "), "warn,sdci=INFO");
    }

    #[test]
    fn full_directive_is_kept() {
        assert_eq!(directive("sdci_exec=trace,info"), "sdci_exec=trace,info");
    }

    #[test]
    fn bad_filter_is_rejected() {
        assert!(matches!(
            mk_filter("sdci=notalevel"),
            Err(LoggerError::InvalidFilter { directive, .. }) if directive == "sdci=notalevel"
        ));
    }

    #[test]
    fn second_install_reports_already_initialized() {
        let cfg = LoggerConfig::default();
        install(&cfg).unwrap();
        assert!(tracing::dispatcher::has_been_set());
        assert!(matches!(install(&cfg), Err(LoggerError::AlreadyInitialized)));
    }
}
