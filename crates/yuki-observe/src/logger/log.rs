use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Directive, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Runtime client crates that are chatty at `debug`. Capped at `warn` unless the level names them.
const QUIET_CRATES: &[&str] = &["bollard", "hyper", "hyper_util"];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the output layer for `cfg`, filtered by its level.
pub(crate) fn layer_for(cfg: &LoggerConfig) -> Result<BoxedLayer, LoggerError> {
    let filter = filter_for(&cfg.level)?;
    let layer = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(local_rfc3339())
            .with_filter(filter)
            .boxed(),
        // One flat object per line, so event fields such as `exit_code` sit next to `message`.
        LoggerFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(local_rfc3339())
            .with_filter(filter)
            .boxed(),
        LoggerFormat::Journald => journald_layer(filter)?,
    };
    Ok(layer)
}

pub(crate) fn install(layer: BoxedLayer) -> Result<(), LoggerError> {
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(as_error)
}

pub(crate) fn filter_for(level: &str) -> Result<EnvFilter, LoggerError> {
    let invalid = || LoggerError::InvalidLogLevel(level.to_string());
    let mut filter = EnvFilter::try_new(level).map_err(|_| invalid())?;
    for krate in QUIET_CRATES {
        if names_target(level, krate) {
            continue;
        }
        let directive: Directive = format!("{krate}=warn").parse().map_err(|_| invalid())?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn names_target(level: &str, krate: &str) -> bool {
    level
        .split(',')
        .filter_map(|d| d.split('=').next())
        .any(|target| target.trim() == krate)
}

/// RFC 3339 timestamps in the local offset, or UTC when it cannot be determined.
fn local_rfc3339() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn as_error(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("SetGlobalDefaultError") || s.contains("global default trace dispatcher") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald_layer(filter: EnvFilter) -> Result<BoxedLayer, LoggerError> {
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("yukid".to_string());
    Ok(journald.with_filter(filter).boxed())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald_layer(_filter: EnvFilter) -> Result<BoxedLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_directives() {
        assert!(filter_for("info").is_ok());
        assert!(filter_for("yuki_core=debug,yuki_docker=trace").is_ok());
    }

    #[test]
    fn filter_rejects_bad_level() {
        let err = filter_for("yuki_core=loud").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLogLevel(l) if l == "yuki_core=loud"));
    }

    #[test]
    fn runtime_crates_are_quieted_unless_named() {
        let filter = filter_for("debug").unwrap().to_string();
        assert!(filter.contains("bollard=warn"));
        assert!(filter.contains("hyper=warn"));

        let filter = filter_for("debug,bollard=trace").unwrap().to_string();
        assert!(filter.contains("bollard=trace"));
        assert!(!filter.contains("bollard=warn"));
        assert!(filter.contains("hyper_util=warn"));
    }

    #[test]
    fn text_and_json_layers_build() {
        for format in [LoggerFormat::Text, LoggerFormat::Json] {
            let cfg = LoggerConfig {
                format,
                ..LoggerConfig::default()
            };
            assert!(layer_for(&cfg).is_ok());
        }
    }

    #[cfg(not(feature = "journald"))]
    #[test]
    fn journald_layer_needs_feature() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Journald,
            ..LoggerConfig::default()
        };
        assert!(matches!(layer_for(&cfg), Err(LoggerError::JournaldNotSupported)));
    }

    #[test]
    fn second_install_reports_already_initialized() {
        let cfg = LoggerConfig::default();
        let first = install(layer_for(&cfg).unwrap());
        let second = install(layer_for(&cfg).unwrap());
        // Another test may have won the first install.
        if first.is_ok() {
            assert!(matches!(second, Err(LoggerError::AlreadyInitialized)));
        } else {
            assert!(second.is_err());
        }
    }
}
