use std::io::IsTerminal;

use serde::Deserialize;

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Environment variable overriding [`LoggerConfig::format`].
pub const ENV_LOG_FORMAT: &str = "YUKI_LOG_FORMAT";
/// Environment variable overriding [`LoggerConfig::level`]; any `EnvFilter` directive is accepted.
pub const ENV_LOG_LEVEL: &str = "YUKI_LOG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: cfg!(test) || std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `YUKI_LOG_FORMAT` and `YUKI_LOG`.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
            if self.format == LoggerFormat::Json {
                self.use_color = false;
            }
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        Ok(self)
    }
}
