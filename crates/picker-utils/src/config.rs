//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-picker".to_string(),
            environment: "development".to_string(),
            log_filter: "warn,picker_core=info,picker_stock=info,picker_cli=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Read overrides from `PICKER_ENV`, `PICKER_LOG` and `PICKER_LOG_FORMAT`
    ///
    /// Production environments log JSON unless `PICKER_LOG_FORMAT` says otherwise.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(environment) = lookup("PICKER_ENV") {
            config.environment = environment;
        }
        if let Some(filter) = lookup("PICKER_LOG") {
            config.log_filter = filter;
        }
        config.log_format = match lookup("PICKER_LOG_FORMAT") {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(_) => LogFormat::Pretty,
            None if config.is_production() => LogFormat::Json,
            None => LogFormat::Pretty,
        };
        config
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production")
    }
}
