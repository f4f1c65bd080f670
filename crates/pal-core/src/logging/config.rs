//! Logging configuration.
//!
//! `PALANTIR_LOG` takes a level (`trace` .. `error`, or `off`) and
//! `PALANTIR_LOG_FORMAT` takes `human` or `jsonl`. Explicit overrides from
//! the embedding application win over both.

use tracing_subscriber::filter::LevelFilter;

pub const ENV_LOG_LEVEL: &str = "PALANTIR_LOG";
pub const ENV_LOG_FORMAT: &str = "PALANTIR_LOG_FORMAT";

/// Where log lines go and how they look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable stderr lines.
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" => Ok(LogFormat::Jsonl),
            other => Err(format!("expected `human` or `jsonl`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Default level for events without a more specific `RUST_LOG` directive.
    pub level: LevelFilter,
    /// Timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Read `PALANTIR_LOG` / `PALANTIR_LOG_FORMAT`, then apply overrides.
    ///
    /// Unparseable values are ignored.
    pub fn from_env(level: Option<LevelFilter>, format: Option<LogFormat>) -> Self {
        let env_level = std::env::var(ENV_LOG_LEVEL).ok().and_then(|v| v.trim().parse().ok());
        let env_format = std::env::var(ENV_LOG_FORMAT).ok().and_then(|v| v.parse().ok());
        Self::resolve(env_level, env_format, level, format)
    }

    fn resolve(
        env_level: Option<LevelFilter>,
        env_format: Option<LogFormat>,
        level: Option<LevelFilter>,
        format: Option<LogFormat>,
    ) -> Self {
        let defaults = LogConfig::default();
        LogConfig {
            format: format.or(env_format).unwrap_or(defaults.format),
            level: level.or(env_level).unwrap_or(defaults.level),
            timestamps: defaults.timestamps,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}
