//! Structured logging for pal-core.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding application's choice. [`init_logging`] provides the standard
//! setup:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for batch pipelines
//!
//! # Usage
//!
//! ```ignore
//! use pal_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! ```
//!
//! Every event carries an `event` field from [`event_names`] and, where it
//! belongs to a pipeline step, a `stage` field. All output goes to stderr.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat};
pub use events::{event_names, Stage};

use std::io::IsTerminal;
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `config.level` is the default directive; `RUST_LOG` directives refine it.
/// Returns false if a global subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
                .is_ok()
        }
    }
}

/// Wall-clock timer for one pipeline stage.
///
/// Emits a `stage.finished` event with the elapsed milliseconds when
/// [`finish`](Self::finish) is called.
#[derive(Debug)]
pub struct StageTimer {
    stage: Stage,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: Stage) -> Self {
        tracing::debug!(event = event_names::STAGE_STARTED, stage = %stage);
        Self {
            stage,
            started: Instant::now(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Log the elapsed time and return it in milliseconds.
    pub fn finish(self) -> f64 {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1e3;
        tracing::info!(
            event = event_names::STAGE_FINISHED,
            stage = %self.stage,
            elapsed_ms,
            "{} finished in {:.1} ms",
            self.stage,
            elapsed_ms
        );
        elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.level, tracing_subscriber::filter::LevelFilter::INFO);
    }

    #[test]
    fn test_stage_timer_reports_elapsed() {
        let timer = StageTimer::start(Stage::Absorption);
        assert_eq!(timer.stage(), Stage::Absorption);
        assert!(timer.finish() >= 0.0);
    }

    #[test]
    fn test_second_init_is_rejected() {
        let config = LogConfig::default().with_level(tracing_subscriber::filter::LevelFilter::OFF);
        // The first call may lose to another test in this binary.
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
