//! Stage logging handle.
//!
//! The library never installs a logger. The driver creates a [`StageLog`]
//! from the configured [`LogLevel`] and hands it to every stage call; stages
//! log through it so that verbosity is decided per run rather than per
//! process. Records go to the `log` facade under the `fragdown` target.

use crate::pipeline::config::LogLevel;
use std::fmt;

const TARGET: &str = "fragdown";

/// Copyable logging handle threaded through the pipeline stages.
#[derive(Debug, Clone, Copy)]
pub struct StageLog {
    level: LogLevel,
    stage: &'static str,
}

impl StageLog {
    /// Create a handle for the driver.
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            stage: "pipeline",
        }
    }

    /// A handle that only passes errors through.
    pub fn quiet() -> Self {
        Self::new(LogLevel::Error)
    }

    /// The same handle, labelled for a specific stage.
    pub fn for_stage(&self, stage: &'static str) -> Self {
        Self {
            level: self.level,
            stage,
        }
    }

    /// Current stage label.
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Whether a record at `level` would be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level.should_log(level)
    }

    /// Emit an error record.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        if self.enabled(LogLevel::Error) {
            log::error!(target: TARGET, "[{}] {}", self.stage, args);
        }
    }

    /// Emit a warning record.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        if self.enabled(LogLevel::Warn) {
            log::warn!(target: TARGET, "[{}] {}", self.stage, args);
        }
    }

    /// Emit an info record.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        if self.enabled(LogLevel::Info) {
            log::info!(target: TARGET, "[{}] {}", self.stage, args);
        }
    }

    /// Emit a debug record.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        if self.enabled(LogLevel::Debug) {
            log::debug!(target: TARGET, "[{}] {}", self.stage, args);
        }
    }

    /// Emit a trace record.
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        if self.enabled(LogLevel::Trace) {
            log::trace!(target: TARGET, "[{}] {}", self.stage, args);
        }
    }
}

impl Default for StageLog {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_stage_keeps_level() {
        let log = StageLog::new(LogLevel::Debug).for_stage("merge");
        assert_eq!(log.stage(), "merge");
        assert!(log.enabled(LogLevel::Debug));
        assert!(!log.enabled(LogLevel::Trace));
    }

    #[test]
    fn test_quiet() {
        let log = StageLog::quiet();
        assert!(log.enabled(LogLevel::Error));
        assert!(!log.enabled(LogLevel::Warn));
        // Must not panic without an installed logger.
        log.warn(format_args!("suppressed {}", 1));
        log.error(format_args!("emitted {}", 2));
    }
}
