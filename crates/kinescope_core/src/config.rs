//! # Scheduler Configuration
//!
//! Declarative startup settings, loadable from TOML:
//!
//! ```toml
//! mode = "real_time"
//! frame_rate = 60.0
//! real_time_scale = 0.5
//! buffer_length_sec = 0.2
//! window_title = "pendulum study"
//! ```
//!
//! Every field is optional; defaults match a freshly constructed
//! scheduler.

use serde::{Deserialize, Serialize};

use crate::error::SchedulerResult;
use crate::frame::Snapshot;
use crate::policy::Mode;
use crate::scheduler::Scheduler;

/// Startup settings for a [`Scheduler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Operating mode.
    pub mode: Mode,
    /// Frame rate to aim for; `None` keeps the mode default.
    pub frame_rate: Option<f64>,
    /// Simulated seconds displayed per real second (RealTime only).
    pub real_time_scale: f64,
    /// Buffer length in seconds; `None` keeps the default, `0.0`
    /// disables buffering.
    pub buffer_length_sec: Option<f64>,
    /// Initial renderer window title.
    pub window_title: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            frame_rate: None,
            real_time_scale: 1.0,
            buffer_length_sec: None,
            window_title: None,
        }
    }
}

impl SchedulerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Malformed TOML or unknown fields.
    pub fn from_toml_str(text: &str) -> SchedulerResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies every setting to a scheduler.
    ///
    /// # Errors
    ///
    /// Sink rejection of the window title directive.
    pub fn apply<S: Snapshot>(&self, scheduler: &Scheduler<S>) -> SchedulerResult<()> {
        scheduler.set_mode(self.mode);
        if let Some(rate) = self.frame_rate {
            scheduler.set_desired_frame_rate(rate);
        }
        scheduler.set_real_time_scale(self.real_time_scale);
        if let Some(seconds) = self.buffer_length_sec {
            scheduler.set_desired_buffer_length_in_sec(seconds);
        }
        if let Some(title) = &self.window_title {
            scheduler.set_window_title(title)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.mode, Mode::PassThrough);
        assert!(config.frame_rate.is_none());
    }

    #[test]
    fn full_document_round_trips() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            mode = "real_time"
            frame_rate = 60.0
            real_time_scale = 0.5
            buffer_length_sec = 0.2
            window_title = "pendulum study"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::RealTime);
        assert_eq!(config.frame_rate, Some(60.0));
        assert_eq!(config.real_time_scale, 0.5);
        assert_eq!(config.buffer_length_sec, Some(0.2));
        assert_eq!(config.window_title.as_deref(), Some("pendulum study"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = SchedulerConfig::from_toml_str("frames_per_second = 60.0");
        assert!(matches!(result, Err(SchedulerError::ConfigFile(_))));
    }

    #[test]
    fn bad_mode_is_rejected() {
        let result = SchedulerConfig::from_toml_str(r#"mode = "turbo""#);
        assert!(matches!(result, Err(SchedulerError::ConfigFile(_))));
    }
}
