//! Core configuration for vizij-timeline-core.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{TimelineError, TimelineResult};
use crate::ticker::TickerConfig;
use crate::vars::Overwrite;

/// Engine-wide defaults and housekeeping policy.
/// Missing fields take their defaults when parsed from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ease used by tweens that do not name one.
    pub default_ease: Easing,
    /// Duration (seconds) used by tweens that do not set one.
    pub default_duration: f64,
    /// Overwrite mode used by tweens that do not set one.
    pub default_overwrite: Overwrite,
    /// Release detached, completed nodes during the clock's idle check.
    pub sweep_completed: bool,
    /// Maximum events retained in `Outputs` between drains.
    pub max_events_per_tick: usize,
    /// Initial capacity hint for dispatch scratch buffers.
    pub scratch_children: usize,
    pub ticker: TickerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ease: Easing::default(),
            default_duration: 0.5,
            default_overwrite: Overwrite::Auto,
            sweep_completed: true,
            max_events_per_tick: 1024,
            scratch_children: 64,
            ticker: TickerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> TimelineResult<Self> {
        serde_json::from_str(json).map_err(|e| TimelineError::Config {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json_str(r#"{ "default_duration": 2.0, "default_ease": "expo.in" }"#)
            .unwrap();
        assert_eq!(cfg.default_duration, 2.0);
        assert_eq!(cfg.default_ease, "expo.in".parse().unwrap());
        assert_eq!(cfg.default_overwrite, Overwrite::Auto);
        assert_eq!(cfg.ticker.idle_frames, 120);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = Config::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, TimelineError::Config { .. }));
    }
}
