//! Dialog launch configuration
//!
//! Timing and easing of the launch/exit morph and of the optional background
//! bounds animation. Every field has a default, so a TOML file only needs to
//! name what it overrides:
//!
//! ```toml
//! host_theme = "dim-host"
//! bounds_animation_duration_ms = 300
//!
//! [timing]
//! total_duration_ms = 400
//! ```

use blinc_animation::Easing;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interpolator::Crossfade;

/// Durations of the launch morph and its cross-fade
///
/// The content of the start surface fades out first, then the content of the
/// end surface fades in. Both segments are expressed in milliseconds from the
/// start of the animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchTiming {
    pub total_duration_ms: u32,
    pub content_before_fade_out_delay_ms: u32,
    pub content_before_fade_out_duration_ms: u32,
    pub content_after_fade_in_delay_ms: u32,
    pub content_after_fade_in_duration_ms: u32,
}

impl Default for LaunchTiming {
    fn default() -> Self {
        Self {
            total_duration_ms: 500,
            content_before_fade_out_delay_ms: 0,
            content_before_fade_out_duration_ms: 150,
            content_after_fade_in_delay_ms: 150,
            content_after_fade_in_duration_ms: 183,
        }
    }
}

impl LaunchTiming {
    /// Cross-fade segments as fractions of the total duration
    pub fn crossfade(&self) -> Crossfade {
        let total = self.total_duration_ms.max(1) as f32;
        let fraction = |ms: u32| (ms as f32 / total).clamp(0.0, 1.0);
        Crossfade {
            fade_out_start: fraction(self.content_before_fade_out_delay_ms),
            fade_out_end: fraction(
                self.content_before_fade_out_delay_ms
                    .saturating_add(self.content_before_fade_out_duration_ms),
            ),
            fade_in_start: fraction(self.content_after_fade_in_delay_ms),
            fade_in_end: fraction(
                self.content_after_fade_in_delay_ms
                    .saturating_add(self.content_after_fade_in_duration_ms),
            ),
        }
    }
}

/// Configuration for [`DialogLaunchAnimator`](crate::DialogLaunchAnimator)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogLaunchConfig {
    /// Theme id handed to the host provider
    pub host_theme: String,
    pub timing: LaunchTiming,
    /// Easing of the morph geometry (the cross-fade is always linear)
    pub position_easing: Easing,
    pub bounds_animation_duration_ms: u32,
    pub bounds_easing: Easing,
}

impl Default for DialogLaunchConfig {
    fn default() -> Self {
        Self {
            host_theme: "host-dialog".to_string(),
            timing: LaunchTiming::default(),
            position_easing: Easing::emphasized(),
            bounds_animation_duration_ms: 500,
            bounds_easing: Easing::standard(),
        }
    }
}

impl DialogLaunchConfig {
    /// Parse a config from TOML, filling missing fields with defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_host_theme(mut self, theme: impl Into<String>) -> Self {
        self.host_theme = theme.into();
        self
    }

    pub fn with_timing(mut self, timing: LaunchTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_position_easing(mut self, easing: Easing) -> Self {
        self.position_easing = easing;
        self
    }

    pub fn with_bounds_animation(mut self, duration_ms: u32, easing: Easing) -> Self {
        self.bounds_animation_duration_ms = duration_ms;
        self.bounds_easing = easing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DialogLaunchError;

    #[test]
    fn test_default_crossfade() {
        let crossfade = LaunchTiming::default().crossfade();
        assert_eq!(crossfade.fade_out_start, 0.0);
        assert!((crossfade.fade_out_end - 0.3).abs() < 1e-6);
        assert!((crossfade.fade_in_start - 0.3).abs() < 1e-6);
        assert!((crossfade.fade_in_end - 0.666).abs() < 1e-6);
    }

    #[test]
    fn test_huge_fade_timings_clamp_to_end() {
        let config = DialogLaunchConfig::from_toml_str(
            r#"
            [timing]
            content_before_fade_out_delay_ms = 4294967295
            content_before_fade_out_duration_ms = 10
            content_after_fade_in_duration_ms = 4294967295
            "#,
        )
        .unwrap();

        let crossfade = config.timing.crossfade();
        assert_eq!(crossfade.fade_out_start, 1.0);
        assert_eq!(crossfade.fade_out_end, 1.0);
        assert_eq!(crossfade.fade_in_end, 1.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DialogLaunchConfig::from_toml_str(
            r#"
            host_theme = "dim-host"
            bounds_animation_duration_ms = 300

            [timing]
            total_duration_ms = 400
            "#,
        )
        .unwrap();

        assert_eq!(config.host_theme, "dim-host");
        assert_eq!(config.bounds_animation_duration_ms, 300);
        assert_eq!(config.timing.total_duration_ms, 400);
        assert_eq!(config.timing.content_after_fade_in_duration_ms, 183);
        assert_eq!(config.position_easing, Easing::emphasized());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DialogLaunchConfig::from_toml_str("timing = 3").unwrap_err();
        assert!(matches!(err, DialogLaunchError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = DialogLaunchConfig::default()
            .with_host_theme("custom")
            .with_position_easing(Easing::Linear)
            .with_bounds_animation(250, Easing::EaseOut);
        assert_eq!(config.host_theme, "custom");
        assert_eq!(config.position_easing, Easing::Linear);
        assert_eq!(config.bounds_animation_duration_ms, 250);
        assert_eq!(config.bounds_easing, Easing::EaseOut);
    }
}
