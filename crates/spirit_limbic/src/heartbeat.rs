//! Heartbeat configuration for the autonomic pulse
//!
//! The heartbeat determines how often the Spirit ages without external
//! stimuli. Intervals are jittered around the base so the pulse never
//! settles into a predictable rhythm.

use spirit_core::HeartbeatSettings;
use std::time::Duration;

/// Configuration for the autonomic heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Mean delay between pulses (default: 60s)
    pub interval: Duration,
    /// Fractional spread around `interval`, in [0, 1] (default: 0.5)
    pub jitter: f64,
    /// Simulated hours per real hour handed to each pulse
    pub time_scale: f64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from(&HeartbeatSettings::default())
    }
}

impl From<&HeartbeatSettings> for HeartbeatConfig {
    fn from(settings: &HeartbeatSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.base_interval_secs.max(1)),
            jitter: settings.jitter.clamp(0.0, 1.0),
            time_scale: if settings.time_scale > 0.0 {
                settings.time_scale
            } else {
                1.0
            },
        }
    }
}

impl HeartbeatConfig {
    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            jitter: 0.5,
            time_scale: 1.0,
        }
    }

    /// Delay before the next pulse for a uniform draw in [0, 1).
    pub fn next_delay(&self, draw: f64) -> Duration {
        let spread = self.jitter * (2.0 * draw.clamp(0.0, 1.0) - 1.0);
        self.interval.mul_f64((1.0 + spread).max(0.0))
    }

    /// Simulated hours covered by a real `elapsed` span.
    pub fn simulated_hours(&self, elapsed: Duration) -> f64 {
        elapsed.as_secs_f64() / 3600.0 * self.time_scale
    }
}
