//! Clamped resource meters (health, energy)

use serde::{Deserialize, Serialize};

/// Readout band used to colour status bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterBand {
    /// Below 30%
    Critical,
    /// Below 60%
    Low,
    Healthy,
}

/// A value clamped to `[0, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    value: f32,
    max: f32,
}

impl Meter {
    /// A full meter
    pub fn full(max: f32) -> Self {
        let max = max.max(0.0);
        Self { value: max, max }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Add `delta` (may be negative) and return the clamped result
    pub fn adjust(&mut self, delta: f32) -> f32 {
        self.value = (self.value + delta).clamp(0.0, self.max);
        self.value
    }

    /// Fill level in `[0, 1]`
    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.value / self.max
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.value <= 0.0
    }

    pub fn has_at_least(&self, amount: f32) -> bool {
        self.value >= amount
    }

    pub fn band(&self) -> MeterBand {
        let pct = self.percentage();
        if pct < 0.3 {
            MeterBand::Critical
        } else if pct < 0.6 {
            MeterBand::Low
        } else {
            MeterBand::Healthy
        }
    }
}
