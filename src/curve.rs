// Look-curve shaping: dead zone, remap, exponential response.
// Small deflections are compressed for precise aiming; full deflection still maps to full output.

use crate::types::LookSettings;

/// Pure per-axis response curve for the look stick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookCurve {
    dead_zone: f64,
    exponent: f64,
}

impl LookCurve {
    pub fn new(dead_zone: f64, exponent: f64) -> Self {
        LookCurve {
            dead_zone,
            exponent,
        }
    }

    pub fn from_settings(settings: &LookSettings) -> Self {
        LookCurve::new(settings.dead_zone, settings.exponent)
    }

    pub fn dead_zone(&self) -> f64 {
        self.dead_zone
    }

    /// Shape one axis value in [-1, 1]. Output is in [-1, 1] with the input's sign.
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }

        let magnitude = value.abs().min(1.0);
        if magnitude <= self.dead_zone {
            return 0.0;
        }

        let normalized = (magnitude - self.dead_zone) / (1.0 - self.dead_zone);
        normalized.powf(self.exponent).copysign(value)
    }
}

impl Default for LookCurve {
    fn default() -> Self {
        LookCurve::from_settings(&LookSettings::default())
    }
}
