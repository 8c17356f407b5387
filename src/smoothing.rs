// First-order low-pass filter for raw stick input.

use crate::types::GestureVector;

/// Axis difference below which the filter snaps to its input.
pub const SETTLE_THRESHOLD: f64 = 1e-4;

/// Per-axis exponential smoothing. State persists across ticks until `reset`.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingFilter {
    factor: f64,
    smoothed: GestureVector,
}

impl SmoothingFilter {
    pub fn new(factor: f64) -> Self {
        SmoothingFilter {
            factor: factor.clamp(f64::MIN_POSITIVE, 1.0),
            smoothed: GestureVector::zero(),
        }
    }

    pub fn value(&self) -> GestureVector {
        self.smoothed
    }

    /// Advance one tick toward `raw` and return the new smoothed vector.
    pub fn update(&mut self, raw: GestureVector) -> GestureVector {
        self.smoothed.x = step(self.smoothed.x, raw.x, self.factor);
        self.smoothed.y = step(self.smoothed.y, raw.y, self.factor);
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = GestureVector::zero();
    }
}

fn step(current: f64, target: f64, factor: f64) -> f64 {
    let next = current + (target - current) * factor;
    if (target - next).abs() < SETTLE_THRESHOLD {
        target
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Ticks needed for a unit step to settle: ceil(ln(threshold) / ln(1 - factor)) + 1.
    fn settle_bound(factor: f64) -> usize {
        ((SETTLE_THRESHOLD.ln() / (1.0 - factor).ln()).ceil() as usize) + 1
    }

    #[test]
    fn first_tick_moves_by_factor() {
        let mut filter = SmoothingFilter::new(0.22);
        let out = filter.update(GestureVector::new(1.0, -1.0));
        assert!((out.x - 0.22).abs() < 1e-12);
        assert!((out.y + 0.22).abs() < 1e-12);
    }

    #[test]
    fn release_decays_to_exact_zero() {
        let mut filter = SmoothingFilter::new(0.22);
        for _ in 0..50 {
            filter.update(GestureVector::new(1.0, 1.0));
        }
        let bound = settle_bound(0.22);
        let mut ticks = 0;
        while filter.value() != GestureVector::zero() {
            filter.update(GestureVector::zero());
            ticks += 1;
            assert!(ticks <= bound, "did not settle within {bound} ticks");
        }
    }

    #[test]
    fn reset_clears_state() {
        let mut filter = SmoothingFilter::new(0.22);
        filter.update(GestureVector::new(0.8, 0.4));
        filter.reset();
        assert_eq!(filter.value(), GestureVector::zero());
    }

    proptest! {
        #[test]
        fn converges_monotonically(
            target in -1.0f64..=1.0,
            factor in 0.05f64..=1.0,
        ) {
            let mut filter = SmoothingFilter::new(factor);
            let raw = GestureVector::new(target, 0.0);
            let mut previous_gap = target.abs();
            for _ in 0..settle_bound(factor) {
                let gap = (target - filter.update(raw).x).abs();
                prop_assert!(gap <= previous_gap);
                previous_gap = gap;
            }
            prop_assert_eq!(filter.value().x, target);
        }
    }
}
