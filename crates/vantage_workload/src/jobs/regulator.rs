//! # View Regulation
//!
//! Feedback control over region sizing: each tracked region carries a time
//! budget, and its view extents grow or shrink so the measured per-region
//! processing time stays inside that budget.
//!
//! Control is proportional and deliberately asymmetric — the step-down
//! fraction (0.11) is larger than the step-up fraction (0.09), so an
//! over-budget region shrinks faster than an under-budget one grows. The
//! measured time is EWMA-smoothed before comparison, and the resulting
//! extents are hard-clamped to a `[min, max]` back/front range. This is a
//! soft signal only: it never aborts in-flight work.

use crate::types::NUM_TRACKED_REGIONS;
use crate::views::{BackFront, View};
use std::time::Duration;

/// Default fractional shrink per over-budget frame.
pub const DEFAULT_STEP_DOWN: f32 = 0.11;
/// Default fractional growth per under-budget frame.
pub const DEFAULT_STEP_UP: f32 = 0.09;

/// Fraction of the budget below which the region is considered comfortably
/// under budget and allowed to grow. Between this and the budget itself the
/// extents hold steady.
const GROWTH_HEADROOM: f32 = 0.9;

/// Smoothing time constant for the measured-time average, seconds.
const SMOOTHING_WINDOW: f32 = 0.5;

/// Per-region proportional controller.
#[derive(Debug, Clone)]
pub struct Regulator {
    budget: Duration,
    min_range: BackFront,
    max_range: BackFront,
    relative_step_down: f32,
    relative_step_up: f32,
    measured_avg: f32,
    measured_var: f32,
}

impl Regulator {
    /// Creates a regulator with the default asymmetric step fractions.
    pub fn new(budget: Duration, min_range: BackFront, max_range: BackFront) -> Self {
        Self {
            budget,
            min_range,
            max_range,
            relative_step_down: DEFAULT_STEP_DOWN,
            relative_step_up: DEFAULT_STEP_UP,
            measured_avg: 0.0,
            measured_var: 0.0,
        }
    }

    /// The configured time budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Smoothed measured time, seconds.
    pub fn measured_avg(&self) -> f32 {
        self.measured_avg
    }

    /// Folds one frame's measured time into the running average and
    /// variance. Called once per frame, before regulating any view.
    pub fn sample(&mut self, delta_time: f32, measured: Duration) {
        let m = measured.as_secs_f32();
        let alpha = (delta_time / SMOOTHING_WINDOW).clamp(0.01, 1.0);
        let deviation = m - self.measured_avg;
        self.measured_avg += alpha * deviation;
        self.measured_var += alpha * (deviation * deviation - self.measured_var);
    }

    /// Produces the regulated back/front pair from the current one:
    /// multiplicative shrink when over budget, multiplicative growth when
    /// comfortably under, clamped to the configured range.
    pub fn regulate(&self, current: BackFront) -> BackFront {
        let budget = self.budget.as_secs_f32();
        let scale = if self.measured_avg > budget {
            1.0 - self.relative_step_down
        } else if self.measured_avg < budget * GROWTH_HEADROOM {
            1.0 + self.relative_step_up
        } else {
            1.0
        };

        [
            (current[0] * scale).clamp(self.min_range[0], self.max_range[0]),
            (current[1] * scale).clamp(self.min_range[1], self.max_range[1]),
        ]
    }

    /// Convenience combining [`sample`](Self::sample) and
    /// [`regulate`](Self::regulate) for a single view.
    pub fn run(&mut self, delta_time: f32, measured: Duration, current: BackFront) -> BackFront {
        self.sample(delta_time, measured);
        self.regulate(current)
    }
}

/// Per-frame job regulating every view's region extents, one regulator per
/// tracked region.
#[derive(Debug)]
pub struct ControlViews {
    regulators: [Regulator; NUM_TRACKED_REGIONS],
}

impl ControlViews {
    /// Creates the job from one regulator per tracked region.
    pub fn new(regulators: [Regulator; NUM_TRACKED_REGIONS]) -> Self {
        Self { regulators }
    }

    /// Access to the per-region regulators.
    pub fn regulators(&self) -> &[Regulator; NUM_TRACKED_REGIONS] {
        &self.regulators
    }

    /// Applies one frame of regulation: folds the measured per-region
    /// timings in once, then rewrites every view's back/front extents and
    /// rederives its region spheres.
    pub fn run(
        &mut self,
        delta_time: f32,
        timings: &[Duration; NUM_TRACKED_REGIONS],
        views: &mut [View],
    ) {
        for (regulator, &measured) in self.regulators.iter_mut().zip(timings.iter()) {
            regulator.sample(delta_time, measured);
        }

        for view in views.iter_mut() {
            let mut back_fronts = view.region_back_fronts;
            for (region, back_front) in back_fronts.iter_mut().enumerate() {
                *back_front = self.regulators[region].regulate(*back_front);
            }
            view.set_back_fronts(back_fronts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn regulator() -> Regulator {
        Regulator::new(Duration::from_millis(2), [1.0, 5.0], [20.0, 200.0])
    }

    #[test]
    fn test_over_budget_shrinks_to_min_and_not_below() {
        let mut r = regulator();
        let mut current: BackFront = [10.0, 100.0];

        for _ in 0..200 {
            let next = r.run(1.0, Duration::from_millis(20), current);
            assert!(next[0] <= current[0] && next[1] <= current[1]);
            assert!(next[0] >= 1.0 && next[1] >= 5.0);
            current = next;
        }
        assert_eq!(current, [1.0, 5.0]);
    }

    #[test]
    fn test_under_budget_grows_to_max_and_not_above() {
        let mut r = regulator();
        let mut current: BackFront = [2.0, 10.0];

        for _ in 0..200 {
            let next = r.run(1.0, Duration::from_micros(10), current);
            assert!(next[0] >= current[0] && next[1] >= current[1]);
            assert!(next[0] <= 20.0 && next[1] <= 200.0);
            current = next;
        }
        assert_eq!(current, [20.0, 200.0]);
    }

    #[test]
    fn test_near_budget_holds_steady() {
        let mut r = regulator();
        // Converge the average right onto a value inside the deadband.
        for _ in 0..100 {
            r.sample(1.0, Duration::from_micros(1900));
        }
        assert_eq!(r.regulate([10.0, 100.0]), [10.0, 100.0]);
    }

    #[test]
    fn test_control_views_rewrites_all_views() {
        let budgets = [Duration::from_millis(2); NUM_TRACKED_REGIONS];
        let regulators =
            std::array::from_fn(|_| Regulator::new(budgets[0], [0.5, 1.0], [50.0, 500.0]));
        let mut control = ControlViews::new(regulators);

        let mut views = vec![
            View::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
            View::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        ];
        let before: Vec<_> = views.iter().map(|v| v.region_back_fronts).collect();

        // Heavily over budget: every region of every view shrinks, and the
        // derived spheres follow.
        control.run(1.0, &[Duration::from_millis(50); NUM_TRACKED_REGIONS], &mut views);

        for (view, before) in views.iter().zip(before) {
            for region in 0..NUM_TRACKED_REGIONS {
                assert!(view.region_back_fronts[region][1] < before[region][1]);
                assert!(view.regions[region].radius > 0.0);
            }
        }
    }
}
