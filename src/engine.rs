//! Venting decision: hysteresis on the dew point difference plus hard safety floors.
//!
//! ```text
//!   desired
//!     on  |            ┌──────────────
//!         |            │   ▲
//!         |     ◄──────┼───┘
//!     off |────────────┘
//!         +-----------+-----------+----► delta (inside - outside)
//!                 diff_min   diff_min + hysteresis
//! ```
//!
//! The engine only ever sees cycles in which both sensors delivered
//! plausible readings.

use std::fmt;

use crate::config::Thresholds;
use crate::measurement::Climate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyFloor {
    InsideTooCold,
    OutsideTooCold,
    InsideTooDry,
}

impl fmt::Display for SafetyFloor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyFloor::InsideTooCold => f.write_str("inside temperature below minimum"),
            SafetyFloor::OutsideTooCold => f.write_str("outside temperature below minimum"),
            SafetyFloor::InsideTooDry => f.write_str("inside humidity below minimum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// No baseline yet (first cycle or re-seed); the decision waits one cycle.
    Seeded,
    /// A dew point jumped further than believable; prior state kept.
    SpikeRejected { inside_jump: f32, outside_jump: f32 },
    Decided {
        delta: f32,
        desired: bool,
        /// Floors that forced the fan off, empty if none.
        blocked_by: Vec<SafetyFloor>,
    },
}

#[derive(Debug, Clone)]
pub struct VentingDecisionEngine {
    thresholds: Thresholds,
    desired: bool,
    /// Dew points (inside, outside) of the last accepted cycle.
    baseline: Option<(f32, f32)>,
    rejected_in_row: u32,
    reseed_after: u32,
}

impl VentingDecisionEngine {
    pub fn new(thresholds: Thresholds, reseed_after: u32) -> Self {
        Self {
            thresholds,
            desired: false,
            baseline: None,
            rejected_in_row: 0,
            reseed_after,
        }
    }

    pub fn desired(&self) -> bool {
        self.desired
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn evaluate(&mut self, inside: &Climate, outside: &Climate) -> Verdict {
        let Some((last_inside, last_outside)) = self.baseline else {
            self.seed(inside, outside);
            return Verdict::Seeded;
        };

        let inside_jump = (inside.dew_point - last_inside).abs();
        let outside_jump = (outside.dew_point - last_outside).abs();
        let limit = self.thresholds.max_dew_point_jump;
        if inside_jump > limit || outside_jump > limit {
            self.rejected_in_row += 1;
            log::warn!(
                "Deviation between dew points is too high! inside {inside_jump:.1}°C, outside {outside_jump:.1}°C"
            );
            if self.reseed_after > 0 && self.rejected_in_row >= self.reseed_after {
                log::warn!(
                    "{} consecutive deviations, taking current dew points as new baseline",
                    self.rejected_in_row
                );
                self.seed(inside, outside);
            }
            return Verdict::SpikeRejected {
                inside_jump,
                outside_jump,
            };
        }

        let delta = inside.dew_point - outside.dew_point;
        if delta > self.thresholds.switch_on_above() {
            self.desired = true;
        }
        if delta < self.thresholds.diff_min {
            self.desired = false;
        }

        let blocked_by = self.safety_floors(inside, outside);
        if !blocked_by.is_empty() {
            self.desired = false;
        }

        self.baseline = Some((inside.dew_point, outside.dew_point));
        self.rejected_in_row = 0;

        Verdict::Decided {
            delta,
            desired: self.desired,
            blocked_by,
        }
    }

    fn seed(&mut self, inside: &Climate, outside: &Climate) {
        self.baseline = Some((inside.dew_point, outside.dew_point));
        self.rejected_in_row = 0;
    }

    fn safety_floors(&self, inside: &Climate, outside: &Climate) -> Vec<SafetyFloor> {
        let t = &self.thresholds;
        [
            (inside.temperature < t.temp_inside_min, SafetyFloor::InsideTooCold),
            (outside.temperature < t.temp_outside_min, SafetyFloor::OutsideTooCold),
            (inside.humidity < t.hum_inside_min, SafetyFloor::InsideTooDry),
        ]
        .into_iter()
        .filter_map(|(violated, floor)| violated.then_some(floor))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate(temperature: f32, humidity: f32, dew_point: f32) -> Climate {
        Climate {
            temperature,
            humidity,
            dew_point,
        }
    }

    /// Engine with a baseline already in place at the given dew points.
    fn seeded(inside_dp: f32, outside_dp: f32) -> VentingDecisionEngine {
        let mut engine = VentingDecisionEngine::new(Thresholds::DEFAULT, 4);
        let verdict = engine.evaluate(
            &climate(22.0, 60.0, inside_dp),
            &climate(5.0, 80.0, outside_dp),
        );
        assert_eq!(verdict, Verdict::Seeded);
        engine
    }

    /// Feeds a delta keeping the outside dew point at 0 and moving inside in small steps.
    fn feed_delta(engine: &mut VentingDecisionEngine, delta: f32) -> Verdict {
        engine.evaluate(&climate(22.0, 60.0, delta), &climate(5.0, 80.0, 0.0))
    }

    #[test]
    fn test_first_cycle_only_seeds() {
        let engine = seeded(12.5, 1.8);
        assert!(!engine.desired());
    }

    #[test]
    fn test_concrete_scenario_turns_on() {
        let inside = climate(22.0, 55.0, crate::dew_point::calc_dew_point(22.0, 55.0));
        let outside = climate(5.0, 80.0, crate::dew_point::calc_dew_point(5.0, 80.0));
        let mut engine = seeded(inside.dew_point, outside.dew_point);

        match engine.evaluate(&inside, &outside) {
            Verdict::Decided {
                delta,
                desired,
                blocked_by,
            } => {
                assert!((delta - 10.7).abs() < 0.15);
                assert!(desired);
                assert!(blocked_by.is_empty());
            }
            other => panic!("unexpected verdict {other:?}"),
        }
        assert!(engine.desired());
    }

    #[test]
    fn test_no_chatter_at_switch_on_boundary() {
        let t = Thresholds::DEFAULT;
        let mut engine = seeded(t.diff_min, 0.0);

        feed_delta(&mut engine, t.diff_min);
        assert!(!engine.desired());
        feed_delta(&mut engine, t.diff_min + t.hysteresis - 0.01);
        assert!(!engine.desired());
        feed_delta(&mut engine, t.diff_min + t.hysteresis);
        assert!(!engine.desired());
        feed_delta(&mut engine, t.diff_min + t.hysteresis + 0.01);
        assert!(engine.desired());
    }

    #[test]
    fn test_hysteresis_band_keeps_on_state() {
        let t = Thresholds::DEFAULT;
        let mut engine = seeded(4.5, 0.0);
        feed_delta(&mut engine, 4.5);
        assert!(engine.desired());

        feed_delta(&mut engine, 3.6);
        assert!(engine.desired());
        feed_delta(&mut engine, t.diff_min);
        assert!(engine.desired());
        feed_delta(&mut engine, 2.9);
        assert!(!engine.desired());
    }

    #[test]
    fn test_inside_humidity_floor_dominates() {
        let mut engine = seeded(15.0, 2.0);
        let verdict = engine.evaluate(&climate(22.0, 49.9, 15.0), &climate(5.0, 80.0, 2.0));
        assert_eq!(
            verdict,
            Verdict::Decided {
                delta: 13.0,
                desired: false,
                blocked_by: vec![SafetyFloor::InsideTooDry],
            }
        );
        assert!(!engine.desired());
    }

    #[test]
    fn test_temperature_floors_turn_fan_off() {
        let mut engine = seeded(15.0, 2.0);
        engine.evaluate(&climate(22.0, 60.0, 15.0), &climate(5.0, 80.0, 2.0));
        assert!(engine.desired());

        let verdict = engine.evaluate(&climate(9.9, 60.0, 15.0), &climate(-10.1, 80.0, 2.0));
        match verdict {
            Verdict::Decided {
                desired, blocked_by, ..
            } => {
                assert!(!desired);
                assert_eq!(
                    blocked_by,
                    vec![SafetyFloor::InsideTooCold, SafetyFloor::OutsideTooCold]
                );
            }
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn test_spike_keeps_prior_state() {
        let mut engine = seeded(10.0, 2.0);
        engine.evaluate(&climate(22.0, 60.0, 10.0), &climate(5.0, 80.0, 2.0));
        assert!(engine.desired());

        // Jump of 1.5°C with a delta that would otherwise switch off.
        let verdict = engine.evaluate(&climate(22.0, 60.0, 11.5), &climate(5.0, 80.0, 10.0));
        assert!(matches!(verdict, Verdict::SpikeRejected { .. }));
        assert!(engine.desired());

        // Baseline is still the accepted 10.0 / 2.0.
        let verdict = engine.evaluate(&climate(22.0, 60.0, 10.5), &climate(5.0, 80.0, 2.5));
        assert!(matches!(verdict, Verdict::Decided { desired: true, .. }));
    }

    #[test]
    fn test_spike_off_state_is_not_turned_on() {
        let mut engine = seeded(10.0, 9.0);
        let verdict = engine.evaluate(&climate(22.0, 60.0, 11.5), &climate(5.0, 80.0, 0.0));
        assert_eq!(
            verdict,
            Verdict::SpikeRejected {
                inside_jump: 1.5,
                outside_jump: 9.0
            }
        );
        assert!(!engine.desired());
    }

    #[test]
    fn test_spikes_below_reseed_count_keep_baseline() {
        let mut engine = seeded(10.0, 2.0);
        let inside = climate(22.0, 60.0, 14.0);
        let outside = climate(5.0, 80.0, 2.0);

        for _ in 0..3 {
            assert!(matches!(
                engine.evaluate(&inside, &outside),
                Verdict::SpikeRejected { .. }
            ));
        }
        assert_eq!(engine.baseline, Some((10.0, 2.0)));
        assert_eq!(engine.rejected_in_row, 3);

        let verdict = engine.evaluate(&climate(22.0, 60.0, 10.5), &outside);
        assert!(matches!(verdict, Verdict::Decided { desired: true, .. }));
        assert_eq!(engine.baseline, Some((10.5, 2.0)));
        assert_eq!(engine.rejected_in_row, 0);
    }

    #[test]
    fn test_repeated_spikes_reseed_baseline() {
        let mut engine = seeded(10.0, 2.0);
        let inside = climate(22.0, 60.0, 14.0);
        let outside = climate(5.0, 80.0, 2.0);

        for _ in 0..4 {
            assert!(matches!(
                engine.evaluate(&inside, &outside),
                Verdict::SpikeRejected { .. }
            ));
        }
        assert!(matches!(
            engine.evaluate(&inside, &outside),
            Verdict::Decided { desired: true, .. }
        ));
    }
}
