//! Speed-weighted scoring curves applied to correct answers.

use std::time::Duration;

/// How many points a correct answer earns given how fast it arrived.
///
/// Both curves are monotonic non-increasing in elapsed time; incorrect
/// answers never reach the curve and always score zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringCurve {
    /// `round(base × remaining / limit)`: the full base at the instant the
    /// question opens, tapering linearly to zero at the window's end.
    SpeedFactor,
    /// `round(base + base × multiplier × max(0, 1 − elapsed/limit))`: the
    /// full base is always granted and speed earns a bonus on top.
    SpeedBonus {
        /// Fraction of the base points available as speed bonus.
        multiplier: f64,
    },
}

impl Default for ScoringCurve {
    fn default() -> Self {
        ScoringCurve::SpeedFactor
    }
}

impl ScoringCurve {
    /// Points for a correct answer submitted `elapsed` into a window of `limit`.
    pub fn award(&self, base_points: u32, elapsed: Duration, limit: Duration) -> u32 {
        if limit.is_zero() {
            return base_points;
        }

        match self {
            ScoringCurve::SpeedFactor => {
                let remaining = limit.saturating_sub(elapsed);
                let scaled = f64::from(base_points) * remaining.as_secs_f64() / limit.as_secs_f64();
                scaled.round() as u32
            }
            ScoringCurve::SpeedBonus { multiplier } => {
                let ratio = (1.0 - elapsed.as_secs_f64() / limit.as_secs_f64()).clamp(0.0, 1.0);
                let scaled = f64::from(base_points) * (1.0 + multiplier * ratio);
                scaled.round() as u32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(30);

    #[test]
    fn speed_factor_scales_with_remaining_time() {
        let curve = ScoringCurve::SpeedFactor;
        assert_eq!(curve.award(100, Duration::ZERO, LIMIT), 100);
        assert_eq!(curve.award(100, Duration::from_secs(10), LIMIT), 67);
        assert_eq!(curve.award(100, Duration::from_secs(15), LIMIT), 50);
        assert_eq!(curve.award(100, LIMIT, LIMIT), 0);
    }

    #[test]
    fn speed_factor_saturates_past_the_window() {
        let curve = ScoringCurve::SpeedFactor;
        assert_eq!(curve.award(100, Duration::from_secs(45), LIMIT), 0);
    }

    #[test]
    fn speed_bonus_keeps_the_base_and_adds_speed() {
        let curve = ScoringCurve::SpeedBonus { multiplier: 0.5 };
        assert_eq!(curve.award(1000, Duration::ZERO, LIMIT), 1500);
        assert_eq!(curve.award(1000, Duration::from_secs(15), LIMIT), 1250);
        assert_eq!(curve.award(1000, LIMIT, LIMIT), 1000);
        assert_eq!(curve.award(1000, Duration::from_secs(60), LIMIT), 1000);
    }

    #[test]
    fn both_curves_are_monotonic_in_elapsed_time() {
        for curve in [
            ScoringCurve::SpeedFactor,
            ScoringCurve::SpeedBonus { multiplier: 0.5 },
        ] {
            let mut previous = u32::MAX;
            for seconds in 0..=30 {
                let points = curve.award(500, Duration::from_secs(seconds), LIMIT);
                assert!(points <= previous, "curve {curve:?} increased at {seconds}s");
                previous = points;
            }
        }
    }
}
