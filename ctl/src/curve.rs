//! Temperature-to-fan-level step curve.

use tpfan_ec::FanLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint {
    /// Threshold in whole degrees Celsius.
    pub threshold: i16,
    pub level: FanLevel,
}

impl CurvePoint {
    pub const fn new(threshold: i16, level: FanLevel) -> Self {
        Self { threshold, level }
    }
}

/// Ordered list of curve points, kept sorted ascending by threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanCurve {
    points: Vec<CurvePoint>,
}

impl FanCurve {
    /// Points may arrive in any order; they are sorted on the way in.
    pub fn new(mut points: Vec<CurvePoint>) -> Self {
        points.sort_by_key(|p| p.threshold);
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Level of the highest threshold at or below the reading.
    ///
    /// A reading below every threshold gets the first point's level. An
    /// absent reading (or an empty curve) falls back to firmware
    /// control rather than any discrete level.
    pub fn target_level(&self, temperature: Option<i16>) -> FanLevel {
        let Some(temp) = temperature else {
            return FanLevel::Auto;
        };
        let Some(first) = self.points.first() else {
            return FanLevel::Auto;
        };
        let mut target = first.level;
        for point in &self.points {
            if temp >= point.threshold {
                target = point.level;
            } else {
                break;
            }
        }
        target
    }
}

impl Default for FanCurve {
    /// Conservative curve for common ThinkPad models.
    fn default() -> Self {
        Self::new(vec![
            CurvePoint::new(0, FanLevel::Level(0)),
            CurvePoint::new(50, FanLevel::Level(1)),
            CurvePoint::new(55, FanLevel::Level(2)),
            CurvePoint::new(65, FanLevel::Level(3)),
            CurvePoint::new(75, FanLevel::Level(5)),
            CurvePoint::new(85, FanLevel::Level(7)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_curve_steps() {
        let curve = FanCurve::default();
        assert_eq!(curve.target_level(Some(60)), FanLevel::Level(2));
        assert_eq!(curve.target_level(Some(49)), FanLevel::Level(0));
        assert_eq!(curve.target_level(Some(90)), FanLevel::Level(7));
    }

    #[test]
    fn exact_threshold_selects_its_level() {
        let curve = FanCurve::default();
        assert_eq!(curve.target_level(Some(55)), FanLevel::Level(2));
        assert_eq!(curve.target_level(Some(85)), FanLevel::Level(7));
    }

    #[test]
    fn below_first_threshold_uses_first_level() {
        let curve = FanCurve::default();
        assert_eq!(curve.target_level(Some(-20)), FanLevel::Level(0));
    }

    #[test]
    fn absent_reading_falls_back_to_auto() {
        let curve = FanCurve::default();
        assert_eq!(curve.target_level(None), FanLevel::Auto);
    }

    #[test]
    fn empty_curve_falls_back_to_auto() {
        let curve = FanCurve::new(Vec::new());
        assert_eq!(curve.target_level(Some(60)), FanLevel::Auto);
    }

    #[test]
    fn points_are_sorted_on_construction() {
        let curve = FanCurve::new(vec![
            CurvePoint::new(70, FanLevel::Level(5)),
            CurvePoint::new(0, FanLevel::Level(0)),
            CurvePoint::new(40, FanLevel::Level(2)),
        ]);
        let thresholds: Vec<i16> = curve.points().iter().map(|p| p.threshold).collect();
        assert_eq!(thresholds, vec![0, 40, 70]);
        assert_eq!(curve.target_level(Some(45)), FanLevel::Level(2));
    }
}
