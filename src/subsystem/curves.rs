//! Health-to-performance curves
//!
//! Each subsystem type degrades differently. Curves are piecewise-linear
//! over (health fraction, performance) control points sorted by health.
//! A repeated health value is a step: the later point wins at and above it.

use super::SubsystemType;

/// Engines hold up until half health, then fall off sharply
const ENGINE_CURVE: &[(f32, f32)] = &[
    (0.0, 0.0),
    (0.1, 0.05),
    (0.3, 0.2),
    (0.5, 0.8),
    (0.75, 0.95),
    (1.0, 1.0),
];

/// Near-linear degradation below 70%
const WEAPONS_CURVE: &[(f32, f32)] = &[(0.0, 0.0), (0.35, 0.45), (0.7, 0.9), (1.0, 1.0)];

const SENSORS_CURVE: &[(f32, f32)] = &[
    (0.0, 0.0),
    (0.2, 0.35),
    (0.5, 0.7),
    (0.8, 0.9),
    (1.0, 1.0),
];

/// Two plateaus: backup mode and primary mode
const NAVIGATION_CURVE: &[(f32, f32)] = &[
    (0.0, 0.0),
    (0.25, 0.3),
    (0.4, 0.35),
    (0.6, 0.8),
    (0.75, 0.85),
    (1.0, 1.0),
];

/// Step at 30%: either the link holds or it barely works
const COMMUNICATION_CURVE: &[(f32, f32)] = &[(0.0, 0.0), (0.3, 0.25), (0.3, 1.0), (1.0, 1.0)];

const SHIELDS_CURVE: &[(f32, f32)] = &[(0.0, 0.0), (0.5, 0.6), (1.0, 1.0)];

pub fn curve_for(subsystem_type: SubsystemType) -> &'static [(f32, f32)] {
    match subsystem_type {
        SubsystemType::Engine => ENGINE_CURVE,
        SubsystemType::Weapons | SubsystemType::Turret => WEAPONS_CURVE,
        SubsystemType::Sensors => SENSORS_CURVE,
        SubsystemType::Navigation => NAVIGATION_CURVE,
        SubsystemType::Communication => COMMUNICATION_CURVE,
        SubsystemType::Shields => SHIELDS_CURVE,
    }
}

/// Piecewise-linear lookup over sorted control points
pub fn interpolate(points: &[(f32, f32)], x: f32) -> f32 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x >= x0 && x < x1 {
            let t = (x - x0) / (x1 - x0);
            return y0 + (y1 - y0) * t;
        }
    }
    last.1
}

/// Performance for a subsystem type at the given health fraction
pub fn performance_factor(subsystem_type: SubsystemType, health_percentage: f32) -> f32 {
    let health = if health_percentage.is_finite() {
        health_percentage.clamp(0.0, 1.0)
    } else {
        0.0
    };
    interpolate(curve_for(subsystem_type), health).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_endpoints() {
        for t in SubsystemType::all() {
            assert_eq!(performance_factor(*t, 0.0), 0.0, "{} at zero", t);
            assert_eq!(performance_factor(*t, 1.0), 1.0, "{} at full", t);
        }
    }

    #[test]
    fn test_engine_sharp_dropoff_below_half() {
        assert!(approx(performance_factor(SubsystemType::Engine, 0.5), 0.8));
        assert!(approx(performance_factor(SubsystemType::Engine, 0.1), 0.05));
        // Steeper between 30% and 50% than between 50% and 75%
        let low_slope = (0.8 - 0.2) / 0.2;
        let high_slope = (0.95 - 0.8) / 0.25;
        assert!(low_slope > high_slope * 3.0);
    }

    #[test]
    fn test_weapons_linear_section() {
        assert!(approx(performance_factor(SubsystemType::Weapons, 0.7), 0.9));
        let mid = performance_factor(SubsystemType::Weapons, 0.175);
        assert!(approx(mid, 0.225));
    }

    #[test]
    fn test_communication_step() {
        let below = performance_factor(SubsystemType::Communication, 0.29);
        let at = performance_factor(SubsystemType::Communication, 0.3);
        assert!(below < 0.25);
        assert_eq!(at, 1.0);
    }

    #[test]
    fn test_navigation_plateau() {
        let a = performance_factor(SubsystemType::Navigation, 0.25);
        let b = performance_factor(SubsystemType::Navigation, 0.4);
        assert!((b - a) < 0.1);
    }

    #[test]
    fn test_monotonic_non_decreasing() {
        for t in SubsystemType::all() {
            let mut prev = 0.0;
            for i in 0..=100 {
                let p = performance_factor(*t, i as f32 / 100.0);
                assert!(p + 1e-6 >= prev, "{} not monotonic at {}", t, i);
                prev = p;
            }
        }
    }

    #[test]
    fn test_out_of_range_input_clamped() {
        assert_eq!(performance_factor(SubsystemType::Sensors, -0.5), 0.0);
        assert_eq!(performance_factor(SubsystemType::Sensors, 3.0), 1.0);
        assert_eq!(performance_factor(SubsystemType::Sensors, f32::NAN), 0.0);
    }

    #[test]
    fn test_interpolate_empty() {
        assert_eq!(interpolate(&[], 0.5), 0.0);
    }
}
