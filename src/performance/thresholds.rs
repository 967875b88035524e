//! Threshold tables mapping an aggregate to a ship-wide modifier

use serde::{Deserialize, Serialize};

/// Piecewise modifier: full output at or above `full_at`, linear from
/// `low_output` to 1.0 across `[low_input, full_at)`, and `floor` below that
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub full_at: f32,
    pub low_input: f32,
    pub low_output: f32,
    pub floor: f32,
}

impl ThresholdTable {
    pub const fn new(full_at: f32, low_input: f32, low_output: f32, floor: f32) -> Self {
        Self {
            full_at,
            low_input,
            low_output,
            floor,
        }
    }

    pub fn evaluate(&self, input: f32) -> f32 {
        if input.is_nan() {
            return self.floor;
        }
        if input >= self.full_at {
            1.0
        } else if input >= self.low_input {
            let span = (self.full_at - self.low_input).max(f32::EPSILON);
            let t = (input - self.low_input) / span;
            self.low_output + (1.0 - self.low_output) * t
        } else {
            self.floor
        }
    }
}

pub const SPEED_TABLE: ThresholdTable = ThresholdTable::new(0.8, 0.3, 0.4, 0.2);
pub const WEAPON_ACCURACY_TABLE: ThresholdTable = ThresholdTable::new(0.7, 0.2, 0.5, 0.25);
pub const WEAPON_RATE_TABLE: ThresholdTable = ThresholdTable::new(0.7, 0.2, 0.3, 0.1);
pub const SHIELD_EFFECTIVENESS_TABLE: ThresholdTable = ThresholdTable::new(0.6, 0.2, 0.4, 0.1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_table() {
        assert_eq!(SPEED_TABLE.evaluate(1.0), 1.0);
        assert_eq!(SPEED_TABLE.evaluate(0.8), 1.0);
        assert!((SPEED_TABLE.evaluate(0.55) - 0.7).abs() < 1e-5);
        assert!((SPEED_TABLE.evaluate(0.3) - 0.4).abs() < 1e-5);
        assert_eq!(SPEED_TABLE.evaluate(0.29), 0.2);
        assert_eq!(SPEED_TABLE.evaluate(0.0), 0.2);
    }

    #[test]
    fn test_tables_monotonic() {
        for table in [
            SPEED_TABLE,
            WEAPON_ACCURACY_TABLE,
            WEAPON_RATE_TABLE,
            SHIELD_EFFECTIVENESS_TABLE,
        ] {
            let mut last = 0.0;
            for i in 0..=100 {
                let v = table.evaluate(i as f32 / 100.0);
                assert!(v >= last);
                assert!((table.floor..=1.0).contains(&v));
                last = v;
            }
        }
    }

    #[test]
    fn test_nan_gives_floor() {
        assert_eq!(WEAPON_RATE_TABLE.evaluate(f32::NAN), 0.1);
    }
}
