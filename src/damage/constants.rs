//! Damage model constants - all tunable defaults in one place
//!
//! Runtime values come from `DamageConfig`; these are its defaults plus the
//! fixed rules that are not meant to be tuned per ship.

// Distribution
pub const SUBSYSTEM_DAMAGE_FRACTION: f32 = 0.3;
pub const MIN_SUBSYSTEM_DAMAGE: f32 = 0.5;
pub const DIRECTED_PRIMARY_SHARE: f32 = 0.8;
pub const DIRECTED_SEARCH_RANGE: f32 = 10.0;
pub const PROXIMITY_RANGE: f32 = 15.0;
pub const SHOCKWAVE_STRUCTURAL_SHARE: f32 = 0.6;

// Targeting
pub const MIN_HIT_PROBABILITY: f32 = 0.05;
pub const MAX_HIT_PROBABILITY: f32 = 0.95;
pub const MAX_RANGE_ACCURACY: f32 = 0.3;
pub const BEYOND_RANGE_ACCURACY: f32 = 0.1;
pub const REFERENCE_SUBSYSTEM_RADIUS: f32 = 2.0;
pub const MISS_RADIUS_FACTOR: f32 = 1.5;
pub const FAILED_PENETRATION_DAMAGE: f32 = 0.1;
pub const MIN_PENETRATION_MULTIPLIER: f32 = 0.8;
pub const MAX_PENETRATION_MULTIPLIER: f32 = 1.5;
pub const MIN_IMPACT_ANGLE_FACTOR: f32 = 0.1;

// Shields
pub const SHIELD_MAX_STRENGTH: f32 = 1000.0;
pub const SHIELD_RECHARGE_DELAY: f64 = 3.0;
pub const SHIELD_RECHARGE_RATE: f32 = 50.0;
pub const SHIELD_BALANCE_RATE: f32 = 20.0;
pub const SHIELD_ADJACENT_SPILL: f32 = 0.2;
pub const SHIELD_OPPOSITE_SPILL: f32 = 0.1;
pub const SHIELD_SPILL_RADIUS: f32 = 10.0;

// Destruction
pub const BASE_EXPLOSION_CHANCE: f32 = 0.3;
pub const MAX_EXPLOSION_CHANCE: f32 = 0.95;
pub const EXPLOSION_SPLASH_FRACTION: f32 = 0.3;
pub const PERMANENT_DAMAGE_CHANCE: f32 = 0.8;
pub const PERMANENT_PERFORMANCE_CEILING: f32 = 0.5;
pub const BASE_CASCADE_CHANCE: f32 = 0.4;
pub const STATIC_EDGE_CASCADE_BONUS: f32 = 1.5;
pub const CASCADE_MIN_DELAY: f64 = 0.5;
pub const CASCADE_MAX_DELAY: f64 = 2.0;
pub const CASCADE_MIN_DAMAGE_FRACTION: f32 = 0.25;
pub const CASCADE_MAX_DAMAGE_FRACTION: f32 = 0.5;
pub const POWER_SOURCE_CASCADE_SCALE: f32 = 1.5;
pub const CATASTROPHIC_THRESHOLD: f32 = 0.9;

// Performance
pub const PERFORMANCE_UPDATE_INTERVAL: f64 = 0.5;
pub const PERFORMANCE_EVENT_DELTA: f32 = 0.05;
pub const BROWNOUT_THRESHOLD: f32 = 0.3;
pub const TARGETING_PENALTY_THRESHOLD: f32 = 0.5;

// Criticality
pub const CRITICAL_FRACTION_THRESHOLD: f32 = 0.5;
pub const LOW_EFFECTIVENESS_THRESHOLD: f32 = 0.5;
pub const LOW_EFFECTIVENESS_PRIORITY_BONUS: f32 = 1.3;

// Repair
pub const MAX_CONCURRENT_REPAIRS: usize = 3;
pub const REPAIR_SECONDS_PER_HP: f32 = 0.2;
pub const MIN_REPAIR_DURATION: f32 = 1.0;
pub const MATERIALS_PER_HP: f32 = 0.5;
pub const SPARE_PARTS_PER_HP: f32 = 0.1;
pub const EMERGENCY_SUPPLIES_PER_HP: f32 = 0.2;
pub const REFUND_FRACTION: f32 = 0.5;
pub const REFUND_PROGRESS_LIMIT: f32 = 0.5;
pub const AUTO_REPAIR_INTERVAL: f64 = 5.0;
pub const AUTO_REPAIR_HEALTH_THRESHOLD: f32 = 0.7;
pub const EMERGENCY_REPAIR_COOLDOWN: f64 = 120.0;
pub const STARTING_MATERIALS: f32 = 500.0;
pub const STARTING_SPARE_PARTS: f32 = 100.0;
pub const STARTING_EMERGENCY_SUPPLIES: f32 = 50.0;

// Fleet
pub const PARALLEL_FLEET_THRESHOLD: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chances_are_probabilities() {
        for chance in [
            BASE_EXPLOSION_CHANCE,
            MAX_EXPLOSION_CHANCE,
            PERMANENT_DAMAGE_CHANCE,
            BASE_CASCADE_CHANCE,
            CATASTROPHIC_THRESHOLD,
        ] {
            assert!((0.0..=1.0).contains(&chance));
        }
        assert!(MAX_EXPLOSION_CHANCE >= BASE_EXPLOSION_CHANCE);
    }

    #[test]
    fn test_cascade_window_ordered() {
        assert!(CASCADE_MIN_DELAY < CASCADE_MAX_DELAY);
        assert!(CASCADE_MIN_DAMAGE_FRACTION < CASCADE_MAX_DAMAGE_FRACTION);
    }

    #[test]
    fn test_spill_less_than_primary() {
        assert!(SHIELD_OPPOSITE_SPILL < SHIELD_ADJACENT_SPILL);
        assert!(SHIELD_ADJACENT_SPILL < 1.0);
    }
}
