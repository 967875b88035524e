//! Ship-wide performance aggregates, cascade penalties and derived modifiers
//!
//! Aggregates are recomputed on a fixed cadence and right after any health
//! change. Subsystem effectiveness is rewritten on every recompute, so the
//! registry's per-change reset never leaves a stale penalty behind.

pub mod thresholds;

pub use thresholds::ThresholdTable;

use serde::{Deserialize, Serialize};

use crate::core::config::PerformanceConfig;
use crate::core::types::SimTime;
use crate::subsystem::{Subsystem, SubsystemRegistry, SubsystemType};
use thresholds::{SHIELD_EFFECTIVENESS_TABLE, SPEED_TABLE, WEAPON_ACCURACY_TABLE, WEAPON_RATE_TABLE};

/// Importance-weighted mean performance per category; empty categories are 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAggregates {
    pub engine: f32,
    pub weapon: f32,
    pub sensor: f32,
    pub shield: f32,
    pub system: f32,
}

impl Default for PerformanceAggregates {
    fn default() -> Self {
        Self {
            engine: 1.0,
            weapon: 1.0,
            sensor: 1.0,
            shield: 1.0,
            system: 1.0,
        }
    }
}

/// Multipliers the rest of the game reads off a damaged ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipModifiers {
    pub speed: f32,
    pub weapon_accuracy: f32,
    pub weapon_rate: f32,
    pub shield_effectiveness: f32,
}

impl Default for ShipModifiers {
    fn default() -> Self {
        Self {
            speed: 1.0,
            weapon_accuracy: 1.0,
            weapon_rate: 1.0,
            shield_effectiveness: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceController {
    config: PerformanceConfig,
    aggregates: PerformanceAggregates,
    modifiers: ShipModifiers,
    /// Effectiveness scale applied to every subsystem; 1.0 when powered
    brownout: f32,
    /// Effectiveness scale applied to turrets; 1.0 when sensors are healthy
    targeting_penalty: f32,
    last_update: SimTime,
}

impl PerformanceController {
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            aggregates: PerformanceAggregates::default(),
            modifiers: ShipModifiers::default(),
            brownout: 1.0,
            targeting_penalty: 1.0,
            last_update: 0.0,
        }
    }

    pub fn aggregates(&self) -> PerformanceAggregates {
        self.aggregates
    }

    pub fn modifiers(&self) -> ShipModifiers {
        self.modifiers
    }

    pub fn brownout(&self) -> f32 {
        self.brownout
    }

    pub fn targeting_penalty(&self) -> f32 {
        self.targeting_penalty
    }

    /// Recompute if the cadence has elapsed; returns whether it ran
    pub fn tick(&mut self, now: SimTime, registry: &mut SubsystemRegistry) -> bool {
        if now - self.last_update < self.config.update_interval {
            return false;
        }
        self.last_update = now;
        self.recompute(registry);
        true
    }

    pub fn recompute(&mut self, registry: &mut SubsystemRegistry) {
        let aggregates = PerformanceAggregates {
            engine: weighted_mean(registry, |t| t == SubsystemType::Engine),
            weapon: weighted_mean(registry, |t| {
                matches!(t, SubsystemType::Weapons | SubsystemType::Turret)
            }),
            sensor: weighted_mean(registry, |t| t == SubsystemType::Sensors),
            shield: weighted_mean(registry, |t| t == SubsystemType::Shields),
            system: weighted_mean(registry, |_| true),
        };

        let brownout = if aggregates.engine < self.config.brownout_threshold {
            aggregates.engine / self.config.brownout_threshold
        } else {
            1.0
        };
        let targeting_penalty = if aggregates.sensor < self.config.targeting_threshold {
            aggregates.sensor / self.config.targeting_threshold
        } else {
            1.0
        };

        if (brownout < 1.0) != (self.brownout < 1.0) {
            if brownout < 1.0 {
                tracing::info!("Power brownout: engine output at {:.2}", aggregates.engine);
            } else {
                tracing::info!("Power restored");
            }
        }

        let updates: Vec<_> = registry
            .iter()
            .map(|(id, s)| {
                let mut effectiveness = s.performance_factor * brownout;
                if s.subsystem_type == SubsystemType::Turret {
                    effectiveness *= targeting_penalty;
                }
                (id, effectiveness)
            })
            .collect();
        for (id, effectiveness) in updates {
            registry.set_effectiveness(id, effectiveness);
        }

        let weapon_health = mean_health(registry, |t| {
            matches!(t, SubsystemType::Weapons | SubsystemType::Turret)
        });

        self.modifiers = ShipModifiers {
            speed: SPEED_TABLE.evaluate(aggregates.engine),
            weapon_accuracy: WEAPON_ACCURACY_TABLE.evaluate(aggregates.sensor * targeting_penalty),
            weapon_rate: WEAPON_RATE_TABLE.evaluate(weapon_health),
            shield_effectiveness: SHIELD_EFFECTIVENESS_TABLE.evaluate(aggregates.shield * brownout),
        };
        self.aggregates = aggregates;
        self.brownout = brownout;
        self.targeting_penalty = targeting_penalty;
    }
}

impl Default for PerformanceController {
    fn default() -> Self {
        Self::new(PerformanceConfig::default())
    }
}

fn weighted_mean(registry: &SubsystemRegistry, include: impl Fn(SubsystemType) -> bool) -> f32 {
    let (sum, weight) = registry
        .iter()
        .filter(|(_, s)| include(s.subsystem_type))
        .fold((0.0, 0.0), |(sum, weight), (_, s)| {
            let w = s.subsystem_type.importance_weight();
            (sum + contribution(s) * w, weight + w)
        });
    if weight > 0.0 {
        sum / weight
    } else {
        1.0
    }
}

fn contribution(subsystem: &Subsystem) -> f32 {
    if subsystem.is_destroyed {
        0.0
    } else {
        subsystem.performance_factor
    }
}

fn mean_health(registry: &SubsystemRegistry, include: impl Fn(SubsystemType) -> bool) -> f32 {
    let (sum, count) = registry
        .iter()
        .filter(|(_, s)| include(s.subsystem_type))
        .fold((0.0, 0usize), |(sum, count), (_, s)| {
            (sum + s.health_percentage(), count + 1)
        });
    if count > 0 {
        sum / count as f32
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::events::EventBus;

    fn ship() -> SubsystemRegistry {
        let mut registry = SubsystemRegistry::new();
        registry.register("engine", SubsystemType::Engine, 100.0).unwrap();
        registry.register("radar", SubsystemType::Sensors, 100.0).unwrap();
        registry.register("turret", SubsystemType::Turret, 100.0).unwrap();
        registry.register("shield_gen", SubsystemType::Shields, 100.0).unwrap();
        registry
    }

    #[test]
    fn test_healthy_ship_full_modifiers() {
        let mut registry = ship();
        let mut perf = PerformanceController::default();
        perf.recompute(&mut registry);
        assert_eq!(perf.aggregates(), PerformanceAggregates::default());
        assert_eq!(perf.modifiers(), ShipModifiers::default());
        assert_eq!(perf.brownout(), 1.0);
    }

    #[test]
    fn test_empty_category_is_full() {
        let mut registry = SubsystemRegistry::new();
        registry.register("radar", SubsystemType::Sensors, 100.0).unwrap();
        let mut perf = PerformanceController::default();
        perf.recompute(&mut registry);
        assert_eq!(perf.aggregates().engine, 1.0);
        assert_eq!(perf.modifiers().speed, 1.0);
    }

    #[test]
    fn test_brownout_scales_everything() {
        let mut registry = ship();
        let mut bus = EventBus::new();
        // Engine curve at 10% health gives 0.05 performance
        registry.apply_effective_damage(registry.id("engine").unwrap(), 90.0, &mut bus);

        let mut perf = PerformanceController::default();
        perf.recompute(&mut registry);

        let expected = 0.05 / 0.3;
        assert!((perf.brownout() - expected).abs() < 1e-4);
        let radar = registry.get_by_name("radar").unwrap();
        assert!((radar.effectiveness - expected).abs() < 1e-4);
        assert!(perf.modifiers().speed <= 0.2 + 1e-6);
        assert!(perf.modifiers().shield_effectiveness < 1.0);
    }

    #[test]
    fn test_sensor_loss_penalizes_turrets_only() {
        let mut registry = ship();
        registry.mark_destroyed(registry.id("radar").unwrap());

        let mut perf = PerformanceController::default();
        perf.recompute(&mut registry);

        assert_eq!(perf.aggregates().sensor, 0.0);
        assert_eq!(perf.targeting_penalty(), 0.0);
        assert_eq!(registry.get_by_name("turret").unwrap().effectiveness, 0.0);
        assert_eq!(registry.get_by_name("engine").unwrap().effectiveness, 1.0);
        assert_eq!(perf.modifiers().weapon_accuracy, 0.25);
    }

    #[test]
    fn test_weapon_rate_from_health() {
        let mut registry = ship();
        let mut bus = EventBus::new();
        registry.apply_effective_damage(registry.id("turret").unwrap(), 55.0, &mut bus);

        let mut perf = PerformanceController::default();
        perf.recompute(&mut registry);
        // 45% health: 0.3 + 0.7 * (0.25 / 0.5)
        assert!((perf.modifiers().weapon_rate - 0.65).abs() < 1e-4);
    }

    #[test]
    fn test_tick_cadence() {
        let mut registry = ship();
        let mut perf = PerformanceController::default();
        assert!(!perf.tick(0.25, &mut registry));
        assert!(perf.tick(0.5, &mut registry));
        assert!(!perf.tick(0.75, &mut registry));
        assert!(perf.tick(1.0, &mut registry));
    }

    #[test]
    fn test_system_aggregate_weighted() {
        let mut registry = ship();
        registry.mark_destroyed(registry.id("engine").unwrap());
        let mut perf = PerformanceController::default();
        perf.recompute(&mut registry);
        // Engine weight 2.0 out of 2.0 + 1.2 + 1.5 + 1.0
        let expected = (1.2 + 1.5 + 1.0) / (2.0 + 1.2 + 1.5 + 1.0);
        assert!((perf.aggregates().system - expected).abs() < 1e-4);
    }
}
