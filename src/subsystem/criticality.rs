//! Tactical importance of subsystems
//!
//! Static criticality comes from what a subsystem is (type, name, hull
//! class). Tactical priority layers the current damage picture on top and
//! is what AI gunners rank targets by.

use serde::{Deserialize, Serialize};

use super::registry::SubsystemRegistry;
use super::{CriticalityLevel, Subsystem, SubsystemType};
use crate::core::config::CriticalityConfig;
use crate::core::types::{ShipClass, SubsystemId};
use crate::damage::constants::{LOW_EFFECTIVENESS_PRIORITY_BONUS, LOW_EFFECTIVENESS_THRESHOLD};
use crate::ship::events::{EventBus, ShipEvent};

/// What an attacker is trying to achieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticalGoal {
    /// Take the ship out of the fight without killing it
    Disable,
    Destroy,
    /// Neutralize defenses, keep the hull and reactor intact
    Capture,
    /// Blind and isolate
    Harass,
}

/// Ship-wide health summary
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ShipCriticalState {
    #[default]
    Operational,
    Degraded,
    Critical,
    Failing,
}

fn type_base_score(subsystem_type: SubsystemType) -> f32 {
    match subsystem_type {
        SubsystemType::Engine => 0.9,
        SubsystemType::Shields => 0.8,
        SubsystemType::Weapons => 0.7,
        SubsystemType::Sensors => 0.6,
        SubsystemType::Navigation => 0.6,
        SubsystemType::Turret => 0.5,
        SubsystemType::Communication => 0.3,
    }
}

fn name_modifier(name: &str) -> f32 {
    let name = name.to_lowercase();
    let mut modifier = 0.0;
    if name.contains("primary") {
        modifier += 0.2;
    }
    if name.contains("backup") {
        modifier -= 0.2;
    }
    if name.contains("reactor") {
        modifier += 0.3;
    }
    if name.contains("life-support") || name.contains("life_support") {
        modifier += 0.3;
    }
    modifier
}

fn ship_class_modifier(class: ShipClass, subsystem_type: SubsystemType) -> f32 {
    use ShipClass::*;
    use SubsystemType::*;

    match (class, subsystem_type) {
        (Fighter, Engine) | (Fighter, Weapons) => 0.1,
        (Fighter, Communication) => -0.1,
        (Corvette, Sensors) => 0.1,
        (Cruiser, Turret) => 0.15,
        (Capital, Shields) | (Capital, Communication) => 0.1,
        (Capital, Navigation) => 0.1,
        (Freighter, Weapons) | (Freighter, Turret) => -0.2,
        (Freighter, Engine) => 0.1,
        _ => 0.0,
    }
}

fn level_for_score(score: f32) -> CriticalityLevel {
    if score >= 0.9 {
        CriticalityLevel::Vital
    } else if score >= 0.7 {
        CriticalityLevel::Critical
    } else if score >= 0.45 {
        CriticalityLevel::Important
    } else {
        CriticalityLevel::NonCritical
    }
}

fn criticality_multiplier(level: CriticalityLevel) -> f32 {
    match level {
        CriticalityLevel::NonCritical => 0.5,
        CriticalityLevel::Important => 1.0,
        CriticalityLevel::Critical => 1.5,
        CriticalityLevel::Vital => 2.0,
    }
}

/// Finishing off a damaged system is worth more than scratching a healthy
/// one; a nearly dead one is not worth the shots
fn health_multiplier(subsystem: &Subsystem) -> f32 {
    if subsystem.is_destroyed || subsystem.current_health <= 0.0 {
        return 0.0;
    }
    let health = subsystem.health_percentage();
    if health < 0.1 {
        0.5
    } else if health <= 0.5 {
        1.5
    } else if health <= 0.8 {
        1.2
    } else {
        1.0
    }
}

fn goal_multiplier(goal: TacticalGoal, subsystem: &Subsystem) -> f32 {
    use SubsystemType::*;

    let name = subsystem.name.to_lowercase();
    match goal {
        TacticalGoal::Disable => match subsystem.subsystem_type {
            Engine | Navigation => 1.6,
            Weapons | Turret => 1.3,
            _ => 0.8,
        },
        TacticalGoal::Destroy => {
            let level_bonus = match subsystem.criticality {
                CriticalityLevel::Vital => 1.5,
                CriticalityLevel::Critical => 1.3,
                _ => 1.0,
            };
            level_bonus * (1.5 - subsystem.health_percentage())
        }
        TacticalGoal::Capture => {
            if name.contains("reactor") {
                return 0.1;
            }
            match subsystem.subsystem_type {
                Shields | Weapons => 1.5,
                Turret | Communication => 1.3,
                Engine => 0.3,
                _ => 0.8,
            }
        }
        TacticalGoal::Harass => match subsystem.subsystem_type {
            Sensors => 1.5,
            Communication => 1.4,
            Turret => 1.3,
            _ => 0.4,
        },
    }
}

#[derive(Debug, Clone)]
pub struct CriticalityClassifier {
    ship_class: ShipClass,
    config: CriticalityConfig,
    /// Static score per subsystem, indexed by `SubsystemId`
    static_scores: Vec<f32>,
    /// Last computed tactical priority per subsystem
    priorities: Vec<f32>,
    state: ShipCriticalState,
    critical_fraction: f32,
}

impl CriticalityClassifier {
    pub fn new(ship_class: ShipClass, config: CriticalityConfig) -> Self {
        Self {
            ship_class,
            config,
            static_scores: Vec::new(),
            priorities: Vec::new(),
            state: ShipCriticalState::Operational,
            critical_fraction: 0.0,
        }
    }

    /// Static score: type base + name keywords + hull class
    pub fn static_score(&self, name: &str, subsystem_type: SubsystemType) -> f32 {
        (type_base_score(subsystem_type)
            + name_modifier(name)
            + ship_class_modifier(self.ship_class, subsystem_type))
        .clamp(0.0, 1.5)
    }

    pub fn classify(&self, name: &str, subsystem_type: SubsystemType) -> CriticalityLevel {
        level_for_score(self.static_score(name, subsystem_type))
    }

    /// Score a newly registered subsystem and store its level on the registry
    pub fn on_registered(&mut self, id: SubsystemId, registry: &mut SubsystemRegistry) {
        let Some(subsystem) = registry.get(id) else {
            return;
        };
        let score = self.static_score(&subsystem.name, subsystem.subsystem_type);
        registry.set_criticality(id, level_for_score(score));

        if self.static_scores.len() <= id.index() {
            self.static_scores.resize(id.index() + 1, 0.0);
            self.priorities.resize(id.index() + 1, 0.0);
        }
        self.static_scores[id.index()] = score;
    }

    /// Dynamic tactical priority for one subsystem
    pub fn tactical_priority(&self, id: SubsystemId, subsystem: &Subsystem) -> f32 {
        let base = self
            .static_scores
            .get(id.index())
            .copied()
            .unwrap_or_else(|| self.static_score(&subsystem.name, subsystem.subsystem_type));
        let mut priority =
            base * health_multiplier(subsystem) * criticality_multiplier(subsystem.criticality);
        if subsystem.effectiveness < LOW_EFFECTIVENESS_THRESHOLD {
            priority *= LOW_EFFECTIVENESS_PRIORITY_BONUS;
        }
        priority
    }

    pub fn priority(&self, id: SubsystemId) -> f32 {
        self.priorities.get(id.index()).copied().unwrap_or(0.0)
    }

    pub fn state(&self) -> ShipCriticalState {
        self.state
    }

    pub fn critical_fraction(&self) -> f32 {
        self.critical_fraction
    }

    /// Recompute priorities and the ship critical state, emitting events on
    /// state changes
    pub fn rescore(&mut self, registry: &SubsystemRegistry, bus: &mut EventBus) {
        self.priorities.resize(registry.len(), 0.0);
        for (id, subsystem) in registry.iter() {
            self.priorities[id.index()] = self.tactical_priority(id, subsystem);
        }

        let previous_fraction = self.critical_fraction;
        let (state, fraction) = Self::evaluate_state(registry);
        self.critical_fraction = fraction;

        let threshold = self.config.critical_fraction_threshold;
        if previous_fraction <= threshold && fraction > threshold {
            tracing::info!(
                "Critical subsystems below threshold: {:.0}%",
                fraction * 100.0
            );
            bus.emit(ShipEvent::CriticalThresholdExceeded {
                critical_fraction: fraction,
            });
        }

        if state != self.state {
            bus.emit(ShipEvent::ShipCriticalStateChanged {
                previous: self.state,
                current: state,
            });
            self.state = state;
        }
    }

    /// Derive the ship state from vital failures and the share of
    /// critical/vital subsystems below their critical threshold
    pub fn evaluate_state(registry: &SubsystemRegistry) -> (ShipCriticalState, f32) {
        if registry.is_empty() {
            return (ShipCriticalState::Operational, 0.0);
        }

        let mut vital_failures = 0;
        let mut important = 0;
        let mut important_below = 0;
        let mut health_sum = 0.0;

        for (_, subsystem) in registry.iter() {
            health_sum += subsystem.health_percentage();
            if subsystem.criticality == CriticalityLevel::Vital && !subsystem.is_functional {
                vital_failures += 1;
            }
            if subsystem.criticality >= CriticalityLevel::Critical {
                important += 1;
                if subsystem.is_below_critical_threshold() {
                    important_below += 1;
                }
            }
        }

        let fraction = if important > 0 {
            important_below as f32 / important as f32
        } else {
            0.0
        };
        let mean_health = health_sum / registry.len() as f32;

        let state = if vital_failures >= 2 || fraction >= 0.75 {
            ShipCriticalState::Failing
        } else if vital_failures >= 1 || fraction >= 0.5 {
            ShipCriticalState::Critical
        } else if fraction > 0.0 || mean_health < 0.7 {
            ShipCriticalState::Degraded
        } else {
            ShipCriticalState::Operational
        };
        (state, fraction)
    }

    /// Highest-value live targets for the goal, best first
    pub fn best_targets(
        &self,
        registry: &SubsystemRegistry,
        goal: TacticalGoal,
        max_n: usize,
    ) -> Vec<String> {
        let mut scored: Vec<(f32, SubsystemId, &Subsystem)> = registry
            .iter()
            .filter(|(_, s)| s.is_live())
            .map(|(id, s)| {
                let score = self.tactical_priority(id, s) * goal_multiplier(goal, s);
                (score, id, s)
            })
            .collect();

        // Stable sort keeps registration order for ties
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored
            .into_iter()
            .take(max_n)
            .map(|(_, _, s)| s.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CriticalityClassifier {
        CriticalityClassifier::new(ShipClass::Frigate, CriticalityConfig::default())
    }

    fn registry_with(
        classifier: &mut CriticalityClassifier,
        entries: &[(&str, SubsystemType)],
    ) -> SubsystemRegistry {
        let mut registry = SubsystemRegistry::new();
        for (name, t) in entries {
            let id = registry.register(name, *t, 100.0).unwrap();
            classifier.on_registered(id, &mut registry);
        }
        registry
    }

    #[test]
    fn test_name_keywords() {
        let c = classifier();
        assert!(
            c.static_score("primary_sensors", SubsystemType::Sensors)
                > c.static_score("sensors", SubsystemType::Sensors)
        );
        assert!(
            c.static_score("backup_sensors", SubsystemType::Sensors)
                < c.static_score("sensors", SubsystemType::Sensors)
        );
        assert_eq!(
            c.classify("reactor_core", SubsystemType::Engine),
            CriticalityLevel::Vital
        );
        assert_eq!(
            c.classify("comms", SubsystemType::Communication),
            CriticalityLevel::NonCritical
        );
        assert_eq!(
            c.classify("life_support_comms", SubsystemType::Communication),
            CriticalityLevel::Important
        );
    }

    #[test]
    fn test_ship_class_shifts_levels() {
        let freighter = CriticalityClassifier::new(ShipClass::Freighter, CriticalityConfig::default());
        let frigate = classifier();
        assert!(
            freighter.static_score("guns", SubsystemType::Weapons)
                < frigate.static_score("guns", SubsystemType::Weapons)
        );
    }

    #[test]
    fn test_health_sensitivity() {
        let mut c = classifier();
        let mut registry = registry_with(&mut c, &[("guns", SubsystemType::Weapons)]);
        let id = registry.id("guns").unwrap();
        let mut bus = EventBus::new();

        let full = c.tactical_priority(id, registry.get(id).unwrap());
        registry.apply_effective_damage(id, 70.0, &mut bus);
        let wounded = c.tactical_priority(id, registry.get(id).unwrap());
        registry.apply_effective_damage(id, 25.0, &mut bus);
        let nearly_dead = c.tactical_priority(id, registry.get(id).unwrap());

        assert!(wounded > full);
        assert!(nearly_dead < wounded);
    }

    #[test]
    fn test_low_effectiveness_bonus() {
        let mut c = classifier();
        let mut registry = registry_with(&mut c, &[("guns", SubsystemType::Weapons)]);
        let id = registry.id("guns").unwrap();
        let before = c.tactical_priority(id, registry.get(id).unwrap());
        registry.set_effectiveness(id, 0.3);
        let after = c.tactical_priority(id, registry.get(id).unwrap());
        assert!((after / before - LOW_EFFECTIVENESS_PRIORITY_BONUS).abs() < 1e-5);
    }

    #[test]
    fn test_goal_reranking() {
        let mut c = classifier();
        let registry = registry_with(
            &mut c,
            &[
                ("engine", SubsystemType::Engine),
                ("radar", SubsystemType::Sensors),
                ("comms", SubsystemType::Communication),
                ("shield_gen", SubsystemType::Shields),
            ],
        );

        let disable = c.best_targets(&registry, TacticalGoal::Disable, 1);
        assert_eq!(disable, vec!["engine".to_string()]);

        let capture = c.best_targets(&registry, TacticalGoal::Capture, 1);
        assert_eq!(capture, vec!["shield_gen".to_string()]);

        let harass = c.best_targets(&registry, TacticalGoal::Harass, 4);
        assert_eq!(harass.len(), 4);
        assert_eq!(harass[0], "radar");
    }

    #[test]
    fn test_best_targets_skip_destroyed() {
        let mut c = classifier();
        let mut registry = registry_with(
            &mut c,
            &[("engine", SubsystemType::Engine), ("radar", SubsystemType::Sensors)],
        );
        let engine = registry.id("engine").unwrap();
        registry.mark_destroyed(engine);

        let targets = c.best_targets(&registry, TacticalGoal::Destroy, 5);
        assert_eq!(targets, vec!["radar".to_string()]);
    }

    #[test]
    fn test_ship_state_transitions() {
        let mut c = classifier();
        let mut registry = registry_with(
            &mut c,
            &[
                ("reactor", SubsystemType::Engine),
                ("shield_gen", SubsystemType::Shields),
                ("radar", SubsystemType::Sensors),
            ],
        );
        let mut bus = EventBus::new();

        c.rescore(&registry, &mut bus);
        assert_eq!(c.state(), ShipCriticalState::Operational);
        assert!(bus.flush().is_empty());

        let reactor = registry.id("reactor").unwrap();
        registry.apply_effective_damage(reactor, 100.0, &mut bus);
        bus.flush();

        c.rescore(&registry, &mut bus);
        assert!(c.state() >= ShipCriticalState::Critical);
        let events = bus.flush();
        assert!(events
            .iter()
            .any(|e| matches!(e, ShipEvent::ShipCriticalStateChanged { .. })));
    }

    #[test]
    fn test_critical_threshold_exceeded_once() {
        let mut c = classifier();
        let mut registry = registry_with(
            &mut c,
            &[
                ("engine", SubsystemType::Engine),
                ("shield_gen", SubsystemType::Shields),
            ],
        );
        let mut bus = EventBus::new();
        for name in ["engine", "shield_gen"] {
            let id = registry.id(name).unwrap();
            registry.apply_effective_damage(id, 90.0, &mut bus);
        }
        bus.flush();

        c.rescore(&registry, &mut bus);
        c.rescore(&registry, &mut bus);
        let exceeded = bus
            .flush()
            .into_iter()
            .filter(|e| matches!(e, ShipEvent::CriticalThresholdExceeded { .. }))
            .count();
        assert_eq!(exceeded, 1);
        assert_eq!(c.critical_fraction(), 1.0);
        assert_eq!(c.state(), ShipCriticalState::Failing);
    }
}
