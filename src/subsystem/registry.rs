//! Subsystem health ledger
//!
//! Subsystems live in a dense table indexed by `SubsystemId`. Every health
//! change goes through one place so performance, functional state and the
//! threshold events stay consistent with health.

use ahash::AHashMap;

use super::curves;
use super::{CriticalityLevel, FailureReason, Subsystem, SubsystemSpec, SubsystemType};
use crate::core::error::{DamageError, Result};
use crate::core::types::{DamageType, SubsystemId};
use crate::damage::constants::PERFORMANCE_EVENT_DELTA;
use crate::damage::modifiers::damage_type_modifier;
use crate::ship::events::{EventBus, ShipEvent};

/// What a single health mutation did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthChange {
    pub id: SubsystemId,
    pub previous_health: f32,
    pub current_health: f32,
    pub previous_performance: f32,
    pub current_performance: f32,
    /// Health dropped below the type's critical threshold on this change
    pub crossed_critical: bool,
    /// Health went from positive to zero on this change
    pub reached_zero: bool,
}

impl HealthChange {
    /// Health lost (positive) or gained (negative)
    pub fn health_lost(&self) -> f32 {
        self.previous_health - self.current_health
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubsystemRegistry {
    subsystems: Vec<Subsystem>,
    by_name: AHashMap<String, SubsystemId>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    /// Register a subsystem at the ship origin with default size and armor
    pub fn register(
        &mut self,
        name: &str,
        subsystem_type: SubsystemType,
        max_health: f32,
    ) -> Result<SubsystemId> {
        self.register_spec(SubsystemSpec::new(name, subsystem_type, max_health))
    }

    pub fn register_spec(&mut self, spec: SubsystemSpec) -> Result<SubsystemId> {
        if spec.name.trim().is_empty() {
            tracing::warn!("Rejected subsystem registration: empty name");
            return Err(DamageError::InvalidArgument(
                "subsystem name must not be empty".into(),
            ));
        }
        if !spec.max_health.is_finite() || spec.max_health <= 0.0 {
            tracing::warn!(
                "Rejected subsystem '{}': max_health {} must be positive",
                spec.name,
                spec.max_health
            );
            return Err(DamageError::InvalidArgument(format!(
                "max_health for '{}' must be positive, got {}",
                spec.name, spec.max_health
            )));
        }
        if self.by_name.contains_key(&spec.name) {
            tracing::warn!("Rejected subsystem '{}': already registered", spec.name);
            return Err(DamageError::InvalidArgument(format!(
                "subsystem '{}' is already registered",
                spec.name
            )));
        }

        let id = SubsystemId(self.subsystems.len() as u32);
        self.by_name.insert(spec.name.clone(), id);
        self.subsystems.push(Subsystem::from_spec(spec));
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<SubsystemId> {
        self.by_name.get(name).copied()
    }

    /// Look up a name, logging unknown names
    pub fn resolve(&self, name: &str) -> Result<SubsystemId> {
        self.id(name).ok_or_else(|| {
            tracing::warn!("Unknown subsystem '{}'", name);
            DamageError::UnknownSubsystem(name.to_string())
        })
    }

    pub fn get(&self, id: SubsystemId) -> Option<&Subsystem> {
        self.subsystems.get(id.index())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Subsystem> {
        self.id(name).and_then(|id| self.get(id))
    }

    pub fn name(&self, id: SubsystemId) -> &str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or("<unknown>")
    }

    /// All subsystems in registration order
    pub fn iter(&self) -> impl Iterator<Item = (SubsystemId, &Subsystem)> {
        self.subsystems
            .iter()
            .enumerate()
            .map(|(i, s)| (SubsystemId(i as u32), s))
    }

    pub fn health_percentage(&self, name: &str) -> Option<f32> {
        self.get_by_name(name).map(Subsystem::health_percentage)
    }

    pub fn is_functional(&self, name: &str) -> bool {
        self.get_by_name(name).map(|s| s.is_functional).unwrap_or(false)
    }

    pub fn destroyed_count(&self) -> usize {
        self.subsystems.iter().filter(|s| s.is_destroyed).count()
    }

    pub fn destroyed_fraction(&self) -> f32 {
        if self.subsystems.is_empty() {
            return 0.0;
        }
        self.destroyed_count() as f32 / self.subsystems.len() as f32
    }

    /// Apply raw damage by name; the damage-type table scales it first
    pub fn apply_damage(
        &mut self,
        name: &str,
        amount: f32,
        damage_type: DamageType,
        bus: &mut EventBus,
    ) -> Result<HealthChange> {
        let id = self.resolve(name)?;
        let subsystem = &self.subsystems[id.index()];
        let effective = sanitize(amount) * damage_type_modifier(subsystem.subsystem_type, damage_type);
        Ok(self.apply_effective_damage(id, effective, bus))
    }

    /// Apply damage that has already been through every modifier
    pub fn apply_effective_damage(
        &mut self,
        id: SubsystemId,
        amount: f32,
        bus: &mut EventBus,
    ) -> HealthChange {
        let current = self.subsystems[id.index()].current_health;
        self.set_health(id, current - sanitize(amount), bus)
    }

    /// Restore health by name, clamped to max
    pub fn repair(&mut self, name: &str, amount: f32, bus: &mut EventBus) -> Result<HealthChange> {
        let id = self.resolve(name)?;
        Ok(self.repair_id(id, amount, bus))
    }

    /// Destroyed subsystems do not heal; use `revive` for an explicit reset
    pub fn repair_id(&mut self, id: SubsystemId, amount: f32, bus: &mut EventBus) -> HealthChange {
        let subsystem = &self.subsystems[id.index()];
        if subsystem.is_destroyed {
            return self.unchanged(id);
        }
        let current = subsystem.current_health;
        self.set_health(id, current + sanitize(amount), bus)
    }

    /// Force the destroyed sentinel. Returns false if already destroyed.
    pub fn mark_destroyed(&mut self, id: SubsystemId) -> bool {
        let Some(subsystem) = self.subsystems.get_mut(id.index()) else {
            return false;
        };
        if subsystem.is_destroyed {
            return false;
        }
        subsystem.is_destroyed = true;
        subsystem.current_health = 0.0;
        subsystem.performance_factor = 0.0;
        subsystem.effectiveness = 0.0;
        subsystem.is_functional = false;
        subsystem.is_repairing = false;
        true
    }

    /// Mark a subsystem non-repairable and cap its performance
    pub fn apply_permanent_damage(&mut self, id: SubsystemId, ceiling: f32) {
        if let Some(subsystem) = self.subsystems.get_mut(id.index()) {
            subsystem.permanent_damage = true;
            subsystem.performance_ceiling = ceiling.clamp(0.0, 1.0);
            subsystem.performance_factor = subsystem.performance_factor.min(subsystem.performance_ceiling);
        }
    }

    /// Bring a subsystem back to full health and clear the destroyed
    /// sentinel. A permanent-damage ceiling stays in place.
    pub fn revive(&mut self, id: SubsystemId, bus: &mut EventBus) -> HealthChange {
        if let Some(subsystem) = self.subsystems.get_mut(id.index()) {
            subsystem.is_destroyed = false;
        }
        let max = self.subsystems[id.index()].max_health;
        self.set_health(id, max, bus)
    }

    pub fn set_effectiveness(&mut self, id: SubsystemId, effectiveness: f32) {
        if let Some(subsystem) = self.subsystems.get_mut(id.index()) {
            subsystem.effectiveness = if subsystem.is_destroyed {
                0.0
            } else {
                effectiveness.clamp(0.0, 1.0)
            };
        }
    }

    pub fn set_repairing(&mut self, id: SubsystemId, repairing: bool) {
        if let Some(subsystem) = self.subsystems.get_mut(id.index()) {
            subsystem.is_repairing = repairing;
        }
    }

    pub fn set_criticality(&mut self, id: SubsystemId, level: CriticalityLevel) {
        if let Some(subsystem) = self.subsystems.get_mut(id.index()) {
            subsystem.criticality = level;
        }
    }

    fn unchanged(&self, id: SubsystemId) -> HealthChange {
        let s = &self.subsystems[id.index()];
        HealthChange {
            id,
            previous_health: s.current_health,
            current_health: s.current_health,
            previous_performance: s.performance_factor,
            current_performance: s.performance_factor,
            crossed_critical: false,
            reached_zero: false,
        }
    }

    fn set_health(&mut self, id: SubsystemId, health: f32, bus: &mut EventBus) -> HealthChange {
        let subsystem = &mut self.subsystems[id.index()];
        let previous_health = subsystem.current_health;
        let previous_performance = subsystem.performance_factor;
        let previous_pct = subsystem.health_percentage();

        subsystem.current_health = health.clamp(0.0, subsystem.max_health);
        let pct = subsystem.health_percentage();
        subsystem.performance_factor = if subsystem.is_destroyed {
            0.0
        } else {
            curves::performance_factor(subsystem.subsystem_type, pct).min(subsystem.performance_ceiling)
        };
        subsystem.effectiveness = subsystem.performance_factor;
        subsystem.is_functional = subsystem.current_health > 0.0 && !subsystem.is_destroyed;

        let threshold = subsystem.subsystem_type.critical_threshold();
        let change = HealthChange {
            id,
            previous_health,
            current_health: subsystem.current_health,
            previous_performance,
            current_performance: subsystem.performance_factor,
            crossed_critical: previous_pct >= threshold && pct < threshold,
            reached_zero: previous_health > 0.0 && subsystem.current_health <= 0.0,
        };

        if change.current_health != change.previous_health {
            bus.emit(ShipEvent::HealthChanged {
                subsystem: subsystem.name.clone(),
                previous: change.previous_health,
                current: change.current_health,
                max: subsystem.max_health,
            });
        }
        if previous_performance - change.current_performance > PERFORMANCE_EVENT_DELTA {
            bus.emit(ShipEvent::PerformanceDegraded {
                subsystem: subsystem.name.clone(),
                previous: previous_performance,
                current: change.current_performance,
            });
        }
        if change.crossed_critical {
            bus.emit(ShipEvent::SubsystemFailed {
                subsystem: subsystem.name.clone(),
                reason: FailureReason::CriticalThreshold,
            });
        }
        if change.reached_zero {
            bus.emit(ShipEvent::SubsystemFailed {
                subsystem: subsystem.name.clone(),
                reason: FailureReason::ZeroHealth,
            });
        }

        change
    }
}

fn sanitize(amount: f32) -> f32 {
    if amount.is_finite() {
        amount.max(0.0)
    } else {
        0.0
    }
}
