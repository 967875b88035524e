//! Cascade edges between subsystems and the per-type tables that drive
//! explosion and cascade rolls

use serde::{Deserialize, Serialize};

use super::DestructionCause;
use crate::core::types::{DamageType, SimTime, SubsystemId};
use crate::subsystem::SubsystemType;

/// Explicit dependency: losing `source` may take `dependent` down with it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeLink {
    pub source: SubsystemId,
    pub dependent: SubsystemId,
    /// Per-edge scale on the cascade roll
    pub probability: f32,
}

/// Secondary damage waiting in the delay queue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeHit {
    pub source: SubsystemId,
    pub dependent: SubsystemId,
    pub damage: f32,
    pub scheduled_at: SimTime,
}

/// How readily a destroyed subsystem drags its dependents down
pub fn cascade_strength(source: SubsystemType) -> f32 {
    match source {
        SubsystemType::Engine => 1.0,
        SubsystemType::Shields => 0.6,
        SubsystemType::Weapons => 0.6,
        SubsystemType::Sensors => 0.5,
        SubsystemType::Navigation => 0.5,
        SubsystemType::Communication => 0.4,
        SubsystemType::Turret => 0.4,
    }
}

/// Implicit dependencies that exist on every ship
pub fn type_derived_edge(source: SubsystemType, dependent: SubsystemType) -> bool {
    use SubsystemType::*;
    match source {
        // Power plant feeds everything
        Engine => true,
        Sensors => matches!(dependent, Turret | Weapons),
        Communication => dependent == Sensors,
        Navigation => dependent == Engine,
        _ => false,
    }
}

/// Likelihood that this kind of hardware goes up when destroyed
pub fn explosion_type_modifier(subsystem_type: SubsystemType) -> f32 {
    match subsystem_type {
        SubsystemType::Engine => 1.5,
        SubsystemType::Weapons => 1.3,
        SubsystemType::Turret => 1.2,
        SubsystemType::Shields => 1.1,
        SubsystemType::Sensors => 0.6,
        SubsystemType::Navigation => 0.5,
        SubsystemType::Communication => 0.5,
    }
}

pub fn explosion_cause_modifier(cause: DestructionCause) -> f32 {
    match cause {
        DestructionCause::Weapon(DamageType::Explosive) => 1.3,
        DestructionCause::Weapon(DamageType::Plasma) => 1.2,
        DestructionCause::Weapon(DamageType::Emp) => 0.5,
        DestructionCause::Weapon(_) => 1.0,
        DestructionCause::Explosion => 1.2,
        DestructionCause::Cascade => 0.8,
    }
}

/// Power sources hit their dependents harder
pub fn is_power_source(name: &str, subsystem_type: SubsystemType) -> bool {
    subsystem_type == SubsystemType::Engine || name.to_lowercase().contains("reactor")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_feeds_everything() {
        for t in SubsystemType::all() {
            assert!(type_derived_edge(SubsystemType::Engine, *t));
        }
        assert!(type_derived_edge(SubsystemType::Sensors, SubsystemType::Turret));
        assert!(!type_derived_edge(SubsystemType::Sensors, SubsystemType::Engine));
        assert!(!type_derived_edge(SubsystemType::Shields, SubsystemType::Engine));
    }

    #[test]
    fn test_power_sources() {
        assert!(is_power_source("anything", SubsystemType::Engine));
        assert!(is_power_source("Aux_Reactor", SubsystemType::Shields));
        assert!(!is_power_source("radar", SubsystemType::Sensors));
    }

    #[test]
    fn test_explosive_hits_detonate_more() {
        let kinetic = explosion_cause_modifier(DestructionCause::Weapon(DamageType::Kinetic));
        let explosive = explosion_cause_modifier(DestructionCause::Weapon(DamageType::Explosive));
        assert!(explosive > kinetic);
        assert!(explosion_cause_modifier(DestructionCause::Cascade) < kinetic);
    }
}
