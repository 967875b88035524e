//! Ship subsystems: the health ledger and what it means tactically

pub mod criticality;
pub mod curves;
pub mod registry;

pub use criticality::{CriticalityClassifier, ShipCriticalState, TacticalGoal};
pub use registry::{HealthChange, SubsystemRegistry};

use derive_more::Display;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Functional category of a subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum SubsystemType {
    #[display(fmt = "engine")]
    Engine,
    #[display(fmt = "weapons")]
    Weapons,
    #[display(fmt = "turret")]
    Turret,
    /// Radar and other sensor suites
    #[display(fmt = "sensors")]
    Sensors,
    #[display(fmt = "navigation")]
    Navigation,
    #[display(fmt = "communication")]
    Communication,
    #[display(fmt = "shields")]
    Shields,
}

impl SubsystemType {
    pub fn all() -> &'static [SubsystemType] {
        &[
            SubsystemType::Engine,
            SubsystemType::Weapons,
            SubsystemType::Turret,
            SubsystemType::Sensors,
            SubsystemType::Navigation,
            SubsystemType::Communication,
            SubsystemType::Shields,
        ]
    }

    /// Health fraction below which the subsystem reports a critical failure
    pub fn critical_threshold(&self) -> f32 {
        match self {
            SubsystemType::Engine => 0.25,
            SubsystemType::Weapons => 0.2,
            SubsystemType::Turret => 0.2,
            SubsystemType::Sensors => 0.15,
            SubsystemType::Navigation => 0.2,
            SubsystemType::Communication => 0.3,
            SubsystemType::Shields => 0.25,
        }
    }

    /// Heavy mechanical hardware; the rest is electronics
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SubsystemType::Engine | SubsystemType::Weapons | SubsystemType::Turret
        )
    }

    /// Importance weight used when averaging ship-wide performance
    pub fn importance_weight(&self) -> f32 {
        match self {
            SubsystemType::Engine => 2.0,
            SubsystemType::Weapons | SubsystemType::Turret => 1.5,
            SubsystemType::Sensors => 1.2,
            SubsystemType::Navigation => 0.8,
            SubsystemType::Communication => 0.5,
            SubsystemType::Shields => 1.0,
        }
    }
}

/// Static tactical classification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum CriticalityLevel {
    NonCritical,
    #[default]
    Important,
    Critical,
    Vital,
}

/// Why a subsystem reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Health fell below the type's critical threshold
    CriticalThreshold,
    /// Health reached zero
    ZeroHealth,
}

/// Everything needed to register a subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemSpec {
    pub name: String,
    pub subsystem_type: SubsystemType,
    pub max_health: f32,
    /// Ship-local position of the subsystem's center
    pub position: Vec3,
    pub radius: f32,
    pub armor_thickness: f32,
}

impl SubsystemSpec {
    pub fn new(name: impl Into<String>, subsystem_type: SubsystemType, max_health: f32) -> Self {
        Self {
            name: name.into(),
            subsystem_type,
            max_health,
            position: Vec3::ZERO,
            radius: 2.0,
            armor_thickness: 1.0,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_armor(mut self, armor_thickness: f32) -> Self {
        self.armor_thickness = armor_thickness;
        self
    }
}

/// A trackable ship component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subsystem {
    pub name: String,
    pub subsystem_type: SubsystemType,
    pub current_health: f32,
    pub max_health: f32,
    /// Curve output for the current health, capped by `performance_ceiling`
    pub performance_factor: f32,
    /// Performance after ship-wide penalties (brownout, targeting loss)
    pub effectiveness: f32,
    /// Upper bound on performance; lowered by permanent damage
    pub performance_ceiling: f32,
    pub criticality: CriticalityLevel,
    pub is_functional: bool,
    pub is_repairing: bool,
    pub is_destroyed: bool,
    pub permanent_damage: bool,
    pub position: Vec3,
    pub radius: f32,
    pub armor_thickness: f32,
}

impl Subsystem {
    pub fn from_spec(spec: SubsystemSpec) -> Self {
        Self {
            name: spec.name,
            subsystem_type: spec.subsystem_type,
            current_health: spec.max_health,
            max_health: spec.max_health,
            performance_factor: 1.0,
            effectiveness: 1.0,
            performance_ceiling: 1.0,
            criticality: CriticalityLevel::default(),
            is_functional: true,
            is_repairing: false,
            is_destroyed: false,
            permanent_damage: false,
            position: spec.position,
            radius: spec.radius.max(0.1),
            armor_thickness: spec.armor_thickness.max(0.1),
        }
    }

    /// Current health as a fraction of max, always within [0, 1]
    pub fn health_percentage(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.current_health / self.max_health).clamp(0.0, 1.0)
    }

    pub fn health_deficit(&self) -> f32 {
        (self.max_health - self.current_health).max(0.0)
    }

    pub fn is_below_critical_threshold(&self) -> bool {
        self.health_percentage() < self.subsystem_type.critical_threshold()
    }

    /// Destroyed subsystems are kept in the table but ignored by targeting
    /// and distribution
    pub fn is_live(&self) -> bool {
        !self.is_destroyed
    }
}
