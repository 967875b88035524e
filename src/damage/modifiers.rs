//! Damage modifier tables
//!
//! Two layers, applied in order: what the weapon effect does to this kind
//! of hardware, then how exposed this kind of hardware is in general.

use crate::core::types::DamageType;
use crate::subsystem::SubsystemType;

/// Damage-type vs subsystem-type multiplier
pub fn damage_type_modifier(subsystem_type: SubsystemType, damage_type: DamageType) -> f32 {
    use DamageType::*;
    use SubsystemType::*;

    match (damage_type, subsystem_type) {
        // EMP fries electronics, barely scratches machinery
        (Emp, Sensors) => 3.0,
        (Emp, Communication) => 2.5,
        (Emp, Navigation) => 2.0,
        (Emp, Shields) => 2.0,
        (Emp, Weapons) => 1.0,
        (Emp, Turret) => 0.8,
        (Emp, Engine) => 0.5,

        // Explosive: fuel and ammunition feeds are the weak points
        (Explosive, Engine) => 1.5,
        (Explosive, Turret) => 1.3,
        (Explosive, Weapons) => 1.2,
        (Explosive, Sensors) => 1.2,
        (Explosive, Shields) => 0.8,
        (Explosive, _) => 1.0,

        (Energy, Sensors) => 1.3,
        (Energy, Weapons) => 1.1,
        (Energy, Shields) => 0.7,
        (Energy, _) => 1.0,

        (Kinetic, Turret) => 1.2,
        (Kinetic, Sensors) => 0.9,
        (Kinetic, Shields) => 0.9,
        (Kinetic, _) => 1.0,

        (Plasma, Engine) => 1.3,
        (Plasma, Weapons) => 1.3,
        (Plasma, _) => 1.1,
    }
}

/// Static per-type exposure multiplier
pub fn type_vulnerability(subsystem_type: SubsystemType) -> f32 {
    match subsystem_type {
        SubsystemType::Engine => 1.2,
        SubsystemType::Weapons => 1.1,
        SubsystemType::Turret => 1.0,
        SubsystemType::Sensors => 1.3,
        SubsystemType::Navigation => 0.9,
        SubsystemType::Communication => 1.1,
        SubsystemType::Shields => 0.8,
    }
}

/// Both layers combined
pub fn combined_modifier(subsystem_type: SubsystemType, damage_type: DamageType) -> f32 {
    damage_type_modifier(subsystem_type, damage_type) * type_vulnerability(subsystem_type)
}
