//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulation time in seconds on the ship's monotonic clock
pub type SimTime = f64;

/// Unique identifier for ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipId(pub Uuid);

impl ShipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense arena handle into a ship's subsystem table
///
/// Handles are only meaningful for the registry that issued them. Tasks and
/// destruction records hold these instead of owning the subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsystemId(pub u32);

impl SubsystemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of weapon effect delivered the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum DamageType {
    #[display(fmt = "kinetic")]
    Kinetic,
    #[display(fmt = "explosive")]
    Explosive,
    #[display(fmt = "energy")]
    Energy,
    #[display(fmt = "emp")]
    Emp,
    #[display(fmt = "plasma")]
    Plasma,
}

impl DamageType {
    pub fn all() -> &'static [DamageType] {
        &[
            DamageType::Kinetic,
            DamageType::Explosive,
            DamageType::Energy,
            DamageType::Emp,
            DamageType::Plasma,
        ]
    }
}

/// Hull class of the ship, used to bias subsystem criticality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
pub enum ShipClass {
    #[display(fmt = "fighter")]
    Fighter,
    #[display(fmt = "corvette")]
    Corvette,
    #[default]
    #[display(fmt = "frigate")]
    Frigate,
    #[display(fmt = "cruiser")]
    Cruiser,
    #[display(fmt = "capital")]
    Capital,
    #[display(fmt = "freighter")]
    Freighter,
}
