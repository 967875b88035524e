//! Hullguard - spacecraft subsystem damage simulation
//!
//! Per-ship subsystem health, directional shields, weighted damage
//! distribution, explosions and cascades, performance degradation,
//! tactical criticality and a resource-limited repair queue.

pub mod core;
pub mod damage;
pub mod destruction;
pub mod performance;
pub mod repair;
pub mod shields;
pub mod ship;
pub mod subsystem;

pub use crate::core::{DamageConfig, DamageError, DamageType, Result, ShipClass, ShipId, SimTime, SubsystemId};
pub use crate::damage::{IncomingDamage, TargetedAttack, TargetingOutcome, WeaponProfile};
pub use crate::repair::{RepairError, RepairPriority, RepairStart, RepairType, ResourceType};
pub use crate::shields::Quadrant;
pub use crate::ship::{DamageReport, Fleet, ShipDamageModel, ShipEvent, ShipStatus};
pub use crate::subsystem::{ShipCriticalState, SubsystemSpec, SubsystemType, TacticalGoal};
