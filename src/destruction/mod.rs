//! What happens when a subsystem hits zero health

pub mod cascade;
pub mod coordinator;
pub mod delay_queue;

pub use cascade::{CascadeHit, CascadeLink};
pub use coordinator::{CascadeTick, DestructionCoordinator};
pub use delay_queue::DelayQueue;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::{DamageType, SimTime, SubsystemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum DestructionCause {
    #[display(fmt = "{} fire", _0)]
    Weapon(DamageType),
    #[display(fmt = "explosion")]
    Explosion,
    #[display(fmt = "cascade failure")]
    Cascade,
}

/// Created once at the first zero-health crossing, kept until reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestructionRecord {
    pub subsystem: SubsystemId,
    pub cause: DestructionCause,
    pub time: SimTime,
    pub exploded: bool,
    /// At least one cascade was scheduled from this destruction
    pub cascaded: bool,
    pub permanent: bool,
}
