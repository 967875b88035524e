//! Repair queue, shared resources and emergency repairs

pub mod economy;
pub mod resources;
pub mod task;

pub use economy::RepairEconomy;
pub use resources::{ResourcePool, ResourceType};
pub use task::{RepairPriority, RepairTask, RepairType, TaskId};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of a successful repair request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairStart {
    Active(TaskId),
    /// Every repair slot is busy; the task waits its turn
    Queued(TaskId),
}

impl RepairStart {
    pub fn task_id(&self) -> TaskId {
        match self {
            RepairStart::Active(id) | RepairStart::Queued(id) => *id,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, RepairStart::Queued(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepairError {
    #[error("Unknown subsystem: {0}")]
    UnknownSubsystem(String),

    #[error("{0} is already at full health")]
    AlreadyAtFullHealth(String),

    #[error("{0} already has a repair queued or in progress")]
    AlreadyQueued(String),

    #[error("{0} is permanently damaged")]
    PermanentlyDamaged(String),

    #[error("{0} is destroyed")]
    SubsystemDestroyed(String),

    #[error("Insufficient {resource}: need {required:.1}, have {available:.1}")]
    InsufficientResources {
        resource: ResourceType,
        required: f32,
        available: f32,
    },

    #[error("Emergency repair on cooldown for {remaining:.1}s")]
    EmergencyCooldown { remaining: f64 },

    #[error("Unknown repair task {0}")]
    UnknownTask(TaskId),
}
