//! Repair task lifecycle and per-type repair characteristics

use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::resources::ResourceType;
use crate::core::types::{SimTime, SubsystemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum RepairType {
    #[display(fmt = "standard")]
    Standard,
    /// Quick patch in the field; cheaper, restores less
    #[display(fmt = "field")]
    Field,
    /// Full overhaul; slow and expensive
    #[display(fmt = "depot")]
    Depot,
    #[display(fmt = "emergency")]
    Emergency,
    #[display(fmt = "auto")]
    Auto,
}

impl RepairType {
    /// Scale on repair duration
    pub fn duration_modifier(&self) -> f32 {
        match self {
            RepairType::Standard => 1.0,
            RepairType::Field => 0.7,
            RepairType::Depot => 1.5,
            RepairType::Emergency => 0.75,
            RepairType::Auto => 1.5,
        }
    }

    /// Fraction of the health deficit the repair restores
    pub fn effectiveness(&self) -> f32 {
        match self {
            RepairType::Standard => 1.0,
            RepairType::Field => 0.7,
            RepairType::Depot => 1.0,
            RepairType::Emergency => 0.3,
            RepairType::Auto => 0.8,
        }
    }

    /// Scale on resources consumed
    pub fn cost_modifier(&self) -> f32 {
        match self {
            RepairType::Standard => 1.0,
            RepairType::Field => 0.6,
            RepairType::Depot => 1.5,
            RepairType::Emergency => 1.0,
            RepairType::Auto => 0.8,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, Serialize, Deserialize,
)]
pub enum RepairPriority {
    #[display(fmt = "low")]
    Low,
    #[default]
    #[display(fmt = "normal")]
    Normal,
    #[display(fmt = "high")]
    High,
    #[display(fmt = "critical")]
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display(fmt = "#{}", _0)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairTask {
    pub id: TaskId,
    pub subsystem: SubsystemId,
    pub repair_type: RepairType,
    pub priority: RepairPriority,
    /// Seconds of work needed once active
    pub duration: f64,
    pub elapsed: f64,
    pub health_to_restore: f32,
    pub restored: f32,
    /// Resources taken at start; the basis for refunds
    pub consumed: Vec<(ResourceType, f32)>,
    pub requested_at: SimTime,
}

impl RepairTask {
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Emergency repairs run outside the concurrency cap
    pub fn uses_slot(&self) -> bool {
        self.repair_type != RepairType::Emergency
    }
}
