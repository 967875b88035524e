//! Outbound events and the per-ship event bus
//!
//! Managers push events while they mutate ship state; the orchestrator
//! flushes once per operation so subscribers always see a tick's events in
//! the order they happened, after all state changes for that step are done.

use serde::{Deserialize, Serialize};

use crate::core::types::SimTime;
use crate::destruction::DestructionCause;
use crate::repair::{RepairType, TaskId};
use crate::shields::{Quadrant, RechargeState};
use crate::subsystem::criticality::ShipCriticalState;
use crate::subsystem::FailureReason;

/// Events consumed by the HUD, visualization and AI layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShipEvent {
    HealthChanged {
        subsystem: String,
        previous: f32,
        current: f32,
        max: f32,
    },
    /// Performance dropped by more than the reporting delta
    PerformanceDegraded {
        subsystem: String,
        previous: f32,
        current: f32,
    },
    SubsystemFailed {
        subsystem: String,
        reason: FailureReason,
    },
    RepairStarted {
        subsystem: String,
        task: TaskId,
        repair_type: RepairType,
        /// True if the task is waiting for a free repair slot
        queued: bool,
    },
    SubsystemRepaired {
        subsystem: String,
        task: TaskId,
        restored: f32,
    },
    RepairCancelled {
        subsystem: String,
        task: TaskId,
        refunded: bool,
    },
    SubsystemDestroyed {
        subsystem: String,
        cause: DestructionCause,
        time: SimTime,
        permanent: bool,
    },
    Explosion {
        source: String,
        splash_damage: f32,
        affected: Vec<String>,
    },
    CascadeTriggered {
        source: String,
        dependent: String,
        delay: SimTime,
    },
    CascadeDamageApplied {
        source: String,
        dependent: String,
        damage: f32,
    },
    CriticalThresholdExceeded {
        critical_fraction: f32,
    },
    ShipCriticalStateChanged {
        previous: ShipCriticalState,
        current: ShipCriticalState,
    },
    CatastrophicFailure {
        destroyed_fraction: f32,
    },
    ShieldQuadrantDepleted {
        quadrant: Quadrant,
    },
    ShieldRechargeStateChanged {
        quadrant: Quadrant,
        previous: RechargeState,
        current: RechargeState,
    },
}

impl ShipEvent {
    /// Subsystem this event is about, if any
    pub fn subsystem(&self) -> Option<&str> {
        match self {
            ShipEvent::HealthChanged { subsystem, .. }
            | ShipEvent::PerformanceDegraded { subsystem, .. }
            | ShipEvent::SubsystemFailed { subsystem, .. }
            | ShipEvent::RepairStarted { subsystem, .. }
            | ShipEvent::SubsystemRepaired { subsystem, .. }
            | ShipEvent::RepairCancelled { subsystem, .. }
            | ShipEvent::SubsystemDestroyed { subsystem, .. } => Some(subsystem),
            ShipEvent::Explosion { source, .. } => Some(source),
            ShipEvent::CascadeTriggered { dependent, .. }
            | ShipEvent::CascadeDamageApplied { dependent, .. } => Some(dependent),
            _ => None,
        }
    }
}

/// Read-only event callback
pub type Subscriber = Box<dyn FnMut(&ShipEvent) + Send>;

/// Ordered, synchronous event fan-out for one ship
#[derive(Default)]
pub struct EventBus {
    pending: Vec<ShipEvent>,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: ShipEvent) {
        self.pending.push(event);
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ShipEvent) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Events emitted since the last flush
    pub fn pending(&self) -> &[ShipEvent] {
        &self.pending
    }

    /// Deliver pending events to every subscriber in emission order and
    /// hand them back to the caller
    pub fn flush(&mut self) -> Vec<ShipEvent> {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for subscriber in self.subscribers.iter_mut() {
                subscriber(event);
            }
        }
        events
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
