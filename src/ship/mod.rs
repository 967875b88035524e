//! Ship-level orchestration, events and fleets

pub mod events;
pub mod fleet;
pub mod orchestrator;

pub use events::{EventBus, ShipEvent, Subscriber};
pub use fleet::Fleet;
pub use orchestrator::{DamageReport, QuadrantStatus, ShipDamageModel, ShipStatus, SubsystemStatus};
