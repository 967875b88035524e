pub mod config;
pub mod error;
pub mod types;

pub use config::DamageConfig;
pub use error::{DamageError, Result};
pub use types::{DamageType, ShipClass, ShipId, SimTime, SubsystemId};
