//! Turning incoming fire into subsystem damage

pub mod constants;
pub mod distributor;
pub mod modifiers;
pub mod targeting;

pub use distributor::{DamageDistributor, DamageShare, Distribution, DistributionMode, IncomingDamage};
pub use modifiers::{combined_modifier, damage_type_modifier, type_vulnerability};
pub use targeting::{MissReason, TargetedAttack, TargetingOutcome, TargetingResolver, WeaponProfile};
