//! Directional shields split into four independently recharging quadrants

pub mod controller;
pub mod quadrant;

pub use controller::{ShieldHit, ShieldQuadrantController};
pub use quadrant::{Quadrant, RechargeState, ShieldQuadrant, ShipFrame};
