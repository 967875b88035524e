//! Quadrant geometry and per-quadrant recharge state

use derive_more::Display;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Quadrant {
    #[display(fmt = "front")]
    Front,
    #[display(fmt = "right")]
    Right,
    #[display(fmt = "rear")]
    Rear,
    #[display(fmt = "left")]
    Left,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Front,
        Quadrant::Right,
        Quadrant::Rear,
        Quadrant::Left,
    ];

    pub fn index(self) -> usize {
        match self {
            Quadrant::Front => 0,
            Quadrant::Right => 1,
            Quadrant::Rear => 2,
            Quadrant::Left => 3,
        }
    }

    /// The two quadrants sharing a sector edge with this one
    pub fn adjacent(self) -> [Quadrant; 2] {
        match self {
            Quadrant::Front | Quadrant::Rear => [Quadrant::Left, Quadrant::Right],
            Quadrant::Left | Quadrant::Right => [Quadrant::Front, Quadrant::Rear],
        }
    }

    pub fn opposite(self) -> Quadrant {
        match self {
            Quadrant::Front => Quadrant::Rear,
            Quadrant::Rear => Quadrant::Front,
            Quadrant::Left => Quadrant::Right,
            Quadrant::Right => Quadrant::Left,
        }
    }

    /// Sector for a signed angle in degrees; positive turns toward the left
    pub fn from_angle(degrees: f32) -> Quadrant {
        let abs = degrees.abs();
        if abs <= 45.0 {
            Quadrant::Front
        } else if abs <= 135.0 {
            if degrees > 0.0 {
                Quadrant::Left
            } else {
                Quadrant::Right
            }
        } else {
            Quadrant::Rear
        }
    }
}

/// Ship-local orientation used to classify hit directions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipFrame {
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for ShipFrame {
    fn default() -> Self {
        Self {
            forward: Vec3::Y,
            up: Vec3::Z,
        }
    }
}

impl ShipFrame {
    /// Signed angle in degrees from forward to `direction` around `up`.
    /// Returns `None` for directions parallel to `up` or zero.
    pub fn signed_angle(&self, direction: Vec3) -> Option<f32> {
        let up = self.up.normalize_or_zero();
        let flat = direction - up * direction.dot(up);
        if flat.length_squared() <= f32::EPSILON {
            return None;
        }
        let forward = self.forward.normalize_or_zero();
        let sin = forward.cross(flat).dot(up);
        let cos = forward.dot(flat);
        Some(sin.atan2(cos).to_degrees())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum RechargeState {
    /// Full, or below full but hit within the last `recharge_delay`
    #[display(fmt = "idle")]
    Idle,
    /// Counting down the undamaged delay before recharge
    #[display(fmt = "delay")]
    Delay,
    /// Trickle charging
    #[display(fmt = "active")]
    Active,
    /// Hit while charging; settles back to idle once left alone
    #[display(fmt = "interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldQuadrant {
    pub quadrant: Quadrant,
    pub strength: f32,
    pub max_strength: f32,
    pub state: RechargeState,
    /// Time of the most recent hit on this quadrant
    pub last_damage: Option<SimTime>,
    /// Start of the current Delay or Interrupted countdown
    pub timer_start: SimTime,
}

impl ShieldQuadrant {
    pub fn new(quadrant: Quadrant, max_strength: f32) -> Self {
        let max_strength = max_strength.max(0.0);
        Self {
            quadrant,
            strength: max_strength,
            max_strength,
            state: RechargeState::Idle,
            last_damage: None,
            timer_start: 0.0,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max_strength <= 0.0 {
            return 0.0;
        }
        self.strength / self.max_strength
    }

    pub fn is_depleted(&self) -> bool {
        self.strength <= 0.0
    }

    /// Absorb up to the current strength; returns (absorbed, overflow)
    pub fn absorb(&mut self, amount: f32) -> (f32, f32) {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let absorbed = amount.min(self.strength);
        self.strength -= absorbed;
        (absorbed, amount - absorbed)
    }

    pub fn seconds_since(&self, now: SimTime) -> SimTime {
        now - self.timer_start
    }

    /// No hit in the last `delay` seconds; a never-hit quadrant qualifies
    pub fn undamaged_for(&self, now: SimTime, delay: SimTime) -> bool {
        self.last_damage.map_or(true, |hit| now - hit >= delay)
    }
}
