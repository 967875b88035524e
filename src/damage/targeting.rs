//! Aimed fire at a named subsystem: hit roll, deviation, armor penetration

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::core::types::DamageType;
use crate::subsystem::Subsystem;

/// Weapon characteristics relevant to subsystem targeting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Base accuracy in [0, 1]
    pub accuracy: f32,
    /// Armor penetration rating, compared against armor thickness
    pub penetration: f32,
    pub optimal_range: f32,
    pub max_range: f32,
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self {
            accuracy: 0.8,
            penetration: 1.0,
            optimal_range: 100.0,
            max_range: 300.0,
        }
    }
}

/// One shot aimed at a specific subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetedAttack {
    /// World-frame position of the shooter
    pub attacker_position: Vec3,
    /// World-frame position of the target ship's origin
    pub target_position: Vec3,
    pub subsystem: String,
    pub weapon: WeaponProfile,
    pub damage_type: DamageType,
    pub base_damage: f32,
}

impl TargetedAttack {
    pub fn new(subsystem: impl Into<String>, base_damage: f32, damage_type: DamageType) -> Self {
        Self {
            attacker_position: Vec3::ZERO,
            target_position: Vec3::ZERO,
            subsystem: subsystem.into(),
            weapon: WeaponProfile::default(),
            damage_type,
            base_damage,
        }
    }

    pub fn from_position(mut self, attacker_position: Vec3) -> Self {
        self.attacker_position = attacker_position;
        self
    }

    pub fn against(mut self, target_position: Vec3) -> Self {
        self.target_position = target_position;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapon = weapon;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissReason {
    /// The hit-probability roll failed
    Accuracy,
    /// The shot landed but too far from the subsystem
    Deviation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetingOutcome {
    pub hit: bool,
    pub hit_probability: f32,
    /// Sampled aim error relative to the subsystem center
    pub offset: Vec3,
    pub penetrated: bool,
    /// Damage to apply before the damage-type table
    pub damage: f32,
    pub miss_reason: Option<MissReason>,
}

impl TargetingOutcome {
    fn miss(hit_probability: f32, offset: Vec3, reason: MissReason) -> Self {
        Self {
            hit: false,
            hit_probability,
            offset,
            penetrated: false,
            damage: 0.0,
            miss_reason: Some(reason),
        }
    }
}

/// Stateless resolver; all randomness comes from the caller's RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetingResolver;

impl TargetingResolver {
    pub fn new() -> Self {
        Self
    }

    /// Multiplier on accuracy from range alone
    pub fn range_falloff(weapon: &WeaponProfile, distance: f32) -> f32 {
        if distance <= weapon.optimal_range {
            1.0
        } else if distance <= weapon.max_range {
            let span = (weapon.max_range - weapon.optimal_range).max(f32::EPSILON);
            let t = (distance - weapon.optimal_range) / span;
            1.0 + (MAX_RANGE_ACCURACY - 1.0) * t
        } else {
            BEYOND_RANGE_ACCURACY
        }
    }

    /// Larger subsystems are easier to hit; the reference radius gives no bonus
    pub fn size_bonus(radius: f32) -> f32 {
        ((radius / REFERENCE_SUBSYSTEM_RADIUS - 1.0) * 0.25).clamp(-0.5, 0.5)
    }

    pub fn hit_probability(weapon: &WeaponProfile, distance: f32, radius: f32) -> f32 {
        let p = weapon.accuracy * Self::range_falloff(weapon, distance) * (1.0 + Self::size_bonus(radius));
        p.clamp(MIN_HIT_PROBABILITY, MAX_HIT_PROBABILITY)
    }

    /// Cosine between the reversed shot direction and the surface normal
    pub fn impact_angle_factor(incoming: Vec3, surface_normal: Vec3) -> f32 {
        let incoming = incoming.normalize_or_zero();
        let normal = surface_normal.normalize_or_zero();
        if incoming == Vec3::ZERO || normal == Vec3::ZERO {
            return 1.0;
        }
        (-incoming).dot(normal).max(MIN_IMPACT_ANGLE_FACTOR)
    }

    pub fn penetration_chance(penetration: f32, angle_factor: f32, armor_thickness: f32) -> f32 {
        if armor_thickness <= 0.0 {
            return 1.0;
        }
        (penetration * angle_factor / armor_thickness).clamp(0.0, 1.0)
    }

    /// Damage scale for a penetrating hit. Penetration exactly matching the
    /// armor gives the minimum; three times the armor gives the maximum.
    pub fn penetration_multiplier(penetration: f32, angle_factor: f32, armor_thickness: f32) -> f32 {
        if armor_thickness <= 0.0 {
            return MAX_PENETRATION_MULTIPLIER;
        }
        let margin = penetration * angle_factor / armor_thickness - 1.0;
        let span = MAX_PENETRATION_MULTIPLIER - MIN_PENETRATION_MULTIPLIER;
        (MIN_PENETRATION_MULTIPLIER + margin.max(0.0) * span / 2.0)
            .clamp(MIN_PENETRATION_MULTIPLIER, MAX_PENETRATION_MULTIPLIER)
    }

    /// Aim error spread; grows with distance and with inaccuracy
    pub fn spread(weapon: &WeaponProfile, distance: f32, radius: f32) -> f32 {
        let range = weapon.max_range.max(1.0);
        radius * (0.5 + (1.0 - weapon.accuracy.clamp(0.0, 1.0))) * (1.0 + distance / range)
    }

    pub fn resolve<R: Rng>(
        &self,
        attack: &TargetedAttack,
        subsystem: &Subsystem,
        rng: &mut R,
    ) -> TargetingOutcome {
        let aim_point = attack.target_position + subsystem.position;
        let distance = attack.attacker_position.distance(aim_point);
        let radius = subsystem.radius.max(f32::EPSILON);
        let hit_probability = Self::hit_probability(&attack.weapon, distance, radius);

        if rng.gen::<f32>() >= hit_probability {
            return TargetingOutcome::miss(hit_probability, Vec3::ZERO, MissReason::Accuracy);
        }

        // Sum of two uniforms per axis keeps the variance bounded
        let spread = Self::spread(&attack.weapon, distance, radius);
        let mut axis = || (rng.gen::<f32>() + rng.gen::<f32>() - 1.0) * spread;
        let offset = Vec3::new(axis(), axis(), axis());

        if offset.length() > MISS_RADIUS_FACTOR * radius {
            return TargetingOutcome::miss(hit_probability, offset, MissReason::Deviation);
        }

        let incoming = aim_point - attack.attacker_position;
        // Outward normal at the struck point of the subsystem's bounding sphere
        let surface_normal = offset - incoming.normalize_or_zero() * radius;
        let angle = Self::impact_angle_factor(incoming, surface_normal);
        let chance =
            Self::penetration_chance(attack.weapon.penetration, angle, subsystem.armor_thickness);
        let base = attack.base_damage.max(0.0);

        let (penetrated, damage) = if rng.gen::<f32>() < chance {
            let scale = Self::penetration_multiplier(
                attack.weapon.penetration,
                angle,
                subsystem.armor_thickness,
            );
            (true, base * scale)
        } else {
            (false, base * FAILED_PENETRATION_DAMAGE)
        };

        TargetingOutcome {
            hit: true,
            hit_probability,
            offset,
            penetrated,
            damage,
            miss_reason: None,
        }
    }
}
