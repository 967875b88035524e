//! Routing hull damage into subsystem shares
//!
//! Only a fixed fraction of every hit reaches internal hardware; the rest is
//! absorbed by structure. How that fraction is split depends on what kind
//! of hit it was.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::constants::{DIRECTED_PRIMARY_SHARE, SHOCKWAVE_STRUCTURAL_SHARE};
use super::modifiers::combined_modifier;
use crate::core::config::DistributionConfig;
use crate::core::types::{DamageType, SubsystemId};
use crate::subsystem::{Subsystem, SubsystemRegistry};

/// A hit landing on the ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingDamage {
    pub amount: f32,
    /// Ship-local impact point
    pub impact_position: Vec3,
    /// Direction the projectile or beam was travelling
    pub impact_direction: Vec3,
    pub damage_type: DamageType,
    pub target_subsystem: Option<String>,
    pub area_radius: Option<f32>,
    pub shockwave: bool,
    /// Precision hit that concentrates on the nearest subsystem
    pub directed: bool,
}

impl IncomingDamage {
    pub fn new(amount: f32, damage_type: DamageType) -> Self {
        Self {
            amount,
            impact_position: Vec3::ZERO,
            impact_direction: Vec3::ZERO,
            damage_type,
            target_subsystem: None,
            area_radius: None,
            shockwave: false,
            directed: false,
        }
    }

    pub fn at(mut self, impact_position: Vec3) -> Self {
        self.impact_position = impact_position;
        self
    }

    pub fn travelling(mut self, impact_direction: Vec3) -> Self {
        self.impact_direction = impact_direction;
        self
    }

    pub fn targeting(mut self, subsystem: impl Into<String>) -> Self {
        self.target_subsystem = Some(subsystem.into());
        self
    }

    pub fn with_area(mut self, radius: f32) -> Self {
        self.area_radius = Some(radius);
        self
    }

    pub fn as_shockwave(mut self) -> Self {
        self.shockwave = true;
        self
    }

    pub fn as_directed(mut self) -> Self {
        self.directed = true;
        self
    }

    /// Blast radius if this is area damage
    pub fn blast_radius(&self) -> Option<f32> {
        self.area_radius.filter(|r| *r > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionMode {
    Specific,
    Directed,
    Area,
    Shockwave,
    Proximity,
}

/// Damage allotted to one subsystem after every modifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageShare {
    pub id: SubsystemId,
    pub amount: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub mode: DistributionMode,
    pub shares: Vec<DamageShare>,
}

impl Distribution {
    pub fn total(&self) -> f32 {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DamageDistributor {
    config: DistributionConfig,
}

impl DamageDistributor {
    pub fn new(config: DistributionConfig) -> Self {
        Self { config }
    }

    pub fn select_mode(&self, event: &IncomingDamage) -> DistributionMode {
        if event.target_subsystem.is_some() {
            DistributionMode::Specific
        } else if event.shockwave {
            DistributionMode::Shockwave
        } else if event.blast_radius().is_some() {
            DistributionMode::Area
        } else if event.directed {
            DistributionMode::Directed
        } else {
            DistributionMode::Proximity
        }
    }

    /// Split `event` into per-subsystem shares. Nothing is applied here.
    pub fn distribute(&self, event: &IncomingDamage, registry: &SubsystemRegistry) -> Distribution {
        let mode = self.select_mode(event);
        let allotted = event.amount.max(0.0) * self.config.subsystem_fraction;

        let raw = if allotted <= 0.0 {
            Vec::new()
        } else {
            match mode {
                DistributionMode::Specific => self.specific(event, registry, allotted),
                DistributionMode::Directed => self.directed(event, registry, allotted),
                DistributionMode::Area => self.area(event, registry, allotted),
                DistributionMode::Shockwave => self.shockwave(registry, allotted),
                DistributionMode::Proximity => self.proximity(event, registry, allotted),
            }
        };

        let shares: Vec<DamageShare> = raw
            .into_iter()
            .filter_map(|(id, amount)| {
                let subsystem = registry.get(id)?;
                let amount = amount * combined_modifier(subsystem.subsystem_type, event.damage_type);
                (amount >= self.config.min_damage).then_some(DamageShare { id, amount })
            })
            .collect();

        tracing::debug!(
            "Distributed {:.1} damage via {:?} into {} shares",
            allotted,
            mode,
            shares.len()
        );

        Distribution { mode, shares }
    }

    fn specific(
        &self,
        event: &IncomingDamage,
        registry: &SubsystemRegistry,
        allotted: f32,
    ) -> Vec<(SubsystemId, f32)> {
        let Some(name) = event.target_subsystem.as_deref() else {
            return Vec::new();
        };
        match registry.resolve(name) {
            Ok(id) if registry.get(id).is_some_and(Subsystem::is_live) => vec![(id, allotted)],
            _ => Vec::new(),
        }
    }

    fn directed(
        &self,
        event: &IncomingDamage,
        registry: &SubsystemRegistry,
        allotted: f32,
    ) -> Vec<(SubsystemId, f32)> {
        let range = self.config.directed_search_range;
        let in_range = live_within(registry, event.impact_position, range);

        let Some(&(primary, _)) = in_range
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        else {
            return Vec::new();
        };

        let secondary: Vec<SubsystemId> = in_range
            .iter()
            .filter(|(id, d)| *id != primary && *d <= range * 0.5)
            .map(|(id, _)| *id)
            .collect();

        let mut shares = vec![(primary, allotted * DIRECTED_PRIMARY_SHARE)];
        if !secondary.is_empty() {
            let each = allotted * (1.0 - DIRECTED_PRIMARY_SHARE) / secondary.len() as f32;
            shares.extend(secondary.into_iter().map(|id| (id, each)));
        }
        shares
    }

    fn area(
        &self,
        event: &IncomingDamage,
        registry: &SubsystemRegistry,
        allotted: f32,
    ) -> Vec<(SubsystemId, f32)> {
        let Some(radius) = event.blast_radius() else {
            return Vec::new();
        };
        live_within(registry, event.impact_position, radius)
            .into_iter()
            .map(|(id, d)| (id, allotted * (1.0 - d / radius)))
            .collect()
    }

    fn shockwave(&self, registry: &SubsystemRegistry, allotted: f32) -> Vec<(SubsystemId, f32)> {
        let (structural, electronic): (Vec<_>, Vec<_>) = registry
            .iter()
            .filter(|(_, s)| s.is_live())
            .partition(|(_, s)| s.subsystem_type.is_structural());

        let mut shares = Vec::with_capacity(structural.len() + electronic.len());
        for (group, fraction) in [
            (structural, SHOCKWAVE_STRUCTURAL_SHARE),
            (electronic, 1.0 - SHOCKWAVE_STRUCTURAL_SHARE),
        ] {
            if group.is_empty() {
                continue;
            }
            let each = allotted * fraction / group.len() as f32;
            shares.extend(group.into_iter().map(|(id, _)| (id, each)));
        }
        shares
    }

    /// Inverse-distance weighting, normalized over subsystems in range only.
    /// Nothing in range means nothing is damaged.
    fn proximity(
        &self,
        event: &IncomingDamage,
        registry: &SubsystemRegistry,
        allotted: f32,
    ) -> Vec<(SubsystemId, f32)> {
        let weighted: Vec<(SubsystemId, f32)> =
            live_within(registry, event.impact_position, self.config.proximity_range)
                .into_iter()
                .map(|(id, d)| (id, 1.0 / (d + 1.0)))
                .collect();

        let total: f32 = weighted.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        weighted
            .into_iter()
            .map(|(id, w)| (id, allotted * w / total))
            .collect()
    }
}

/// Live subsystems whose center lies within `range` of `point`, with distances
fn live_within(registry: &SubsystemRegistry, point: Vec3, range: f32) -> Vec<(SubsystemId, f32)> {
    registry
        .iter()
        .filter(|(_, s)| s.is_live())
        .map(|(id, s)| (id, s.position.distance(point)))
        .filter(|(_, d)| *d <= range)
        .collect()
}
