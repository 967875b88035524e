//! Zero-health consequences: explosions, permanent damage and cascades
//!
//! Every destruction is processed through one worklist so that explosion
//! chains resolve breadth-first within the same call. Cascades are deferred
//! through the delay queue and fire on a later tick.

use std::collections::VecDeque;

use ahash::AHashMap;
use rand::Rng;

use super::cascade::{
    cascade_strength, explosion_cause_modifier, explosion_type_modifier, is_power_source,
    type_derived_edge, CascadeHit, CascadeLink,
};
use super::delay_queue::DelayQueue;
use super::{DestructionCause, DestructionRecord};
use crate::core::config::DestructionConfig;
use crate::core::types::{DamageType, SimTime, SubsystemId};
use crate::damage::constants::*;
use crate::damage::modifiers::damage_type_modifier;
use crate::ship::events::{EventBus, ShipEvent};
use crate::subsystem::{SubsystemRegistry, SubsystemType};

/// What one tick of the cascade queue did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeTick {
    /// Cascades that landed on an intact subsystem
    pub applied: usize,
    pub destroyed: Vec<SubsystemId>,
}

#[derive(Debug, Clone, Default)]
pub struct DestructionCoordinator {
    config: DestructionConfig,
    records: AHashMap<SubsystemId, DestructionRecord>,
    links: Vec<CascadeLink>,
    pending: DelayQueue<CascadeHit>,
    catastrophic: bool,
}

impl DestructionCoordinator {
    pub fn new(config: DestructionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn record(&self, id: SubsystemId) -> Option<&DestructionRecord> {
        self.records.get(&id)
    }

    pub fn is_catastrophic(&self) -> bool {
        self.catastrophic
    }

    pub fn links(&self) -> &[CascadeLink] {
        &self.links
    }

    pub fn pending_cascades(&self) -> impl Iterator<Item = (SimTime, &CascadeHit)> {
        self.pending.iter()
    }

    /// Add or replace the static edge between two subsystems
    pub fn add_cascade_link(&mut self, source: SubsystemId, dependent: SubsystemId, probability: f32) {
        let probability = probability.clamp(0.0, 1.0);
        if let Some(link) = self
            .links
            .iter_mut()
            .find(|l| l.source == source && l.dependent == dependent)
        {
            link.probability = probability;
            return;
        }
        self.links.push(CascadeLink {
            source,
            dependent,
            probability,
        });
    }

    pub fn explosion_chance(&self, subsystem_type: SubsystemType, cause: DestructionCause) -> f32 {
        (self.config.base_explosion_chance
            * explosion_type_modifier(subsystem_type)
            * explosion_cause_modifier(cause))
        .min(self.config.max_explosion_chance)
    }

    /// Roll chance for one edge. `static_probability` is set for explicit links.
    pub fn cascade_chance(&self, source: SubsystemType, static_probability: Option<f32>) -> f32 {
        let (bonus, probability) = match static_probability {
            Some(p) => (STATIC_EDGE_CASCADE_BONUS, p),
            None => (1.0, 1.0),
        };
        (self.config.cascade_failure_chance * cascade_strength(source) * bonus * probability)
            .clamp(0.0, 1.0)
    }

    /// Process subsystems that just reached zero health. Returns every
    /// subsystem destroyed by this call, including explosion chains.
    pub fn on_zero_health<R: Rng>(
        &mut self,
        ids: &[SubsystemId],
        cause: DestructionCause,
        now: SimTime,
        registry: &mut SubsystemRegistry,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> Vec<SubsystemId> {
        let mut worklist: VecDeque<(SubsystemId, DestructionCause)> =
            ids.iter().map(|id| (*id, cause)).collect();
        let mut destroyed = Vec::new();

        while let Some((id, cause)) = worklist.pop_front() {
            if self.records.contains_key(&id) {
                continue;
            }
            let Some(subsystem) = registry.get(id) else {
                continue;
            };
            if subsystem.current_health > 0.0 && !subsystem.is_destroyed {
                continue;
            }
            let name = subsystem.name.clone();
            let subsystem_type = subsystem.subsystem_type;
            let max_health = subsystem.max_health;

            registry.mark_destroyed(id);

            let exploded = rng.gen::<f32>() < self.explosion_chance(subsystem_type, cause);
            let permanent = rng.gen::<f32>() < self.config.permanent_damage_chance;
            if permanent {
                registry.apply_permanent_damage(id, self.config.permanent_performance_ceiling);
            }

            tracing::info!("Subsystem '{}' destroyed by {}", name, cause);
            bus.emit(ShipEvent::SubsystemDestroyed {
                subsystem: name.clone(),
                cause,
                time: now,
                permanent,
            });

            if exploded {
                for victim in self.explode(id, &name, max_health, registry, bus) {
                    worklist.push_back((victim, DestructionCause::Explosion));
                }
            }

            let cascaded = self.schedule_cascades(id, &name, subsystem_type, now, registry, rng, bus);

            self.records.insert(
                id,
                DestructionRecord {
                    subsystem: id,
                    cause,
                    time: now,
                    exploded,
                    cascaded,
                    permanent,
                },
            );
            destroyed.push(id);
        }

        if !destroyed.is_empty() {
            self.check_catastrophic(registry, bus);
        }
        destroyed
    }

    /// Fire due cascades
    pub fn tick<R: Rng>(
        &mut self,
        now: SimTime,
        registry: &mut SubsystemRegistry,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> CascadeTick {
        let mut result = CascadeTick::default();
        for hit in self.pending.drain_due(now) {
            let Some(dependent) = registry.get(hit.dependent) else {
                continue;
            };
            if dependent.is_destroyed {
                tracing::debug!(
                    "Cascade into '{}' skipped: already destroyed",
                    dependent.name
                );
                continue;
            }

            let change = registry.apply_effective_damage(hit.dependent, hit.damage, bus);
            result.applied += 1;
            tracing::info!(
                "Cascade from '{}' hit '{}' for {:.1}",
                registry.name(hit.source),
                registry.name(hit.dependent),
                change.health_lost()
            );
            bus.emit(ShipEvent::CascadeDamageApplied {
                source: registry.name(hit.source).to_string(),
                dependent: registry.name(hit.dependent).to_string(),
                damage: change.health_lost(),
            });

            if change.reached_zero {
                result.destroyed.extend(self.on_zero_health(
                    &[hit.dependent],
                    DestructionCause::Cascade,
                    now,
                    registry,
                    rng,
                    bus,
                ));
            }
        }
        result
    }

    /// Forget a destruction so the subsystem can be destroyed again, and
    /// drop any cascades still aimed at it
    pub fn reset(&mut self, id: SubsystemId, registry: &SubsystemRegistry) {
        self.records.remove(&id);
        self.pending.retain(|hit| hit.dependent != id);
        if registry.destroyed_fraction() < self.config.catastrophic_threshold {
            self.catastrophic = false;
        }
    }

    /// Splash the source's blast over every other intact subsystem.
    /// Returns the ones it brought to zero.
    fn explode(
        &self,
        source: SubsystemId,
        name: &str,
        max_health: f32,
        registry: &mut SubsystemRegistry,
        bus: &mut EventBus,
    ) -> Vec<SubsystemId> {
        let splash = max_health * self.config.explosion_splash_fraction;
        let targets: Vec<(SubsystemId, SubsystemType, String)> = registry
            .iter()
            .filter(|(id, s)| *id != source && s.is_live() && s.current_health > 0.0)
            .map(|(id, s)| (id, s.subsystem_type, s.name.clone()))
            .collect();

        tracing::info!(
            "'{}' exploded: {:.1} splash to {} subsystems",
            name,
            splash,
            targets.len()
        );
        bus.emit(ShipEvent::Explosion {
            source: name.to_string(),
            splash_damage: splash,
            affected: targets.iter().map(|(_, _, n)| n.clone()).collect(),
        });

        targets
            .into_iter()
            .filter_map(|(id, subsystem_type, _)| {
                let amount = splash * damage_type_modifier(subsystem_type, DamageType::Explosive);
                registry
                    .apply_effective_damage(id, amount, bus)
                    .reached_zero
                    .then_some(id)
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn schedule_cascades<R: Rng>(
        &mut self,
        source: SubsystemId,
        name: &str,
        source_type: SubsystemType,
        now: SimTime,
        registry: &SubsystemRegistry,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> bool {
        let power_scale = if is_power_source(name, source_type) {
            POWER_SOURCE_CASCADE_SCALE
        } else {
            1.0
        };

        let mut scheduled = false;
        for (dependent, subsystem) in registry.iter() {
            if dependent == source || !subsystem.is_live() || subsystem.current_health <= 0.0 {
                continue;
            }
            let static_probability = self
                .links
                .iter()
                .find(|l| l.source == source && l.dependent == dependent)
                .map(|l| l.probability);
            if static_probability.is_none()
                && !type_derived_edge(source_type, subsystem.subsystem_type)
            {
                continue;
            }

            let chance = self.cascade_chance(source_type, static_probability);
            if rng.gen::<f32>() >= chance {
                continue;
            }

            let fraction = rng.gen_range(CASCADE_MIN_DAMAGE_FRACTION..=CASCADE_MAX_DAMAGE_FRACTION);
            let damage = (subsystem.max_health * fraction * power_scale).min(subsystem.max_health);
            let delay = rng.gen_range(CASCADE_MIN_DELAY..=CASCADE_MAX_DELAY);

            self.pending.schedule(
                now + delay,
                CascadeHit {
                    source,
                    dependent,
                    damage,
                    scheduled_at: now,
                },
            );
            tracing::info!(
                "Cascade scheduled: '{}' -> '{}' in {:.2}s",
                name,
                subsystem.name,
                delay
            );
            bus.emit(ShipEvent::CascadeTriggered {
                source: name.to_string(),
                dependent: subsystem.name.clone(),
                delay,
            });
            scheduled = true;
        }
        scheduled
    }

    fn check_catastrophic(&mut self, registry: &SubsystemRegistry, bus: &mut EventBus) {
        let fraction = registry.destroyed_fraction();
        if !self.catastrophic && fraction >= self.config.catastrophic_threshold {
            self.catastrophic = true;
            tracing::info!("Catastrophic failure: {:.0}% of subsystems destroyed", fraction * 100.0);
            bus.emit(ShipEvent::CatastrophicFailure {
                destroyed_fraction: fraction,
            });
        }
    }
}
