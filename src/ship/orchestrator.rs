//! One ship's damage model: owns the clock, RNG, event bus and every manager
//!
//! Public operations run the managers in a fixed order and flush the event
//! bus once at the end, so subscribers see a consistent ship after each call.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::DamageConfig;
use crate::core::error::{DamageError, Result};
use crate::core::types::{ShipClass, ShipId, SimTime, SubsystemId};
use crate::damage::{
    DamageDistributor, DistributionMode, IncomingDamage, TargetedAttack, TargetingOutcome,
    TargetingResolver,
};
use crate::destruction::{DestructionCause, DestructionCoordinator};
use crate::performance::{PerformanceAggregates, PerformanceController, ShipModifiers};
use crate::repair::{
    RepairEconomy, RepairError, RepairPriority, RepairStart, RepairType, ResourceType, TaskId,
};
use crate::shields::{Quadrant, RechargeState, ShieldHit, ShieldQuadrantController};
use crate::ship::events::{EventBus, ShipEvent};
use crate::subsystem::{
    CriticalityClassifier, CriticalityLevel, ShipCriticalState, Subsystem, SubsystemRegistry,
    SubsystemSpec, SubsystemType, TacticalGoal,
};

/// Result of one `apply_damage` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DamageReport {
    /// None when the ship had no live shield generator
    pub shield: Option<ShieldHit>,
    /// Damage that got past the shields
    pub hull_damage: f32,
    pub mode: Option<DistributionMode>,
    /// Effective damage dealt per subsystem, in distribution order
    pub shares: Vec<(String, f32)>,
    pub destroyed: Vec<String>,
    pub events: Vec<ShipEvent>,
}

impl DamageReport {
    pub fn total_applied(&self) -> f32 {
        self.shares.iter().map(|(_, amount)| amount).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemStatus {
    pub name: String,
    pub subsystem_type: SubsystemType,
    pub health: f32,
    pub max_health: f32,
    pub performance: f32,
    pub effectiveness: f32,
    pub criticality: CriticalityLevel,
    pub functional: bool,
    pub destroyed: bool,
    pub repairing: bool,
    pub permanent_damage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrantStatus {
    pub quadrant: Quadrant,
    pub strength: f32,
    pub max_strength: f32,
    pub state: RechargeState,
}

/// Serializable snapshot of a ship for HUDs and reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipStatus {
    pub id: ShipId,
    pub name: String,
    pub ship_class: ShipClass,
    pub time: SimTime,
    pub critical_state: ShipCriticalState,
    pub critical_fraction: f32,
    pub destroyed_fraction: f32,
    pub catastrophic: bool,
    pub aggregates: PerformanceAggregates,
    pub modifiers: ShipModifiers,
    pub shields: Vec<QuadrantStatus>,
    pub subsystems: Vec<SubsystemStatus>,
    pub active_repairs: usize,
    pub queued_repairs: usize,
    pub resources: Vec<(ResourceType, f32)>,
}

#[derive(Debug)]
pub struct ShipDamageModel {
    id: ShipId,
    name: String,
    ship_class: ShipClass,
    config: DamageConfig,
    rng: ChaCha8Rng,
    now: SimTime,
    bus: EventBus,
    registry: SubsystemRegistry,
    distributor: DamageDistributor,
    targeting: TargetingResolver,
    shields: ShieldQuadrantController,
    destruction: DestructionCoordinator,
    performance: PerformanceController,
    criticality: CriticalityClassifier,
    repairs: RepairEconomy,
}

impl ShipDamageModel {
    /// Build a ship from a validated config and an RNG seed
    pub fn new(
        name: impl Into<String>,
        ship_class: ShipClass,
        config: DamageConfig,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(name.into(), ship_class, config, seed))
    }

    /// Default config, seeded
    pub fn with_seed(name: impl Into<String>, ship_class: ShipClass, seed: u64) -> Self {
        Self::build(name.into(), ship_class, DamageConfig::default(), seed)
    }

    fn build(name: String, ship_class: ShipClass, config: DamageConfig, seed: u64) -> Self {
        Self {
            id: ShipId::new(),
            name,
            ship_class,
            rng: ChaCha8Rng::seed_from_u64(seed),
            now: 0.0,
            bus: EventBus::new(),
            registry: SubsystemRegistry::new(),
            distributor: DamageDistributor::new(config.distribution.clone()),
            targeting: TargetingResolver::new(),
            shields: ShieldQuadrantController::new(config.shields.clone()),
            destruction: DestructionCoordinator::new(config.destruction.clone()),
            performance: PerformanceController::new(config.performance.clone()),
            criticality: CriticalityClassifier::new(ship_class, config.criticality.clone()),
            repairs: RepairEconomy::new(config.repair.clone()),
            config,
        }
    }

    pub fn id(&self) -> ShipId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ship_class(&self) -> ShipClass {
        self.ship_class
    }

    pub fn config(&self) -> &DamageConfig {
        &self.config
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn registry(&self) -> &SubsystemRegistry {
        &self.registry
    }

    pub fn repairs(&self) -> &RepairEconomy {
        &self.repairs
    }

    pub fn destruction(&self) -> &DestructionCoordinator {
        &self.destruction
    }

    pub fn shields(&self) -> &ShieldQuadrantController {
        &self.shields
    }

    // ---- registration ----

    pub fn register_subsystem(
        &mut self,
        name: &str,
        subsystem_type: SubsystemType,
        max_health: f32,
    ) -> Result<SubsystemId> {
        self.register_subsystem_spec(SubsystemSpec::new(name, subsystem_type, max_health))
    }

    pub fn register_subsystem_spec(&mut self, spec: SubsystemSpec) -> Result<SubsystemId> {
        let id = self.registry.register_spec(spec)?;
        self.criticality.on_registered(id, &mut self.registry);
        self.performance.recompute(&mut self.registry);
        self.criticality.rescore(&self.registry, &mut self.bus);
        self.bus.flush();
        Ok(id)
    }

    /// Declare that destroying `source` may cascade into `dependent`
    pub fn add_cascade_link(&mut self, source: &str, dependent: &str, probability: f32) -> Result<()> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            tracing::warn!("Rejected cascade link probability {}", probability);
            return Err(DamageError::InvalidArgument(format!(
                "cascade probability must be in [0, 1], got {}",
                probability
            )));
        }
        let source_id = self.registry.resolve(source)?;
        let dependent_id = self.registry.resolve(dependent)?;
        if source_id == dependent_id {
            tracing::warn!("Rejected self cascade link on '{}'", source);
            return Err(DamageError::InvalidArgument(format!(
                "'{}' cannot cascade into itself",
                source
            )));
        }
        self.destruction
            .add_cascade_link(source_id, dependent_id, probability);
        Ok(())
    }

    // ---- damage ----

    /// Run a hit through shields, distribution, destruction and repair
    /// cancellation, then flush events
    pub fn apply_damage(&mut self, event: IncomingDamage) -> DamageReport {
        if !event.amount.is_finite() || event.amount < 0.0 {
            tracing::warn!("Ignored damage event with amount {}", event.amount);
            return DamageReport::default();
        }

        let shield = self.absorb(&event);
        let hull_damage = shield.map(|hit| hit.overflow).unwrap_or(event.amount);

        let mut report = DamageReport {
            shield,
            hull_damage,
            ..Default::default()
        };

        let mut zeroed = Vec::new();
        if hull_damage > 0.0 {
            let hull_event = IncomingDamage {
                amount: hull_damage,
                ..event.clone()
            };
            let distribution = self.distributor.distribute(&hull_event, &self.registry);
            tracing::debug!(
                "{:?} distribution of {:.1} over {} subsystems",
                distribution.mode,
                hull_damage,
                distribution.shares.len()
            );
            report.mode = Some(distribution.mode);
            for share in distribution.shares {
                let change = self
                    .registry
                    .apply_effective_damage(share.id, share.amount, &mut self.bus);
                report
                    .shares
                    .push((self.registry.name(share.id).to_string(), change.health_lost()));
                if change.reached_zero {
                    zeroed.push(share.id);
                }
            }
        }

        let (destroyed, events) = self.settle(&zeroed, DestructionCause::Weapon(event.damage_type));
        report.destroyed = destroyed;
        report.events = events;
        report
    }

    /// Aimed shot at one named subsystem. Misses leave the ship untouched.
    pub fn fire_at_subsystem(&mut self, attack: TargetedAttack) -> Result<TargetingOutcome> {
        let id = self.registry.resolve(&attack.subsystem)?;
        let Some(subsystem) = self.registry.get(id) else {
            return Err(DamageError::UnknownSubsystem(attack.subsystem.clone()));
        };
        let aim_point = attack.target_position + subsystem.position;
        let outcome = self.targeting.resolve(&attack, subsystem, &mut self.rng);

        if !outcome.hit || outcome.damage <= 0.0 {
            tracing::debug!("Shot at '{}' missed: {:?}", attack.subsystem, outcome.miss_reason);
            return Ok(outcome);
        }

        let event = IncomingDamage::new(outcome.damage, attack.damage_type)
            .at(subsystem.position + outcome.offset)
            .travelling(aim_point - attack.attacker_position)
            .targeting(attack.subsystem.as_str());
        let hull_damage = self
            .absorb(&event)
            .map(|hit| hit.overflow)
            .unwrap_or(outcome.damage);

        let mut zeroed = Vec::new();
        if hull_damage > 0.0 {
            let change =
                self.registry
                    .apply_damage(&attack.subsystem, hull_damage, attack.damage_type, &mut self.bus)?;
            if change.reached_zero {
                zeroed.push(id);
            }
        }
        self.settle(&zeroed, DestructionCause::Weapon(attack.damage_type));
        Ok(outcome)
    }

    /// Shields only hold while a shield generator is still running
    fn absorb(&mut self, event: &IncomingDamage) -> Option<ShieldHit> {
        let powered = self
            .registry
            .iter()
            .any(|(_, s)| s.subsystem_type == SubsystemType::Shields && s.is_live());
        if !powered {
            return None;
        }
        Some(self.shields.apply_hit(event, self.now, &mut self.bus))
    }

    /// Everything after health changed: recompute, destruction, repair
    /// cancellation, recompute again, flush
    fn settle(&mut self, zeroed: &[SubsystemId], cause: DestructionCause) -> (Vec<String>, Vec<ShipEvent>) {
        self.performance.recompute(&mut self.registry);
        self.criticality.rescore(&self.registry, &mut self.bus);

        let destroyed = self.destruction.on_zero_health(
            zeroed,
            cause,
            self.now,
            &mut self.registry,
            &mut self.rng,
            &mut self.bus,
        );
        self.cancel_repairs_for(&destroyed);

        self.performance.recompute(&mut self.registry);
        self.criticality.rescore(&self.registry, &mut self.bus);

        let names = destroyed
            .iter()
            .map(|id| self.registry.name(*id).to_string())
            .collect();
        (names, self.bus.flush())
    }

    fn cancel_repairs_for(&mut self, destroyed: &[SubsystemId]) {
        for id in destroyed {
            if let Some(task) = self
                .repairs
                .cancel_for_subsystem(*id, &mut self.registry, &mut self.bus)
            {
                tracing::debug!("Repair {} dropped: '{}' destroyed", task, self.registry.name(*id));
            }
        }
    }

    // ---- repair ----

    pub fn repair_request(
        &mut self,
        name: &str,
        repair_type: RepairType,
        priority: RepairPriority,
    ) -> std::result::Result<RepairStart, RepairError> {
        let result = self.repairs.start_repair(
            name,
            repair_type,
            priority,
            self.now,
            &mut self.registry,
            &mut self.bus,
        );
        self.bus.flush();
        result
    }

    pub fn emergency_repair(&mut self, name: &str) -> std::result::Result<RepairStart, RepairError> {
        let result = self
            .repairs
            .emergency_repair(name, self.now, &mut self.registry, &mut self.bus);
        self.bus.flush();
        result
    }

    /// Returns whether resources were refunded
    pub fn cancel_repair(&mut self, task: TaskId) -> std::result::Result<bool, RepairError> {
        let result = self.repairs.cancel(task, &mut self.registry, &mut self.bus);
        self.bus.flush();
        result
    }

    pub fn add_resources(&mut self, resource: ResourceType, amount: f32) -> f32 {
        self.repairs.add_resources(resource, amount)
    }

    // ---- time ----

    /// Advance the ship by `dt` seconds and return the events emitted
    pub fn tick(&mut self, dt: f64) -> Vec<ShipEvent> {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!("Ignored tick with dt {}", dt);
            return Vec::new();
        }
        self.now += dt;

        let shield_effectiveness = self.performance.modifiers().shield_effectiveness;
        self.shields
            .update(self.now, dt, shield_effectiveness, &mut self.bus);

        let cascades = self.destruction.tick(
            self.now,
            &mut self.registry,
            &mut self.rng,
            &mut self.bus,
        );
        self.cancel_repairs_for(&cascades.destroyed);

        if cascades.applied > 0 {
            self.performance.recompute(&mut self.registry);
        } else {
            self.performance.tick(self.now, &mut self.registry);
        }

        if self
            .repairs
            .tick(self.now, dt, &mut self.registry, &mut self.bus)
        {
            self.performance.recompute(&mut self.registry);
        }

        self.criticality.rescore(&self.registry, &mut self.bus);
        self.bus.flush()
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ShipEvent) + Send + 'static,
    {
        self.bus.subscribe(callback);
    }

    // ---- queries ----

    pub fn is_functional(&self, name: &str) -> bool {
        self.registry.is_functional(name)
    }

    /// 0.0 for unknown subsystems
    pub fn health_percentage(&self, name: &str) -> f32 {
        self.registry.health_percentage(name).unwrap_or_else(|| {
            tracing::warn!("Health query for unknown subsystem '{}'", name);
            0.0
        })
    }

    pub fn get_best_targets(&self, goal: TacticalGoal, max_n: usize) -> Vec<String> {
        self.criticality.best_targets(&self.registry, goal, max_n)
    }

    pub fn get_ship_critical_state(&self) -> ShipCriticalState {
        self.criticality.state()
    }

    pub fn modifiers(&self) -> ShipModifiers {
        self.performance.modifiers()
    }

    pub fn aggregates(&self) -> PerformanceAggregates {
        self.performance.aggregates()
    }

    pub fn shield_strength(&self, quadrant: Quadrant) -> f32 {
        self.shields.strength(quadrant)
    }

    pub fn subsystem(&self, name: &str) -> Option<&Subsystem> {
        self.registry.get_by_name(name)
    }

    pub fn destroyed_fraction(&self) -> f32 {
        self.registry.destroyed_fraction()
    }

    pub fn status(&self) -> ShipStatus {
        ShipStatus {
            id: self.id,
            name: self.name.clone(),
            ship_class: self.ship_class,
            time: self.now,
            critical_state: self.criticality.state(),
            critical_fraction: self.criticality.critical_fraction(),
            destroyed_fraction: self.registry.destroyed_fraction(),
            catastrophic: self.destruction.is_catastrophic(),
            aggregates: self.performance.aggregates(),
            modifiers: self.performance.modifiers(),
            shields: self
                .shields
                .quadrants()
                .iter()
                .map(|q| QuadrantStatus {
                    quadrant: q.quadrant,
                    strength: q.strength,
                    max_strength: q.max_strength,
                    state: q.state,
                })
                .collect(),
            subsystems: self
                .registry
                .iter()
                .map(|(_, s)| SubsystemStatus {
                    name: s.name.clone(),
                    subsystem_type: s.subsystem_type,
                    health: s.current_health,
                    max_health: s.max_health,
                    performance: s.performance_factor,
                    effectiveness: s.effectiveness,
                    criticality: s.criticality,
                    functional: s.is_functional,
                    destroyed: s.is_destroyed,
                    repairing: s.is_repairing,
                    permanent_damage: s.permanent_damage,
                })
                .collect(),
            active_repairs: self.repairs.active_tasks().len(),
            queued_repairs: self.repairs.queued_tasks().len(),
            resources: ResourceType::all()
                .iter()
                .map(|r| (*r, self.repairs.resources().get(*r)))
                .collect(),
        }
    }

    /// Bring a destroyed subsystem back at full health, e.g. after a refit
    pub fn reset_subsystem(&mut self, name: &str) -> Result<()> {
        let id = self.registry.resolve(name)?;
        self.repairs
            .cancel_for_subsystem(id, &mut self.registry, &mut self.bus);
        self.registry.revive(id, &mut self.bus);
        self.destruction.reset(id, &self.registry);
        self.performance.recompute(&mut self.registry);
        self.criticality.rescore(&self.registry, &mut self.bus);
        self.bus.flush();
        Ok(())
    }
}
