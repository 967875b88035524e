//! Bounded-concurrency repair scheduling
//!
//! Scheduled repairs share a fixed number of slots; the rest wait in a
//! queue ordered by priority, then request order. Emergency repairs run
//! outside the slots but are rate limited by a cooldown.

use super::resources::{ResourcePool, ResourceType};
use super::task::{RepairPriority, RepairTask, RepairType, TaskId};
use super::{RepairError, RepairStart};
use crate::core::config::RepairConfig;
use crate::core::types::{SimTime, SubsystemId};
use crate::damage::constants::*;
use crate::ship::events::{EventBus, ShipEvent};
use crate::subsystem::SubsystemRegistry;

#[derive(Debug, Clone)]
pub struct RepairEconomy {
    config: RepairConfig,
    resources: ResourcePool,
    active: Vec<RepairTask>,
    /// Kept sorted: priority descending, then request order
    queue: Vec<RepairTask>,
    next_id: u64,
    last_emergency: Option<SimTime>,
    last_auto_repair: SimTime,
}

impl RepairEconomy {
    pub fn new(config: RepairConfig) -> Self {
        let resources = ResourcePool::from_config(&config);
        Self {
            config,
            resources,
            active: Vec::new(),
            queue: Vec::new(),
            next_id: 1,
            last_emergency: None,
            last_auto_repair: 0.0,
        }
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn active_tasks(&self) -> &[RepairTask] {
        &self.active
    }

    pub fn queued_tasks(&self) -> &[RepairTask] {
        &self.queue
    }

    pub fn task(&self, id: TaskId) -> Option<&RepairTask> {
        self.active.iter().chain(self.queue.iter()).find(|t| t.id == id)
    }

    pub fn task_for(&self, subsystem: SubsystemId) -> Option<&RepairTask> {
        self.active
            .iter()
            .chain(self.queue.iter())
            .find(|t| t.subsystem == subsystem)
    }

    fn slots_in_use(&self) -> usize {
        self.active.iter().filter(|t| t.uses_slot()).count()
    }

    /// Seconds until another emergency repair is allowed
    pub fn emergency_cooldown_remaining(&self, now: SimTime) -> f64 {
        self.last_emergency
            .map(|last| (EMERGENCY_REPAIR_COOLDOWN - (now - last)).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn add_resources(&mut self, resource: ResourceType, amount: f32) -> f32 {
        let added = self.resources.add(resource, amount);
        if added <= 0.0 {
            tracing::warn!("Ignored non-positive {} delivery: {}", resource, amount);
        }
        added
    }

    /// Request a scheduled repair. Emergency requests go through
    /// `emergency_repair` and its cooldown.
    pub fn start_repair(
        &mut self,
        name: &str,
        repair_type: RepairType,
        priority: RepairPriority,
        now: SimTime,
        registry: &mut SubsystemRegistry,
        bus: &mut EventBus,
    ) -> Result<RepairStart, RepairError> {
        if repair_type == RepairType::Emergency {
            return self.emergency_repair(name, now, registry, bus);
        }

        let (id, deficit) = self.check_eligible(name, registry)?;
        let cost = repair_type.cost_modifier();
        let requirements = [
            (ResourceType::Materials, deficit * MATERIALS_PER_HP * cost),
            (ResourceType::SpareParts, deficit * SPARE_PARTS_PER_HP * cost),
        ];
        self.consume(name, &requirements)?;

        let task = self.new_task(id, repair_type, priority, deficit, &requirements, now);
        let task_id = task.id;

        let start = if self.slots_in_use() < self.config.max_concurrent {
            registry.set_repairing(id, true);
            self.active.push(task);
            RepairStart::Active(task_id)
        } else {
            self.enqueue(task);
            RepairStart::Queued(task_id)
        };

        tracing::debug!(
            "{} repair {} on '{}' ({})",
            repair_type,
            task_id,
            name,
            if start.is_queued() { "queued" } else { "active" }
        );
        bus.emit(ShipEvent::RepairStarted {
            subsystem: name.to_string(),
            task: task_id,
            repair_type,
            queued: start.is_queued(),
        });
        Ok(start)
    }

    /// Immediate repair outside the concurrency cap, paid from emergency
    /// supplies and gated by a cooldown
    pub fn emergency_repair(
        &mut self,
        name: &str,
        now: SimTime,
        registry: &mut SubsystemRegistry,
        bus: &mut EventBus,
    ) -> Result<RepairStart, RepairError> {
        let remaining = self.emergency_cooldown_remaining(now);
        if remaining > 0.0 {
            tracing::warn!("Emergency repair on '{}' refused: {:.1}s cooldown left", name, remaining);
            return Err(RepairError::EmergencyCooldown { remaining });
        }

        let (id, deficit) = self.check_eligible(name, registry)?;
        let requirements = [(ResourceType::EmergencySupplies, deficit * EMERGENCY_SUPPLIES_PER_HP)];
        self.consume(name, &requirements)?;

        let task = self.new_task(
            id,
            RepairType::Emergency,
            RepairPriority::Critical,
            deficit,
            &requirements,
            now,
        );
        let task_id = task.id;
        registry.set_repairing(id, true);
        self.active.push(task);
        self.last_emergency = Some(now);

        tracing::info!("Emergency repair {} on '{}'", task_id, name);
        bus.emit(ShipEvent::RepairStarted {
            subsystem: name.to_string(),
            task: task_id,
            repair_type: RepairType::Emergency,
            queued: false,
        });
        Ok(RepairStart::Active(task_id))
    }

    /// Cancel a task. Returns whether anything was refunded.
    pub fn cancel(
        &mut self,
        task_id: TaskId,
        registry: &mut SubsystemRegistry,
        bus: &mut EventBus,
    ) -> Result<bool, RepairError> {
        let task = if let Some(pos) = self.active.iter().position(|t| t.id == task_id) {
            self.active.remove(pos)
        } else if let Some(pos) = self.queue.iter().position(|t| t.id == task_id) {
            self.queue.remove(pos)
        } else {
            tracing::warn!("Cancel for unknown repair task {}", task_id);
            return Err(RepairError::UnknownTask(task_id));
        };

        let refunded = task.progress() < REFUND_PROGRESS_LIMIT;
        if refunded {
            for (resource, amount) in &task.consumed {
                self.resources.add(*resource, amount * REFUND_FRACTION);
            }
        }
        registry.set_repairing(task.subsystem, false);

        tracing::debug!(
            "Repair {} on '{}' cancelled at {:.0}% (refund: {})",
            task_id,
            registry.name(task.subsystem),
            task.progress() * 100.0,
            refunded
        );
        bus.emit(ShipEvent::RepairCancelled {
            subsystem: registry.name(task.subsystem).to_string(),
            task: task_id,
            refunded,
        });

        self.promote(registry, bus);
        Ok(refunded)
    }

    /// Cancel whatever repair targets `subsystem`, e.g. after it is destroyed
    pub fn cancel_for_subsystem(
        &mut self,
        subsystem: SubsystemId,
        registry: &mut SubsystemRegistry,
        bus: &mut EventBus,
    ) -> Option<TaskId> {
        let task_id = self.task_for(subsystem)?.id;
        self.cancel(task_id, registry, bus).ok()?;
        Some(task_id)
    }

    /// Advance active repairs by `dt`, promote queued work and run the
    /// auto-repair sweep. Returns whether any health changed.
    pub fn tick(
        &mut self,
        now: SimTime,
        dt: f64,
        registry: &mut SubsystemRegistry,
        bus: &mut EventBus,
    ) -> bool {
        let mut changed = false;
        let mut finished = Vec::new();

        for task in self.active.iter_mut() {
            task.elapsed += dt.max(0.0);
            let target = task.health_to_restore * task.progress();
            let delta = target - task.restored;
            if delta > 0.0 {
                let change = registry.repair_id(task.subsystem, delta, bus);
                task.restored = target;
                changed |= change.current_health != change.previous_health;
            }
            if task.is_complete() {
                finished.push(task.id);
            }
        }

        for task_id in finished {
            if let Some(pos) = self.active.iter().position(|t| t.id == task_id) {
                let task = self.active.remove(pos);
                registry.set_repairing(task.subsystem, false);
                tracing::debug!(
                    "Repair {} on '{}' complete: +{:.1}",
                    task.id,
                    registry.name(task.subsystem),
                    task.restored
                );
                bus.emit(ShipEvent::SubsystemRepaired {
                    subsystem: registry.name(task.subsystem).to_string(),
                    task: task.id,
                    restored: task.restored,
                });
            }
        }

        self.promote(registry, bus);

        if self.config.auto_repair && now - self.last_auto_repair >= self.config.auto_repair_interval {
            self.last_auto_repair = now;
            self.auto_repair(now, registry, bus);
        }

        changed
    }

    /// Queue a low-priority repair for the most damaged eligible subsystem
    fn auto_repair(&mut self, now: SimTime, registry: &mut SubsystemRegistry, bus: &mut EventBus) {
        let candidate = registry
            .iter()
            .filter(|(id, s)| {
                s.is_live()
                    && !s.permanent_damage
                    && s.health_deficit() > 0.0
                    && s.health_percentage() < self.config.auto_repair_threshold
                    && self.task_for(*id).is_none()
            })
            .min_by(|a, b| {
                a.1.health_percentage()
                    .partial_cmp(&b.1.health_percentage())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(_, s)| s.name.clone());

        if let Some(name) = candidate {
            if let Err(e) = self.start_repair(&name, RepairType::Auto, RepairPriority::Low, now, registry, bus) {
                tracing::debug!("Auto-repair skipped '{}': {}", name, e);
            }
        }
    }

    fn promote(&mut self, registry: &mut SubsystemRegistry, bus: &mut EventBus) {
        while self.slots_in_use() < self.config.max_concurrent && !self.queue.is_empty() {
            let task = self.queue.remove(0);
            registry.set_repairing(task.subsystem, true);
            tracing::debug!("Repair {} promoted from queue", task.id);
            bus.emit(ShipEvent::RepairStarted {
                subsystem: registry.name(task.subsystem).to_string(),
                task: task.id,
                repair_type: task.repair_type,
                queued: false,
            });
            self.active.push(task);
        }
    }

    fn enqueue(&mut self, task: RepairTask) {
        // Stable: equal priorities keep request order
        let pos = self
            .queue
            .iter()
            .position(|t| t.priority < task.priority)
            .unwrap_or(self.queue.len());
        self.queue.insert(pos, task);
    }

    fn check_eligible(
        &self,
        name: &str,
        registry: &SubsystemRegistry,
    ) -> Result<(SubsystemId, f32), RepairError> {
        let reject = |e: RepairError| {
            tracing::warn!("Repair request rejected: {}", e);
            e
        };
        let Some(id) = registry.id(name) else {
            return Err(reject(RepairError::UnknownSubsystem(name.to_string())));
        };
        let Some(subsystem) = registry.get(id) else {
            return Err(reject(RepairError::UnknownSubsystem(name.to_string())));
        };
        if subsystem.is_destroyed {
            return Err(reject(RepairError::SubsystemDestroyed(name.to_string())));
        }
        if subsystem.permanent_damage {
            return Err(reject(RepairError::PermanentlyDamaged(name.to_string())));
        }
        let deficit = subsystem.health_deficit();
        if deficit <= 0.0 {
            return Err(reject(RepairError::AlreadyAtFullHealth(name.to_string())));
        }
        if self.task_for(id).is_some() {
            return Err(reject(RepairError::AlreadyQueued(name.to_string())));
        }
        Ok((id, deficit))
    }

    fn consume(&mut self, name: &str, requirements: &[(ResourceType, f32)]) -> Result<(), RepairError> {
        if let Some((resource, required, available)) = self.resources.shortfall(requirements) {
            tracing::warn!(
                "Repair on '{}' rejected: need {:.1} {}, have {:.1}",
                name,
                required,
                resource,
                available
            );
            return Err(RepairError::InsufficientResources {
                resource,
                required,
                available,
            });
        }
        self.resources.consume_materials(requirements);
        Ok(())
    }

    fn new_task(
        &mut self,
        subsystem: SubsystemId,
        repair_type: RepairType,
        priority: RepairPriority,
        deficit: f32,
        consumed: &[(ResourceType, f32)],
        now: SimTime,
    ) -> RepairTask {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let duration = (deficit * self.config.seconds_per_hp * repair_type.duration_modifier())
            .max(MIN_REPAIR_DURATION);
        RepairTask {
            id,
            subsystem,
            repair_type,
            priority,
            duration: duration as f64,
            elapsed: 0.0,
            health_to_restore: deficit * repair_type.effectiveness(),
            restored: 0.0,
            consumed: consumed.to_vec(),
            requested_at: now,
        }
    }
}

impl Default for RepairEconomy {
    fn default() -> Self {
        Self::new(RepairConfig::default())
    }
}
