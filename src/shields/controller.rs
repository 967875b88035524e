//! Shield absorption, spill and the recharge state machine

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::quadrant::{Quadrant, RechargeState, ShieldQuadrant, ShipFrame};
use crate::core::config::ShieldConfig;
use crate::core::types::SimTime;
use crate::damage::constants::{SHIELD_ADJACENT_SPILL, SHIELD_OPPOSITE_SPILL};
use crate::damage::IncomingDamage;
use crate::ship::events::{EventBus, ShipEvent};

/// What the shields did with one hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldHit {
    pub quadrant: Quadrant,
    /// Absorbed by the primary quadrant
    pub absorbed: f32,
    /// Absorbed by neighbouring quadrants from area spill
    pub spill_absorbed: f32,
    /// Primary-hit damage that passes through to the hull
    pub overflow: f32,
}

#[derive(Debug, Clone)]
pub struct ShieldQuadrantController {
    quadrants: [ShieldQuadrant; 4],
    frame: ShipFrame,
    config: ShieldConfig,
}

impl ShieldQuadrantController {
    pub fn new(config: ShieldConfig) -> Self {
        let quadrants = Quadrant::ALL.map(|q| ShieldQuadrant::new(q, config.max_strength));
        Self {
            quadrants,
            frame: ShipFrame::default(),
            config,
        }
    }

    pub fn with_frame(mut self, frame: ShipFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> &ShieldQuadrant {
        &self.quadrants[quadrant.index()]
    }

    pub fn strength(&self, quadrant: Quadrant) -> f32 {
        self.quadrant(quadrant).strength
    }

    pub fn state(&self, quadrant: Quadrant) -> RechargeState {
        self.quadrant(quadrant).state
    }

    pub fn total_strength(&self) -> f32 {
        self.quadrants.iter().map(|q| q.strength).sum()
    }

    pub fn quadrants(&self) -> &[ShieldQuadrant; 4] {
        &self.quadrants
    }

    /// Sector the hit came from. Uses the reverse of the travel direction,
    /// then the impact position; a hit with neither lands on the front.
    pub fn quadrant_for(&self, event: &IncomingDamage) -> Quadrant {
        let from = if event.impact_direction != Vec3::ZERO {
            -event.impact_direction
        } else {
            event.impact_position
        };
        self.frame
            .signed_angle(from)
            .map(Quadrant::from_angle)
            .unwrap_or(Quadrant::Front)
    }

    /// Run a hit through the shields, returning what passes to the hull
    pub fn apply_hit(&mut self, event: &IncomingDamage, now: SimTime, bus: &mut EventBus) -> ShieldHit {
        let quadrant = self.quadrant_for(event);
        let amount = if event.amount.is_finite() {
            event.amount.max(0.0)
        } else {
            0.0
        };

        let (absorbed, overflow) = self.absorb_into(quadrant, amount, now, bus);

        let mut spill_absorbed = 0.0;
        if event
            .blast_radius()
            .is_some_and(|radius| radius > self.config.spill_radius)
        {
            for neighbour in quadrant.adjacent() {
                spill_absorbed += self.absorb_into(neighbour, amount * SHIELD_ADJACENT_SPILL, now, bus).0;
            }
            spill_absorbed += self
                .absorb_into(quadrant.opposite(), amount * SHIELD_OPPOSITE_SPILL, now, bus)
                .0;
        }

        tracing::debug!(
            "Shield {} absorbed {:.1} (+{:.1} spill), {:.1} passes through",
            quadrant,
            absorbed,
            spill_absorbed,
            overflow
        );

        ShieldHit {
            quadrant,
            absorbed,
            spill_absorbed,
            overflow,
        }
    }

    fn absorb_into(
        &mut self,
        quadrant: Quadrant,
        amount: f32,
        now: SimTime,
        bus: &mut EventBus,
    ) -> (f32, f32) {
        if amount <= 0.0 {
            return (0.0, 0.0);
        }
        let q = &mut self.quadrants[quadrant.index()];
        let was_up = !q.is_depleted();
        let result = q.absorb(amount);

        q.last_damage = Some(now);
        let next = match q.state {
            RechargeState::Delay | RechargeState::Interrupted => {
                q.timer_start = now;
                q.state
            }
            RechargeState::Active => {
                q.timer_start = now;
                RechargeState::Interrupted
            }
            RechargeState::Idle => RechargeState::Idle,
        };
        Self::transition(q, next, bus);

        if was_up && q.is_depleted() {
            bus.emit(ShipEvent::ShieldQuadrantDepleted { quadrant });
        }
        result
    }

    /// Advance every quadrant one step. `effectiveness` scales recharge.
    pub fn update(&mut self, now: SimTime, dt: f64, effectiveness: f32, bus: &mut EventBus) {
        let delay = self.config.recharge_delay;
        let charge = self.config.recharge_rate * effectiveness.clamp(0.0, 1.0) * dt.max(0.0) as f32;

        for q in self.quadrants.iter_mut() {
            let next = match q.state {
                RechargeState::Idle
                    if q.strength < q.max_strength && q.undamaged_for(now, delay) =>
                {
                    q.timer_start = now;
                    RechargeState::Delay
                }
                RechargeState::Idle => RechargeState::Idle,
                RechargeState::Delay if q.seconds_since(now) >= delay => RechargeState::Active,
                RechargeState::Delay => RechargeState::Delay,
                RechargeState::Active => {
                    q.strength = (q.strength + charge).min(q.max_strength);
                    if q.strength >= q.max_strength {
                        RechargeState::Idle
                    } else {
                        RechargeState::Active
                    }
                }
                RechargeState::Interrupted if q.seconds_since(now) >= delay => RechargeState::Idle,
                RechargeState::Interrupted => RechargeState::Interrupted,
            };
            Self::transition(q, next, bus);
        }

        if self.config.auto_balance {
            self.balance(dt);
        }
    }

    /// Move strength toward the mean; each quadrant moves at most
    /// `balance_rate * dt` and the total is conserved
    fn balance(&mut self, dt: f64) {
        let cap = self.config.balance_rate * dt.max(0.0) as f32;
        if cap <= 0.0 {
            return;
        }
        let mean = self.total_strength() / self.quadrants.len() as f32;
        let desired = self
            .quadrants
            .each_ref()
            .map(|q| (mean - q.strength).clamp(-cap, cap));

        let gains: f32 = desired.iter().filter(|d| **d > 0.0).sum();
        let losses: f32 = -desired.iter().filter(|d| **d < 0.0).sum::<f32>();
        let transfer = gains.min(losses);
        if transfer <= f32::EPSILON {
            return;
        }

        for (q, delta) in self.quadrants.iter_mut().zip(desired) {
            let scaled = if delta > 0.0 {
                delta * transfer / gains
            } else {
                delta * transfer / losses
            };
            q.strength = (q.strength + scaled).clamp(0.0, q.max_strength);
        }
    }

    fn transition(q: &mut ShieldQuadrant, next: RechargeState, bus: &mut EventBus) {
        if q.state == next {
            return;
        }
        tracing::debug!("Shield {} recharge {} -> {}", q.quadrant, q.state, next);
        bus.emit(ShipEvent::ShieldRechargeStateChanged {
            quadrant: q.quadrant,
            previous: q.state,
            current: next,
        });
        q.state = next;
    }
}

impl Default for ShieldQuadrantController {
    fn default() -> Self {
        Self::new(ShieldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DamageType;
    use crate::damage::constants::SHIELD_RECHARGE_DELAY;

    fn head_on(amount: f32) -> IncomingDamage {
        IncomingDamage::new(amount, DamageType::Kinetic)
            .at(Vec3::new(0.0, 20.0, 0.0))
            .travelling(Vec3::NEG_Y)
    }

    fn run(shields: &mut ShieldQuadrantController, from: f64, to: f64, dt: f64, bus: &mut EventBus) {
        let mut t = from;
        while t < to - 1e-9 {
            t += dt;
            shields.update(t, dt, 1.0, bus);
        }
    }

    #[test]
    fn test_hit_from_ahead_only_reduces_front() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        let hit = shields.apply_hit(&head_on(300.0), 0.0, &mut bus);
        assert_eq!(hit.quadrant, Quadrant::Front);
        assert_eq!(hit.absorbed, 300.0);
        assert_eq!(hit.overflow, 0.0);
        assert_eq!(shields.strength(Quadrant::Front), 700.0);
        for q in [Quadrant::Left, Quadrant::Right, Quadrant::Rear] {
            assert_eq!(shields.strength(q), 1000.0);
        }
    }

    #[test]
    fn test_direction_falls_back_to_position() {
        let shields = ShieldQuadrantController::default();
        let from_port = IncomingDamage::new(10.0, DamageType::Energy).at(Vec3::new(-30.0, 0.0, 0.0));
        assert_eq!(shields.quadrant_for(&from_port), Quadrant::Left);
        let from_behind = IncomingDamage::new(10.0, DamageType::Energy).at(Vec3::new(0.0, -30.0, 0.0));
        assert_eq!(shields.quadrant_for(&from_behind), Quadrant::Rear);
        // Travelling toward -X means it came from starboard
        let from_starboard = IncomingDamage::new(10.0, DamageType::Energy).travelling(Vec3::NEG_X);
        assert_eq!(shields.quadrant_for(&from_starboard), Quadrant::Right);
    }

    #[test]
    fn test_overflow_and_depletion_event() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        let hit = shields.apply_hit(&head_on(1250.0), 0.0, &mut bus);
        assert_eq!(hit.absorbed, 1000.0);
        assert_eq!(hit.overflow, 250.0);
        assert!(bus.pending().contains(&ShipEvent::ShieldQuadrantDepleted {
            quadrant: Quadrant::Front
        }));
    }

    #[test]
    fn test_area_spill() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        let blast = head_on(500.0).with_area(20.0);
        let hit = shields.apply_hit(&blast, 0.0, &mut bus);
        assert_eq!(shields.strength(Quadrant::Front), 500.0);
        assert_eq!(shields.strength(Quadrant::Left), 900.0);
        assert_eq!(shields.strength(Quadrant::Right), 900.0);
        assert_eq!(shields.strength(Quadrant::Rear), 950.0);
        assert_eq!(hit.spill_absorbed, 250.0);

        // Small blasts do not spill
        let mut shields = ShieldQuadrantController::default();
        shields.apply_hit(&head_on(500.0).with_area(5.0), 0.0, &mut bus);
        assert_eq!(shields.strength(Quadrant::Left), 1000.0);
    }

    #[test]
    fn test_recharge_cycle() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        shields.apply_hit(&head_on(100.0), 0.0, &mut bus);
        run(&mut shields, 0.0, 2.5, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Idle);

        shields.update(3.0, 0.5, 1.0, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Delay);

        run(&mut shields, 3.0, 5.5, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Delay);
        assert_eq!(shields.strength(Quadrant::Front), 900.0);

        shields.update(6.0, 0.5, 1.0, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Active);

        // 100 points at 50/s takes two more seconds
        run(&mut shields, 6.0, 8.0, 0.5, &mut bus);
        assert_eq!(shields.strength(Quadrant::Front), 1000.0);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Idle);
    }

    #[test]
    fn test_damage_during_delay_restarts_timer() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        shields.apply_hit(&head_on(100.0), 0.0, &mut bus);
        run(&mut shields, 0.0, 4.0, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Delay);

        shields.apply_hit(&head_on(10.0), 4.0, &mut bus);
        run(&mut shields, 4.0, 6.5, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Delay);
        shields.update(7.0, 0.5, 1.0, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Active);
    }

    #[test]
    fn test_damage_while_active_interrupts() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        shields.apply_hit(&head_on(500.0), 0.0, &mut bus);
        run(&mut shields, 0.0, 6.0, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Active);

        shields.apply_hit(&head_on(10.0), 6.0, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Interrupted);
        let frozen = shields.strength(Quadrant::Front);

        run(&mut shields, 6.0, 8.5, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Interrupted);
        assert_eq!(shields.strength(Quadrant::Front), frozen);

        shields.update(9.0, 0.5, 1.0, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Idle);
    }

    #[test]
    fn test_full_delay_after_interruption() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        shields.apply_hit(&head_on(500.0), 0.0, &mut bus);
        run(&mut shields, 0.0, 6.0, 0.5, &mut bus);
        shields.apply_hit(&head_on(10.0), 6.0, &mut bus);

        let mut entered_delay = None;
        let mut went_active = None;
        let mut t = 6.0;
        while t < 20.0 && went_active.is_none() {
            t += 0.5;
            shields.update(t, 0.5, 1.0, &mut bus);
            match shields.state(Quadrant::Front) {
                RechargeState::Delay if entered_delay.is_none() => entered_delay = Some(t),
                RechargeState::Active => went_active = Some(t),
                _ => {}
            }
        }

        let entered_delay = entered_delay.unwrap();
        let went_active = went_active.unwrap();
        assert!(entered_delay - 6.0 >= SHIELD_RECHARGE_DELAY);
        assert!(went_active - entered_delay >= SHIELD_RECHARGE_DELAY);
    }

    #[test]
    fn test_effectiveness_scales_recharge() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();

        shields.apply_hit(&head_on(500.0), 0.0, &mut bus);
        run(&mut shields, 0.0, 6.0, 0.5, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Active);
        shields.update(7.0, 1.0, 0.5, &mut bus);
        assert!((shields.strength(Quadrant::Front) - 525.0).abs() < 1e-3);
    }

    #[test]
    fn test_transitions_emit_events() {
        let mut shields = ShieldQuadrantController::default();
        let mut bus = EventBus::new();
        shields.apply_hit(&head_on(50.0), 0.0, &mut bus);
        shields.update(0.5, 0.5, 1.0, &mut bus);
        assert_eq!(shields.state(Quadrant::Front), RechargeState::Idle);

        shields.update(3.0, 2.5, 1.0, &mut bus);
        assert!(bus.pending().contains(&ShipEvent::ShieldRechargeStateChanged {
            quadrant: Quadrant::Front,
            previous: RechargeState::Idle,
            current: RechargeState::Delay,
        }));
    }

    #[test]
    fn test_auto_balance_conserves_total() {
        let config = ShieldConfig {
            auto_balance: true,
            recharge_rate: 0.0,
            ..Default::default()
        };
        let mut shields = ShieldQuadrantController::new(config);
        let mut bus = EventBus::new();

        shields.apply_hit(&head_on(600.0), 0.0, &mut bus);
        let before = shields.total_strength();
        shields.update(0.5, 0.5, 1.0, &mut bus);

        assert!((shields.total_strength() - before).abs() < 1e-3);
        assert!((shields.strength(Quadrant::Front) - 410.0).abs() < 1e-3);
        for q in [Quadrant::Left, Quadrant::Right, Quadrant::Rear] {
            let s = shields.strength(q);
            assert!(s < 1000.0 && s >= 990.0);
        }
    }
}
