//! Property tests for health, shield and resource bounds

use glam::Vec3;
use hullguard::ship::EventBus;
use hullguard::subsystem::curves::performance_factor;
use hullguard::subsystem::SubsystemRegistry;
use hullguard::{
    DamageType, IncomingDamage, Quadrant, RepairPriority, RepairType, ResourceType, ShipClass,
    ShipDamageModel, ShipEvent, SubsystemSpec, SubsystemType,
};
use proptest::prelude::*;

fn damage_type() -> impl Strategy<Value = DamageType> {
    prop::sample::select(DamageType::all().to_vec())
}

fn subsystem_type() -> impl Strategy<Value = SubsystemType> {
    prop::sample::select(SubsystemType::all().to_vec())
}

fn shielded_ship(seed: u64) -> ShipDamageModel {
    let mut ship = ShipDamageModel::with_seed("prop", ShipClass::Frigate, seed);
    for (i, t) in SubsystemType::all().iter().enumerate() {
        ship.register_subsystem_spec(
            SubsystemSpec::new(format!("{}_{}", t, i), *t, 100.0)
                .at(Vec3::new((i as f32 - 3.0) * 4.0, (i % 3) as f32 * 5.0, 0.0)),
        )
        .unwrap();
    }
    ship
}

proptest! {
    #[test]
    fn health_percentage_stays_in_unit_range(
        t in subsystem_type(),
        hits in prop::collection::vec((0.0f32..500.0, damage_type()), 1..20),
    ) {
        let mut registry = SubsystemRegistry::new();
        let mut bus = EventBus::new();
        registry.register("target", t, 120.0).unwrap();

        for (amount, damage_type) in hits {
            registry.apply_damage("target", amount, damage_type, &mut bus).unwrap();
            let s = registry.get_by_name("target").unwrap();
            prop_assert!((0.0..=1.0).contains(&s.health_percentage()));
            if !s.is_destroyed && !s.permanent_damage {
                prop_assert_eq!(s.performance_factor, performance_factor(t, s.health_percentage()));
            }
            if s.current_health <= 0.0 {
                prop_assert!(!s.is_functional);
            }
        }
    }

    #[test]
    fn repair_never_exceeds_pre_damage_health(
        t in subsystem_type(),
        damage in 0.0f32..200.0,
        damage_type in damage_type(),
        repair_fraction in 0.0f32..=1.0,
    ) {
        let mut registry = SubsystemRegistry::new();
        let mut bus = EventBus::new();
        registry.register("target", t, 150.0).unwrap();
        let before = registry.get_by_name("target").unwrap().current_health;

        let change = registry.apply_damage("target", damage, damage_type, &mut bus).unwrap();
        registry.repair("target", change.health_lost() * repair_fraction, &mut bus).unwrap();

        let after = registry.get_by_name("target").unwrap().current_health;
        prop_assert!(after <= before + 1e-3);
        prop_assert!(after <= 150.0);
    }

    #[test]
    fn shield_strength_bounded(
        seed in 0u64..1000,
        hits in prop::collection::vec(
            (0.0f32..1500.0, -1.0f32..1.0, -1.0f32..1.0, prop::option::of(0.0f32..25.0)),
            1..15,
        ),
    ) {
        let mut ship = shielded_ship(seed);
        let max = ship.config().shields.max_strength;
        for (amount, x, y, radius) in hits {
            let mut hit = IncomingDamage::new(amount, DamageType::Energy)
                .travelling(Vec3::new(x, y, 0.0));
            if let Some(r) = radius {
                hit = hit.with_area(r);
            }
            ship.apply_damage(hit);
            ship.tick(0.5);
            for q in Quadrant::ALL {
                let strength = ship.shield_strength(q);
                prop_assert!((0.0..=max).contains(&strength));
            }
        }
    }

    #[test]
    fn destroyed_event_fires_once(
        seed in 0u64..1000,
        hits in prop::collection::vec(200.0f32..3000.0, 2..8),
    ) {
        let mut ship = shielded_ship(seed);
        let target = "engine_0";
        let mut destroyed = 0;
        for amount in hits {
            let mut events = ship
                .apply_damage(IncomingDamage::new(amount, DamageType::Kinetic).targeting(target))
                .events;
            events.extend(ship.tick(0.5));
            destroyed += events
                .iter()
                .filter(|e| matches!(e, ShipEvent::SubsystemDestroyed { subsystem, .. } if subsystem == target))
                .count();
        }
        prop_assert!(destroyed <= 1);
        if ship.subsystem(target).unwrap().is_destroyed {
            prop_assert_eq!(destroyed, 1);
        }
    }

    #[test]
    fn resources_never_negative(
        ops in prop::collection::vec((0usize..7, any::<bool>()), 1..25),
    ) {
        let mut ship = shielded_ship(7);
        let names: Vec<String> = ship.registry().iter().map(|(_, s)| s.name.clone()).collect();
        ship.apply_damage(IncomingDamage::new(4000.0, DamageType::Explosive).with_area(40.0));

        for (index, cancel) in ops {
            let name = &names[index % names.len()];
            if let Ok(start) = ship.repair_request(name, RepairType::Depot, RepairPriority::Normal) {
                if cancel {
                    let _ = ship.cancel_repair(start.task_id());
                }
            }
            ship.tick(0.5);
            for r in ResourceType::all() {
                prop_assert!(ship.repairs().resources().get(*r) >= 0.0);
            }
        }
    }
}
