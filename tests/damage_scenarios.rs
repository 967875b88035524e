//! End-to-end damage scenarios
//!
//! Registry arithmetic, directional shields, repair slot limits and
//! deferred cascades, driven through the public ship API.

use glam::Vec3;
use hullguard::core::config::DamageConfig;
use hullguard::ship::EventBus;
use hullguard::subsystem::curves::performance_factor;
use hullguard::subsystem::SubsystemRegistry;
use hullguard::{
    DamageType, IncomingDamage, Quadrant, RepairPriority, RepairType, ShipClass,
    ShipCriticalState, ShipDamageModel, ShipEvent, SubsystemSpec, SubsystemType, TacticalGoal,
};

fn quiet_config() -> DamageConfig {
    let mut config = DamageConfig::default();
    config.destruction.base_explosion_chance = 0.0;
    config.destruction.permanent_damage_chance = 0.0;
    config.destruction.cascade_failure_chance = 0.0;
    config
}

/// Engine(max=100) takes 60 explosive: x1.5 gives 90, leaving 10
#[test]
fn test_scenario_a_explosive_engine_hit() {
    let mut registry = SubsystemRegistry::new();
    let mut bus = EventBus::new();
    registry.register("engine", SubsystemType::Engine, 100.0).unwrap();

    let change = registry
        .apply_damage("engine", 60.0, DamageType::Explosive, &mut bus)
        .unwrap();

    assert_eq!(change.health_lost(), 90.0);
    let engine = registry.get_by_name("engine").unwrap();
    assert_eq!(engine.current_health, 10.0);
    assert_eq!(
        engine.performance_factor,
        performance_factor(SubsystemType::Engine, 0.1)
    );
    assert!(!engine.is_destroyed);
}

/// Four quadrants at 1000; a hit from dead ahead only touches Front
#[test]
fn test_scenario_b_frontal_hit_only_drains_front() {
    let mut ship = ShipDamageModel::with_seed("B", ShipClass::Frigate, 1);
    ship.register_subsystem("shield_gen", SubsystemType::Shields, 100.0)
        .unwrap();

    let report = ship.apply_damage(
        IncomingDamage::new(300.0, DamageType::Energy)
            .at(Vec3::new(0.0, 30.0, 0.0))
            .travelling(Vec3::new(0.0, -1.0, 0.0)),
    );

    assert_eq!(report.shield.unwrap().quadrant, Quadrant::Front);
    assert_eq!(ship.shield_strength(Quadrant::Front), 700.0);
    for q in [Quadrant::Left, Quadrant::Right, Quadrant::Rear] {
        assert_eq!(ship.shield_strength(q), 1000.0);
    }
    assert_eq!(ship.health_percentage("shield_gen"), 1.0);
}

/// Three busy repair slots: the fourth request waits, then runs
#[test]
fn test_scenario_c_fourth_repair_queues() {
    let mut ship = ShipDamageModel::new("C", ShipClass::Frigate, quiet_config(), 2).unwrap();
    let names = ["nav_1", "nav_2", "nav_3", "nav_4"];
    for name in names {
        ship.register_subsystem(name, SubsystemType::Navigation, 100.0)
            .unwrap();
        ship.apply_damage(IncomingDamage::new(100.0, DamageType::Kinetic).targeting(name));
    }

    let starts: Vec<_> = names
        .iter()
        .map(|name| {
            ship.repair_request(name, RepairType::Standard, RepairPriority::Normal)
                .unwrap()
        })
        .collect();
    assert!(starts[..3].iter().all(|s| !s.is_queued()));
    assert!(starts[3].is_queued());
    assert_eq!(ship.repairs().active_tasks().len(), 3);
    assert_eq!(ship.repairs().queued_tasks().len(), 1);

    let mut promoted = false;
    for _ in 0..20 {
        for event in ship.tick(0.5) {
            if let ShipEvent::RepairStarted {
                subsystem,
                queued: false,
                ..
            } = &event
            {
                promoted |= subsystem == "nav_4";
            }
        }
    }
    assert!(promoted);
    assert!(ship.repairs().queued_tasks().is_empty());
    assert!(ship.health_percentage("nav_1") > 0.99);
}

fn cascade_ship(seed: u64) -> ShipDamageModel {
    let mut config = quiet_config();
    config.destruction.cascade_failure_chance = 1.0;
    let mut ship = ShipDamageModel::new("D", ShipClass::Frigate, config, seed).unwrap();
    ship.register_subsystem("main_engine", SubsystemType::Engine, 100.0)
        .unwrap();
    ship.register_subsystem("comms", SubsystemType::Communication, 100.0)
        .unwrap();
    ship.add_cascade_link("main_engine", "comms", 1.0).unwrap();
    ship
}

/// Destroyed engine with a forced cascade damages its dependent after a delay
#[test]
fn test_scenario_d_cascade_after_delay() {
    let mut ship = cascade_ship(3);
    let report = ship.apply_damage(
        IncomingDamage::new(1000.0, DamageType::Kinetic).targeting("main_engine"),
    );
    assert_eq!(report.destroyed, vec!["main_engine".to_string()]);

    let delay = report
        .events
        .iter()
        .find_map(|e| match e {
            ShipEvent::CascadeTriggered { dependent, delay, .. } if dependent == "comms" => Some(*delay),
            _ => None,
        })
        .expect("cascade scheduled");
    assert!((0.5..=2.0).contains(&delay));

    let mut applied_at = None;
    while ship.now() < 3.0 {
        let events = ship.tick(0.25);
        if events
            .iter()
            .any(|e| matches!(e, ShipEvent::CascadeDamageApplied { dependent, .. } if dependent == "comms"))
        {
            applied_at = Some(ship.now());
            break;
        }
        assert_eq!(ship.health_percentage("comms"), 1.0);
    }

    let applied_at = applied_at.expect("cascade fired");
    assert!(applied_at >= delay);
    assert!(applied_at < delay + 0.25 + 1e-9);
    assert!(ship.health_percentage("comms") < 1.0);
}

/// A dependent destroyed before its cascade lands is left alone
#[test]
fn test_scenario_d_destroyed_dependent_skipped() {
    let mut ship = cascade_ship(4);
    ship.apply_damage(IncomingDamage::new(1000.0, DamageType::Kinetic).targeting("main_engine"));
    ship.apply_damage(IncomingDamage::new(1000.0, DamageType::Kinetic).targeting("comms"));
    assert!(!ship.is_functional("comms"));

    let mut events = Vec::new();
    for _ in 0..12 {
        events.extend(ship.tick(0.25));
    }
    assert!(!events
        .iter()
        .any(|e| matches!(e, ShipEvent::CascadeDamageApplied { .. })));
}

#[test]
fn test_losing_critical_systems_escalates_state() {
    let mut ship = ShipDamageModel::new("E", ShipClass::Cruiser, quiet_config(), 5).unwrap();
    for (name, t) in [
        ("main_engine", SubsystemType::Engine),
        ("radar", SubsystemType::Sensors),
        ("primary_weapons", SubsystemType::Weapons),
        ("comms", SubsystemType::Communication),
    ] {
        ship.register_subsystem(name, t, 100.0).unwrap();
    }
    assert_eq!(ship.get_ship_critical_state(), ShipCriticalState::Operational);

    ship.apply_damage(IncomingDamage::new(1000.0, DamageType::Kinetic).targeting("main_engine"));
    ship.apply_damage(IncomingDamage::new(1000.0, DamageType::Kinetic).targeting("primary_weapons"));

    assert!(ship.get_ship_critical_state() > ShipCriticalState::Degraded);
    assert!(ship.modifiers().speed < 1.0);

    let targets = ship.get_best_targets(TacticalGoal::Destroy, 5);
    assert!(!targets.contains(&"main_engine".to_string()));
    assert!(!targets.is_empty());
}

#[test]
fn test_same_seed_same_outcome() {
    let run = |seed| {
        let mut ship = ShipDamageModel::with_seed("det", ShipClass::Frigate, seed);
        for (i, t) in SubsystemType::all().iter().enumerate() {
            ship.register_subsystem_spec(
                SubsystemSpec::new(format!("s{}", i), *t, 80.0).at(Vec3::new(i as f32 * 3.0, 0.0, 0.0)),
            )
            .unwrap();
        }
        for i in 0..5 {
            ship.apply_damage(
                IncomingDamage::new(400.0, DamageType::Explosive)
                    .at(Vec3::new(i as f32 * 4.0, 0.0, 0.0))
                    .with_area(12.0),
            );
            ship.tick(0.5);
        }
        ship.status()
            .subsystems
            .iter()
            .map(|s| (s.health, s.destroyed))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(99), run(99));
}
