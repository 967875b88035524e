//! Hullguard - Headless Damage Runner
//!
//! Builds a demo frigate, fires seeded volleys at it while ticking the
//! simulation, and prints the outcome as JSON or text.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use hullguard::core::error::Result;
use hullguard::{
    DamageConfig, DamageType, IncomingDamage, RepairPriority, RepairType, ShipClass,
    ShipDamageModel, ShipEvent, ShipStatus, SubsystemSpec, SubsystemType, TacticalGoal,
    TargetedAttack, WeaponProfile,
};

/// Headless Damage Runner - seeded volleys against a demo ship
#[derive(Parser, Debug)]
#[command(name = "hullguard")]
#[command(about = "Run a seeded damage scenario against a demo frigate and report the result")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation ticks to run
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.5)]
    dt: f64,

    /// Fire a volley every N ticks
    #[arg(long, default_value_t = 10)]
    volley_every: u64,

    /// TOML damage config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    seed: u64,
    ticks: u64,
    elapsed: f64,
    volleys: u32,
    aimed_hits: u32,
    destroyed: Vec<String>,
    repairs_started: u32,
    event_count: usize,
    best_targets: Vec<String>,
    status: ShipStatus,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "hullguard=debug" } else { "hullguard=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => DamageConfig::load(path)?,
        None => DamageConfig::default(),
    };

    // Determine seed
    let seed = args.seed.unwrap_or_else(|| rand::random());
    let mut volley_rng = StdRng::seed_from_u64(seed);

    let mut ship = ShipDamageModel::new("Demo Frigate", ShipClass::Frigate, config, seed)?;
    build_frigate(&mut ship)?;

    let mut events: Vec<ShipEvent> = Vec::new();
    let mut volleys = 0;
    let mut aimed_hits = 0;

    for tick in 1..=args.ticks {
        if args.volley_every > 0 && tick % args.volley_every == 0 {
            volleys += 1;
            let report = ship.apply_damage(random_volley(&mut volley_rng));
            events.extend(report.events);

            if let Some(target) = ship.get_best_targets(TacticalGoal::Disable, 1).first() {
                let attack = TargetedAttack::new(target.as_str(), 35.0, DamageType::Kinetic)
                    .from_position(Vec3::new(0.0, 180.0, 0.0))
                    .with_weapon(WeaponProfile::default());
                if ship.fire_at_subsystem(attack)?.hit {
                    aimed_hits += 1;
                }
            }

            request_repairs(&mut ship);
        }
        events.extend(ship.tick(args.dt));
    }

    let destroyed = events
        .iter()
        .filter_map(|e| match e {
            ShipEvent::SubsystemDestroyed { subsystem, .. } => Some(subsystem.clone()),
            _ => None,
        })
        .collect();
    let repairs_started = events
        .iter()
        .filter(|e| matches!(e, ShipEvent::RepairStarted { queued: false, .. }))
        .count() as u32;

    let result = RunResult {
        seed,
        ticks: args.ticks,
        elapsed: ship.now(),
        volleys,
        aimed_hits,
        destroyed,
        repairs_started,
        event_count: events.len(),
        best_targets: ship.get_best_targets(TacticalGoal::Destroy, 3),
        status: ship.status(),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_text(&result);
    }
    Ok(())
}

fn build_frigate(ship: &mut ShipDamageModel) -> Result<()> {
    let layout = [
        ("main_reactor", SubsystemType::Engine, 150.0, Vec3::new(0.0, -25.0, 0.0)),
        ("thrusters", SubsystemType::Engine, 100.0, Vec3::new(0.0, -40.0, 0.0)),
        ("shield_gen", SubsystemType::Shields, 120.0, Vec3::new(0.0, -5.0, 4.0)),
        ("primary_weapons", SubsystemType::Weapons, 110.0, Vec3::new(0.0, 30.0, 0.0)),
        ("turret_port", SubsystemType::Turret, 70.0, Vec3::new(-12.0, 10.0, 2.0)),
        ("turret_starboard", SubsystemType::Turret, 70.0, Vec3::new(12.0, 10.0, 2.0)),
        ("radar", SubsystemType::Sensors, 60.0, Vec3::new(0.0, 20.0, 8.0)),
        ("nav_computer", SubsystemType::Navigation, 50.0, Vec3::new(0.0, 5.0, -3.0)),
        ("comms_array", SubsystemType::Communication, 40.0, Vec3::new(4.0, 0.0, 9.0)),
    ];
    for (name, subsystem_type, max_health, position) in layout {
        ship.register_subsystem_spec(
            SubsystemSpec::new(name, subsystem_type, max_health)
                .at(position)
                .with_radius(3.0),
        )?;
    }
    ship.add_cascade_link("main_reactor", "shield_gen", 0.8)?;
    ship.add_cascade_link("main_reactor", "primary_weapons", 0.6)?;
    ship.add_cascade_link("radar", "turret_port", 0.4)?;
    Ok(())
}

fn random_volley(rng: &mut StdRng) -> IncomingDamage {
    let damage_type = DamageType::all()[rng.gen_range(0..DamageType::all().len())];
    let position = Vec3::new(
        rng.gen_range(-15.0..15.0),
        rng.gen_range(-45.0..35.0),
        rng.gen_range(-5.0..10.0),
    );
    let direction = -position.normalize_or_zero();
    let event = IncomingDamage::new(rng.gen_range(200.0..900.0), damage_type)
        .at(position)
        .travelling(direction);

    match rng.gen_range(0..4) {
        0 => event.with_area(rng.gen_range(5.0..20.0)),
        1 => event.as_shockwave(),
        2 => event.as_directed(),
        _ => event,
    }
}

/// Queue standard repairs for anything below half health
fn request_repairs(ship: &mut ShipDamageModel) {
    let damaged: Vec<String> = ship
        .registry()
        .iter()
        .filter(|(_, s)| s.is_live() && !s.is_repairing && s.health_percentage() < 0.5)
        .map(|(_, s)| s.name.clone())
        .collect();
    for name in damaged {
        if let Err(e) = ship.repair_request(&name, RepairType::Standard, RepairPriority::High) {
            tracing::debug!("Repair for '{}' not started: {}", name, e);
        }
    }
}

fn print_text(result: &RunResult) {
    println!("=== HULLGUARD RUN ===");
    println!("Seed: {}  Ticks: {}  Elapsed: {:.1}s", result.seed, result.ticks, result.elapsed);
    println!("Volleys: {}  Aimed hits: {}", result.volleys, result.aimed_hits);
    println!(
        "Ship state: {:?}  Destroyed: {:.0}%",
        result.status.critical_state,
        result.status.destroyed_fraction * 100.0
    );
    println!();
    for s in &result.status.subsystems {
        println!(
            "  {:<18} {:>6.1}/{:<6.1} perf {:.2}  eff {:.2}{}",
            s.name,
            s.health,
            s.max_health,
            s.performance,
            s.effectiveness,
            if s.destroyed { "  DESTROYED" } else if s.repairing { "  repairing" } else { "" }
        );
    }
    println!();
    for q in &result.status.shields {
        println!("  shield {:<6} {:>7.1}/{:.0}  {}", q.quadrant, q.strength, q.max_strength, q.state);
    }
    println!();
    println!("Destroyed: {}", result.destroyed.join(", "));
    println!("Best targets: {}", result.best_targets.join(", "));
    println!("Events: {}  Repairs started: {}", result.event_count, result.repairs_started);
}
