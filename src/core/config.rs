//! Damage model configuration with documented defaults
//!
//! Every value has a default in `damage::constants`. A TOML file only needs
//! the fields it overrides. The emergency repair cooldown is fixed and not
//! part of the config:
//!
//! ```toml
//! [shields]
//! recharge_delay = 5.0
//!
//! [repair]
//! max_concurrent = 2
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{DamageError, Result};
use crate::damage::constants::*;

/// How incoming hull damage is routed into subsystems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Fraction of total incoming damage that ever reaches subsystems
    pub subsystem_fraction: f32,
    /// Shares below this after modifiers are dropped
    pub min_damage: f32,
    /// Search radius for directed hits; secondary shares use half of it
    pub directed_search_range: f32,
    /// Radius for inverse-distance proximity weighting
    pub proximity_range: f32,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            subsystem_fraction: SUBSYSTEM_DAMAGE_FRACTION,
            min_damage: MIN_SUBSYSTEM_DAMAGE,
            directed_search_range: DIRECTED_SEARCH_RANGE,
            proximity_range: PROXIMITY_RANGE,
        }
    }
}

/// Shield quadrant recharge and spill behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Strength of each quadrant at full charge
    pub max_strength: f32,
    /// Seconds without damage before recharge starts (and before an
    /// interrupted quadrant settles back to idle)
    pub recharge_delay: f64,
    /// Strength restored per second while actively recharging
    pub recharge_rate: f32,
    /// Move strength between quadrants toward the average
    pub auto_balance: bool,
    /// Maximum strength one quadrant gains or loses per second when balancing
    pub balance_rate: f32,
    /// Blast radius above which area damage spills to other quadrants
    pub spill_radius: f32,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            max_strength: SHIELD_MAX_STRENGTH,
            recharge_delay: SHIELD_RECHARGE_DELAY,
            recharge_rate: SHIELD_RECHARGE_RATE,
            auto_balance: false,
            balance_rate: SHIELD_BALANCE_RATE,
            spill_radius: SHIELD_SPILL_RADIUS,
        }
    }
}

/// Zero-health consequences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestructionConfig {
    pub base_explosion_chance: f32,
    pub max_explosion_chance: f32,
    /// Splash damage as a fraction of the exploding subsystem's max health
    pub explosion_splash_fraction: f32,
    pub permanent_damage_chance: f32,
    /// Performance cap left on a permanently damaged subsystem
    pub permanent_performance_ceiling: f32,
    pub cascade_failure_chance: f32,
    /// Destroyed fraction of the ship that signals catastrophic failure
    pub catastrophic_threshold: f32,
}

impl Default for DestructionConfig {
    fn default() -> Self {
        Self {
            base_explosion_chance: BASE_EXPLOSION_CHANCE,
            max_explosion_chance: MAX_EXPLOSION_CHANCE,
            explosion_splash_fraction: EXPLOSION_SPLASH_FRACTION,
            permanent_damage_chance: PERMANENT_DAMAGE_CHANCE,
            permanent_performance_ceiling: PERMANENT_PERFORMANCE_CEILING,
            cascade_failure_chance: BASE_CASCADE_CHANCE,
            catastrophic_threshold: CATASTROPHIC_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Seconds between scheduled aggregate recomputes
    pub update_interval: f64,
    /// Engine aggregate below which every subsystem browns out
    pub brownout_threshold: f32,
    /// Sensor aggregate below which turrets lose targeting
    pub targeting_threshold: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            update_interval: PERFORMANCE_UPDATE_INTERVAL,
            brownout_threshold: BROWNOUT_THRESHOLD,
            targeting_threshold: TARGETING_PENALTY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalityConfig {
    /// Fraction of critical/vital subsystems below threshold that raises an alert
    pub critical_fraction_threshold: f32,
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            critical_fraction_threshold: CRITICAL_FRACTION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Scheduled repairs that may run at once; emergency repairs do not count
    pub max_concurrent: usize,
    pub seconds_per_hp: f32,
    pub auto_repair: bool,
    pub auto_repair_interval: f64,
    /// Health fraction below which auto-repair picks a subsystem
    pub auto_repair_threshold: f32,
    /// Starting stock
    pub materials: f32,
    pub spare_parts: f32,
    pub emergency_supplies: f32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_concurrent: MAX_CONCURRENT_REPAIRS,
            seconds_per_hp: REPAIR_SECONDS_PER_HP,
            auto_repair: false,
            auto_repair_interval: AUTO_REPAIR_INTERVAL,
            auto_repair_threshold: AUTO_REPAIR_HEALTH_THRESHOLD,
            materials: STARTING_MATERIALS,
            spare_parts: STARTING_SPARE_PARTS,
            emergency_supplies: STARTING_EMERGENCY_SUPPLIES,
        }
    }
}

/// Configuration for one ship's damage model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    pub distribution: DistributionConfig,
    pub shields: ShieldConfig,
    pub destruction: DestructionConfig,
    pub performance: PerformanceConfig,
    pub criticality: CriticalityConfig,
    pub repair: RepairConfig,
    /// Minimum fleet size before ships are ticked on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            distribution: DistributionConfig::default(),
            shields: ShieldConfig::default(),
            destruction: DestructionConfig::default(),
            performance: PerformanceConfig::default(),
            criticality: CriticalityConfig::default(),
            repair: RepairConfig::default(),
            parallel_threshold: PARALLEL_FLEET_THRESHOLD,
        }
    }
}

impl DamageConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DamageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let chances = [
            ("base_explosion_chance", self.destruction.base_explosion_chance),
            ("max_explosion_chance", self.destruction.max_explosion_chance),
            ("permanent_damage_chance", self.destruction.permanent_damage_chance),
            ("cascade_failure_chance", self.destruction.cascade_failure_chance),
            ("catastrophic_threshold", self.destruction.catastrophic_threshold),
            ("subsystem_fraction", self.distribution.subsystem_fraction),
            (
                "permanent_performance_ceiling",
                self.destruction.permanent_performance_ceiling,
            ),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(DamageError::InvalidConfig(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
        }

        if self.destruction.max_explosion_chance < self.destruction.base_explosion_chance {
            return Err(DamageError::InvalidConfig(format!(
                "max_explosion_chance ({}) should be >= base_explosion_chance ({})",
                self.destruction.max_explosion_chance, self.destruction.base_explosion_chance
            )));
        }

        if self.shields.max_strength < 0.0 || self.shields.recharge_rate < 0.0 {
            return Err(DamageError::InvalidConfig(
                "Shield strength and recharge rate must be non-negative".into(),
            ));
        }
        if self.shields.recharge_delay < 0.0 || self.performance.update_interval <= 0.0 {
            return Err(DamageError::InvalidConfig(
                "Delays must be non-negative and update_interval positive".into(),
            ));
        }

        if self.repair.max_concurrent == 0 {
            return Err(DamageError::InvalidConfig(
                "max_concurrent must allow at least one repair".into(),
            ));
        }
        if self.repair.seconds_per_hp <= 0.0 || self.repair.auto_repair_interval <= 0.0 {
            return Err(DamageError::InvalidConfig(
                "Repair timings must be positive".into(),
            ));
        }

        Ok(())
    }
}
