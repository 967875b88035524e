//! Independent ships ticked together
//!
//! Ships share no state, so large fleets tick on the rayon pool.

use rayon::prelude::*;

use crate::core::config::DamageConfig;
use crate::core::types::ShipId;
use crate::ship::events::ShipEvent;
use crate::ship::orchestrator::ShipDamageModel;

#[derive(Debug)]
pub struct Fleet {
    ships: Vec<ShipDamageModel>,
    /// Fleet size at which ticking goes parallel
    parallel_threshold: usize,
}

impl Fleet {
    pub fn new(parallel_threshold: usize) -> Self {
        Self {
            ships: Vec::new(),
            parallel_threshold,
        }
    }

    pub fn add(&mut self, ship: ShipDamageModel) -> ShipId {
        let id = ship.id();
        self.ships.push(ship);
        id
    }

    pub fn get(&self, id: ShipId) -> Option<&ShipDamageModel> {
        self.ships.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: ShipId) -> Option<&mut ShipDamageModel> {
        self.ships.iter_mut().find(|s| s.id() == id)
    }

    pub fn remove(&mut self, id: ShipId) -> Option<ShipDamageModel> {
        let pos = self.ships.iter().position(|s| s.id() == id)?;
        Some(self.ships.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShipDamageModel> {
        self.ships.iter()
    }

    /// Advance every ship by `dt`. Results keep fleet order.
    pub fn tick_all(&mut self, dt: f64) -> Vec<(ShipId, Vec<ShipEvent>)> {
        if self.ships.len() >= self.parallel_threshold {
            // PARALLEL: each ship owns its RNG and bus
            self.ships
                .par_iter_mut()
                .map(|ship| (ship.id(), ship.tick(dt)))
                .collect()
        } else {
            self.ships
                .iter_mut()
                .map(|ship| (ship.id(), ship.tick(dt)))
                .collect()
        }
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new(DamageConfig::default().parallel_threshold)
    }
}
