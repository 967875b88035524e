//! Shared repair stock

use ahash::AHashMap;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::config::RepairConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ResourceType {
    #[display(fmt = "materials")]
    Materials,
    #[display(fmt = "spare parts")]
    SpareParts,
    /// Only drawn by emergency repairs
    #[display(fmt = "emergency supplies")]
    EmergencySupplies,
}

impl ResourceType {
    pub fn all() -> &'static [ResourceType] {
        &[
            ResourceType::Materials,
            ResourceType::SpareParts,
            ResourceType::EmergencySupplies,
        ]
    }
}

/// Resource amounts never go negative
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    stock: AHashMap<ResourceType, f32>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting stock from config
    pub fn from_config(config: &RepairConfig) -> Self {
        let mut pool = Self::new();
        pool.add(ResourceType::Materials, config.materials);
        pool.add(ResourceType::SpareParts, config.spare_parts);
        pool.add(ResourceType::EmergencySupplies, config.emergency_supplies);
        pool
    }

    pub fn get(&self, resource: ResourceType) -> f32 {
        self.stock.get(&resource).copied().unwrap_or(0.0)
    }

    /// Add stock, returns amount actually added
    pub fn add(&mut self, resource: ResourceType, amount: f32) -> f32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        *self.stock.entry(resource).or_insert(0.0) += amount;
        amount
    }

    /// Remove stock, returns amount actually removed
    pub fn remove(&mut self, resource: ResourceType, amount: f32) -> f32 {
        match self.stock.get_mut(&resource) {
            Some(current) if amount > 0.0 => {
                let removed = amount.min(*current);
                *current -= removed;
                removed
            }
            _ => 0.0,
        }
    }

    /// First requirement the pool cannot cover, as (resource, required, available)
    pub fn shortfall(&self, requirements: &[(ResourceType, f32)]) -> Option<(ResourceType, f32, f32)> {
        requirements
            .iter()
            .find(|(res, amount)| self.get(*res) < *amount)
            .map(|(res, amount)| (*res, *amount, self.get(*res)))
    }

    pub fn has_materials(&self, requirements: &[(ResourceType, f32)]) -> bool {
        self.shortfall(requirements).is_none()
    }

    /// All-or-nothing consumption, returns true if successful
    pub fn consume_materials(&mut self, requirements: &[(ResourceType, f32)]) -> bool {
        if !self.has_materials(requirements) {
            return false;
        }
        for (res, amount) in requirements {
            self.remove(*res, *amount);
        }
        true
    }
}
