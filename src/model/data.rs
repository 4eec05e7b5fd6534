use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{NodeEntity, Timesteps};

/// An active (technology, node) pair — one element of the set `U`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unit {
    pub technology: String,
    pub node: String,
}

impl Unit {
    pub fn new(technology: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            technology: technology.into(),
            node: node.into(),
        }
    }
}

/// The dimensioned parameter tables of the optimization model.
///
/// Sets are accumulated from the entities actually observed, never
/// pre-declared, so the formulation carries no unused indices. Tables are
/// sparse; accessor methods resolve the defaults (lifetime 100,
/// availability 1, everything else 0).
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    /// Re-indexed timesteps 1..=|T|.
    pub timesteps: Vec<usize>,
    /// `N`: node ids, junctions excluded upstream.
    pub nodes: BTreeSet<String>,
    /// `H`: technologies present.
    pub technologies: BTreeSet<String>,
    /// `U`: (technology, node) pairs actually instantiated.
    pub units: BTreeSet<Unit>,

    // Role flags per technology; only present entries are true.
    producers: BTreeSet<String>,
    consumers: BTreeSet<String>,
    storages: BTreeSet<String>,
    curtailment: BTreeSet<String>,

    // Per-technology scalars.
    capacity_cost: BTreeMap<String, f64>,
    operational_cost: BTreeMap<String, f64>,
    operational_lifetime: BTreeMap<String, f64>,
    yearly_demand: BTreeMap<String, f64>,

    // Per (technology, 1-based timestep).
    demand_profile: BTreeMap<(String, usize), f64>,
    availability_profile: BTreeMap<(String, usize), f64>,

    // Per (technology, node).
    installed_capacity: BTreeMap<Unit, f64>,
    energy_capacity: BTreeMap<Unit, f64>,
}

impl ModelData {
    /// Project the entity list onto set-indexed parameter tables.
    pub fn from_entities(entities: &[NodeEntity], timesteps: &Timesteps) -> Self {
        let mut data = ModelData {
            timesteps: (1..=timesteps.len()).collect(),
            ..Default::default()
        };

        for entity in entities {
            let tech = entity.technology().to_string();
            let node = entity.node_id().to_string();
            let unit = Unit::new(tech.clone(), node.clone());
            data.nodes.insert(node);
            data.technologies.insert(tech.clone());
            data.units.insert(unit.clone());

            match entity {
                NodeEntity::Producer(p) => {
                    data.producers.insert(tech.clone());
                    if p.records_curtailment {
                        data.curtailment.insert(tech.clone());
                    }
                    data.capacity_cost.insert(tech.clone(), p.capacity_cost);
                    data.operational_cost
                        .insert(tech.clone(), p.operational_cost);
                    data.operational_lifetime
                        .insert(tech.clone(), p.operational_lifetime);
                    for (i, value) in p.availability_profile.iter().enumerate() {
                        data.availability_profile
                            .insert((tech.clone(), i + 1), *value);
                    }
                    data.installed_capacity.insert(unit, p.installed_capacity);
                }
                NodeEntity::Consumer(c) => {
                    data.consumers.insert(tech.clone());
                    data.yearly_demand.insert(tech.clone(), c.yearly_demand);
                    for (i, value) in c.demand_profile.iter().enumerate() {
                        data.demand_profile.insert((tech.clone(), i + 1), *value);
                    }
                }
                NodeEntity::Storage(s) => {
                    data.storages.insert(tech.clone());
                    data.energy_capacity
                        .insert(unit.clone(), s.energy_capacity);
                    data.installed_capacity.insert(unit, s.installed_capacity);
                }
            }
        }

        data
    }

    pub fn period_count(&self) -> usize {
        self.timesteps.len()
    }

    /// 8760 / |T|, extrapolating the modeled window to a full year.
    pub fn year_factor(&self) -> f64 {
        8760.0 / self.timesteps.len() as f64
    }

    // Role predicates.

    pub fn is_producer(&self, technology: &str) -> bool {
        self.producers.contains(technology)
    }

    pub fn is_consumer(&self, technology: &str) -> bool {
        self.consumers.contains(technology)
    }

    pub fn is_storage(&self, technology: &str) -> bool {
        self.storages.contains(technology)
    }

    pub fn records_curtailment(&self, technology: &str) -> bool {
        self.curtailment.contains(technology)
    }

    // Derived subsets of `U`.

    /// `Ug`: generator pairs.
    pub fn generator_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| self.is_producer(&u.technology))
    }

    /// `Uc`: consumer pairs.
    pub fn consumer_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| self.is_consumer(&u.technology))
    }

    /// `Us`: storage pairs.
    pub fn storage_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| self.is_storage(&u.technology))
    }

    /// `UgRE`: generator pairs whose curtailment is tracked.
    pub fn curtailment_units(&self) -> impl Iterator<Item = &Unit> {
        self.generator_units()
            .filter(|u| self.records_curtailment(&u.technology))
    }

    // Parameter accessors with sparse defaults.

    pub fn capacity_cost(&self, technology: &str) -> f64 {
        self.capacity_cost.get(technology).copied().unwrap_or(0.0)
    }

    pub fn operational_cost(&self, technology: &str) -> f64 {
        self.operational_cost
            .get(technology)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn operational_lifetime(&self, technology: &str) -> f64 {
        self.operational_lifetime
            .get(technology)
            .copied()
            .unwrap_or(100.0)
    }

    pub fn yearly_demand(&self, technology: &str) -> f64 {
        self.yearly_demand.get(technology).copied().unwrap_or(0.0)
    }

    /// Demand fraction for (technology, timestep); `None` means the
    /// constraint for that pair is skipped, not defaulted.
    pub fn demand_profile(&self, technology: &str, t: usize) -> Option<f64> {
        self.demand_profile
            .get(&(technology.to_string(), t))
            .copied()
    }

    pub fn availability(&self, technology: &str, t: usize) -> f64 {
        self.availability_profile
            .get(&(technology.to_string(), t))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn installed_capacity(&self, unit: &Unit) -> f64 {
        self.installed_capacity.get(unit).copied().unwrap_or(0.0)
    }

    pub fn energy_capacity(&self, unit: &Unit) -> f64 {
        self.energy_capacity.get(unit).copied().unwrap_or(0.0)
    }

    // Raw table views for the solver-input writer.

    pub fn capacity_cost_table(&self) -> &BTreeMap<String, f64> {
        &self.capacity_cost
    }

    pub fn operational_cost_table(&self) -> &BTreeMap<String, f64> {
        &self.operational_cost
    }

    pub fn operational_lifetime_table(&self) -> &BTreeMap<String, f64> {
        &self.operational_lifetime
    }

    pub fn yearly_demand_table(&self) -> &BTreeMap<String, f64> {
        &self.yearly_demand
    }

    pub fn demand_profile_table(&self) -> &BTreeMap<(String, usize), f64> {
        &self.demand_profile
    }

    pub fn availability_profile_table(&self) -> &BTreeMap<(String, usize), f64> {
        &self.availability_profile
    }

    pub fn installed_capacity_table(&self) -> &BTreeMap<Unit, f64> {
        &self.installed_capacity
    }

    pub fn energy_capacity_table(&self) -> &BTreeMap<Unit, f64> {
        &self.energy_capacity
    }

    pub fn producer_technologies(&self) -> &BTreeSet<String> {
        &self.producers
    }

    pub fn consumer_technologies(&self) -> &BTreeSet<String> {
        &self.consumers
    }

    pub fn storage_technologies(&self) -> &BTreeSet<String> {
        &self.storages
    }

    pub fn curtailment_technologies(&self) -> &BTreeSet<String> {
        &self.curtailment
    }
}
