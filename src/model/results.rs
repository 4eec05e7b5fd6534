use serde::{Serialize, Serializer};

use super::solver::SolvedDispatch;

/// Stack-order keys for the generation/consumption chart. Curtailed flows
/// draw above (or below) the served flow of the same sign.
pub const STACK_GENERATION: i32 = 1;
pub const STACK_CURTAILED_GENERATION: i32 = 100;
pub const STACK_CONSUMPTION: i32 = -1;
pub const STACK_CURTAILED_DEMAND: i32 = -100;

/// Unmet demand below this is floating-point noise, not unserved load.
pub const UNMET_TOLERANCE: f64 = 1e-1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Supply,
    Demand,
}

/// One row of the stacked generation/consumption chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartRecord {
    pub technology: String,
    pub node: String,
    pub timestep: usize,
    pub value: f64,
    pub stack_order: i32,
    pub category: Category,
}

/// One row of the storage-level line chart.
#[derive(Debug, Clone, Serialize)]
pub struct StorageRecord {
    pub technology: String,
    pub node: String,
    pub timestep: usize,
    pub value: f64,
}

/// Installed capacity of one unit after the solve.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityRecord {
    pub technology: String,
    pub node: String,
    pub value: f64,
}

/// The headline scalar per solve: cost per unit of energy served, or a
/// sentinel when demand could not be met.
///
/// Serializes as a bare number or the string `"inf"`, which is what the
/// consuming frontend matches on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelizedCost {
    Cost(f64),
    Unserved,
}

impl LevelizedCost {
    /// Cost per energy unit when demand is essentially met, rounded to
    /// 4 decimals; the sentinel otherwise. Zero energy served also yields
    /// the sentinel so an empty network never reads as free.
    pub fn from_solution(totex: f64, energy_sup_tot: f64, unmet_demand: f64) -> Self {
        if unmet_demand < UNMET_TOLERANCE && energy_sup_tot > 0.0 {
            LevelizedCost::Cost(round4(totex / energy_sup_tot))
        } else {
            LevelizedCost::Unserved
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, LevelizedCost::Cost(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            LevelizedCost::Cost(v) => Some(*v),
            LevelizedCost::Unserved => None,
        }
    }
}

impl Serialize for LevelizedCost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LevelizedCost::Cost(v) => serializer.serialize_f64(*v),
            LevelizedCost::Unserved => serializer.serialize_str("inf"),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

/// Everything extracted from one solved instance.
#[derive(Debug, Clone, Serialize)]
pub struct SolveResults {
    pub levelized_cost: LevelizedCost,
    pub generation_consumption: Vec<ChartRecord>,
    pub storage_levels: Vec<StorageRecord>,
    pub generator_capacities: Vec<CapacityRecord>,
    pub storage_capacities: Vec<CapacityRecord>,
}

impl SolveResults {
    pub fn from_solution(solved: &SolvedDispatch) -> Self {
        Self {
            levelized_cost: LevelizedCost::from_solution(
                solved.totex,
                solved.energy_sup_tot,
                solved.unmet_demand,
            ),
            generation_consumption: generation_consumption_records(solved),
            storage_levels: storage_level_records(solved),
            generator_capacities: solved
                .cg
                .iter()
                .map(|(u, v)| CapacityRecord {
                    technology: u.technology.clone(),
                    node: u.node.clone(),
                    value: *v,
                })
                .collect(),
            storage_capacities: solved
                .ecap
                .iter()
                .map(|(u, v)| CapacityRecord {
                    technology: u.technology.clone(),
                    node: u.node.clone(),
                    value: *v,
                })
                .collect(),
        }
    }
}

/// Served generation, served consumption, then the curtailed layers, each
/// tagged with its stack order and Supply/Demand category.
pub fn generation_consumption_records(solved: &SolvedDispatch) -> Vec<ChartRecord> {
    let mut records = Vec::new();
    let mut push = |flows: &std::collections::BTreeMap<(super::data::Unit, usize), f64>,
                    stack_order: i32,
                    category: Category| {
        for ((unit, t), value) in flows {
            records.push(ChartRecord {
                technology: unit.technology.clone(),
                node: unit.node.clone(),
                timestep: *t,
                value: *value,
                stack_order,
                category,
            });
        }
    };

    push(&solved.pg, STACK_GENERATION, Category::Supply);
    push(&solved.pd, STACK_CONSUMPTION, Category::Demand);
    push(&solved.nspg, STACK_CURTAILED_GENERATION, Category::Supply);
    push(&solved.nspd, STACK_CURTAILED_DEMAND, Category::Demand);
    records
}

pub fn storage_level_records(solved: &SolvedDispatch) -> Vec<StorageRecord> {
    solved
        .es
        .iter()
        .map(|((unit, t), value)| StorageRecord {
            technology: unit.technology.clone(),
            node: unit.node.clone(),
            timestep: *t,
            value: *value,
        })
        .collect()
}
