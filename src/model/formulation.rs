use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use std::collections::BTreeMap;

use super::data::{ModelData, Unit};

/// Cost per unit of unmet demand; large enough that the solver only leaves
/// demand unmet when no dispatch can satisfy it.
pub const DEFAULT_UNMET_PENALTY: f64 = 1e6;

#[derive(Debug, Clone, Copy)]
pub struct FormulationOptions {
    /// Fix `Cg`/`Ecap` to the slider-derived capacities, turning the model
    /// from capacity expansion into pure dispatch.
    pub fix_capacities: bool,
    pub unmet_penalty: f64,
}

impl Default for FormulationOptions {
    fn default() -> Self {
        Self {
            fix_capacities: false,
            unmet_penalty: DEFAULT_UNMET_PENALTY,
        }
    }
}

/// Handles to every decision variable, keyed the way the sets are.
pub struct VariableIndex {
    pub totex: Variable,
    pub capex: Variable,
    pub opex: Variable,
    pub penalty: Variable,
    pub year_factor: Variable,
    pub energy_sup_tot: Variable,
    pub unmet_demand: Variable,
    /// Generation/discharge power, `Ug ∪ Us × T`.
    pub pg: BTreeMap<(Unit, usize), Variable>,
    /// Consumption/charge power, `Uc ∪ Us × T`.
    pub pd: BTreeMap<(Unit, usize), Variable>,
    /// Curtailed demand, `Uc × T`.
    pub nspd: BTreeMap<(Unit, usize), Variable>,
    /// Curtailed generation, `UgRE × T`.
    pub nspg: BTreeMap<(Unit, usize), Variable>,
    /// Storage energy level, `Us × T`.
    pub es: BTreeMap<(Unit, usize), Variable>,
    /// Net node injection, `N × T`, free sign.
    pub pi: BTreeMap<(String, usize), Variable>,
    /// Installed generation capacity, `Ug`.
    pub cg: BTreeMap<Unit, Variable>,
    /// Installed storage energy capacity, `Us`.
    pub ecap: BTreeMap<Unit, Variable>,
}

/// The assembled linear program: variables, objective and constraint rows,
/// still unbound to any solver.
pub struct DispatchProblem {
    pub variables: ProblemVariables,
    pub objective: Variable,
    pub constraints: Vec<Constraint>,
    pub index: VariableIndex,
}

impl DispatchProblem {
    pub fn build(data: &ModelData, options: &FormulationOptions) -> Self {
        let mut vars = ProblemVariables::new();

        let generators: Vec<Unit> = data.generator_units().cloned().collect();
        let consumers: Vec<Unit> = data.consumer_units().cloned().collect();
        let storages: Vec<Unit> = data.storage_units().cloned().collect();
        let curtailing: Vec<Unit> = data.curtailment_units().cloned().collect();
        let times = data.timesteps.clone();
        let year_factor_value = data.year_factor();

        let totex = vars.add(variable());
        let capex = vars.add(variable());
        let opex = vars.add(variable());
        let penalty = vars.add(variable());
        let year_factor = vars.add(variable());
        let energy_sup_tot = vars.add(variable());
        let unmet_demand = vars.add(variable());

        let mut pg = BTreeMap::new();
        let mut pd = BTreeMap::new();
        let mut nspd = BTreeMap::new();
        let mut nspg = BTreeMap::new();
        let mut es = BTreeMap::new();
        let mut pi = BTreeMap::new();
        let mut cg = BTreeMap::new();
        let mut ecap = BTreeMap::new();

        for u in generators.iter().chain(storages.iter()) {
            for &t in &times {
                pg.insert((u.clone(), t), vars.add(variable().min(0.0)));
            }
        }
        for u in consumers.iter().chain(storages.iter()) {
            for &t in &times {
                pd.insert((u.clone(), t), vars.add(variable().min(0.0)));
            }
        }
        for u in &consumers {
            for &t in &times {
                nspd.insert((u.clone(), t), vars.add(variable().min(0.0)));
            }
        }
        for u in &curtailing {
            for &t in &times {
                nspg.insert((u.clone(), t), vars.add(variable().min(0.0)));
            }
        }
        for u in &storages {
            for &t in &times {
                es.insert((u.clone(), t), vars.add(variable().min(0.0)));
            }
        }
        for n in &data.nodes {
            for &t in &times {
                pi.insert((n.clone(), t), vars.add(variable()));
            }
        }
        for u in &generators {
            cg.insert(u.clone(), vars.add(variable().min(0.0)));
        }
        for u in &storages {
            ecap.insert(u.clone(), vars.add(variable().min(0.0)));
        }

        let mut constraints = Vec::new();

        // Cost decomposition.
        constraints.push(constraint!(totex == capex + opex + penalty));

        // Unmet demand is priced far above any real technology.
        let penalty_sum: Expression = consumers
            .iter()
            .flat_map(|u| times.iter().map(move |&t| (u.clone(), t)))
            .map(|key| options.unmet_penalty * nspd[&key])
            .sum();
        constraints.push(constraint!(penalty == penalty_sum));

        // Annualized capital cost.
        let capex_sum: Expression = generators
            .iter()
            .map(|u| {
                (data.capacity_cost(&u.technology) / data.operational_lifetime(&u.technology))
                    * cg[u]
            })
            .sum();
        constraints.push(constraint!(capex == capex_sum));

        // Operating cost over the window, extrapolated to a full year.
        let opex_sum: Expression = generators
            .iter()
            .flat_map(|u| times.iter().map(move |&t| (u.clone(), t)))
            .map(|key| {
                (data.operational_cost(&key.0.technology) * year_factor_value) * pg[&key]
            })
            .sum();
        constraints.push(constraint!(opex == opex_sum));

        constraints.push(constraint!(year_factor == year_factor_value));

        // Network-wide conservation, no losses.
        for &t in &times {
            let injection_sum: Expression = data
                .nodes
                .iter()
                .map(|n| Expression::from(pi[&(n.clone(), t)]))
                .sum();
            constraints.push(constraint!(injection_sum == 0.0));
        }

        // Net injection per node: generator output minus consumer draw.
        // Storage flows stay out of the balance; they only move energy
        // along the unit's own level recurrence.
        for n in &data.nodes {
            for &t in &times {
                let production: Expression = generators
                    .iter()
                    .filter(|u| u.node == *n)
                    .map(|u| Expression::from(pg[&(u.clone(), t)]))
                    .sum();
                let consumption: Expression = consumers
                    .iter()
                    .filter(|u| u.node == *n)
                    .map(|u| Expression::from(pd[&(u.clone(), t)]))
                    .sum();
                constraints.push(constraint!(
                    production - consumption == pi[&(n.clone(), t)]
                ));
            }
        }

        // Summary scalars.
        let supplied: Expression = consumers
            .iter()
            .flat_map(|u| times.iter().map(move |&t| (u.clone(), t)))
            .map(|key| year_factor_value * pd[&key])
            .sum();
        constraints.push(constraint!(energy_sup_tot == supplied));

        let unmet_sum: Expression = consumers
            .iter()
            .flat_map(|u| times.iter().map(move |&t| (u.clone(), t)))
            .map(|key| Expression::from(nspd[&key]))
            .sum();
        constraints.push(constraint!(unmet_demand == unmet_sum));

        // Slider-driven dispatch: hardware is given, not optimized.
        if options.fix_capacities {
            for u in &generators {
                constraints.push(constraint!(cg[u] == data.installed_capacity(u)));
            }
            for u in &storages {
                constraints.push(constraint!(ecap[u] == data.energy_capacity(u)));
            }
        }

        // Generation ceiling.
        for u in &generators {
            for &t in &times {
                constraints.push(constraint!(pg[&(u.clone(), t)] <= cg[u]));
            }
        }

        // Storage level recurrence, periodic over the window: the first
        // timestep wraps to the last so the trajectory closes on itself.
        if let (Some(&first), Some(&last)) = (times.first(), times.last()) {
            for u in &storages {
                for &t in &times {
                    let prev = if t == first { last } else { t - 1 };
                    constraints.push(constraint!(
                        es[&(u.clone(), t)]
                            == es[&(u.clone(), prev)] + pd[&(u.clone(), t)]
                                - pg[&(u.clone(), t)]
                    ));
                }
                for &t in &times {
                    constraints.push(constraint!(es[&(u.clone(), t)] <= ecap[u]));
                }
            }
        }

        // Demand satisfaction where a profile entry exists; absent entries
        // skip the constraint for that pair, they do not fail.
        for u in &consumers {
            for &t in &times {
                if let Some(fraction) = data.demand_profile(&u.technology, t) {
                    let target =
                        data.yearly_demand(&u.technology) / year_factor_value * fraction;
                    constraints.push(constraint!(
                        pd[&(u.clone(), t)] + nspd[&(u.clone(), t)] == target
                    ));
                }
            }
        }

        // Curtailment-tracked generators follow their availability profile;
        // others are capped only by the generation ceiling.
        for u in &curtailing {
            for &t in &times {
                let availability = data.availability(&u.technology, t);
                constraints.push(constraint!(
                    pg[&(u.clone(), t)] + nspg[&(u.clone(), t)] == availability * cg[u]
                ));
            }
        }

        DispatchProblem {
            variables: vars,
            objective: totex,
            constraints,
            index: VariableIndex {
                totex,
                capex,
                opex,
                penalty,
                year_factor,
                energy_sup_tot,
                unmet_demand,
                pg,
                pd,
                nspd,
                nspg,
                es,
                pi,
                cg,
                ecap,
            },
        }
    }
}
