use good_lp::{default_solver, ResolutionError, Solution, SolverModel};
use std::collections::BTreeMap;
use tracing::debug;

use super::data::Unit;
use super::formulation::DispatchProblem;
use crate::error::DispatchError;

/// Numeric solution to a [`DispatchProblem`], with every variable resolved
/// to its value and keyed the way the formulation keyed it.
#[derive(Debug, Clone)]
pub struct SolvedDispatch {
    pub totex: f64,
    pub capex: f64,
    pub opex: f64,
    pub penalty: f64,
    pub year_factor: f64,
    pub energy_sup_tot: f64,
    pub unmet_demand: f64,
    pub pg: BTreeMap<(Unit, usize), f64>,
    pub pd: BTreeMap<(Unit, usize), f64>,
    pub nspd: BTreeMap<(Unit, usize), f64>,
    pub nspg: BTreeMap<(Unit, usize), f64>,
    pub es: BTreeMap<(Unit, usize), f64>,
    pub pi: BTreeMap<(String, usize), f64>,
    pub cg: BTreeMap<Unit, f64>,
    pub ecap: BTreeMap<Unit, f64>,
}

/// Seam between the formulation and whatever backend carries it out.
pub trait DispatchSolver {
    fn solve(&self, problem: DispatchProblem) -> Result<SolvedDispatch, DispatchError>;
}

/// The bundled LP backend.
pub struct LinearSolver;

impl DispatchSolver for LinearSolver {
    fn solve(&self, problem: DispatchProblem) -> Result<SolvedDispatch, DispatchError> {
        let DispatchProblem {
            variables,
            objective,
            constraints,
            index,
        } = problem;

        debug!(rows = constraints.len(), "handing model to the solver");

        let mut model = variables.minimise(objective).using(default_solver);
        for c in constraints {
            model = model.with(c);
        }

        let solution = model.solve().map_err(|e| match e {
            ResolutionError::Infeasible => DispatchError::SolverInfeasible,
            other => DispatchError::SolverError(other.to_string()),
        })?;

        let read_map = |vars: &BTreeMap<(Unit, usize), good_lp::Variable>| {
            vars.iter()
                .map(|(k, v)| (k.clone(), solution.value(*v)))
                .collect::<BTreeMap<_, _>>()
        };

        Ok(SolvedDispatch {
            totex: solution.value(index.totex),
            capex: solution.value(index.capex),
            opex: solution.value(index.opex),
            penalty: solution.value(index.penalty),
            year_factor: solution.value(index.year_factor),
            energy_sup_tot: solution.value(index.energy_sup_tot),
            unmet_demand: solution.value(index.unmet_demand),
            pg: read_map(&index.pg),
            pd: read_map(&index.pd),
            nspd: read_map(&index.nspd),
            nspg: read_map(&index.nspg),
            es: read_map(&index.es),
            pi: index
                .pi
                .iter()
                .map(|(k, v)| (k.clone(), solution.value(*v)))
                .collect(),
            cg: index
                .cg
                .iter()
                .map(|(k, v)| (k.clone(), solution.value(*v)))
                .collect(),
            ecap: index
                .ecap
                .iter()
                .map(|(k, v)| (k.clone(), solution.value(*v)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConsumerNode, NodeEntity, ProducerNode, Timesteps};
    use crate::model::data::ModelData;
    use crate::model::formulation::FormulationOptions;
    use good_lp::constraint;

    fn small_problem() -> DispatchProblem {
        let entities = vec![
            NodeEntity::Producer(ProducerNode {
                node_id: "node_1".into(),
                technology: "Gen".into(),
                capacity_cost: 10.0,
                operational_cost: 1.0,
                operational_lifetime: 10.0,
                availability_profile: vec![],
                installed_capacity: 5.0,
                records_curtailment: false,
            }),
            NodeEntity::Consumer(ConsumerNode {
                node_id: "node_2".into(),
                technology: "Load".into(),
                yearly_demand: 100.0,
                demand_profile: vec![0.5, 0.5],
            }),
        ];
        let data = ModelData::from_entities(&entities, &Timesteps(vec![1, 2]));
        DispatchProblem::build(
            &data,
            &FormulationOptions {
                fix_capacities: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_solves_and_reports_costs() {
        let solved = LinearSolver.solve(small_problem()).unwrap();
        assert!((solved.totex - (solved.capex + solved.opex + solved.penalty)).abs() < 1e-6);
        assert_eq!(solved.year_factor, 4380.0);
        assert!(solved.energy_sup_tot > 0.0);
    }

    #[test]
    fn test_infeasible_model_maps_to_infeasible_error() {
        let mut problem = small_problem();
        let yf = problem.index.year_factor;
        problem.constraints.push(constraint!(yf == 1.0));

        let err = LinearSolver.solve(problem).unwrap_err();
        assert!(matches!(err, DispatchError::SolverInfeasible));
    }
}
