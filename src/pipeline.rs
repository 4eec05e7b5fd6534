use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::GraphRequest;
use crate::error::DispatchError;
use crate::model::{
    ChartRecord, DispatchProblem, DispatchSolver, FormulationOptions, LevelizedCost,
    LinearSolver, ModelData, ModelInput, SolveResults, StorageRecord,
};
use crate::scenario::{Scenario, SimulationContext};
use crate::sweep::run_sweep;

/// The result payload of one solved cell.
#[derive(Debug, Clone, Serialize)]
pub struct CellPayload {
    pub heatmap: LevelizedCost,
    pub linechart: Vec<StorageRecord>,
    pub barchart: Vec<ChartRecord>,
}

/// Either one cell or the full 6x6 sweep matrix.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MainData {
    Cell(Box<CellPayload>),
    Matrix(Vec<Vec<CellPayload>>),
}

/// The full response: `None` main data on reset, the best capacity pair
/// only populated by a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResponse {
    #[serde(rename = "mainData")]
    pub main_data: Option<MainData>,
    #[serde(rename = "bestIdx")]
    pub best_idx: Vec<(String, u8)>,
}

/// Translate, formulate, solve and extract one cell with the capacities
/// the request carries.
pub fn run_cell(
    graph: &GraphRequest,
    ctx: &SimulationContext,
) -> Result<CellPayload, DispatchError> {
    if ctx.timesteps.is_empty() {
        return Err(DispatchError::EmptyTimestepWindow);
    }

    let scenario = Scenario::build(graph, ctx);
    let data = ModelData::from_entities(&scenario.entities, &scenario.timesteps);
    debug!(
        nodes = data.nodes.len(),
        technologies = data.technologies.len(),
        timesteps = data.period_count(),
        "translated graph"
    );

    if let Some(path) = &ctx.model_input_dump {
        if let Err(e) = ModelInput::render(&data).write_to(path) {
            warn!(path = %path.display(), error = %e, "could not dump model input");
        }
    }

    let problem = DispatchProblem::build(
        &data,
        &FormulationOptions {
            fix_capacities: true,
            unmet_penalty: ctx.unmet_penalty,
        },
    );
    let solved = LinearSolver.solve(problem)?;
    info!(
        totex = solved.totex,
        unmet = solved.unmet_demand,
        "solved dispatch"
    );

    let results = SolveResults::from_solution(&solved);
    // Demand layers render downward: their values carry the sign of the
    // stack order.
    let barchart = results
        .generation_consumption
        .into_iter()
        .map(|mut r| {
            r.value = r.value.copysign(f64::from(r.stack_order));
            r
        })
        .collect();

    Ok(CellPayload {
        heatmap: results.levelized_cost,
        linechart: results.storage_levels,
        barchart,
    })
}

/// Dispatch a full request: reset short-circuits, auto-simulate runs the
/// capacity sweep, anything else solves the single configured cell.
pub fn process_request(
    graph: &GraphRequest,
    ctx: &SimulationContext,
) -> Result<SimulationResponse, DispatchError> {
    if graph.slider_data.reset {
        return Ok(SimulationResponse {
            main_data: None,
            best_idx: Vec::new(),
        });
    }

    if graph.slider_data.auto_simulate {
        let sweep = run_sweep(graph, ctx)?;
        return Ok(SimulationResponse {
            main_data: Some(MainData::Matrix(sweep.matrix)),
            best_idx: sweep.best_capacities,
        });
    }

    let cell = run_cell(graph, ctx)?;
    Ok(SimulationResponse {
        main_data: Some(MainData::Cell(Box::new(cell))),
        best_idx: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TechnologyCatalog, TechnologyDefaults};
    use crate::domain::{GraphNode, SliderData, Timesteps};
    use crate::profile::InMemoryProfileStore;

    fn context() -> SimulationContext {
        let mut catalog = TechnologyCatalog::default();
        catalog.insert(
            "gas",
            TechnologyDefaults {
                capacity_cost: Some(50.0),
                operational_cost: Some(1.0),
                operational_lifetime: Some(25.0),
                max_installed_capacity: Some(10.0),
                ..Default::default()
            },
        );
        catalog.insert(
            "household",
            TechnologyDefaults {
                yearly_demand: Some(1000.0),
                demand_profile: Some("flat.txt".to_string()),
                ..Default::default()
            },
        );
        let store = InMemoryProfileStore::new().with_profile("flat.txt", vec![1.0; 4]);
        SimulationContext::new(catalog, Box::new(store), Timesteps(vec![1, 2, 3, 4]))
    }

    fn request(reset: bool, auto_simulate: bool) -> GraphRequest {
        GraphRequest {
            nodes: vec![
                GraphNode {
                    id: "node_1".into(),
                    node_type: "producer".into(),
                    label: "Gas".into(),
                },
                GraphNode {
                    id: "node_2".into(),
                    node_type: "consumer".into(),
                    label: "Household".into(),
                },
            ],
            edges: vec![],
            slider_data: SliderData {
                reset,
                auto_simulate,
                prod_capacities: vec![("1".into(), 5), ("2".into(), 0)],
                slider_vals: vec![],
            },
        }
    }

    #[test]
    fn test_reset_returns_empty_response() {
        let response = process_request(&request(true, false), &context()).unwrap();
        assert!(response.main_data.is_none());
        assert!(response.best_idx.is_empty());
    }

    #[test]
    fn test_single_cell_solve_meets_demand() {
        let cell = run_cell(&request(false, false), &context()).unwrap();
        assert!(cell.heatmap.is_finite());
        assert!(cell.linechart.is_empty());
        assert!(!cell.barchart.is_empty());
    }

    #[test]
    fn test_demand_records_carry_negative_values() {
        let cell = run_cell(&request(false, false), &context()).unwrap();
        for record in &cell.barchart {
            if record.stack_order < 0 {
                assert!(record.value <= 0.0, "demand value {} not negated", record.value);
            } else {
                assert!(record.value >= 0.0);
            }
        }
    }

    #[test]
    fn test_empty_timestep_window_is_rejected() {
        let mut ctx = context();
        ctx.timesteps = Timesteps(vec![]);
        let err = run_cell(&request(false, false), &ctx).unwrap_err();
        assert!(matches!(
            err,
            crate::error::DispatchError::EmptyTimestepWindow
        ));
    }

    #[test]
    fn test_zero_capacity_reads_as_unserved_not_free() {
        let mut graph = request(false, false);
        graph.slider_data.prod_capacities[0].1 = 0;
        let cell = run_cell(&graph, &context()).unwrap();
        assert!(!cell.heatmap.is_finite());
    }

    #[test]
    fn test_response_serialization_shape() {
        let response = process_request(&request(false, false), &context()).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("mainData").is_some());
        assert!(json["mainData"]["heatmap"].is_number());
        assert!(json["bestIdx"].as_array().unwrap().is_empty());
    }
}
