use itertools::iproduct;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use tracing::info;

use crate::domain::{GraphRequest, SLIDER_STEPS};
use crate::error::DispatchError;
use crate::pipeline::{run_cell, CellPayload};
use crate::scenario::SimulationContext;

/// The 6x6 sweep result: one payload per capacity combination plus the
/// capacity list of the best cell found.
#[derive(Debug)]
pub struct SweepOutcome {
    /// Indexed `matrix[col][row]` following the first/second selected node.
    pub matrix: Vec<Vec<CellPayload>>,
    /// The full capacity list with the winning slider pair substituted;
    /// all zeros when every cell came back unserved.
    pub best_capacities: Vec<(String, u8)>,
}

/// Re-solve the scenario at every slider combination of the two selected
/// nodes. Cells are independent solves and run in parallel; the best cell
/// is reduced afterwards in matrix order so ties go to the first one found.
pub fn run_sweep(
    graph: &GraphRequest,
    ctx: &SimulationContext,
) -> Result<SweepOutcome, DispatchError> {
    let capacities = &graph.slider_data.prod_capacities;
    let selections = &graph.slider_data.slider_vals;
    if selections.len() < 2 {
        return Err(DispatchError::InconsistentSweepSelection(format!(
            "need two selected nodes, got {}",
            selections.len()
        )));
    }

    let col_index = locate(capacities, &selections[0].node_id)?;
    let row_index = locate(capacities, &selections[1].node_id)?;

    let cells: Vec<(u8, u8)> = iproduct!(0..SLIDER_STEPS, 0..SLIDER_STEPS).collect();

    let payloads: Vec<CellPayload> = cells
        .par_iter()
        .map(|&(col, row)| {
            let mut cell_graph = graph.clone();
            cell_graph.slider_data.prod_capacities[col_index].1 = col;
            cell_graph.slider_data.prod_capacities[row_index].1 = row;
            run_cell(&cell_graph, ctx)
        })
        .collect::<Result<_, _>>()?;

    let mut matrix: Vec<Vec<CellPayload>> = Vec::with_capacity(SLIDER_STEPS as usize);
    let mut iter = payloads.into_iter();
    for _ in 0..SLIDER_STEPS {
        matrix.push(iter.by_ref().take(SLIDER_STEPS as usize).collect());
    }

    let mut best: Option<(OrderedFloat<f64>, u8, u8)> = None;
    for (col, column) in matrix.iter().enumerate() {
        for (row, cell) in column.iter().enumerate() {
            if let Some(value) = cell.heatmap.value() {
                let value = OrderedFloat(value);
                if best.map_or(true, |(b, _, _)| value < b) {
                    best = Some((value, col as u8, row as u8));
                }
            }
        }
    }

    let best_capacities = match best {
        Some((value, col, row)) => {
            info!(cost = value.0, col, row, "sweep found best cell");
            let mut list = capacities.clone();
            list[col_index].1 = col;
            list[row_index].1 = row;
            list
        }
        None => {
            info!("sweep found no servable cell");
            capacities.iter().map(|(id, _)| (id.clone(), 0)).collect()
        }
    };

    Ok(SweepOutcome {
        matrix,
        best_capacities,
    })
}

fn locate(capacities: &[(String, u8)], node_id: &str) -> Result<usize, DispatchError> {
    capacities
        .iter()
        .position(|(id, _)| id == node_id)
        .ok_or_else(|| {
            DispatchError::InconsistentSweepSelection(format!(
                "selected node '{}' not in the capacity list",
                node_id
            ))
        })
}
