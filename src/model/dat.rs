use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

use super::data::ModelData;

/// AMPL-style `.dat` rendering of the model tables.
///
/// Kept as an export facility for inspecting exactly what a solve saw:
/// sets first, then parameters, scalars and 1-D tables as key/value lines,
/// 2-D tables in matrix form with absent cells written as zero.
pub struct ModelInput(String);

impl ModelInput {
    pub fn render(data: &ModelData) -> Self {
        let mut out = String::new();

        set_block(&mut out, "T", data.timesteps.iter().map(|t| t.to_string()));
        set_block(&mut out, "N", data.nodes.iter().cloned());
        set_block(&mut out, "H", data.technologies.iter().cloned());
        set_block(
            &mut out,
            "U",
            data.units
                .iter()
                .map(|u| format!("{} {}", u.technology, u.node)),
        );

        param_1d(&mut out, "capacity_cost", data.capacity_cost_table());
        param_1d(&mut out, "operational_cost", data.operational_cost_table());
        param_1d(
            &mut out,
            "operational_lifetime",
            data.operational_lifetime_table(),
        );
        param_2d(
            &mut out,
            "demand_profile",
            &timestep_table(data.demand_profile_table()),
        );
        param_1d(&mut out, "yearly_demand", data.yearly_demand_table());
        param_1d(&mut out, "is_consumer", &flag_table(data.consumer_technologies()));
        param_1d(&mut out, "is_producer", &flag_table(data.producer_technologies()));
        param_1d(&mut out, "is_storage", &flag_table(data.storage_technologies()));
        param_1d(
            &mut out,
            "record_curtailment",
            &flag_table(data.curtailment_technologies()),
        );
        param_2d(
            &mut out,
            "availability_profile",
            &timestep_table(data.availability_profile_table()),
        );
        param_2d(
            &mut out,
            "installed_capacity",
            &unit_table(data.installed_capacity_table()),
        );
        param_2d(
            &mut out,
            "energy_capacity",
            &unit_table(data.energy_capacity_table()),
        );

        ModelInput(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.0)
    }
}

fn set_block(out: &mut String, name: &str, rows: impl Iterator<Item = String>) {
    let _ = writeln!(out, "set {} := ", name);
    for row in rows {
        let _ = writeln!(out, "{} ", row);
    }
    out.push_str("; \n\n");
}

/// One `key value` line per entry; an empty table writes nothing at all.
fn param_1d(out: &mut String, name: &str, values: &BTreeMap<String, f64>) {
    if values.is_empty() {
        return;
    }
    let _ = writeln!(out, "param {} := ", name);
    for (key, value) in values {
        if !value.is_nan() {
            let _ = writeln!(out, "{} {}", key, value);
        }
    }
    out.push_str(";\n\n");
}

/// Matrix form: rows are the first key component, columns the second.
/// Columns sort numerically when they all parse as integers.
fn param_2d(out: &mut String, name: &str, values: &BTreeMap<(String, String), f64>) {
    if values.is_empty() {
        return;
    }

    let rows: BTreeSet<&String> = values.keys().map(|(r, _)| r).collect();
    let mut cols: Vec<&String> = values
        .keys()
        .map(|(_, c)| c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if cols.iter().all(|c| c.parse::<i64>().is_ok()) {
        cols.sort_by_key(|c| c.parse::<i64>().unwrap_or(0));
    }

    let _ = write!(out, "param {} : ", name);
    let header: Vec<&str> = cols.iter().map(|c| c.as_str()).collect();
    let _ = writeln!(out, "{} :=", header.join(" "));

    for row in rows {
        let _ = write!(out, "{} ", row);
        for col in &cols {
            let cell = values
                .get(&((*row).clone(), (*col).clone()))
                .copied()
                .unwrap_or(0.0);
            let _ = write!(out, "{:.6} ", cell);
        }
        out.push('\n');
    }
    out.push_str(";\n\n");
}

fn timestep_table(table: &BTreeMap<(String, usize), f64>) -> BTreeMap<(String, String), f64> {
    table
        .iter()
        .map(|((tech, t), v)| ((tech.clone(), t.to_string()), *v))
        .collect()
}

fn unit_table(table: &BTreeMap<super::data::Unit, f64>) -> BTreeMap<(String, String), f64> {
    table
        .iter()
        .map(|(u, v)| ((u.technology.clone(), u.node.clone()), *v))
        .collect()
}

fn flag_table(technologies: &BTreeSet<String>) -> BTreeMap<String, f64> {
    technologies.iter().map(|t| (t.clone(), 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConsumerNode, NodeEntity, ProducerNode, Timesteps};

    fn sample_data() -> ModelData {
        let entities = vec![
            NodeEntity::Producer(ProducerNode {
                node_id: "node_1".into(),
                technology: "Solar".into(),
                capacity_cost: 100.0,
                operational_cost: 2.0,
                operational_lifetime: 20.0,
                availability_profile: vec![0.0, 1.0],
                installed_capacity: 6.0,
                records_curtailment: true,
            }),
            NodeEntity::Consumer(ConsumerNode {
                node_id: "node_2".into(),
                technology: "Household".into(),
                yearly_demand: 1000.0,
                demand_profile: vec![0.25, 0.75],
            }),
        ];
        ModelData::from_entities(&entities, &Timesteps(vec![5, 6]))
    }

    #[test]
    fn test_sets_rendered_first() {
        let dat = ModelInput::render(&sample_data());
        let text = dat.as_str();
        assert!(text.starts_with("set T := \n1 \n2 \n; \n\n"));
        assert!(text.contains("set N := \nnode_1 \nnode_2 \n; \n\n"));
        assert!(text.contains("set U := \nHousehold node_2 \nSolar node_1 \n; \n\n"));
    }

    #[test]
    fn test_scalar_params_as_key_value_lines() {
        let dat = ModelInput::render(&sample_data());
        let text = dat.as_str();
        assert!(text.contains("param capacity_cost := \nSolar 100\n;\n\n"));
        assert!(text.contains("param yearly_demand := \nHousehold 1000\n;\n\n"));
        assert!(text.contains("param is_producer := \nSolar 1\n;\n\n"));
        assert!(text.contains("param record_curtailment := \nSolar 1\n;\n\n"));
    }

    #[test]
    fn test_profiles_rendered_as_matrices() {
        let dat = ModelInput::render(&sample_data());
        let text = dat.as_str();
        assert!(text.contains(
            "param demand_profile : 1 2 :=\nHousehold 0.250000 0.750000 \n;\n\n"
        ));
        assert!(text.contains(
            "param availability_profile : 1 2 :=\nSolar 0.000000 1.000000 \n;\n\n"
        ));
    }

    #[test]
    fn test_capacity_matrix_fills_missing_cells_with_zero() {
        let dat = ModelInput::render(&sample_data());
        // Only Solar@node_1 has a capacity; the matrix still closes cleanly.
        assert!(dat
            .as_str()
            .contains("param installed_capacity : node_1 :=\nSolar 6.000000 \n;\n\n"));
    }

    #[test]
    fn test_empty_tables_are_omitted() {
        let data = ModelData::from_entities(&[], &Timesteps(vec![1]));
        let dat = ModelInput::render(&data);
        assert!(!dat.as_str().contains("param energy_capacity"));
        assert!(!dat.as_str().contains("param is_storage"));
    }
}
