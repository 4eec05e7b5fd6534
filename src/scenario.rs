use std::collections::HashMap;
use tracing::warn;

use crate::catalog::{TechnologyCatalog, TechnologyDefaults};
use crate::domain::{
    slider_to_capacity, GraphNode, GraphRequest, NodeEntity, NodeType, ProducerNode,
    ConsumerNode, StorageNode, Timesteps,
};
use crate::error::DispatchError;
use crate::profile::{process_profile, ProfileKind, ProfileStore};

/// Everything a solve needs besides the graph itself: technology defaults,
/// profile data and the resolved timestep window.
///
/// Shared immutably across sweep cells; each solve derives its own tables.
pub struct SimulationContext {
    pub catalog: TechnologyCatalog,
    pub profiles: Box<dyn ProfileStore>,
    pub timesteps: Timesteps,
    /// Cost placed on each unit of unmet demand in the objective.
    pub unmet_penalty: f64,
    /// When set, every solve writes its model tables here in `.dat` form.
    pub model_input_dump: Option<std::path::PathBuf>,
}

impl SimulationContext {
    pub fn new(
        catalog: TechnologyCatalog,
        profiles: Box<dyn ProfileStore>,
        timesteps: Timesteps,
    ) -> Self {
        Self {
            catalog,
            profiles,
            timesteps,
            unmet_penalty: crate::model::DEFAULT_UNMET_PENALTY,
            model_input_dump: None,
        }
    }

    pub fn with_unmet_penalty(mut self, penalty: f64) -> Self {
        self.unmet_penalty = penalty;
        self
    }

    pub fn with_model_input_dump(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.model_input_dump = Some(path.into());
        self
    }
}

/// A scenario ready for the translation layer: the entities instantiated
/// from the graph plus the timestep window they were aligned to.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub entities: Vec<NodeEntity>,
    pub timesteps: Timesteps,
}

impl Scenario {
    /// Build entities from the graph, best-effort: a node that cannot be
    /// built is logged and skipped rather than failing the scenario.
    pub fn build(graph: &GraphRequest, ctx: &SimulationContext) -> Self {
        let sliders = slider_values(graph);
        let mut entities = Vec::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            match build_entity(node, ctx, &sliders) {
                Ok(Some(entity)) => entities.push(entity),
                Ok(None) => {} // junction
                Err(e) => {
                    warn!(node_id = %node.id, technology = %node.label, error = %e,
                        "skipping node");
                }
            }
        }

        Self {
            entities,
            timesteps: ctx.timesteps.clone(),
        }
    }
}

/// Slider values keyed by graph node id. The frontend sends bare ids in
/// `prodCapacities` while graph nodes carry a `node_` prefix.
fn slider_values(graph: &GraphRequest) -> HashMap<String, u8> {
    graph
        .slider_data
        .prod_capacities
        .iter()
        .map(|(id, value)| (format!("node_{}", id), *value))
        .collect()
}

fn build_entity(
    node: &GraphNode,
    ctx: &SimulationContext,
    sliders: &HashMap<String, u8>,
) -> Result<Option<NodeEntity>, DispatchError> {
    let node_type: NodeType = node.node_type.parse()?;
    if node_type == NodeType::Junction {
        return Ok(None);
    }

    let defaults: &TechnologyDefaults = ctx
        .catalog
        .get(&node.label)
        .ok_or_else(|| DispatchError::MissingTechnologyDefaults(node.label.clone()))?;

    let entity = match node_type {
        NodeType::Junction => return Ok(None),
        NodeType::Producer => NodeEntity::Producer(ProducerNode {
            node_id: node.id.clone(),
            technology: node.label.clone(),
            capacity_cost: defaults.capacity_cost.unwrap_or(0.0),
            operational_cost: defaults.operational_cost.unwrap_or(0.0),
            operational_lifetime: defaults.operational_lifetime.unwrap_or(100.0),
            availability_profile: load_profile(
                ctx,
                defaults.availability_profile.as_deref(),
                ProfileKind::Availability,
                node,
            ),
            installed_capacity: installed_capacity(node, defaults, sliders),
            records_curtailment: defaults.record_curtailment,
        }),
        NodeType::Consumer => NodeEntity::Consumer(ConsumerNode {
            node_id: node.id.clone(),
            technology: node.label.clone(),
            yearly_demand: defaults.yearly_demand.unwrap_or(0.0),
            demand_profile: load_profile(
                ctx,
                defaults.demand_profile.as_deref(),
                ProfileKind::Demand,
                node,
            ),
        }),
        NodeType::Battery => NodeEntity::Storage(StorageNode {
            node_id: node.id.clone(),
            technology: node.label.clone(),
            energy_capacity: defaults.energy_capacity.unwrap_or(0.0),
            installed_capacity: installed_capacity(node, defaults, sliders),
        }),
    };

    Ok(Some(entity))
}

/// A profile that fails to load or normalize resolves to an empty sequence;
/// the entity is still built and the formulation skips its constraints.
fn load_profile(
    ctx: &SimulationContext,
    name: Option<&str>,
    kind: ProfileKind,
    node: &GraphNode,
) -> Vec<f64> {
    match process_profile(ctx.profiles.as_ref(), name, kind, &ctx.timesteps.0) {
        Ok(values) => values,
        Err(e) => {
            warn!(node_id = %node.id, technology = %node.label, error = %e,
                "profile unusable, treating as absent");
            Vec::new()
        }
    }
}

fn installed_capacity(
    node: &GraphNode,
    defaults: &TechnologyDefaults,
    sliders: &HashMap<String, u8>,
) -> f64 {
    let slider = match sliders.get(&node.id) {
        Some(v) => *v,
        None => {
            warn!(node_id = %node.id, "no slider value, installed capacity set to 0");
            return 0.0;
        }
    };
    let max = match defaults.max_installed_capacity {
        Some(m) => m,
        None => {
            warn!(node_id = %node.id, technology = %node.label,
                "no max_installed_capacity, installed capacity set to 0");
            return 0.0;
        }
    };
    slider_to_capacity(max, slider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TechnologyDefaults;
    use crate::domain::{GraphEdge, SliderData};
    use crate::profile::InMemoryProfileStore;

    fn test_catalog() -> TechnologyCatalog {
        let mut catalog = TechnologyCatalog::default();
        catalog.insert(
            "solar",
            TechnologyDefaults {
                capacity_cost: Some(100.0),
                operational_cost: Some(0.0),
                operational_lifetime: Some(20.0),
                max_installed_capacity: Some(10.0),
                availability_profile: Some("solar.txt".to_string()),
                record_curtailment: true,
                ..Default::default()
            },
        );
        catalog.insert(
            "household",
            TechnologyDefaults {
                yearly_demand: Some(1000.0),
                demand_profile: Some("household.txt".to_string()),
                ..Default::default()
            },
        );
        catalog.insert(
            "battery",
            TechnologyDefaults {
                energy_capacity: Some(5.0),
                max_installed_capacity: Some(5.0),
                ..Default::default()
            },
        );
        catalog
    }

    fn test_context() -> SimulationContext {
        let store = InMemoryProfileStore::new()
            .with_profile("solar.txt", vec![0.0, 0.5, 1.0, 0.5])
            .with_profile("household.txt", vec![1.0, 1.0, 1.0, 1.0]);
        SimulationContext::new(
            test_catalog(),
            Box::new(store),
            Timesteps(vec![1, 2, 3, 4]),
        )
    }

    fn graph(nodes: Vec<GraphNode>, caps: Vec<(&str, u8)>) -> GraphRequest {
        GraphRequest {
            nodes,
            edges: Vec::<GraphEdge>::new(),
            slider_data: SliderData {
                reset: false,
                auto_simulate: false,
                prod_capacities: caps
                    .into_iter()
                    .map(|(id, v)| (id.to_string(), v))
                    .collect(),
                slider_vals: vec![],
            },
        }
    }

    fn node(id: &str, node_type: &str, label: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            node_type: node_type.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_builds_all_entity_kinds_and_skips_junctions() {
        let g = graph(
            vec![
                node("node_1", "producer", "Solar"),
                node("node_2", "consumer", "Household"),
                node("node_3", "battery", "Battery"),
                node("node_4", "junction", "Junction"),
            ],
            vec![("1", 5), ("3", 2)],
        );
        let scenario = Scenario::build(&g, &test_context());
        assert_eq!(scenario.entities.len(), 3);

        match &scenario.entities[0] {
            NodeEntity::Producer(p) => {
                assert_eq!(p.installed_capacity, 10.0);
                assert_eq!(p.availability_profile, vec![0.0, 0.5, 1.0, 0.5]);
                assert!(p.records_curtailment);
            }
            other => panic!("expected producer, got {:?}", other),
        }
        match &scenario.entities[1] {
            NodeEntity::Consumer(c) => {
                assert_eq!(c.yearly_demand, 1000.0);
                let sum: f64 = c.demand_profile.iter().sum();
                assert!((sum - 1.0).abs() < 1e-6);
            }
            other => panic!("expected consumer, got {:?}", other),
        }
        match &scenario.entities[2] {
            NodeEntity::Storage(s) => {
                assert_eq!(s.energy_capacity, 5.0);
                assert_eq!(s.installed_capacity, 2.0);
            }
            other => panic!("expected storage, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_technology_is_skipped() {
        let g = graph(
            vec![
                node("node_1", "producer", "Fusion"),
                node("node_2", "consumer", "Household"),
            ],
            vec![("1", 5)],
        );
        let scenario = Scenario::build(&g, &test_context());
        assert_eq!(scenario.entities.len(), 1);
        assert_eq!(scenario.entities[0].technology(), "Household");
    }

    #[test]
    fn test_invalid_node_type_is_skipped() {
        let g = graph(vec![node("node_1", "transformer", "Solar")], vec![("1", 5)]);
        let scenario = Scenario::build(&g, &test_context());
        assert!(scenario.entities.is_empty());
    }

    #[test]
    fn test_missing_slider_yields_zero_capacity() {
        let g = graph(vec![node("node_1", "producer", "Solar")], vec![]);
        let scenario = Scenario::build(&g, &test_context());
        match &scenario.entities[0] {
            NodeEntity::Producer(p) => assert_eq!(p.installed_capacity, 0.0),
            other => panic!("expected producer, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_sum_demand_profile_resolves_to_empty() {
        let store = InMemoryProfileStore::new().with_profile("household.txt", vec![0.0; 4]);
        let ctx = SimulationContext::new(
            test_catalog(),
            Box::new(store),
            Timesteps(vec![1, 2, 3, 4]),
        );
        let g = graph(vec![node("node_2", "consumer", "Household")], vec![]);
        let scenario = Scenario::build(&g, &ctx);
        match &scenario.entities[0] {
            NodeEntity::Consumer(c) => assert!(c.demand_profile.is_empty()),
            other => panic!("expected consumer, got {:?}", other),
        }
    }
}
