use serde::{Deserialize, Serialize};

/// The graph description posted by the frontend: nodes, edges and the
/// per-node capacity sliders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRequest {
    pub nodes: Vec<GraphNode>,
    /// Edges are structural display data; the optimization models a single
    /// copper plate and does not constrain flows along them.
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(rename = "sliderData")]
    pub slider_data: SliderData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique per graph, shaped like `node_{n}` by the frontend.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Technology name, looked up lowercased in the catalog.
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Slider state: one 0..=5 value per capacity-bearing node plus the two
/// nodes selected for the capacity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderData {
    pub reset: bool,
    #[serde(rename = "autoSimulate")]
    pub auto_simulate: bool,
    /// `(bare node id, slider value)` pairs; ids here lack the `node_`
    /// prefix carried by [`GraphNode::id`].
    #[serde(rename = "prodCapacities")]
    pub prod_capacities: Vec<(String, u8)>,
    #[serde(rename = "sliderVals", default)]
    pub slider_vals: Vec<SweepSelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSelection {
    #[serde(rename = "nodeID")]
    pub node_id: String,
}

/// Number of discrete slider positions (0..=5).
pub const SLIDER_STEPS: u8 = 6;

/// Scale a 0..=5 slider value into an absolute installed capacity.
///
/// Linear through zero: slider 0 maps to 0, slider 5 to
/// `max_installed_capacity`.
pub fn slider_to_capacity(max_installed_capacity: f64, slider_value: u8) -> f64 {
    max_installed_capacity / f64::from(SLIDER_STEPS - 1) * f64::from(slider_value)
}
