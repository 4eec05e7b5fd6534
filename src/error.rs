use thiserror::Error;

/// Failures across the dispatch pipeline, from graph translation through
/// solving.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The catalog has no entry for a technology named in the graph.
    #[error("no technology defaults for '{0}'")]
    MissingTechnologyDefaults(String),

    /// The graph names a node type outside the supported vocabulary.
    #[error("invalid node type '{0}'")]
    InvalidNodeType(String),

    /// A demand profile summed to zero over the selected window and cannot
    /// be normalized.
    #[error("demand profile '{0}' sums to zero over the selected timesteps")]
    ZeroNormalization(String),

    /// The resolved timestep window has no entries; every downstream
    /// quantity (year factor, profiles, balances) is undefined over it.
    #[error("timestep window is empty")]
    EmptyTimestepWindow,

    /// A timestep index points outside the profile data.
    #[error("profile '{name}': index {index} out of range for {len} rows")]
    ProfileIndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    /// The profile source could not produce usable data.
    #[error("profile '{name}': {message}")]
    ProfileLoad { name: String, message: String },

    /// The technology catalog could not be read or parsed.
    #[error("catalog '{path}': {message}")]
    CatalogLoad { path: String, message: String },

    /// The solver proved the model has no feasible point.
    #[error("model is infeasible")]
    SolverInfeasible,

    /// The solver failed for any other reason.
    #[error("solver failed: {0}")]
    SolverError(String),

    /// The sweep selection does not name two distinct graph nodes.
    #[error("sweep selection invalid: {0}")]
    InconsistentSweepSelection(String),
}

impl DispatchError {
    /// True when the failure concerns a single node, so scenario building
    /// can drop that node and carry on.
    pub fn is_node_local(&self) -> bool {
        matches!(
            self,
            DispatchError::MissingTechnologyDefaults(_)
                | DispatchError::InvalidNodeType(_)
                | DispatchError::ZeroNormalization(_)
                | DispatchError::ProfileIndexOutOfRange { .. }
                | DispatchError::ProfileLoad { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_local_classification() {
        assert!(DispatchError::MissingTechnologyDefaults("x".into()).is_node_local());
        assert!(DispatchError::ZeroNormalization("x".into()).is_node_local());
        assert!(!DispatchError::SolverInfeasible.is_node_local());
        assert!(!DispatchError::InconsistentSweepSelection("x".into()).is_node_local());
    }

    #[test]
    fn test_messages_name_the_subject() {
        let err = DispatchError::ProfileIndexOutOfRange {
            name: "demand.txt".into(),
            index: 9000,
            len: 8760,
        };
        assert_eq!(
            err.to_string(),
            "profile 'demand.txt': index 9000 out of range for 8760 rows"
        );
    }
}
