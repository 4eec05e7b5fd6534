use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DispatchError;

/// Economic and operational defaults for one technology.
///
/// All fields are optional in the file; absent values stay absent here and
/// the formulation layer supplies its own defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnologyDefaults {
    pub capacity_cost: Option<f64>,
    pub operational_cost: Option<f64>,
    pub operational_lifetime: Option<f64>,
    pub yearly_demand: Option<f64>,
    pub energy_capacity: Option<f64>,
    /// Capacity reached at the top slider position.
    pub max_installed_capacity: Option<f64>,
    /// Name of the availability profile file, if any.
    pub availability_profile: Option<String>,
    /// Name of the demand profile file, if any.
    pub demand_profile: Option<String>,
    #[serde(default)]
    pub record_curtailment: bool,
}

/// Technology defaults keyed by lowercased technology name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnologyCatalog {
    #[serde(default)]
    technology: BTreeMap<String, TechnologyDefaults>,
}

impl TechnologyCatalog {
    pub fn from_toml_str(raw: &str) -> Result<Self, DispatchError> {
        let mut catalog: TechnologyCatalog =
            toml::from_str(raw).map_err(|e| DispatchError::CatalogLoad {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;
        catalog.technology = catalog
            .technology
            .into_iter()
            .map(|(name, defaults)| (name.to_lowercase(), defaults))
            .collect();
        Ok(catalog)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, DispatchError> {
        let raw = std::fs::read_to_string(path).map_err(|e| DispatchError::CatalogLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            DispatchError::CatalogLoad { message, .. } => DispatchError::CatalogLoad {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Look up defaults by technology name, case-insensitively.
    pub fn get(&self, technology: &str) -> Option<&TechnologyDefaults> {
        self.technology.get(&technology.to_lowercase())
    }

    pub fn insert(&mut self, technology: impl Into<String>, defaults: TechnologyDefaults) {
        self.technology
            .insert(technology.into().to_lowercase(), defaults);
    }
}
