use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::catalog::TechnologyCatalog;
use crate::domain::Timesteps;
use crate::profile::{FsProfileStore, ProfileStore};
use crate::scenario::SimulationContext;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding the catalog, profile and timestep files.
    pub dir: PathBuf,
    /// Technology catalog file name within `dir`.
    pub catalog: String,
    /// Timestep index file name within `dir`.
    pub timesteps: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    pub unmet_penalty: f64,
    /// When set, each solve dumps its model tables to this path.
    #[serde(default)]
    pub model_input_dump: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("GRID__").split("__"));
        Ok(figment.extract()?)
    }

    /// Resolve the configured data files into a ready simulation context.
    pub fn build_context(&self) -> Result<SimulationContext> {
        let catalog = TechnologyCatalog::from_toml_file(&self.data.dir.join(&self.data.catalog))?;
        let store = FsProfileStore::new(&self.data.dir);
        let timesteps = Timesteps(store.load_timesteps(&self.data.timesteps)?);
        if timesteps.is_empty() {
            return Err(crate::error::DispatchError::EmptyTimestepWindow.into());
        }

        let mut ctx = SimulationContext::new(catalog, Box::new(store), timesteps)
            .with_unmet_penalty(self.solver.unmet_penalty);
        if let Some(path) = &self.solver.model_input_dump {
            ctx = ctx.with_model_input_dump(path);
        }
        Ok(ctx)
    }
}
