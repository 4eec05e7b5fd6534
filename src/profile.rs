use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::DispatchError;

/// How a profile's selected values are post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// Normalized so the selected values sum to 1.
    Demand,
    /// Passed through unchanged; bounded to [0,1] by upstream data.
    Availability,
}

/// Source of raw profile data and timestep index lists.
///
/// Profiles are flat sequences of numbers covering a full year; timestep
/// files are ordered lists of distinct 1-based row indices into them.
pub trait ProfileStore: Send + Sync {
    fn load_profile(&self, name: &str) -> Result<Vec<f64>, DispatchError>;
    fn load_timesteps(&self, name: &str) -> Result<Vec<usize>, DispatchError>;
}

/// Whitespace-separated flat files under a data directory.
#[derive(Debug, Clone)]
pub struct FsProfileStore {
    dir: PathBuf,
}

impl FsProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, name: &str) -> Result<String, DispatchError> {
        std::fs::read_to_string(self.dir.join(name)).map_err(|e| DispatchError::ProfileLoad {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

impl ProfileStore for FsProfileStore {
    fn load_profile(&self, name: &str) -> Result<Vec<f64>, DispatchError> {
        self.read(name)?
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|e| DispatchError::ProfileLoad {
                    name: name.to_string(),
                    message: format!("bad value '{}': {}", tok, e),
                })
            })
            .collect()
    }

    fn load_timesteps(&self, name: &str) -> Result<Vec<usize>, DispatchError> {
        self.read(name)?
            .split_whitespace()
            .map(|tok| {
                tok.parse::<usize>().map_err(|e| DispatchError::ProfileLoad {
                    name: name.to_string(),
                    message: format!("bad index '{}': {}", tok, e),
                })
            })
            .collect()
    }
}

/// In-memory store used by tests and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: HashMap<String, Vec<f64>>,
    timesteps: HashMap<String, Vec<usize>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.profiles.insert(name.into(), values);
        self
    }

    pub fn with_timesteps(mut self, name: impl Into<String>, indices: Vec<usize>) -> Self {
        self.timesteps.insert(name.into(), indices);
        self
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn load_profile(&self, name: &str) -> Result<Vec<f64>, DispatchError> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::ProfileLoad {
                name: name.to_string(),
                message: "not found".to_string(),
            })
    }

    fn load_timesteps(&self, name: &str) -> Result<Vec<usize>, DispatchError> {
        self.timesteps
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::ProfileLoad {
                name: name.to_string(),
                message: "not found".to_string(),
            })
    }
}

/// Round to the fixed 6-decimal precision written to the solver input.
fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Select the rows of `raw` at the 1-based `indices` and post-process them
/// for the given profile kind.
///
/// Demand profiles are divided by their selected sum; a zero sum is a
/// [`DispatchError::ZeroNormalization`], never a division by zero.
pub fn select_profile(
    name: &str,
    raw: &[f64],
    kind: ProfileKind,
    indices: &[usize],
) -> Result<Vec<f64>, DispatchError> {
    let mut selected = Vec::with_capacity(indices.len());
    for &index in indices {
        let value = index
            .checked_sub(1)
            .and_then(|i| raw.get(i))
            .copied()
            .ok_or(DispatchError::ProfileIndexOutOfRange {
                name: name.to_string(),
                index,
                len: raw.len(),
            })?;
        selected.push(value);
    }

    if kind == ProfileKind::Demand {
        let sum: f64 = selected.iter().sum();
        if sum == 0.0 {
            return Err(DispatchError::ZeroNormalization(name.to_string()));
        }
        for value in &mut selected {
            *value /= sum;
        }
    }

    Ok(selected.into_iter().map(round6).collect())
}

/// Load and select a named profile; a missing/empty name yields an empty
/// sequence (the technology simply has no profile).
pub fn process_profile(
    store: &dyn ProfileStore,
    name: Option<&str>,
    kind: ProfileKind,
    indices: &[usize],
) -> Result<Vec<f64>, DispatchError> {
    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => return Ok(Vec::new()),
    };
    let raw = store.load_profile(name)?;
    select_profile(name, &raw, kind, indices)
}
