pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod scenario;
pub mod sweep;
pub mod telemetry;

pub use error::DispatchError;
