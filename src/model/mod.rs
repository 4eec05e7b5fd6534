pub mod dat;
pub mod data;
pub mod formulation;
pub mod results;
pub mod solver;

pub use dat::*;
pub use data::*;
pub use formulation::*;
pub use results::*;
pub use solver::*;
