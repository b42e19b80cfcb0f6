//! Implements the material models: retention curves, relative and intrinsic permeability

mod logistic;
mod permeability;
mod relative_permeability;
mod retention;
mod van_genuchten;
pub use crate::material::logistic::*;
pub use crate::material::permeability::*;
pub use crate::material::relative_permeability::*;
pub use crate::material::retention::*;
pub use crate::material::van_genuchten::*;
