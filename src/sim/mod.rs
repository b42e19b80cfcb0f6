//! Implements the explicit time stepping of the semi-continuum model

mod boundaries;
mod file_io;
mod hysteresis;
mod mass_balance;
mod simulation;
mod state;
mod transport;
pub use crate::sim::boundaries::*;
pub use crate::sim::file_io::*;
pub use crate::sim::hysteresis::*;
pub use crate::sim::mass_balance::*;
pub use crate::sim::simulation::*;
pub use crate::sim::state::*;
pub use crate::sim::transport::*;
