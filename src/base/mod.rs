//! Implements the base structures for a semi-continuum simulation

mod config;
mod constants;
mod enums;
mod error;
mod grid_spec;
mod json_io;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::enums::*;
pub use crate::base::error::*;
pub use crate::base::grid_spec::*;
pub use crate::base::json_io::*;
