//! Makes available common structures needed to run a simulation
//!
//! You may write `use semicontinuum::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::array::{new_backend, ArrayBackend, ParallelBackend, SerialBackend};
pub use crate::base::{Backend, Branch, Config, GridSpec, Randomization, RetentionFamily, SimError, TopFlux};
pub use crate::base::{DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::material::{new_retention_curve, PermeabilityField, RetentionCurve, RetentionTable};
pub use crate::sim::{FileIo, MassBalance, RelativeError, Simulation, Snapshot, SnapshotSink, State, Summary};
pub use crate::StrError;
