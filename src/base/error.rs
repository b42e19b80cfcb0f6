use crate::StrError;
use thiserror::Error;

/// Defines the errors that stop a simulation
///
/// Low-level constructors and validators return [StrError]; these messages are converted into
/// [SimError::Configuration] when they reach the simulation driver.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimError {
    /// Invalid or inconsistent configuration detected at initialization
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Saturation left the admissible interval [0, limit] during the time loop
    #[error(
        "numerical divergence at step {step} (t = {time} s): saturation range [{min}, {max}] is outside [0, {limit}]"
    )]
    NumericalDivergence {
        /// Index of the offending step
        step: usize,

        /// Simulation time at the offending step
        time: f64,

        /// Minimum saturation of the field
        min: f64,

        /// Maximum saturation of the field
        max: f64,

        /// Upper limit of the saturation
        limit: f64,
    },

    /// Failure of a file operation owned by the driver
    #[error("output error: {0}")]
    Io(String),
}

impl From<StrError> for SimError {
    fn from(message: StrError) -> Self {
        SimError::Configuration(message.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
