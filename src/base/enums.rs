use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the region of the top boundary where the flux is injected
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum TopFlux {
    /// Flux over the whole top face
    Full,

    /// Flux over a centered strip, 1 cm wide along x and spanning the whole y extent
    MiddleStrip,

    /// Flux into the single centered top cell
    SingleCell,
}

/// Defines the closed-form family of the retention curves
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum RetentionFamily {
    /// van Genuchten curves calibrated for 20/30 sand
    VanGenuchten,

    /// Logistic curves
    Logistic,
}

/// Defines a main branch of the hysteresis envelope
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Branch {
    /// Main wetting branch
    Wet,

    /// Main draining branch
    Drain,
}

/// Defines how the multiplier of the intrinsic permeability is generated
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Randomization {
    /// Uniform intrinsic permeability (multiplier equal to one)
    None,

    /// Normal noise at the grid resolution smoothed by a box kernel
    Filter {
        /// Number of cells of the box kernel along each axis
        kernel_size: usize,

        /// Standard deviation of the noise before smoothing
        amplitude: f64,
    },

    /// Normal noise on coarse blocks interpolated onto the grid
    Interpolation {
        /// Edge length of the coarse blocks [m]
        block_size: f64,

        /// Standard deviation of the noise
        amplitude: f64,
    },

    /// Noise field previously generated and saved as JSON
    FromFile {
        /// Path to the JSON file
        path: String,
    },
}

impl Randomization {
    /// Returns the filter method with its usual parameters
    pub fn filter() -> Self {
        Randomization::Filter {
            kernel_size: 6,
            amplitude: 0.8,
        }
    }

    /// Returns the interpolation method with its usual parameters
    pub fn interpolation() -> Self {
        Randomization::Interpolation {
            block_size: 0.025,
            amplitude: 0.3,
        }
    }
}

/// Defines the array backend used by the solver
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Backend {
    /// Single-threaded element-wise operations
    Serial,

    /// Data-parallel element-wise operations on a dedicated thread pool
    Parallel {
        /// Number of threads of the pool
        n_thread: usize,
    },
}

impl fmt::Display for TopFlux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopFlux::Full => write!(f, "full top boundary"),
            TopFlux::MiddleStrip => write!(f, "middle strip (1 cm)"),
            TopFlux::SingleCell => write!(f, "single middle cell"),
        }
    }
}

impl fmt::Display for RetentionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionFamily::VanGenuchten => write!(f, "van Genuchten"),
            RetentionFamily::Logistic => write!(f, "logistic"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
