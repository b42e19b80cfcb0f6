/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/semicontinuum/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/semicontinuum/test";

/// Defines the default filename stem of the output files
pub const DEFAULT_FILENAME_STEM: &str = "semicontinuum";

/// Defines the tolerance added to extent/dL before truncation
///
/// Avoids losing a cell when the ratio is an integer up to round-off (e.g., 0.075/0.0025).
pub const GRID_TOLERANCE: f64 = 1e-9;

/// Defines the width of the middle strip used by the top boundary condition [m]
pub const MIDDLE_STRIP_WIDTH: f64 = 0.01;

/// Defines the smallest distance from 0 and 1 of the (scaled) saturation fed to retention curves
pub const SATURATION_EPSILON: f64 = 1e-4;
