use super::{Config, GRID_TOLERANCE};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the grid dimensions and the time-stepping constants derived from the configuration
///
/// All fields are indexed as (y, z, x) where z is the depth (pointing downwards).
///
/// The time step is `dt = dx_par² · dt_base`, thus halving the block size quarters the time step.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct GridSpec {
    /// Number of blocks along x
    pub nx: usize,

    /// Number of blocks along y
    pub ny: usize,

    /// Number of blocks along z
    pub nz: usize,

    /// Edge length of the blocks [m]
    pub dl: f64,

    /// Ratio of dl and the reference length
    pub dx_par: f64,

    /// Time step [s]
    pub dt: f64,

    /// Factor converting a net flux into a saturation increment: `SM = dt / (θ · dl)` [s/m]
    pub sm: f64,

    /// Number of time steps needed to reach the simulated time
    pub n_iteration: usize,

    /// Number of time steps between checkpoints
    pub print_modulo: usize,
}

impl GridSpec {
    /// Allocates a new instance
    pub fn new(config: &Config) -> Result<Self, StrError> {
        if config.dl <= 0.0 {
            return Err("dl must be > 0.0");
        }
        if config.reference_length <= 0.0 || config.dt_base <= 0.0 {
            return Err("reference_length and dt_base must be > 0.0");
        }
        if config.porosity <= 0.0 {
            return Err("porosity must be > 0.0");
        }
        if config.realtime <= 0.0 || config.time_interval <= 0.0 {
            return Err("realtime and time_interval must be > 0.0");
        }
        let nx = number_of_blocks(config.x_size, config.dl);
        let ny = number_of_blocks(config.y_size, config.dl);
        let nz = number_of_blocks(config.z_size, config.dl);
        if nx == 0 {
            return Err("x_size is smaller than dl; there would be no blocks along x");
        }
        if ny == 0 {
            return Err("y_size is smaller than dl; there would be no blocks along y");
        }
        if nz == 0 {
            return Err("z_size is smaller than dl; there would be no blocks along z");
        }
        let dx_par = config.dl / config.reference_length;
        let dt = dx_par * dx_par * config.dt_base;
        let sm = dt / (config.porosity * config.dl);
        let n_iteration = f64::round(config.realtime / dt) as usize;
        let print_modulo = usize::max(1, f64::round(config.time_interval / dt) as usize);
        Ok(GridSpec {
            nx,
            ny,
            nz,
            dl: config.dl,
            dx_par,
            dt,
            sm,
            n_iteration,
            print_modulo,
        })
    }

    /// Returns the total number of blocks
    pub fn n_cell(&self) -> usize {
        self.ny * self.nz * self.nx
    }

    /// Returns the shape of the cell-centered fields (ny, nz, nx)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.ny, self.nz, self.nx)
    }

    /// Returns the shape of the x-faces (ny, nz, nx + 1)
    pub fn shape_x_faces(&self) -> (usize, usize, usize) {
        (self.ny, self.nz, self.nx + 1)
    }

    /// Returns the shape of the y-faces (ny + 1, nz, nx)
    pub fn shape_y_faces(&self) -> (usize, usize, usize) {
        (self.ny + 1, self.nz, self.nx)
    }

    /// Returns the shape of the z-faces (ny, nz + 1, nx)
    pub fn shape_z_faces(&self) -> (usize, usize, usize) {
        (self.ny, self.nz + 1, self.nx)
    }

    /// Returns the shape of the bottom slab (ny, 1, nx)
    pub fn shape_bottom(&self) -> (usize, usize, usize) {
        (self.ny, 1, self.nx)
    }

    /// Returns the simulation time after a number of steps
    pub fn time(&self, step: usize) -> f64 {
        step as f64 * self.dt
    }
}

/// Returns floor(extent / dl) allowing for round-off in the ratio
fn number_of_blocks(extent: f64, dl: f64) -> usize {
    if extent <= 0.0 {
        return 0;
    }
    f64::floor(extent / dl + GRID_TOLERANCE) as usize
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
