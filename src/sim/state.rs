use crate::base::GridSpec;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Holds the fields of the simulation at one time step
///
/// All arrays are indexed as (y, z, x).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct State {
    /// Number of steps performed
    pub step: usize,

    /// Simulation time
    pub time: f64,

    /// Liquid saturation of the cells
    ///
    /// (ny, nz, nx)
    pub saturation: Array3<f64>,

    /// Liquid pressure of the cells [Pa]
    ///
    /// (ny, nz, nx)
    pub pressure: Array3<f64>,

    /// Darcy fluxes through the x-faces, positive along +x [m/s]
    ///
    /// (ny, nz, nx + 1)
    pub flux_x: Array3<f64>,

    /// Darcy fluxes through the y-faces, positive along +y [m/s]
    ///
    /// (ny + 1, nz, nx)
    pub flux_y: Array3<f64>,

    /// Darcy fluxes through the z-faces, positive downwards [m/s]
    ///
    /// (ny, nz + 1, nx)
    pub flux_z: Array3<f64>,

    /// Net inflow of the cells (sum of the six bounding faces) [m/s]
    ///
    /// (ny, nz, nx)
    pub divergence: Array3<f64>,

    /// Relative permeability of the cells
    ///
    /// (ny, nz, nx)
    pub rel_perm: Array3<f64>,

    /// Flux through the bottom boundary [m/s]
    ///
    /// (ny, 1, nx)
    pub bottom_flux: Array3<f64>,
}

impl State {
    /// Allocates a new instance with zero-filled arrays
    pub fn new(grid: &GridSpec) -> Self {
        State {
            step: 0,
            time: 0.0,
            saturation: Array3::zeros(grid.shape()),
            pressure: Array3::zeros(grid.shape()),
            flux_x: Array3::zeros(grid.shape_x_faces()),
            flux_y: Array3::zeros(grid.shape_y_faces()),
            flux_z: Array3::zeros(grid.shape_z_faces()),
            divergence: Array3::zeros(grid.shape()),
            rel_perm: Array3::zeros(grid.shape()),
            bottom_flux: Array3::zeros(grid.shape_bottom()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
