use crate::array::ArrayBackend;
use crate::material::{PermeabilityField, RelativePermeability};
use ndarray::{Array3, ArrayView3, ArrayViewMut3, Axis};

/// Computes the Darcy fluxes at the faces and the saturation increment of the cells
///
/// The flux through the interior face between cells i and j (j after i along the axis) is
///
/// ```text
/// q = cond · sqrt(kr_i) · sqrt(kr_j) · (g_axis - (P_j - P_i) / dl)
/// ```
///
/// where `g_axis` is ρ·g along z (pointing downwards) and zero along x and y. The saturation
/// increment of a cell is `SM` times the net inflow through its six faces.
pub struct FluxTransport {
    /// Factor converting a net flux into a saturation increment
    sm: f64,

    /// Block size
    dl: f64,

    /// Gravity term along z
    rho_g: f64,

    /// Upper limit of the saturation
    lim_value: f64,

    /// Relative permeability model
    rel_perm_model: RelativePermeability,

    /// Square root of the relative permeability (ny, nz, nx)
    kr_sqrt: Array3<f64>,

    /// Saturation at the end of the current step (ny, nz, nx)
    pub sl_new: Array3<f64>,
}

impl FluxTransport {
    /// Allocates a new instance
    pub fn new(
        shape: (usize, usize, usize),
        sm: f64,
        dl: f64,
        rho_g: f64,
        lim_value: f64,
        rel_perm_model: RelativePermeability,
    ) -> Self {
        FluxTransport {
            sm,
            dl,
            rho_g,
            lim_value,
            rel_perm_model,
            kr_sqrt: Array3::zeros(shape),
            sl_new: Array3::zeros(shape),
        }
    }

    /// Computes the net inflow of each cell
    ///
    /// `Q = qx[k] - qx[k+1] + qy[i] - qy[i+1] + qz[j] - qz[j+1]`
    pub fn divergence(
        &self,
        backend: &dyn ArrayBackend,
        flux_x: ArrayView3<f64>,
        flux_y: ArrayView3<f64>,
        flux_z: ArrayView3<f64>,
        divergence: ArrayViewMut3<f64>,
    ) {
        backend.fill_with(divergence, &|(i, j, k)| {
            flux_x[[i, j, k]] - flux_x[[i, j, k + 1]] + flux_y[[i, j, k]] - flux_y[[i + 1, j, k]] + flux_z[[i, j, k]]
                - flux_z[[i, j + 1, k]]
        });
    }

    /// Computes the new saturation `S_new = S + SM·Q` (stored in `sl_new`)
    pub fn advance_saturation(&mut self, backend: &dyn ArrayBackend, sl: ArrayView3<f64>, divergence: ArrayView3<f64>) {
        let sm = self.sm;
        backend.fill_with(self.sl_new.view_mut(), &|idx| {
            let (i, j, k) = idx;
            sl[[i, j, k]] + sm * divergence[[i, j, k]]
        });
    }

    /// Returns the excess of saturation above the limit to the cell above (along z)
    ///
    /// Each column is swept from the bottom to the top. The excess of the top cell cannot go
    /// anywhere else, thus it is removed and accounted for in the returned amount.
    ///
    /// Only the vertical direction is considered; no lateral redistribution is performed.
    pub fn return_overflow(&mut self) -> f64 {
        let lim = self.lim_value;
        let mut rejected = 0.0;
        for mut column in self.sl_new.lanes_mut(Axis(1)) {
            let nz = column.len();
            for j in (0..nz).rev() {
                let excess = column[j] - lim;
                if excess > 0.0 {
                    column[j] = lim;
                    if j > 0 {
                        column[j - 1] += excess;
                    } else {
                        rejected += excess;
                    }
                }
            }
        }
        rejected
    }

    /// Computes the relative permeability from the saturation
    pub fn update_rel_perm(&mut self, backend: &dyn ArrayBackend, sl: ArrayView3<f64>, mut rel_perm: ArrayViewMut3<f64>) {
        self.rel_perm_model.calculate_into(backend, sl, rel_perm.view_mut());
        let kr = rel_perm.view();
        backend.fill_with(self.kr_sqrt.view_mut(), &|(i, j, k)| f64::sqrt(kr[[i, j, k]]));
    }

    /// Computes the fluxes through the interior faces
    ///
    /// The lateral boundary faces and the bottom face carry zero flux (the bottom exchange is
    /// handled separately); the top face keeps its boundary value.
    pub fn update_fluxes(
        &self,
        backend: &dyn ArrayBackend,
        permeability: &PermeabilityField,
        pressure: ArrayView3<f64>,
        flux_x: ArrayViewMut3<f64>,
        flux_y: ArrayViewMut3<f64>,
        flux_z: ArrayViewMut3<f64>,
    ) {
        let kr = &self.kr_sqrt;
        let dl = self.dl;
        let rho_g = self.rho_g;
        let nx = kr.dim().2;
        let ny = kr.dim().0;
        let nz = kr.dim().1;
        let cond_x = &permeability.cond_x;
        let cond_y = &permeability.cond_y;
        let cond_z = &permeability.cond_z;
        backend.fill_with(flux_x, &|(i, j, k)| {
            if k == 0 || k == nx {
                return 0.0;
            }
            let gradient = (pressure[[i, j, k]] - pressure[[i, j, k - 1]]) / dl;
            cond_x[[i, j, k - 1]] * kr[[i, j, k - 1]] * kr[[i, j, k]] * (0.0 - gradient)
        });
        backend.fill_with(flux_y, &|(i, j, k)| {
            if i == 0 || i == ny {
                return 0.0;
            }
            let gradient = (pressure[[i, j, k]] - pressure[[i - 1, j, k]]) / dl;
            cond_y[[i - 1, j, k]] * kr[[i - 1, j, k]] * kr[[i, j, k]] * (0.0 - gradient)
        });
        backend.update(flux_z, &|(i, j, k), old| {
            if j == 0 {
                return old;
            }
            if j == nz {
                return 0.0;
            }
            let gradient = (pressure[[i, j, k]] - pressure[[i, j - 1, k]]) / dl;
            cond_z[[i, j - 1, k]] * kr[[i, j - 1, k]] * kr[[i, j, k]] * (rho_g - gradient)
        });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
