use crate::array::ArrayBackend;
use crate::base::{Config, GridSpec, TopFlux, MIDDLE_STRIP_WIDTH};
use crate::material::PermeabilityField;
use crate::StrError;
use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};
use std::ops::Range;

/// Implements the boundary conditions at the top and bottom faces of the medium
///
/// The top face receives a constant flux over a region selected by [TopFlux]. The bottom face
/// exchanges water with the outside according to a Darcy flux driven by gravity and the
/// pressure of the bottom cells, but never takes the saturation below the residual value.
/// A residual saturation ≥ 1 closes the bottom face. All other faces are impermeable.
pub struct Boundaries {
    /// Flux injected through the top face [m/s]
    top_flux: f64,

    /// Range of y indices of the injection region
    y_range: Range<usize>,

    /// Range of x indices of the injection region
    x_range: Range<usize>,

    /// Residual saturation of the bottom face (None if closed)
    residual: Option<f64>,

    /// Intrinsic permeability of the bottom layer (ny, 1, nx)
    k_bottom: Array3<f64>,

    /// Index of the bottom layer
    z_bottom: usize,

    rho_g: f64,
    mu_inv: f64,
    dl: f64,
    sm: f64,
}

/// Returns the (y, x) index ranges of the top cells receiving the flux
pub fn top_region(mode: TopFlux, grid: &GridSpec, x_size: f64) -> (Range<usize>, Range<usize>) {
    match mode {
        TopFlux::Full => (0..grid.ny, 0..grid.nx),
        TopFlux::MiddleStrip => {
            let width = usize::max(1, f64::round(MIDDLE_STRIP_WIDTH / grid.dl) as usize);
            let width = usize::min(width, grid.nx);
            let offset = f64::max(0.0, (x_size - MIDDLE_STRIP_WIDTH) / 2.0);
            let x0 = usize::min(f64::round(offset / grid.dl) as usize, grid.nx - width);
            (0..grid.ny, x0..x0 + width)
        }
        TopFlux::SingleCell => {
            // centre cell for odd counts; the cell after the centre for even counts
            let (y0, x0) = (grid.ny / 2, grid.nx / 2);
            (y0..y0 + 1, x0..x0 + 1)
        }
    }
}

impl Boundaries {
    /// Allocates a new instance
    pub fn new(config: &Config, grid: &GridSpec, permeability: &PermeabilityField) -> Result<Self, StrError> {
        if config.top_flux < 0.0 {
            return Err("top flux must be ≥ 0.0");
        }
        if config.viscosity <= 0.0 {
            return Err("viscosity must be > 0.0");
        }
        let (y_range, x_range) = top_region(config.top_flux_mode, grid, config.x_size);
        let residual = if config.bottom_is_open() {
            Some(config.saturation_residual)
        } else {
            None
        };
        Ok(Boundaries {
            top_flux: config.top_flux,
            y_range,
            x_range,
            residual,
            k_bottom: permeability.k_bottom(),
            z_bottom: grid.nz - 1,
            rho_g: config.rho_g(),
            mu_inv: 1.0 / config.viscosity,
            dl: grid.dl,
            sm: grid.sm,
        })
    }

    /// Returns the number of top cells receiving the flux
    pub fn n_top_cell(&self) -> usize {
        self.y_range.len() * self.x_range.len()
    }

    /// Returns the (y, x) index ranges of the top cells receiving the flux
    pub fn region(&self) -> (Range<usize>, Range<usize>) {
        (self.y_range.clone(), self.x_range.clone())
    }

    /// Indicates whether the bottom face exchanges water or not
    pub fn bottom_is_open(&self) -> bool {
        self.residual.is_some()
    }

    /// Sets the fluxes of the top face (z-faces with index 0)
    pub fn apply_top(&self, backend: &dyn ArrayBackend, mut flux_z: ArrayViewMut3<f64>) {
        let top = flux_z.slice_mut(s![.., 0..1, ..]);
        backend.fill_with(top, &|(i, _, k)| {
            if self.y_range.contains(&i) && self.x_range.contains(&k) {
                self.top_flux
            } else {
                0.0
            }
        });
    }

    /// Returns the sum of the fluxes through the top face
    pub fn total_top_flux(&self, backend: &dyn ArrayBackend, flux_z: ArrayView3<f64>) -> f64 {
        backend.sum(flux_z.slice(s![.., 0..1, ..]))
    }

    /// Computes the flux through the bottom face of the bottom cells
    ///
    /// `q = k·kr/μ · (ρg - (0 - P)/dl)`; the array is left untouched if the face is closed.
    pub fn update_bottom_flux(
        &self,
        backend: &dyn ArrayBackend,
        pressure: ArrayView3<f64>,
        rel_perm: ArrayView3<f64>,
        bottom_flux: ArrayViewMut3<f64>,
    ) {
        if self.residual.is_none() {
            return;
        }
        let z = self.z_bottom;
        backend.fill_with(bottom_flux, &|(i, _, k)| {
            let gradient = (0.0 - pressure[[i, z, k]]) / self.dl;
            self.mu_inv * self.k_bottom[[i, 0, k]] * rel_perm[[i, z, k]] * (self.rho_g - gradient)
        });
    }

    /// Applies the bottom exchange to the new saturation of the bottom cells
    ///
    /// `S_new = max(S_new + SM·q, min(S_new, S_residual))`
    ///
    /// Returns the total change of saturation caused by the exchange (zero if closed).
    pub fn apply_bottom(
        &self,
        backend: &dyn ArrayBackend,
        mut sl_new: ArrayViewMut3<f64>,
        bottom_flux: ArrayView3<f64>,
    ) -> f64 {
        let residual = match self.residual {
            Some(r) => r,
            None => return 0.0,
        };
        let z = self.z_bottom;
        let mut bottom = sl_new.slice_mut(s![.., z..z + 1, ..]);
        let before = backend.sum(bottom.view());
        backend.update(bottom.view_mut(), &|(i, _, k), s| {
            let limit = f64::min(s, residual);
            f64::max(s + self.sm * bottom_flux[[i, 0, k]], limit)
        });
        backend.sum(bottom.view()) - before
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{top_region, Boundaries};
    use crate::array::SerialBackend;
    use crate::base::{Config, GridSpec, Randomization, TopFlux};
    use crate::material::PermeabilityField;
    use crate::StrError;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn setup(config: &mut Config) -> Result<(GridSpec, PermeabilityField), StrError> {
        config.set_randomization(Randomization::None)?;
        let grid = GridSpec::new(config)?;
        let backend = SerialBackend::new();
        let permeability = PermeabilityField::new(&backend, config, &grid)?;
        Ok((grid, permeability))
    }

    #[test]
    fn top_region_works() -> Result<(), StrError> {
        let config = Config::new();
        let grid = GridSpec::new(&config)?;
        assert_eq!(top_region(TopFlux::Full, &grid, 0.1), (0..40, 0..40));
        // 1 cm strip = 4 cells starting at 4.5 cm / 0.25 cm = 18
        assert_eq!(top_region(TopFlux::MiddleStrip, &grid, 0.1), (0..40, 18..22));
        assert_eq!(top_region(TopFlux::SingleCell, &grid, 0.1), (20..21, 20..21));

        // narrow domain: the strip is clamped to the available cells
        let mut config = Config::new();
        config.set_domain(0.005, 0.0025, 0.01)?;
        let grid = GridSpec::new(&config)?;
        assert_eq!(top_region(TopFlux::MiddleStrip, &grid, 0.005), (0..1, 0..2));
        assert_eq!(top_region(TopFlux::SingleCell, &grid, 0.005), (0..1, 1..2));

        // odd counts: the single cell is the centre one
        let mut config = Config::new();
        config.set_domain(0.0075, 0.0125, 0.01)?;
        let grid = GridSpec::new(&config)?;
        assert_eq!((grid.nx, grid.ny), (3, 5));
        assert_eq!(top_region(TopFlux::SingleCell, &grid, 0.0075), (2..3, 1..2));
        assert_eq!(top_region(TopFlux::MiddleStrip, &grid, 0.0075), (0..5, 0..3));
        Ok(())
    }

    #[test]
    fn apply_top_works() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        let mut config = Config::new();
        config.set_domain(0.03, 0.01, 0.01)?.set_dl(0.005)?;
        config.set_top_flux(1e-4, TopFlux::MiddleStrip)?;
        let (grid, permeability) = setup(&mut config)?;
        let boundaries = Boundaries::new(&config, &grid, &permeability)?;
        let mut flux_z = Array3::<f64>::zeros(grid.shape_z_faces());
        boundaries.apply_top(&backend, flux_z.view_mut());
        // nx = 6; strip of 2 cells starting at 1 cm / 0.5 cm = 2
        assert_eq!(boundaries.region(), (0..2, 2..4));
        assert_eq!(boundaries.n_top_cell(), 4);
        for i in 0..grid.ny {
            for k in 0..grid.nx {
                let expected = if k == 2 || k == 3 { 1e-4 } else { 0.0 };
                assert_eq!(flux_z[[i, 0, k]], expected);
                assert_eq!(flux_z[[i, 1, k]], 0.0);
            }
        }
        assert_relative_eq!(boundaries.total_top_flux(&backend, flux_z.view()), 4e-4, epsilon = 1e-18);
        Ok(())
    }

    #[test]
    fn closed_bottom_does_nothing() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        let mut config = Config::new();
        config.set_domain(0.005, 0.005, 0.01)?.set_saturation_residual(1.05)?;
        let (grid, permeability) = setup(&mut config)?;
        let boundaries = Boundaries::new(&config, &grid, &permeability)?;
        assert!(!boundaries.bottom_is_open());
        let pressure = Array3::from_elem(grid.shape(), -100.0);
        let rel_perm = Array3::from_elem(grid.shape(), 0.5);
        let mut bottom_flux = Array3::<f64>::zeros(grid.shape_bottom());
        boundaries.update_bottom_flux(&backend, pressure.view(), rel_perm.view(), bottom_flux.view_mut());
        assert!(bottom_flux.iter().all(|&q| q == 0.0));
        let mut sl = Array3::from_elem(grid.shape(), 0.5);
        let exchanged = boundaries.apply_bottom(&backend, sl.view_mut(), bottom_flux.view());
        assert_eq!(exchanged, 0.0);
        assert!(sl.iter().all(|&s| s == 0.5));
        Ok(())
    }

    #[test]
    fn open_bottom_respects_the_residual() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        let mut config = Config::new();
        config.set_domain(0.005, 0.0025, 0.01)?.set_saturation_residual(0.05)?;
        let (grid, permeability) = setup(&mut config)?;
        let boundaries = Boundaries::new(&config, &grid, &permeability)?;
        assert!(boundaries.bottom_is_open());
        assert_eq!(grid.shape(), (1, 4, 2));

        // strong suction ⇒ negative flux
        let pressure = Array3::from_elem(grid.shape(), -1000.0);
        let rel_perm = Array3::from_elem(grid.shape(), 1.0);
        let mut bottom_flux = Array3::<f64>::zeros(grid.shape_bottom());
        boundaries.update_bottom_flux(&backend, pressure.view(), rel_perm.view(), bottom_flux.view_mut());
        let q = (config.kappa / config.viscosity) * (config.rho_g() - 1000.0 / 0.0025);
        for v in bottom_flux.iter() {
            assert_relative_eq!(*v, q, max_relative = 1e-12);
        }

        // cell above the residual decreases but never below it; cell below the residual is kept
        let mut sl = Array3::from_elem(grid.shape(), 0.3);
        sl[[0, 3, 0]] = 0.0500001;
        sl[[0, 3, 1]] = 0.01;
        let exchanged = boundaries.apply_bottom(&backend, sl.view_mut(), bottom_flux.view());
        assert_eq!(sl[[0, 3, 0]], 0.05);
        assert_eq!(sl[[0, 3, 1]], 0.01);
        assert_eq!(sl[[0, 2, 0]], 0.3);
        assert_relative_eq!(exchanged, -1e-7, epsilon = 1e-15);
        Ok(())
    }
}
