use crate::array::{box_filter, cubic_resample, ArrayBackend};
use crate::base::{read_json, write_json, Config, GridSpec, Randomization, GRID_TOLERANCE};
use crate::StrError;
use ndarray::{s, Array3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::ffi::OsStr;

/// Holds the intrinsic permeability of the cells and the hydraulic conductances of the faces
///
/// The conductance between two adjacent cells i and j is `sqrt(k_i)·sqrt(k_j)/μ`. Only the
/// interior faces are stored, thus `cond_x` has shape (ny, nz, nx-1), `cond_y` has shape
/// (ny-1, nz, nx), and `cond_z` has shape (ny, nz-1, nx).
#[derive(Clone, Debug)]
pub struct PermeabilityField {
    /// Holds the noise field (None if the randomization is disabled)
    pub noise: Option<Array3<f64>>,

    /// Holds the multiplier of the reference permeability (always positive)
    pub multiplier: Array3<f64>,

    /// Holds the intrinsic permeability of each cell [m²]
    pub k_cell: Array3<f64>,

    /// Holds the conductances of the interior x-faces [m²/(Pa·s)]
    pub cond_x: Array3<f64>,

    /// Holds the conductances of the interior y-faces [m²/(Pa·s)]
    pub cond_y: Array3<f64>,

    /// Holds the conductances of the interior z-faces [m²/(Pa·s)]
    pub cond_z: Array3<f64>,
}

/// Holds the extrema of the generated fields
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PermeabilityStats {
    /// Minimum and maximum of the noise (None if the randomization is disabled)
    pub noise_range: Option<(f64, f64)>,

    /// Minimum intrinsic permeability
    pub k_min: f64,

    /// Maximum intrinsic permeability
    pub k_max: f64,

    /// Mean intrinsic permeability
    pub k_mean: f64,
}

/// Allocates the random number generator; a seed makes the noise reproducible
pub fn new_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Returns a field of normal noise with zero mean and standard deviation `amplitude`
fn normal_noise<R: Rng>(rng: &mut R, shape: (usize, usize, usize), amplitude: f64) -> Array3<f64> {
    Array3::from_shape_fn(shape, |_| {
        let r: f64 = rng.sample(StandardNormal);
        amplitude * r
    })
}

/// Returns the number of coarse blocks covering an extent
fn number_of_coarse_blocks(extent: f64, block_size: f64) -> usize {
    usize::max(1, f64::ceil(extent / block_size - GRID_TOLERANCE) as usize)
}

/// Generates the noise field of the intrinsic permeability
///
/// Returns None if the randomization is disabled.
pub fn generate_noise<R: Rng>(
    backend: &dyn ArrayBackend,
    config: &Config,
    grid: &GridSpec,
    rng: &mut R,
) -> Result<Option<Array3<f64>>, StrError> {
    match &config.randomization {
        Randomization::None => Ok(None),
        Randomization::Filter { kernel_size, amplitude } => {
            let white = normal_noise(rng, grid.shape(), *amplitude);
            Ok(Some(box_filter(backend, &white, *kernel_size)?))
        }
        Randomization::Interpolation { block_size, amplitude } => {
            if *block_size <= 0.0 {
                return Err("block_size of the interpolation method must be > 0.0");
            }
            let coarse_shape = (
                number_of_coarse_blocks(config.y_size, *block_size),
                number_of_coarse_blocks(config.z_size, *block_size),
                number_of_coarse_blocks(config.x_size, *block_size),
            );
            let coarse = normal_noise(rng, coarse_shape, *amplitude);
            Ok(Some(cubic_resample(backend, &coarse, grid.shape())?))
        }
        Randomization::FromFile { path } => {
            let noise = read_noise(path)?;
            if noise.dim() != grid.shape() {
                return Err("the shape of the noise field in the file does not match the grid");
            }
            Ok(Some(noise))
        }
    }
}

/// Reads a noise field from a JSON file
pub fn read_noise<P>(full_path: &P) -> Result<Array3<f64>, StrError>
where
    P: AsRef<OsStr> + ?Sized,
{
    read_json(full_path)
}

/// Writes a noise field to a JSON file
pub fn write_noise<P>(full_path: &P, noise: &Array3<f64>) -> Result<(), StrError>
where
    P: AsRef<OsStr> + ?Sized,
{
    write_json(full_path, noise)
}

impl PermeabilityField {
    /// Generates the field according to the configuration
    pub fn new(backend: &dyn ArrayBackend, config: &Config, grid: &GridSpec) -> Result<Self, StrError> {
        let mut rng = new_rng(config.seed);
        let noise = generate_noise(backend, config, grid, &mut rng)?;
        PermeabilityField::from_noise(backend, grid, noise, config.kappa, config.viscosity)
    }

    /// Computes the permeability and conductances from a given noise field
    pub fn from_noise(
        backend: &dyn ArrayBackend,
        grid: &GridSpec,
        noise: Option<Array3<f64>>,
        kappa: f64,
        viscosity: f64,
    ) -> Result<Self, StrError> {
        if kappa <= 0.0 {
            return Err("kappa must be > 0.0");
        }
        if viscosity <= 0.0 {
            return Err("viscosity must be > 0.0");
        }
        let mut multiplier = Array3::<f64>::ones(grid.shape());
        if let Some(r) = &noise {
            if r.dim() != grid.shape() {
                return Err("the shape of the noise field does not match the grid");
            }
            backend.fill_with(multiplier.view_mut(), &|(i, j, k)| PermeabilityField::multiplier(r[[i, j, k]]));
        }
        let mut k_cell = Array3::<f64>::zeros(grid.shape());
        backend.fill_with(k_cell.view_mut(), &|(i, j, k)| kappa * multiplier[[i, j, k]]);

        // conductances of the interior faces
        let k_sqrt = k_cell.mapv(f64::sqrt);
        let mu_inv = 1.0 / viscosity;
        let (ny, nz, nx) = grid.shape();
        let mut cond_x = Array3::<f64>::zeros((ny, nz, nx - 1));
        let mut cond_y = Array3::<f64>::zeros((ny - 1, nz, nx));
        let mut cond_z = Array3::<f64>::zeros((ny, nz - 1, nx));
        backend.fill_with(cond_x.view_mut(), &|(i, j, k)| {
            mu_inv * k_sqrt[[i, j, k]] * k_sqrt[[i, j, k + 1]]
        });
        backend.fill_with(cond_y.view_mut(), &|(i, j, k)| {
            mu_inv * k_sqrt[[i, j, k]] * k_sqrt[[i + 1, j, k]]
        });
        backend.fill_with(cond_z.view_mut(), &|(i, j, k)| {
            mu_inv * k_sqrt[[i, j, k]] * k_sqrt[[i, j + 1, k]]
        });
        Ok(PermeabilityField {
            noise,
            multiplier,
            k_cell,
            cond_x,
            cond_y,
            cond_z,
        })
    }

    /// Maps a noise value to a strictly positive multiplier
    ///
    /// `r > 0 ⇒ 1 + r`, `r < 0 ⇒ 1/(1 - r)`, `r = 0 ⇒ 1`
    pub fn multiplier(r: f64) -> f64 {
        if r > 0.0 {
            1.0 + r
        } else if r < 0.0 {
            1.0 / (1.0 - r)
        } else {
            1.0
        }
    }

    /// Returns the intrinsic permeability of the bottom layer with shape (ny, 1, nx)
    pub fn k_bottom(&self) -> Array3<f64> {
        let nz = self.k_cell.dim().1;
        self.k_cell.slice(s![.., nz - 1..nz, ..]).to_owned()
    }

    /// Computes the extrema of the generated fields
    pub fn stats(&self, backend: &dyn ArrayBackend) -> PermeabilityStats {
        let noise_range = self.noise.as_ref().map(|r| backend.min_max(r.view()));
        let (k_min, k_max) = backend.min_max(self.k_cell.view());
        PermeabilityStats {
            noise_range,
            k_min,
            k_max,
            k_mean: backend.mean(self.k_cell.view()),
        }
    }

    /// Logs the extrema of the generated fields
    pub fn log_stats(&self, backend: &dyn ArrayBackend, kappa: f64) {
        let stats = self.stats(backend);
        match stats.noise_range {
            Some((min, max)) => {
                log::info!("noise of the intrinsic permeability: min = {:e}, max = {:e}", min, max);
                log::info!(
                    "intrinsic permeability: min = {:e}, max = {:e}, mean = {:e} (reference = {:e})",
                    stats.k_min,
                    stats.k_max,
                    stats.k_mean,
                    kappa
                );
            }
            None => log::info!("uniform intrinsic permeability = {:e}", kappa),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
