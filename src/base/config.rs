use super::{read_json, write_json, Backend, Branch, Randomization, RetentionFamily, TopFlux};
use super::DEFAULT_FILENAME_STEM;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;

/// Holds the configuration of a simulation
///
/// The default values correspond to a 10 cm × 10 cm × 30 cm box of 20/30 sand discretized with
/// 2.5 mm blocks and wetted from the whole top face during 20 s.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Width of the medium along x [m]
    pub x_size: f64,

    /// Width of the medium along y [m]
    pub y_size: f64,

    /// Depth of the medium (z axis, pointing downwards) [m]
    pub z_size: f64,

    /// Edge length of the blocks (cells) [m]
    pub dl: f64,

    /// Simulated (real) time [s]
    pub realtime: f64,

    /// Initial saturation [-]
    pub initial_saturation: f64,

    /// Flux injected through the top boundary [m/s]
    pub top_flux: f64,

    /// Region of the top boundary where the flux is injected
    pub top_flux_mode: TopFlux,

    /// Residual saturation gating the bottom outflow
    ///
    /// A value ≥ 1.0 closes the bottom boundary.
    pub saturation_residual: f64,

    /// Family of the retention curves
    pub retention: RetentionFamily,

    /// Main branch defining the initial pressure
    pub initial_branch: Branch,

    /// Gradient of the transition between the main branches (hysteresis stiffness) [Pa]
    pub kps: f64,

    /// Exponent λ of the relative permeability
    pub lambda: f64,

    /// Largest admissible saturation (used instead of unity)
    pub lim_value: f64,

    /// Randomization of the intrinsic permeability
    pub randomization: Randomization,

    /// Seed of the random number generator (None means entropy)
    pub seed: Option<u64>,

    /// Array backend
    pub backend: Backend,

    /// Returns the excess above lim_value to the cell above instead of stopping the simulation
    ///
    /// **Note:** Only the vertical (1D) return is available.
    pub overflow_return: bool,

    /// Interval between checkpoints [s]
    pub time_interval: f64,

    /// Time step used with blocks of reference length [s]
    pub dt_base: f64,

    /// Reference length of the blocks defining dt_base [m]
    pub reference_length: f64,

    /// Porosity θ
    pub porosity: f64,

    /// Intrinsic permeability κ [m²]
    pub kappa: f64,

    /// Dynamic viscosity μ [Pa·s]
    pub viscosity: f64,

    /// Density of water ρ [kg/m³]
    pub density: f64,

    /// Acceleration due to gravity g [m/s²]
    pub gravity: f64,

    /// Relative tolerance of the mass balance check
    pub mass_balance_tol: f64,

    /// Output directory (None means that no files are written)
    pub output_dir: Option<String>,

    /// Filename stem of the output files
    pub filename_stem: String,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            x_size: 0.10,
            y_size: 0.10,
            z_size: 0.30,
            dl: 0.25 * 0.01,
            realtime: 20.0,
            initial_saturation: 0.01,
            top_flux: 8e-5,
            top_flux_mode: TopFlux::Full,
            saturation_residual: 1.05,
            retention: RetentionFamily::VanGenuchten,
            initial_branch: Branch::Wet,
            kps: 1e5,
            lambda: 0.8,
            lim_value: 0.999,
            randomization: Randomization::interpolation(),
            seed: None,
            backend: Backend::Serial,
            overflow_return: false,
            time_interval: 1.0,
            dt_base: 1e-3 * 0.25,
            reference_length: 0.01,
            porosity: 0.35,
            kappa: 2.293577981651376e-10,
            viscosity: 9e-4,
            density: 1000.0,
            gravity: 9.81,
            mass_balance_tol: 1e-3,
            output_dir: None,
            filename_stem: DEFAULT_FILENAME_STEM.to_string(),
        }
    }

    /// Sets the size of the medium along x, y, and z
    pub fn set_domain(&mut self, x_size: f64, y_size: f64, z_size: f64) -> Result<&mut Self, StrError> {
        if x_size <= 0.0 || y_size <= 0.0 || z_size <= 0.0 {
            return Err("the size of the medium must be > 0.0 along all axes");
        }
        self.x_size = x_size;
        self.y_size = y_size;
        self.z_size = z_size;
        Ok(self)
    }

    /// Sets the edge length of the blocks
    pub fn set_dl(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("dl must be > 0.0");
        }
        self.dl = value;
        Ok(self)
    }

    /// Sets the simulated time
    pub fn set_realtime(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("realtime must be > 0.0");
        }
        self.realtime = value;
        Ok(self)
    }

    /// Sets the initial saturation
    pub fn set_initial_saturation(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 || value >= self.lim_value {
            return Err("initial saturation must satisfy 0.0 ≤ S0 < lim_value");
        }
        self.initial_saturation = value;
        Ok(self)
    }

    /// Sets the flux injected through the top boundary and the injection region
    pub fn set_top_flux(&mut self, value: f64, mode: TopFlux) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("top flux must be ≥ 0.0");
        }
        self.top_flux = value;
        self.top_flux_mode = mode;
        Ok(self)
    }

    /// Sets the residual saturation of the bottom boundary (≥ 1.0 closes the boundary)
    pub fn set_saturation_residual(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("residual saturation must be ≥ 0.0");
        }
        self.saturation_residual = value;
        Ok(self)
    }

    /// Sets the family of the retention curves and the branch defining the initial pressure
    pub fn set_retention(&mut self, family: RetentionFamily, initial_branch: Branch) -> Result<&mut Self, StrError> {
        self.retention = family;
        self.initial_branch = initial_branch;
        Ok(self)
    }

    /// Sets the randomization of the intrinsic permeability
    pub fn set_randomization(&mut self, option: Randomization) -> Result<&mut Self, StrError> {
        match &option {
            Randomization::None => (),
            Randomization::Filter { kernel_size, amplitude } => {
                if *kernel_size < 1 {
                    return Err("kernel_size of the filter method must be ≥ 1");
                }
                if *amplitude < 0.0 {
                    return Err("amplitude of the randomization must be ≥ 0.0");
                }
            }
            Randomization::Interpolation { block_size, amplitude } => {
                if *block_size <= 0.0 {
                    return Err("block_size of the interpolation method must be > 0.0");
                }
                if *amplitude < 0.0 {
                    return Err("amplitude of the randomization must be ≥ 0.0");
                }
            }
            Randomization::FromFile { path } => {
                if path.is_empty() {
                    return Err("the path of the permeability file must not be empty");
                }
            }
        }
        self.randomization = option;
        Ok(self)
    }

    /// Sets the seed of the random number generator
    pub fn set_seed(&mut self, seed: u64) -> Result<&mut Self, StrError> {
        self.seed = Some(seed);
        Ok(self)
    }

    /// Sets the array backend
    pub fn set_backend(&mut self, backend: Backend) -> Result<&mut Self, StrError> {
        if let Backend::Parallel { n_thread } = backend {
            if n_thread < 1 {
                return Err("the parallel backend requires n_thread ≥ 1");
            }
        }
        self.backend = backend;
        Ok(self)
    }

    /// Enables the output files in the given directory
    pub fn set_output(&mut self, output_dir: &str, filename_stem: &str) -> Result<&mut Self, StrError> {
        if output_dir.is_empty() {
            return Err("the output directory must not be empty");
        }
        if filename_stem.is_empty() {
            return Err("the filename stem must not be empty");
        }
        self.output_dir = Some(output_dir.to_string());
        self.filename_stem = filename_stem.to_string();
        Ok(self)
    }

    /// Returns the density of water times the acceleration due to gravity
    pub fn rho_g(&self) -> f64 {
        self.density * self.gravity
    }

    /// Returns the discretization parameter (ratio of dl and the reference length)
    pub fn dx_par(&self) -> f64 {
        self.dl / self.reference_length
    }

    /// Indicates whether the bottom boundary lets water out or not
    pub fn bottom_is_open(&self) -> bool {
        self.saturation_residual < 1.0
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.x_size <= 0.0 || self.y_size <= 0.0 || self.z_size <= 0.0 {
            return Some(format!(
                "(x_size, y_size, z_size) = ({:?}, {:?}, {:?}) is incorrect; all must be > 0.0",
                self.x_size, self.y_size, self.z_size
            ));
        }
        if self.dl <= 0.0 {
            return Some(format!("dl = {:?} is incorrect; it must be > 0.0", self.dl));
        }
        if self.realtime <= 0.0 {
            return Some(format!("realtime = {:?} is incorrect; it must be > 0.0", self.realtime));
        }
        if self.lim_value <= 0.0 || self.lim_value > 1.0 {
            return Some(format!(
                "lim_value = {:?} is incorrect; it must satisfy 0.0 < lim_value ≤ 1.0",
                self.lim_value
            ));
        }
        if self.initial_saturation < 0.0 || self.initial_saturation >= self.lim_value {
            return Some(format!(
                "initial_saturation = {:?} is incorrect; it must satisfy 0.0 ≤ S0 < lim_value = {:?}",
                self.initial_saturation, self.lim_value
            ));
        }
        if self.top_flux < 0.0 {
            return Some(format!("top_flux = {:?} is incorrect; it must be ≥ 0.0", self.top_flux));
        }
        if self.saturation_residual < 0.0 {
            return Some(format!(
                "saturation_residual = {:?} is incorrect; it must be ≥ 0.0",
                self.saturation_residual
            ));
        }
        if self.kps <= 0.0 {
            return Some(format!("kps = {:?} is incorrect; it must be > 0.0", self.kps));
        }
        if self.lambda <= 0.0 {
            return Some(format!("lambda = {:?} is incorrect; it must be > 0.0", self.lambda));
        }
        match &self.randomization {
            Randomization::None => (),
            Randomization::Filter { kernel_size, amplitude } => {
                if *kernel_size < 1 {
                    return Some(format!("kernel_size = {} is incorrect; it must be ≥ 1", kernel_size));
                }
                if *amplitude < 0.0 {
                    return Some(format!("amplitude = {:?} is incorrect; it must be ≥ 0.0", amplitude));
                }
            }
            Randomization::Interpolation { block_size, amplitude } => {
                if *block_size <= 0.0 {
                    return Some(format!("block_size = {:?} is incorrect; it must be > 0.0", block_size));
                }
                if *amplitude < 0.0 {
                    return Some(format!("amplitude = {:?} is incorrect; it must be ≥ 0.0", amplitude));
                }
            }
            Randomization::FromFile { path } => {
                if path.is_empty() {
                    return Some("the path of the permeability file is missing".to_string());
                }
            }
        }
        if let Backend::Parallel { n_thread } = self.backend {
            if n_thread < 1 {
                return Some(format!("n_thread = {} is incorrect; it must be ≥ 1", n_thread));
            }
        }
        if self.time_interval <= 0.0 {
            return Some(format!(
                "time_interval = {:?} is incorrect; it must be > 0.0",
                self.time_interval
            ));
        }
        if self.dt_base <= 0.0 {
            return Some(format!("dt_base = {:?} is incorrect; it must be > 0.0", self.dt_base));
        }
        if self.reference_length <= 0.0 {
            return Some(format!(
                "reference_length = {:?} is incorrect; it must be > 0.0",
                self.reference_length
            ));
        }
        if self.porosity <= 0.0 || self.porosity > 1.0 {
            return Some(format!(
                "porosity = {:?} is incorrect; it must satisfy 0.0 < θ ≤ 1.0",
                self.porosity
            ));
        }
        if self.kappa <= 0.0 {
            return Some(format!("kappa = {:?} is incorrect; it must be > 0.0", self.kappa));
        }
        if self.viscosity <= 0.0 {
            return Some(format!("viscosity = {:?} is incorrect; it must be > 0.0", self.viscosity));
        }
        if self.density <= 0.0 {
            return Some(format!("density = {:?} is incorrect; it must be > 0.0", self.density));
        }
        if self.gravity < 0.0 {
            return Some(format!("gravity = {:?} is incorrect; it must be ≥ 0.0", self.gravity));
        }
        if self.mass_balance_tol <= 0.0 {
            return Some(format!(
                "mass_balance_tol = {:?} is incorrect; it must be > 0.0",
                self.mass_balance_tol
            ));
        }
        if self.filename_stem.is_empty() {
            return Some("the filename stem must not be empty".to_string());
        }
        None // all good
    }

    /// Reads a JSON file containing the configuration
    ///
    /// Missing fields take their default values.
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        read_json(full_path)
    }

    /// Writes a JSON file with the configuration
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        write_json(full_path, self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration data")?;
        writeln!(f, "==================")?;
        writeln!(f, "initial saturation [-]          = {:?}", self.initial_saturation)?;
        writeln!(f, "simulation time [s]             = {:?}", self.realtime)?;
        writeln!(f, "block size [cm]                 = {:?}", self.dl * 100.0)?;
        writeln!(
            f,
            "medium size x, y, z [m]         = {:?}, {:?}, {:?}",
            self.x_size, self.y_size, self.z_size
        )?;
        writeln!(f, "boundary flux [m/s]             = {:?} ({})", self.top_flux, self.top_flux_mode)?;
        writeln!(f, "bottom residual saturation [-]  = {:?}", self.saturation_residual)?;
        writeln!(
            f,
            "retention curve                 = {} (initial branch {:?})",
            self.retention, self.initial_branch
        )?;
        writeln!(f, "randomization                   = {:?}", self.randomization)?;
        writeln!(f, "backend                         = {:?}", self.backend)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::base::{Backend, Branch, Randomization, RetentionFamily, TopFlux, DEFAULT_TEST_DIR};
    use crate::StrError;

    #[test]
    fn new_works() -> Result<(), StrError> {
        let config = Config::new();
        assert_eq!(config.validate(), None);
        assert_eq!(config.rho_g(), 9810.0);
        assert!(!config.bottom_is_open());
        approx::assert_abs_diff_eq!(config.dx_par(), 0.25, epsilon = 1e-15);

        let mut config = Config::new();
        config
            .set_domain(0.0025, 0.0025, 0.075)?
            .set_dl(0.0025)?
            .set_realtime(2.0)?
            .set_initial_saturation(0.02)?
            .set_top_flux(8e-5, TopFlux::SingleCell)?
            .set_saturation_residual(0.05)?
            .set_retention(RetentionFamily::Logistic, Branch::Drain)?
            .set_randomization(Randomization::None)?
            .set_seed(7)?
            .set_backend(Backend::Parallel { n_thread: 2 })?
            .set_output("/tmp/semicontinuum/results", "column")?;
        assert_eq!(config.validate(), None);
        assert!(config.bottom_is_open());
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.output_dir, Some("/tmp/semicontinuum/results".to_string()));
        Ok(())
    }

    #[test]
    fn setters_capture_errors() {
        let mut config = Config::new();
        assert_eq!(
            config.set_domain(0.1, 0.0, 0.3).err(),
            Some("the size of the medium must be > 0.0 along all axes")
        );
        assert_eq!(config.set_dl(0.0).err(), Some("dl must be > 0.0"));
        assert_eq!(config.set_realtime(-1.0).err(), Some("realtime must be > 0.0"));
        assert_eq!(
            config.set_initial_saturation(1.0).err(),
            Some("initial saturation must satisfy 0.0 ≤ S0 < lim_value")
        );
        assert_eq!(config.set_top_flux(-1.0, TopFlux::Full).err(), Some("top flux must be ≥ 0.0"));
        assert_eq!(
            config.set_saturation_residual(-0.1).err(),
            Some("residual saturation must be ≥ 0.0")
        );
        assert_eq!(
            config
                .set_randomization(Randomization::Filter {
                    kernel_size: 0,
                    amplitude: 0.8
                })
                .err(),
            Some("kernel_size of the filter method must be ≥ 1")
        );
        assert_eq!(
            config
                .set_randomization(Randomization::Interpolation {
                    block_size: 0.0,
                    amplitude: 0.3
                })
                .err(),
            Some("block_size of the interpolation method must be > 0.0")
        );
        assert_eq!(
            config
                .set_randomization(Randomization::FromFile { path: String::new() })
                .err(),
            Some("the path of the permeability file must not be empty")
        );
        assert_eq!(
            config.set_backend(Backend::Parallel { n_thread: 0 }).err(),
            Some("the parallel backend requires n_thread ≥ 1")
        );
        assert_eq!(config.set_output("", "x").err(), Some("the output directory must not be empty"));
    }

    #[test]
    fn validate_captures_errors() {
        let mut config = Config::new();
        config.dl = -1.0;
        assert_eq!(
            config.validate(),
            Some("dl = -1.0 is incorrect; it must be > 0.0".to_string())
        );
        let mut config = Config::new();
        config.lim_value = 1.5;
        assert_eq!(
            config.validate(),
            Some("lim_value = 1.5 is incorrect; it must satisfy 0.0 < lim_value ≤ 1.0".to_string())
        );
        let mut config = Config::new();
        config.randomization = Randomization::FromFile { path: String::new() };
        assert_eq!(
            config.validate(),
            Some("the path of the permeability file is missing".to_string())
        );
        let mut config = Config::new();
        config.porosity = 0.0;
        assert_eq!(
            config.validate(),
            Some("porosity = 0.0 is incorrect; it must satisfy 0.0 < θ ≤ 1.0".to_string())
        );
    }

    #[test]
    fn json_works() -> Result<(), StrError> {
        let mut config = Config::new();
        config.set_top_flux(1e-5, TopFlux::MiddleStrip)?.set_seed(123)?;
        let path = format!("{}/config_json_works.json", DEFAULT_TEST_DIR);
        config.write_json(&path)?;
        let back = Config::read_json(&path)?;
        assert_eq!(back, config);

        // missing fields take default values
        let partial: Config = serde_json::from_str(r#"{"realtime": 5.0, "top_flux_mode": "SingleCell"}"#).unwrap();
        assert_eq!(partial.realtime, 5.0);
        assert_eq!(partial.top_flux_mode, TopFlux::SingleCell);
        assert_eq!(partial.dl, 0.0025);
        Ok(())
    }

    #[test]
    fn display_works() {
        let config = Config::new();
        let text = format!("{}", config);
        assert!(text.starts_with("Configuration data\n==================\n"));
        assert!(text.contains("(full top boundary)"));
        assert!(text.contains("retention curve                 = van Genuchten (initial branch Wet)"));
    }
}
