use super::State;
use crate::base::{read_json, write_json, Config, TopFlux, DEFAULT_OUT_DIR};
use crate::material::{write_noise, RetentionTable};
use crate::StrError;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;

/// Holds a copy of the fields at a checkpoint
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Snapshot {
    /// Step of the checkpoint
    pub step: usize,

    /// Simulation time
    pub time: f64,

    /// Liquid saturation (ny, nz, nx)
    pub saturation: Array3<f64>,

    /// Liquid pressure (ny, nz, nx)
    pub pressure: Array3<f64>,

    /// Fluxes through the x-faces (ny, nz, nx + 1)
    pub flux_x: Array3<f64>,

    /// Fluxes through the y-faces (ny + 1, nz, nx)
    pub flux_y: Array3<f64>,

    /// Fluxes through the z-faces (ny, nz + 1, nx)
    pub flux_z: Array3<f64>,

    /// Net inflow of the cells (ny, nz, nx)
    pub divergence: Array3<f64>,
}

impl Snapshot {
    /// Copies the fields of a state
    pub fn new(state: &State) -> Self {
        Snapshot {
            step: state.step,
            time: state.time,
            saturation: state.saturation.clone(),
            pressure: state.pressure.clone(),
            flux_x: state.flux_x.clone(),
            flux_y: state.flux_y.clone(),
            flux_z: state.flux_z.clone(),
            divergence: state.divergence.clone(),
        }
    }
}

/// Defines a consumer of the periodic snapshots
pub trait SnapshotSink {
    /// Receives an owned copy of the fields at a checkpoint
    fn write_snapshot(&mut self, snapshot: Snapshot) -> Result<(), StrError>;
}

/// Keeps all snapshots in memory
impl SnapshotSink for Vec<Snapshot> {
    fn write_snapshot(&mut self, snapshot: Snapshot) -> Result<(), StrError> {
        self.push(snapshot);
        Ok(())
    }
}

/// Holds the flux entry of the parameter manifest
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ManifestFlux {
    /// Region of the top face receiving the flux
    pub mode: TopFlux,

    /// Flux injected through the top face [m/s]
    pub value: f64,

    /// Base time step (for dl = 1 cm) [s]
    pub dt: f64,
}

/// Holds the parameters of a run written once at the beginning
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Manifest {
    /// Size of the medium along x [m]
    pub x: f64,

    /// Size of the medium along y [m]
    pub y: f64,

    /// Size of the medium along z [m]
    pub z: f64,

    /// Simulated time [s]
    pub realtime: f64,

    /// Block size [m]
    pub dx: f64,

    /// Initial saturation
    pub initial_saturation: f64,

    /// Top boundary condition
    pub flux: ManifestFlux,

    /// Resolved configuration
    pub config: Config,
}

impl Manifest {
    /// Allocates a new instance
    pub fn new(config: &Config) -> Self {
        Manifest {
            x: config.x_size,
            y: config.y_size,
            z: config.z_size,
            realtime: config.realtime,
            dx: config.dl,
            initial_saturation: config.initial_saturation,
            flux: ManifestFlux {
                mode: config.top_flux_mode,
                value: config.top_flux,
                dt: config.dt_base,
            },
            config: config.clone(),
        }
    }
}

/// Assists in generating output files
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileIo {
    /// Holds a flag to enable/disable the file generation
    enabled: bool,

    /// Defines the output directory
    output_dir: String,

    /// Defines the filename stem
    filename_stem: String,

    /// Holds the count of files written
    output_count: usize,

    /// Holds the indices of the output files
    pub indices: Vec<usize>,

    /// Holds the simulation times corresponding to each output file
    pub times: Vec<f64>,
}

impl FileIo {
    /// Allocates a new instance with deactivated generation of files
    pub fn new() -> Self {
        FileIo {
            enabled: false,
            output_dir: String::new(),
            filename_stem: String::new(),
            output_count: 0,
            indices: Vec::new(),
            times: Vec::new(),
        }
    }

    /// Allocates a new instance with activated generation of files
    ///
    /// # Input
    ///
    /// * `filename_stem` -- the last part of the filename without extension, e.g., "my_simulation"
    /// * `output_directory` -- the directory to save the output files.
    ///   None means that the default directory will be used; see [DEFAULT_OUT_DIR]
    pub fn new_enabled(filename_stem: &str, output_directory: Option<&str>) -> Result<Self, StrError> {
        let out_dir = match output_directory {
            Some(d) => d,
            None => DEFAULT_OUT_DIR,
        };
        fs::create_dir_all(out_dir).map_err(|_| "cannot create output directory")?;
        Ok(FileIo {
            enabled: true,
            output_dir: out_dir.to_string(),
            filename_stem: filename_stem.to_string(),
            output_count: 0,
            indices: Vec::new(),
            times: Vec::new(),
        })
    }

    /// Indicates whether the generation of files is enabled or not
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Generates the filename path for the parameter manifest
    pub fn path_manifest(&self) -> String {
        self.path_with_suffix("parameters")
    }

    /// Generates the filename path for the summary file
    pub fn path_summary(&self) -> String {
        self.path_with_suffix("summary")
    }

    /// Generates the filename path for the noise field of the intrinsic permeability
    pub fn path_random_perm(&self) -> String {
        self.path_with_suffix("random-perm")
    }

    /// Generates the filename path for the table of retention curves
    pub fn path_retention(&self) -> String {
        self.path_with_suffix("retention")
    }

    /// Generates the filename path for the snapshot files
    pub fn path_snapshot(&self, index: usize) -> String {
        if self.enabled {
            format!("{}/{}-{:0>20}.json", self.output_dir, self.filename_stem, index)
        } else {
            "".to_string()
        }
    }

    fn path_with_suffix(&self, suffix: &str) -> String {
        if self.enabled {
            format!("{}/{}-{}.json", self.output_dir, self.filename_stem, suffix)
        } else {
            "".to_string()
        }
    }

    /// Reads a JSON file containing this struct
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        read_json(full_path)
    }

    /// Writes a JSON file with this struct
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        write_json(full_path, self)
    }

    /// Reads a snapshot file
    pub fn read_snapshot(&self, index: usize) -> Result<Snapshot, StrError> {
        if !self.enabled {
            return Err("the generation of files is not enabled");
        }
        read_json(&self.path_snapshot(index))
    }

    /// Reads the parameter manifest
    pub fn read_manifest(&self) -> Result<Manifest, StrError> {
        if !self.enabled {
            return Err("the generation of files is not enabled");
        }
        read_json(&self.path_manifest())
    }

    /// Writes the parameter manifest
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<(), StrError> {
        if self.enabled {
            write_json(&self.path_manifest(), manifest)?;
        }
        Ok(())
    }

    /// Writes the noise field of the intrinsic permeability
    pub fn write_random_perm(&self, noise: &Array3<f64>) -> Result<(), StrError> {
        if self.enabled {
            write_noise(&self.path_random_perm(), noise)?;
        }
        Ok(())
    }

    /// Writes the table of retention curves
    pub fn write_retention(&self, table: &RetentionTable) -> Result<(), StrError> {
        if self.enabled {
            table.write_json(&self.path_retention())?;
        }
        Ok(())
    }

    /// Writes this struct to the summary file
    pub fn write_self(&self) -> Result<(), StrError> {
        if self.enabled {
            self.write_json(&self.path_summary())?;
        }
        Ok(())
    }
}

/// Writes each snapshot to a file and records its index and time
///
/// **Note:** Nothing is written if the generation of files is disabled.
impl SnapshotSink for FileIo {
    fn write_snapshot(&mut self, snapshot: Snapshot) -> Result<(), StrError> {
        if self.enabled {
            let path = self.path_snapshot(self.output_count);
            write_json(&path, &snapshot)?;
            self.indices.push(self.output_count);
            self.times.push(snapshot.time);
            self.output_count += 1;
        }
        Ok(())
    }
}

impl Default for FileIo {
    fn default() -> Self {
        FileIo::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
