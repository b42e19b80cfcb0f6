use super::{Boundaries, FileIo, FluxTransport, Hysteresis, Manifest, MassBalance, MassBalanceTracker};
use super::{Snapshot, SnapshotSink, State};
use crate::array::{new_backend, ArrayBackend};
use crate::base::{Config, GridSpec, SimError};
use crate::material::{basic_block_size, scale_factor, PermeabilityField, RelativePermeability, RetentionTable};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Holds the outcome of a complete run
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Summary {
    /// Number of steps performed
    pub steps: usize,

    /// Final simulation time
    pub final_time: f64,

    /// Mass-balance checks performed at each checkpoint
    pub checkpoints: Vec<MassBalance>,

    /// Accumulated saturation exchanged through the bottom face
    pub bottom_exchange: f64,

    /// Accumulated saturation removed by the overflow return
    pub rejected: f64,

    /// Elapsed wall time [s]
    pub wall_time: f64,
}

/// Performs a semi-continuum simulation with explicit time stepping
///
/// Each step performs, in this order:
///
/// 1. net inflow of the cells from the face fluxes and `S_new = S + SM·Q`
/// 2. overflow return along z (if enabled)
/// 3. exchange through the bottom face (if open)
/// 4. pressure update within the hysteresis envelope using S and S_new
/// 5. `S ← S_new`, relative permeability, interior fluxes, and bottom flux
/// 6. divergence guard: any saturation outside [0, lim_value] stops the run
pub struct Simulation {
    /// Holds the configuration
    pub config: Config,

    /// Holds the grid and time-stepping constants
    pub grid: GridSpec,

    /// Holds the intrinsic permeability and the face conductances
    pub permeability: PermeabilityField,

    /// Holds the current fields
    pub state: State,

    backend: Box<dyn ArrayBackend>,
    boundaries: Boundaries,
    transport: FluxTransport,
    hysteresis: Hysteresis,
    tracker: MassBalanceTracker,
}

impl Simulation {
    /// Allocates a new instance and sets the initial state
    pub fn new(config: &Config) -> Result<Self, SimError> {
        if let Some(message) = config.validate() {
            return Err(SimError::Configuration(message));
        }
        let grid = GridSpec::new(config)?;
        let backend = new_backend(&config.backend)?;
        let b = backend.as_ref();

        // material
        let permeability = PermeabilityField::new(b, config, &grid)?;
        let boundaries = Boundaries::new(config, &grid, &permeability)?;
        let rel_perm = RelativePermeability::with_wetting_m(config.lambda)?;
        let mut transport = FluxTransport::new(
            grid.shape(),
            grid.sm,
            grid.dl,
            config.rho_g(),
            config.lim_value,
            rel_perm,
        );
        let a = scale_factor(config.retention, grid.dx_par);
        let hysteresis = Hysteresis::new(grid.shape(), config.retention, a, config.rho_g(), config.kps)?;

        // initial state
        let mut state = State::new(&grid);
        state.saturation.fill(config.initial_saturation);
        hysteresis.initial_pressure(
            b,
            config.initial_branch,
            state.saturation.view(),
            state.pressure.view_mut(),
        );
        boundaries.apply_top(b, state.flux_z.view_mut());
        transport.update_rel_perm(b, state.saturation.view(), state.rel_perm.view_mut());
        transport.update_fluxes(
            b,
            &permeability,
            state.pressure.view(),
            state.flux_x.view_mut(),
            state.flux_y.view_mut(),
            state.flux_z.view_mut(),
        );
        boundaries.update_bottom_flux(
            b,
            state.pressure.view(),
            state.rel_perm.view(),
            state.bottom_flux.view_mut(),
        );
        let initial_total = b.sum(state.saturation.view());
        let total_top_flux = boundaries.total_top_flux(b, state.flux_z.view());
        let tracker = MassBalanceTracker::new(initial_total, grid.sm, total_top_flux);

        // messages
        log::info!("initial saturation = {}", config.initial_saturation);
        log::info!("simulated time = {} s", config.realtime);
        log::info!("block size = {} cm", grid.dl * 100.0);
        log::info!(
            "reference block size of the {} retention curve = {} cm (scale factor = {})",
            config.retention,
            basic_block_size(config.retention),
            a
        );
        log::info!("time step = {:e} s ({} steps)", grid.dt, grid.n_iteration);
        log::info!(
            "medium = {} × {} × {} m ({} × {} × {} blocks)",
            config.x_size,
            config.y_size,
            config.z_size,
            grid.nx,
            grid.ny,
            grid.nz
        );
        log::info!(
            "top flux = {:e} m/s over the {} ({} cells)",
            config.top_flux,
            config.top_flux_mode,
            boundaries.n_top_cell()
        );
        if boundaries.bottom_is_open() {
            log::info!("bottom boundary open with residual saturation {}", config.saturation_residual);
        } else {
            log::info!("bottom boundary closed");
        }
        log::info!("array backend = {}", b.name());
        permeability.log_stats(b, config.kappa);
        if config.overflow_return && (grid.nx > 1 || grid.ny > 1) {
            log::warn!("the overflow return only redistributes along z; lateral redistribution is not performed");
        }

        Ok(Simulation {
            config: config.clone(),
            grid,
            permeability,
            state,
            backend,
            boundaries,
            transport,
            hysteresis,
            tracker,
        })
    }

    /// Returns the array backend
    pub fn backend(&self) -> &dyn ArrayBackend {
        self.backend.as_ref()
    }

    /// Returns the sum of the saturation of all cells
    pub fn total_saturation(&self) -> f64 {
        self.backend.sum(self.state.saturation.view())
    }

    /// Performs one explicit time step
    ///
    /// Returns [SimError::NumericalDivergence] if the new saturation leaves [0, lim_value].
    /// The saturation is never clamped to hide the problem.
    pub fn step(&mut self) -> Result<(), SimError> {
        let backend = self.backend.as_ref();
        let state = &mut self.state;
        let transport = &mut self.transport;

        // saturation
        transport.divergence(
            backend,
            state.flux_x.view(),
            state.flux_y.view(),
            state.flux_z.view(),
            state.divergence.view_mut(),
        );
        transport.advance_saturation(backend, state.saturation.view(), state.divergence.view());
        if self.config.overflow_return {
            let rejected = transport.return_overflow();
            self.tracker.record_rejected(rejected);
        }
        let exchanged = self
            .boundaries
            .apply_bottom(backend, transport.sl_new.view_mut(), state.bottom_flux.view());
        self.tracker.record_bottom(exchanged);

        // pressure
        self.hysteresis.update(
            backend,
            state.saturation.view(),
            transport.sl_new.view(),
            state.pressure.view_mut(),
        );
        std::mem::swap(&mut state.saturation, &mut transport.sl_new);

        // fluxes
        transport.update_rel_perm(backend, state.saturation.view(), state.rel_perm.view_mut());
        transport.update_fluxes(
            backend,
            &self.permeability,
            state.pressure.view(),
            state.flux_x.view_mut(),
            state.flux_y.view_mut(),
            state.flux_z.view_mut(),
        );
        self.boundaries.update_bottom_flux(
            backend,
            state.pressure.view(),
            state.rel_perm.view(),
            state.bottom_flux.view_mut(),
        );
        state.step += 1;
        state.time = self.grid.time(state.step);

        // divergence guard (also catches NaN)
        let (min, max) = backend.min_max(state.saturation.view());
        let limit = self.config.lim_value;
        if !(min >= 0.0 && max <= limit) {
            return Err(SimError::NumericalDivergence {
                step: state.step,
                time: state.time,
                min,
                max,
                limit,
            });
        }
        Ok(())
    }

    /// Compares the change of the total saturation with the boundary inflow
    pub fn check_mass_balance(&self) -> MassBalance {
        self.tracker
            .check(self.state.step, self.state.time, self.total_saturation())
    }

    /// Emits a snapshot and checks the mass balance
    ///
    /// A failure of the sink is logged and does not stop the simulation.
    pub fn checkpoint(&self, sink: &mut dyn SnapshotSink, started: Instant) -> MassBalance {
        if let Err(e) = sink.write_snapshot(Snapshot::new(&self.state)) {
            log::warn!("cannot write the snapshot at step {}: {}", self.state.step, e);
        }
        let balance = self.check_mass_balance();
        log::info!(
            "t = {:.3} s (step {}): mass balance absolute error = {:e}, relative error = {}, wall time = {:.2} s",
            self.state.time,
            self.state.step,
            balance.absolute_error,
            balance.relative_error,
            started.elapsed().as_secs_f64()
        );
        if balance.exceeds(self.config.mass_balance_tol) {
            log::warn!(
                "mass balance relative error {} exceeds the tolerance {:e} at t = {:.3} s",
                balance.relative_error,
                self.config.mass_balance_tol,
                self.state.time
            );
        }
        if log::log_enabled!(log::Level::Debug) {
            let (s_min, s_max) = self.backend.min_max(self.state.saturation.view());
            let (p_min, p_max) = self.backend.min_max(self.state.pressure.view());
            log::debug!("saturation in [{}, {}]; pressure in [{}, {}] Pa", s_min, s_max, p_min, p_max);
        }
        balance
    }

    /// Runs the simulation until the configured time
    ///
    /// The initial state and the state at every `print_modulo` steps (and at the last step)
    /// are sent to the sink. The mass balance is checked at the same steps.
    pub fn run(&mut self, sink: &mut dyn SnapshotSink) -> Result<Summary, SimError> {
        let started = Instant::now();
        let mut checkpoints = Vec::new();
        if let Err(e) = sink.write_snapshot(Snapshot::new(&self.state)) {
            log::warn!("cannot write the initial snapshot: {}", e);
        }
        let n_iteration = self.grid.n_iteration;
        let print_modulo = self.grid.print_modulo;
        while self.state.step < n_iteration {
            if let Err(e) = self.step() {
                log::error!("{}", e);
                return Err(e);
            }
            let step = self.state.step;
            if step % print_modulo == 0 || step == n_iteration {
                checkpoints.push(self.checkpoint(sink, started));
            }
        }
        let wall_time = started.elapsed().as_secs_f64();
        log::info!("simulation finished after {} steps in {:.2} s", self.state.step, wall_time);
        Ok(Summary {
            steps: self.state.step,
            final_time: self.state.time,
            checkpoints,
            bottom_exchange: self.tracker.bottom_exchange(),
            rejected: self.tracker.rejected(),
            wall_time,
        })
    }

    /// Runs the simulation writing the output files configured by `output_dir`
    ///
    /// Writes the parameter manifest, the noise of the intrinsic permeability, the table of
    /// retention curves, the snapshots, and the summary file. Failures to write are logged
    /// and do not stop the simulation. No file is written if `output_dir` is None.
    pub fn run_with_output(&mut self) -> Result<Summary, SimError> {
        let mut file_io = match &self.config.output_dir {
            Some(dir) => match FileIo::new_enabled(&self.config.filename_stem, Some(dir.as_str())) {
                Ok(f) => f,
                Err(e) => {
                    log::warn!("{}; no output files will be written", e);
                    FileIo::new()
                }
            },
            None => FileIo::new(),
        };
        if file_io.enabled() {
            if let Err(e) = file_io.write_manifest(&Manifest::new(&self.config)) {
                log::warn!("cannot write the parameter manifest: {}", e);
            }
            if let Some(noise) = &self.permeability.noise {
                if let Err(e) = file_io.write_random_perm(noise) {
                    log::warn!("cannot write the noise of the intrinsic permeability: {}", e);
                }
            }
            match RetentionTable::new(self.config.retention, self.grid.dx_par, self.config.rho_g()) {
                Ok(table) => {
                    if let Err(e) = file_io.write_retention(&table) {
                        log::warn!("cannot write the table of retention curves: {}", e);
                    }
                }
                Err(e) => log::warn!("cannot compute the table of retention curves: {}", e),
            }
        }
        let summary = self.run(&mut file_io)?;
        if let Err(e) = file_io.write_self() {
            log::warn!("cannot write the summary file: {}", e);
        }
        Ok(summary)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
