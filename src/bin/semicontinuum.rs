use env_logger::{Builder, Target};
use log::LevelFilter;
use semicontinuum::base::{Backend, Config, SimError};
use semicontinuum::material::RetentionTable;
use semicontinuum::sim::{FileIo, Simulation};
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "semicontinuum",
    about = "Simulates unsaturated flow in porous media with the semi-continuum model"
)]
struct Options {
    /// JSON file with the configuration (missing fields take default values)
    #[structopt(long)]
    config: Option<String>,

    /// Directory of the output files
    #[structopt(long)]
    out_dir: Option<String>,

    /// Seed of the random intrinsic permeability
    #[structopt(long)]
    seed: Option<u64>,

    /// Simulated time [s]
    #[structopt(long)]
    realtime: Option<f64>,

    /// Number of threads of the parallel backend
    #[structopt(long)]
    parallel: Option<usize>,

    /// Writes the table of retention curves and exits
    #[structopt(long)]
    curves: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG is used if missing
    #[structopt(long)]
    log_level: Option<String>,
}

/// Initializes the logger writing to stdout
fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| {
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|v| v.parse::<LevelFilter>().ok())
        })
        .unwrap_or(LevelFilter::Info);
    Builder::new()
        .filter_level(log_level)
        .target(Target::Stdout)
        .format_timestamp_millis()
        .init();
}

fn main() -> Result<(), SimError> {
    // parse options
    let options = Options::from_args();
    init_logging(options.log_level.as_deref());

    // configuration
    let mut config = match &options.config {
        Some(path) => Config::read_json(path).map_err(|e| SimError::Io(format!("{} ({})", e, path)))?,
        None => Config::new(),
    };
    if let Some(dir) = &options.out_dir {
        let stem = config.filename_stem.clone();
        config.set_output(dir, &stem)?;
    }
    if let Some(seed) = options.seed {
        config.set_seed(seed)?;
    }
    if let Some(realtime) = options.realtime {
        config.set_realtime(realtime)?;
    }
    if let Some(n_thread) = options.parallel {
        config.set_backend(Backend::Parallel { n_thread })?;
    }

    // retention curves only
    if options.curves {
        let table = RetentionTable::new(config.retention, config.dx_par(), config.rho_g())?;
        let file_io = FileIo::new_enabled(&config.filename_stem, config.output_dir.as_deref())
            .map_err(|e| SimError::Io(e.to_string()))?;
        file_io.write_retention(&table).map_err(|e| SimError::Io(e.to_string()))?;
        println!("{}", file_io.path_retention());
        return Ok(());
    }

    // run
    println!("{}", config);
    let mut sim = Simulation::new(&config)?;
    let summary = sim.run_with_output()?;
    println!(
        "\n{} steps; final time = {} s; wall time = {:.2} s",
        summary.steps, summary.final_time, summary.wall_time
    );
    Ok(())
}
