use semicontinuum::prelude::*;

// 1D column receiving a large flux through the top cell
fn flooded_column(realtime: f64) -> Result<Config, StrError> {
    let mut config = Config::new();
    config
        .set_domain(0.0025, 0.0025, 0.075)?
        .set_realtime(realtime)?
        .set_top_flux(0.05, TopFlux::SingleCell)?
        .set_randomization(Randomization::None)?;
    config.time_interval = 0.05;
    Ok(config)
}

#[test]
fn test_divergence_stops_the_run() -> Result<(), StrError> {
    let config = flooded_column(0.5)?;
    let mut sim = Simulation::new(&config).map_err(|_| "cannot allocate the simulation")?;
    let n_iteration = sim.grid.n_iteration;
    let mut snapshots: Vec<Snapshot> = Vec::new();
    match sim.run(&mut snapshots) {
        Err(SimError::NumericalDivergence {
            step,
            min,
            max,
            limit,
            ..
        }) => {
            assert!(step < n_iteration);
            assert_eq!(limit, config.lim_value);
            assert!(max > limit || min < 0.0, "min = {}, max = {}", min, max);
            // the saturation is not clamped
            let (s_min, s_max) = sim.backend().min_max(sim.state.saturation.view());
            assert_eq!((s_min, s_max), (min, max));
            assert_eq!(sim.state.step, step);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("the simulation should diverge"),
    }
    Ok(())
}

#[test]
fn test_overflow_return_keeps_the_run_going() -> Result<(), SimError> {
    let mut config = flooded_column(0.1)?;
    config.overflow_return = true;
    let mut sim = Simulation::new(&config)?;
    let mut snapshots: Vec<Snapshot> = Vec::new();
    let summary = sim.run(&mut snapshots)?;
    assert_eq!(summary.steps, sim.grid.n_iteration);
    assert!(summary.rejected > 0.0);

    // bounded saturation
    let (min, max) = sim.backend().min_max(sim.state.saturation.view());
    assert!(min >= 0.0 && max <= config.lim_value);

    // the rejected amount enters the mass balance
    for balance in &summary.checkpoints {
        match balance.relative_error {
            RelativeError::Value(e) => assert!(e < 1e-3, "relative error {} at t = {}", e, balance.time),
            RelativeError::Undefined => panic!("the inflow is not zero"),
        }
    }
    Ok(())
}
