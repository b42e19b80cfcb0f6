use crate::array::ArrayBackend;
use crate::base::{Branch, RetentionFamily};
use crate::material::{new_retention_curve, RetentionCurve};
use crate::StrError;
use ndarray::{Array3, ArrayView3, ArrayViewMut3};

/// Advances the pressure of one cell given the saturation increment
///
/// The pressure first relaxes by `Kps·ΔS`. Then, a wetting cell (ΔS > 0) cannot go above the
/// main wetting branch and a draining cell (ΔS < 0) cannot go below the main draining branch.
/// Both branches are evaluated at the saturation of the previous step.
pub fn hysteresis_step(pressure: f64, delta_sl: f64, kps: f64, p_wet: f64, p_drain: f64) -> f64 {
    let relaxed = pressure + kps * delta_sl;
    if delta_sl > 0.0 {
        f64::min(relaxed, p_wet)
    } else if delta_sl < 0.0 {
        f64::max(relaxed, p_drain)
    } else {
        relaxed
    }
}

/// Updates the pressure field within the envelope of the main wetting and draining branches
pub struct Hysteresis {
    /// Slope of the scanning curves between the main branches [Pa]
    kps: f64,

    /// Main wetting branch
    wet: Box<dyn RetentionCurve>,

    /// Main draining branch
    drain: Box<dyn RetentionCurve>,

    /// Pressure on the wetting branch at the previous saturation
    p_wet: Array3<f64>,

    /// Pressure on the draining branch at the previous saturation
    p_drain: Array3<f64>,
}

impl Hysteresis {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `shape` -- the shape of the cell-centered fields
    /// * `family` -- the family of the retention curves
    /// * `a` -- the scale factor of the retention curves
    /// * `rho_g` -- the density of water times the acceleration due to gravity
    /// * `kps` -- the slope of the scanning curves
    pub fn new(
        shape: (usize, usize, usize),
        family: RetentionFamily,
        a: f64,
        rho_g: f64,
        kps: f64,
    ) -> Result<Self, StrError> {
        if kps < 0.0 {
            return Err("kps must be ≥ 0.0");
        }
        Ok(Hysteresis {
            kps,
            wet: new_retention_curve(family, Branch::Wet, a, rho_g)?,
            drain: new_retention_curve(family, Branch::Drain, a, rho_g)?,
            p_wet: Array3::zeros(shape),
            p_drain: Array3::zeros(shape),
        })
    }

    /// Returns the retention curve of a main branch
    pub fn curve(&self, branch: Branch) -> &dyn RetentionCurve {
        match branch {
            Branch::Wet => self.wet.as_ref(),
            Branch::Drain => self.drain.as_ref(),
        }
    }

    /// Sets the pressure on a main branch
    pub fn initial_pressure(
        &self,
        backend: &dyn ArrayBackend,
        branch: Branch,
        sl: ArrayView3<f64>,
        pressure: ArrayViewMut3<f64>,
    ) {
        self.curve(branch).calculate_into(backend, sl, pressure);
    }

    /// Updates the pressure given the previous and the new saturation
    pub fn update(
        &mut self,
        backend: &dyn ArrayBackend,
        sl_old: ArrayView3<f64>,
        sl_new: ArrayView3<f64>,
        pressure: ArrayViewMut3<f64>,
    ) {
        self.wet.calculate_into(backend, sl_old, self.p_wet.view_mut());
        self.drain.calculate_into(backend, sl_old, self.p_drain.view_mut());
        let kps = self.kps;
        let p_wet = &self.p_wet;
        let p_drain = &self.p_drain;
        backend.update(pressure, &|(i, j, k), p| {
            let delta = sl_new[[i, j, k]] - sl_old[[i, j, k]];
            hysteresis_step(p, delta, kps, p_wet[[i, j, k]], p_drain[[i, j, k]])
        });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{hysteresis_step, Hysteresis};
    use crate::array::SerialBackend;
    use crate::base::{Branch, RetentionFamily};
    use crate::StrError;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn hysteresis_step_works() {
        let (p_wet, p_drain) = (-500.0, -900.0);
        // wetting: relaxed value below the wet branch is kept
        assert_relative_eq!(hysteresis_step(-800.0, 1e-3, 1e5, p_wet, p_drain), -700.0, epsilon = 1e-12);
        // wetting: cannot go above the wet branch
        assert_eq!(hysteresis_step(-550.0, 1e-3, 1e5, p_wet, p_drain), -500.0);
        // draining: relaxed value above the drain branch is kept
        assert_relative_eq!(hysteresis_step(-600.0, -1e-3, 1e5, p_wet, p_drain), -700.0, epsilon = 1e-12);
        // draining: cannot go below the drain branch
        assert_eq!(hysteresis_step(-850.0, -1e-3, 1e5, p_wet, p_drain), -900.0);
        // no change
        assert_eq!(hysteresis_step(-123.0, 0.0, 1e5, p_wet, p_drain), -123.0);
    }

    #[test]
    fn update_stays_within_the_envelope() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        let shape = (1, 3, 1);
        let mut hysteresis = Hysteresis::new(shape, RetentionFamily::VanGenuchten, 0.3, 9810.0, 1e5)?;
        let sl_old = Array3::from_elem(shape, 0.3);
        let mut pressure = Array3::<f64>::zeros(shape);
        hysteresis.initial_pressure(&backend, Branch::Wet, sl_old.view(), pressure.view_mut());
        let p_wet = hysteresis.curve(Branch::Wet).pressure(0.3);
        let p_drain = hysteresis.curve(Branch::Drain).pressure(0.3);
        assert!(pressure.iter().all(|&p| p == p_wet));

        let mut sl_new = sl_old.clone();
        sl_new[[0, 0, 0]] = 0.31; // wetting: stays on the wet branch
        sl_new[[0, 1, 0]] = 0.29; // draining: leaves the wet branch
        hysteresis.update(&backend, sl_old.view(), sl_new.view(), pressure.view_mut());
        assert_eq!(pressure[[0, 0, 0]], p_wet);
        assert_relative_eq!(pressure[[0, 1, 0]], f64::max(p_wet - 1e3, p_drain), epsilon = 1e-9);
        assert_eq!(pressure[[0, 2, 0]], p_wet);
        for p in pressure.iter() {
            assert!(*p <= p_wet && *p >= p_drain);
        }
        Ok(())
    }

    #[test]
    fn new_captures_errors() {
        assert_eq!(
            Hysteresis::new((1, 1, 1), RetentionFamily::Logistic, 1.0, 9810.0, -1.0).err(),
            Some("kps must be ≥ 0.0")
        );
    }
}
