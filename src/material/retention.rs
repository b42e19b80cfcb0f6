use super::{Logistic, VanGenuchten};
use crate::array::ArrayBackend;
use crate::base::{write_json, Branch, RetentionFamily, SATURATION_EPSILON};
use crate::StrError;
use ndarray::{Array3, ArrayView3, ArrayViewMut3};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;

/// Defines a liquid retention curve P(S) for one branch of the hysteresis envelope
///
/// The pressure is the (signed) liquid pressure: negative values mean suction.
pub trait RetentionCurve: Send + Sync {
    /// Returns the liquid pressure corresponding to the saturation `sl`
    fn pressure(&self, sl: f64) -> f64;

    /// Computes the pressure of every cell into `out`
    fn calculate_into(&self, backend: &dyn ArrayBackend, sl: ArrayView3<f64>, out: ArrayViewMut3<f64>) {
        backend.update(out, &|(i, j, k), _| self.pressure(sl[[i, j, k]]));
    }

    /// Returns a new field with the pressure of every cell
    fn calculate(&self, backend: &dyn ArrayBackend, sl: ArrayView3<f64>) -> Array3<f64> {
        let mut out = Array3::<f64>::zeros(sl.raw_dim());
        self.calculate_into(backend, sl, out.view_mut());
        out
    }
}

/// Returns the reference block size of the retention curves [cm]
///
/// The van Genuchten parameters were calibrated for 20/30 sand with blocks of 10/12 cm.
pub fn basic_block_size(family: RetentionFamily) -> f64 {
    match family {
        RetentionFamily::VanGenuchten => 10.0 / 12.0,
        RetentionFamily::Logistic => 1.0,
    }
}

/// Returns the scale factor A of the retention curves for the given discretization parameter
///
/// `dx_par` is the block size in centimeters (dl / 0.01 m).
pub fn scale_factor(family: RetentionFamily, dx_par: f64) -> f64 {
    dx_par / basic_block_size(family)
}

/// Scales the saturation about ½ and keeps it away from 0 and 1
///
/// `S' = clamp(A·(S - ½) + ½, ε, 1 - ε)`
pub fn scale_saturation(sl: f64, a: f64) -> f64 {
    let s = a * (sl - 0.5) + 0.5;
    f64::clamp(s, SATURATION_EPSILON, 1.0 - SATURATION_EPSILON)
}

/// Allocates the retention curve of a family and branch
///
/// # Input
///
/// * `a` -- the scale factor (see [scale_factor]); use 1.0 for the basic curve
/// * `rho_g` -- the liquid density times the gravity acceleration [Pa/m]
pub fn new_retention_curve(
    family: RetentionFamily,
    branch: Branch,
    a: f64,
    rho_g: f64,
) -> Result<Box<dyn RetentionCurve>, StrError> {
    match family {
        RetentionFamily::VanGenuchten => Ok(Box::new(VanGenuchten::new(branch, a, rho_g)?)),
        RetentionFamily::Logistic => Ok(Box::new(Logistic::new(branch, a, rho_g)?)),
    }
}

/// Holds the retention curves sampled over the saturation range
///
/// The basic curves use A = 1 and the scaled curves use the A of the simulation blocks.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RetentionTable {
    /// Retention family
    pub family: RetentionFamily,

    /// Scale factor of the scaled curves
    pub scale_factor: f64,

    /// Saturation values
    pub saturation: Vec<f64>,

    /// Basic wetting branch
    pub basic_wet: Vec<f64>,

    /// Basic draining branch
    pub basic_drain: Vec<f64>,

    /// Scaled wetting branch
    pub scaled_wet: Vec<f64>,

    /// Scaled draining branch
    pub scaled_drain: Vec<f64>,
}

impl RetentionTable {
    /// Samples the curves at S = 0.001, 0.002, ..., 0.998
    pub fn new(family: RetentionFamily, dx_par: f64, rho_g: f64) -> Result<Self, StrError> {
        let a = scale_factor(family, dx_par);
        let saturation: Vec<f64> = (1..999).map(|i| (i as f64) * 0.001).collect();
        let sample = |branch: Branch, a: f64| -> Result<Vec<f64>, StrError> {
            let curve = new_retention_curve(family, branch, a, rho_g)?;
            Ok(saturation.iter().map(|&s| curve.pressure(s)).collect())
        };
        Ok(RetentionTable {
            family,
            scale_factor: a,
            basic_wet: sample(Branch::Wet, 1.0)?,
            basic_drain: sample(Branch::Drain, 1.0)?,
            scaled_wet: sample(Branch::Wet, a)?,
            scaled_drain: sample(Branch::Drain, a)?,
            saturation,
        })
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
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
