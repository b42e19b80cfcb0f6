use super::{scale_saturation, RetentionCurve};
use crate::base::Branch;
use crate::StrError;

/// Implements a logistic retention curve
///
/// The capillary head in centimeters is `h = h₀ + w·ln(1/S' - 1)`, i.e., the inverse of the
/// logistic function `S' = 1 / (1 + exp((h - h₀)/w))`; the liquid pressure is `P = -ρg·h/100`.
#[derive(Clone, Copy, Debug)]
pub struct Logistic {
    h0: f64,    // head at S' = ½ [cm]
    w: f64,     // width of the transition [cm]
    a: f64,     // scale factor of the saturation
    rho_g: f64, // ρ·g [Pa/m]
}

impl Logistic {
    /// Defines h₀ of the main wetting branch [cm]
    pub const WET_H0: f64 = 6.0;

    /// Defines h₀ of the main draining branch [cm]
    pub const DRAIN_H0: f64 = 10.0;

    /// Defines the width of both main branches [cm]
    pub const WIDTH: f64 = 1.0;

    /// Allocates a main branch
    pub fn new(branch: Branch, a: f64, rho_g: f64) -> Result<Self, StrError> {
        let h0 = match branch {
            Branch::Wet => Logistic::WET_H0,
            Branch::Drain => Logistic::DRAIN_H0,
        };
        Logistic::with_parameters(h0, Logistic::WIDTH, a, rho_g)
    }

    /// Allocates a new instance with arbitrary parameters
    pub fn with_parameters(h0: f64, w: f64, a: f64, rho_g: f64) -> Result<Self, StrError> {
        if w <= 0.0 {
            return Err("w parameter for the logistic retention model is invalid");
        }
        if a <= 0.0 {
            return Err("the scale factor of the retention curve must be > 0.0");
        }
        if rho_g <= 0.0 {
            return Err("rho_g must be > 0.0");
        }
        Ok(Logistic { h0, w, a, rho_g })
    }
}

impl RetentionCurve for Logistic {
    fn pressure(&self, sl: f64) -> f64 {
        let s = scale_saturation(sl, self.a);
        let head = self.h0 + self.w * f64::ln(1.0 / s - 1.0);
        -self.rho_g * head / 100.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
