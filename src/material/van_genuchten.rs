use super::{scale_saturation, RetentionCurve};
use crate::base::Branch;
use crate::StrError;

/// Implements the van Genuchten model for liquid retention
///
/// The capillary head in centimeters is `h = (S'^(-1/m) - 1)^(1/n) / α` with `m = 1 - 1/n`,
/// where S' is the scaled saturation; the liquid pressure is `P = -ρg·h/100`.
///
/// The parameters of the main branches were calibrated for 20/30 sand.
///
/// # Reference
///
/// * van Genuchten MT (1980) A closed-form equation for predicting the hydraulic conductivity
///   of unsaturated soils. Soil Science Society of America Journal, 44(5), 892-898
#[derive(Clone, Copy, Debug)]
pub struct VanGenuchten {
    alpha: f64, // α parameter [1/cm]
    n: f64,     // n parameter
    m: f64,     // m = 1 - 1/n
    a: f64,     // scale factor of the saturation
    rho_g: f64, // ρ·g [Pa/m]
}

impl VanGenuchten {
    /// Defines α of the main wetting branch [1/cm]
    pub const WET_ALPHA: f64 = 0.177;

    /// Defines n of the main wetting branch
    pub const WET_N: f64 = 6.23;

    /// Defines α of the main draining branch [1/cm]
    pub const DRAIN_ALPHA: f64 = 0.0744;

    /// Defines n of the main draining branch
    pub const DRAIN_N: f64 = 8.47;

    /// Allocates a main branch for 20/30 sand
    pub fn new(branch: Branch, a: f64, rho_g: f64) -> Result<Self, StrError> {
        match branch {
            Branch::Wet => VanGenuchten::with_parameters(VanGenuchten::WET_ALPHA, VanGenuchten::WET_N, a, rho_g),
            Branch::Drain => VanGenuchten::with_parameters(VanGenuchten::DRAIN_ALPHA, VanGenuchten::DRAIN_N, a, rho_g),
        }
    }

    /// Allocates a new instance with arbitrary parameters
    pub fn with_parameters(alpha: f64, n: f64, a: f64, rho_g: f64) -> Result<Self, StrError> {
        if alpha <= 0.0 {
            return Err("alpha parameter for the van Genuchten retention model is invalid");
        }
        if n <= 1.0 {
            return Err("n parameter for the van Genuchten retention model is invalid");
        }
        if a <= 0.0 {
            return Err("the scale factor of the retention curve must be > 0.0");
        }
        if rho_g <= 0.0 {
            return Err("rho_g must be > 0.0");
        }
        Ok(VanGenuchten {
            alpha,
            n,
            m: 1.0 - 1.0 / n,
            a,
            rho_g,
        })
    }

    /// Returns the m parameter
    pub fn m(&self) -> f64 {
        self.m
    }
}

impl RetentionCurve for VanGenuchten {
    fn pressure(&self, sl: f64) -> f64 {
        let s = scale_saturation(sl, self.a);
        let head = f64::powf(f64::powf(s, -1.0 / self.m) - 1.0, 1.0 / self.n) / self.alpha;
        -self.rho_g * head / 100.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::VanGenuchten;
    use crate::base::Branch;
    use crate::material::RetentionCurve;
    use approx::assert_relative_eq;

    #[test]
    fn new_captures_errors() {
        assert_eq!(
            VanGenuchten::with_parameters(0.0, 6.23, 1.0, 9810.0).err(),
            Some("alpha parameter for the van Genuchten retention model is invalid")
        );
        assert_eq!(
            VanGenuchten::with_parameters(0.177, 1.0, 1.0, 9810.0).err(),
            Some("n parameter for the van Genuchten retention model is invalid")
        );
        assert_eq!(
            VanGenuchten::with_parameters(0.177, 6.23, 0.0, 9810.0).err(),
            Some("the scale factor of the retention curve must be > 0.0")
        );
        assert_eq!(
            VanGenuchten::with_parameters(0.177, 6.23, 1.0, -1.0).err(),
            Some("rho_g must be > 0.0")
        );
    }

    #[test]
    fn pressure_works() {
        let wet = VanGenuchten::new(Branch::Wet, 1.0, 9810.0).unwrap();
        assert_relative_eq!(wet.m(), 1.0 - 1.0 / 6.23, epsilon = 1e-15);
        // S = 0.5 ⇒ h = (2^(1/m) - 1)^(1/n) / α
        let m = 1.0 - 1.0 / 6.23;
        let head = f64::powf(f64::powf(2.0, 1.0 / m) - 1.0, 1.0 / 6.23) / 0.177;
        assert_relative_eq!(wet.pressure(0.5), -98.1 * head, max_relative = 1e-14);
        // the pressure approaches zero near full saturation
        assert!(wet.pressure(0.9999) > wet.pressure(0.9));
        assert!(wet.pressure(0.9999) < 0.0);
    }

    #[test]
    fn scaling_flattens_the_curve() {
        let basic = VanGenuchten::new(Branch::Drain, 1.0, 9810.0).unwrap();
        let scaled = VanGenuchten::new(Branch::Drain, 0.3, 9810.0).unwrap();
        assert_eq!(basic.pressure(0.5), scaled.pressure(0.5));
        assert!(scaled.pressure(0.1) > basic.pressure(0.1));
        assert!(scaled.pressure(0.9) < basic.pressure(0.9));
    }
}
