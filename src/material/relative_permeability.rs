use super::VanGenuchten;
use crate::array::ArrayBackend;
use crate::StrError;
use ndarray::{ArrayView3, ArrayViewMut3};

/// Implements the relative permeability of the Mualem-van Genuchten model
///
/// `kr = S^λ · (1 - (1 - S^(1/m))^m)²` with S clamped to [0, 1]
#[derive(Clone, Copy, Debug)]
pub struct RelativePermeability {
    lambda: f64,
    m: f64,
}

impl RelativePermeability {
    /// Allocates a new instance
    pub fn new(lambda: f64, m: f64) -> Result<Self, StrError> {
        if lambda < 0.0 {
            return Err("lambda parameter of the relative permeability must be ≥ 0.0");
        }
        if m <= 0.0 || m >= 1.0 {
            return Err("m parameter of the relative permeability must be in (0, 1)");
        }
        Ok(RelativePermeability { lambda, m })
    }

    /// Allocates a new instance with m taken from the main wetting van Genuchten branch
    pub fn with_wetting_m(lambda: f64) -> Result<Self, StrError> {
        RelativePermeability::new(lambda, 1.0 - 1.0 / VanGenuchten::WET_N)
    }

    /// Returns the relative permeability corresponding to the saturation `sl`
    pub fn value(&self, sl: f64) -> f64 {
        let s = f64::clamp(sl, 0.0, 1.0);
        let c = 1.0 - f64::powf(1.0 - f64::powf(s, 1.0 / self.m), self.m);
        f64::powf(s, self.lambda) * c * c
    }

    /// Computes the relative permeability of every cell into `out`
    pub fn calculate_into(&self, backend: &dyn ArrayBackend, sl: ArrayView3<f64>, out: ArrayViewMut3<f64>) {
        backend.update(out, &|(i, j, k), _| self.value(sl[[i, j, k]]));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::RelativePermeability;
    use crate::array::SerialBackend;
    use crate::StrError;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn new_captures_errors() {
        assert_eq!(
            RelativePermeability::new(-1.0, 0.5).err(),
            Some("lambda parameter of the relative permeability must be ≥ 0.0")
        );
        assert_eq!(
            RelativePermeability::new(0.8, 1.0).err(),
            Some("m parameter of the relative permeability must be in (0, 1)")
        );
    }

    #[test]
    fn value_works() -> Result<(), StrError> {
        let kr = RelativePermeability::with_wetting_m(0.8)?;
        assert_eq!(kr.value(0.0), 0.0);
        assert_relative_eq!(kr.value(1.0), 1.0, epsilon = 1e-15);
        assert_eq!(kr.value(-0.1), 0.0);
        assert_relative_eq!(kr.value(1.2), 1.0, epsilon = 1e-15);
        let m = 1.0 - 1.0 / 6.23;
        let s: f64 = 0.3;
        let c = 1.0 - (1.0 - s.powf(1.0 / m)).powf(m);
        assert_relative_eq!(kr.value(s), s.powf(0.8) * c * c, epsilon = 1e-15);
        let mut previous = 0.0;
        for i in 1..=100 {
            let v = kr.value(i as f64 / 100.0);
            assert!(v > previous);
            previous = v;
        }
        Ok(())
    }

    #[test]
    fn calculate_into_works() -> Result<(), StrError> {
        let backend = SerialBackend::new();
        let kr = RelativePermeability::new(0.5, 0.5)?;
        let sl = Array3::from_elem((2, 2, 2), 0.25);
        let mut out = Array3::<f64>::zeros((2, 2, 2));
        kr.calculate_into(&backend, sl.view(), out.view_mut());
        // S^(1/m) = 1/16; (15/16)^0.5; c = 1 - sqrt(15)/4
        let c = 1.0 - f64::sqrt(15.0) / 4.0;
        for v in out.iter() {
            assert_relative_eq!(*v, 0.5 * c * c, epsilon = 1e-15);
        }
        Ok(())
    }
}
