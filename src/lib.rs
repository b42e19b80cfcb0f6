//! Semi-continuum simulator of unsaturated flow in porous media with capillary hysteresis
//!
//! The domain is a box discretized into cubic blocks of edge `dl`. The saturation and the
//! capillary pressure live at the block centers, whereas the Darcy fluxes live at the block
//! faces (staggered grid). Each time step is explicit: the fluxes update the saturation, the
//! saturation increment relaxes the pressure within the envelope defined by the wetting and
//! draining retention curves, and the new pressure drives the next fluxes.
//!
//! All fields are [ndarray::Array3] indexed as (y, z, x), with z pointing downwards.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod array;
pub mod base;
pub mod material;
pub mod prelude;
pub mod sim;
