//! Implements the element-wise and reduction operations on 3D arrays

mod backend;
mod resample;
pub use crate::array::backend::*;
pub use crate::array::resample::*;
