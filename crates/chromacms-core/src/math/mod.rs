//! Color math: matrices, chromatic adaptation, transfer functions

pub mod chromatic_adaptation;
pub mod matrix;
pub mod transfer;

pub use matrix::{rgb_to_xyz, Matrix3x3};
