//! Shape function library for the two plate element families
//!
//! - [`hermite`]: C¹ bicubic Hermite functions of the 16-DOF rectangle,
//!   parametric domain `[0, 1]²`.
//! - [`dkq`]: serendipity, bilinear and Discrete Kirchhoff interpolation
//!   functions of the 12-DOF quadrilateral, parametric domain `[-1, 1]²`.
//!
//! All derivatives are closed form.

pub mod dkq;
pub mod hermite;
