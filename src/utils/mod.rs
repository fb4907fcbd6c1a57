//! # Utilities Module
//!
//! Continuous vector math and discrete grid geometry shared by the generators.

pub mod grid;
pub mod math;

pub use grid::*;
pub use math::*;
