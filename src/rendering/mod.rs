//! # Rendering Module
//!
//! Text output for generated caves.

pub mod ascii;

pub use ascii::*;
