//! # Game Module
//!
//! Runtime queries over a generated cave.
//!
//! Generation stops at a [`CaveResult`](crate::CaveResult); this module holds the
//! pieces a running game layers on top of it, such as which tiles the player has
//! already seen.

pub mod visibility;

pub use visibility::*;
