//! # Utilities Module
//!
//! Field of view, pathfinding, and the weighted random helpers shared by
//! generation and AI.

pub mod fov;
pub mod math;
pub mod pathfinding;

pub use fov::*;
pub use math::*;
pub use pathfinding::*;
