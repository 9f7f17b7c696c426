//! Bounding-volume geometry
//!
//! `OctBB` is the narrow-phase primitive; `AABB` bounds spatial-index nodes
//! and broad-phase queries.

pub mod aabb;
pub mod oct_bb;

pub use aabb::AABB;
pub use oct_bb::{Bumper, OctAxis, OctBB, OctVec};
