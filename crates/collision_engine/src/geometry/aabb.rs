//! Axis-aligned bounding box
//!
//! Used by the spatial index for node bounds and broad-phase queries.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Box with faces parallel to the world axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Lowest corner
    pub min: Vec3,
    /// Highest corner
    pub max: Vec3,
}

impl AABB {
    /// Box spanning two corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box reaching `extents` either side of `center`
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Midpoint
    pub fn center(&self) -> Vec3 {
        self.min.lerp(&self.max, 0.5)
    }

    /// Half of the size along each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) / 2.0
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains(&self, other: &AABB) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }

    /// Whether the boxes share any point
    ///
    /// Touching faces count, so the broad phase never misses a grazing
    /// contact.
    pub fn intersects(&self, other: &AABB) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }
}
