//! Octagonal bounding boxes
//!
//! An `OctBB` bounds a volume along five axes: the world X and Y axes, the
//! two horizontal diagonals `x + y` and `-x + y`, and Z. The four horizontal
//! axes carve an octagon out of the plane, which hugs round characters much
//! better than a square while staying as cheap as an AABB to combine.
//!
//! A box is *valid* only if `mins < maxs` on every axis. Every operation
//! that receives an invalid box returns [`OctBB::EMPTY`] instead of a
//! plausible-looking result, so garbage bounds can never collide.

use std::ops::{Add, Index, IndexMut, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::AABB;
use crate::foundation::math::Vec3;

/// The five axes of an octagonal box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OctAxis {
    /// World x
    X,
    /// World y
    Y,
    /// Diagonal `x + y`
    XY,
    /// Diagonal `-x + y`
    YX,
    /// World z
    Z,
}

impl OctAxis {
    /// All axes in storage order
    pub const ALL: [OctAxis; 5] = [OctAxis::X, OctAxis::Y, OctAxis::XY, OctAxis::YX, OctAxis::Z];

    /// The four horizontal axes
    pub const HORIZONTAL: [OctAxis; 4] = [OctAxis::X, OctAxis::Y, OctAxis::XY, OctAxis::YX];

    /// Storage index of this axis
    pub fn index(self) -> usize {
        match self {
            OctAxis::X => 0,
            OctAxis::Y => 1,
            OctAxis::XY => 2,
            OctAxis::YX => 3,
            OctAxis::Z => 4,
        }
    }
}

/// A point or displacement projected onto the five octagonal axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OctVec(pub [f32; 5]);

impl OctVec {
    /// All components zero
    pub const ZERO: OctVec = OctVec([0.0; 5]);

    /// Project a world vector onto (x, y, x + y, -x + y, z)
    pub fn from_vec3(v: &Vec3) -> Self {
        OctVec([v.x, v.y, v.x + v.y, -v.x + v.y, v.z])
    }

    /// Same value on every axis
    pub fn splat(value: f32) -> Self {
        OctVec([value; 5])
    }

    /// Per-axis minimum
    pub fn min(&self, other: &OctVec) -> OctVec {
        let mut out = *self;
        for (o, b) in out.0.iter_mut().zip(other.0.iter()) {
            *o = o.min(*b);
        }
        out
    }

    /// Per-axis maximum
    pub fn max(&self, other: &OctVec) -> OctVec {
        let mut out = *self;
        for (o, b) in out.0.iter_mut().zip(other.0.iter()) {
            *o = o.max(*b);
        }
        out
    }
}

impl Index<OctAxis> for OctVec {
    type Output = f32;

    fn index(&self, axis: OctAxis) -> &f32 {
        &self.0[axis.index()]
    }
}

impl IndexMut<OctAxis> for OctVec {
    fn index_mut(&mut self, axis: OctAxis) -> &mut f32 {
        &mut self.0[axis.index()]
    }
}

impl Add for OctVec {
    type Output = OctVec;

    fn add(mut self, rhs: OctVec) -> OctVec {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += b;
        }
        self
    }
}

impl Sub for OctVec {
    type Output = OctVec;

    fn sub(mut self, rhs: OctVec) -> OctVec {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a -= b;
        }
        self
    }
}

impl Mul<f32> for OctVec {
    type Output = OctVec;

    fn mul(mut self, rhs: f32) -> OctVec {
        for a in self.0.iter_mut() {
            *a *= rhs;
        }
        self
    }
}

/// Simplified collision footprint of an entity
///
/// `size_big` is the diagonal radius and is tuned independently of `size`;
/// it is not derived as `size * sqrt(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bumper {
    /// Radius along x and y
    pub size: f32,
    /// Radius along the diagonals
    pub size_big: f32,
    /// Vertical extent
    pub height: f32,
}

impl Bumper {
    /// Create a bumper
    pub fn new(size: f32, size_big: f32, height: f32) -> Self {
        Self { size, size_big, height }
    }

    /// Whether the bumper has any horizontal footprint
    pub fn has_size(&self) -> bool {
        self.size != 0.0
    }
}

/// Octagonal bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OctBB {
    /// Lower bound per axis
    pub mins: OctVec,
    /// Upper bound per axis
    pub maxs: OctVec,
}

impl OctBB {
    /// The canonical empty (invalid) box
    pub const EMPTY: OctBB = OctBB {
        mins: OctVec::ZERO,
        maxs: OctVec::ZERO,
    };

    /// Create a box from explicit bounds
    pub fn new(mins: OctVec, maxs: OctVec) -> Self {
        Self { mins, maxs }
    }

    /// Box centred on the origin, `±height` vertically
    pub fn from_bumper(bump: &Bumper) -> Self {
        let mins = OctVec([-bump.size, -bump.size, -bump.size_big, -bump.size_big, -bump.height]);
        let maxs = OctVec([bump.size, bump.size, bump.size_big, bump.size_big, bump.height]);
        Self { mins, maxs }
    }

    /// Box centred on the origin horizontally, standing on `z = 0`
    pub fn from_standing_bumper(bump: &Bumper) -> Self {
        let mut cv = Self::from_bumper(bump);
        cv.mins[OctAxis::Z] = 0.0;
        cv
    }

    /// Tight box around a set of points
    ///
    /// Fewer than two distinct points give a degenerate, invalid box.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut iter = points.iter().map(OctVec::from_vec3);
        let Some(first) = iter.next() else {
            return Self::EMPTY;
        };

        let (mins, maxs) = iter.fold((first, first), |(lo, hi), p| (lo.min(&p), hi.max(&p)));
        Self { mins, maxs }
    }

    /// Whether `mins < maxs` on every axis
    pub fn is_valid(&self) -> bool {
        OctAxis::ALL
            .iter()
            .all(|&axis| self.mins[axis] < self.maxs[axis])
    }

    /// Whether the box is degenerate or inverted on any axis
    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    /// Smallest box containing both
    pub fn union(&self, other: &OctBB) -> OctBB {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }

        OctBB {
            mins: self.mins.min(&other.mins),
            maxs: self.maxs.max(&other.maxs),
        }
    }

    /// Overlap of both, empty if they are disjoint on any axis
    pub fn intersection(&self, other: &OctBB) -> OctBB {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }

        let result = OctBB {
            mins: self.mins.max(&other.mins),
            maxs: self.maxs.min(&other.maxs),
        };

        if result.is_valid() {
            result
        } else {
            Self::EMPTY
        }
    }

    /// Translate by a world vector, including its diagonal projections
    pub fn add_vector(&self, v: &Vec3) -> OctBB {
        if self.is_empty() {
            return Self::EMPTY;
        }

        let shift = OctVec::from_vec3(v);
        OctBB {
            mins: self.mins + shift,
            maxs: self.maxs + shift,
        }
    }

    /// Volume swept by the box moving at `vel` between times `tmin` and `tmax`
    pub fn expand(&self, vel: &Vec3, tmin: f32, tmax: f32) -> OctBB {
        if self.is_empty() {
            return Self::EMPTY;
        }

        if vel.norm_squared() == 0.0 {
            return *self;
        }

        let start = self.add_vector(&(vel * tmin));
        let end = self.add_vector(&(vel * tmax));
        start.union(&end)
    }

    /// `maxs - mins` per axis
    pub fn extents(&self) -> OctVec {
        self.maxs - self.mins
    }

    /// Per-axis penetration depth against another box, `None` if disjoint
    pub fn depth(&self, other: &OctBB) -> Option<OctVec> {
        let overlap = self.intersection(other);
        overlap.is_valid().then(|| overlap.extents())
    }

    /// Axis-aligned bounds of the x, y and z intervals
    pub fn to_aabb(&self) -> AABB {
        AABB::new(
            Vec3::new(self.mins[OctAxis::X], self.mins[OctAxis::Y], self.mins[OctAxis::Z]),
            Vec3::new(self.maxs[OctAxis::X], self.maxs[OctAxis::Y], self.maxs[OctAxis::Z]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(center: Vec3, size: f32) -> OctBB {
        OctBB::from_bumper(&Bumper::new(size, size * 2.0, size)).add_vector(&center)
    }

    #[test]
    fn test_union_and_intersection_commute() {
        let a = cube(Vec3::zeros(), 10.0);
        let b = cube(Vec3::new(6.0, 3.0, -2.0), 8.0);

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.intersection(&b), b.intersection(&a));
        assert_eq!(a.intersection(&a.union(&b)), a);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = cube(Vec3::zeros(), 1.0);
        let b = cube(Vec3::new(10.0, 0.0, 0.0), 1.0);

        let overlap = a.intersection(&b);
        assert!(overlap.is_empty());
        assert_eq!(overlap, OctBB::EMPTY);
        assert!(a.depth(&b).is_none());
    }

    #[test]
    fn test_add_vector_composes() {
        let bb = cube(Vec3::new(1.0, 2.0, 3.0), 4.0);
        let v1 = Vec3::new(1.5, -2.0, 0.25);
        let v2 = Vec3::new(-3.0, 0.5, 2.0);

        let stepwise = bb.add_vector(&v1).add_vector(&v2);
        let direct = bb.add_vector(&(v1 + v2));
        for axis in OctAxis::ALL {
            assert_relative_eq!(stepwise.mins[axis], direct.mins[axis], epsilon = 1e-5);
            assert_relative_eq!(stepwise.maxs[axis], direct.maxs[axis], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_add_vector_shifts_diagonals() {
        let bb = cube(Vec3::zeros(), 1.0).add_vector(&Vec3::new(2.0, 3.0, 0.0));
        assert_eq!(bb.mins[OctAxis::XY], -2.0 + 5.0);
        assert_eq!(bb.mins[OctAxis::YX], -2.0 + 1.0);
    }

    #[test]
    fn test_invalid_box_propagates() {
        let bad = OctBB::new(OctVec::splat(1.0), OctVec::splat(-1.0));
        let good = cube(Vec3::zeros(), 1.0);

        assert_eq!(bad.union(&good), OctBB::EMPTY);
        assert_eq!(good.intersection(&bad), OctBB::EMPTY);
        assert_eq!(bad.add_vector(&Vec3::new(1.0, 0.0, 0.0)), OctBB::EMPTY);
        assert_eq!(bad.expand(&Vec3::new(1.0, 0.0, 0.0), 0.0, 1.0), OctBB::EMPTY);
    }

    #[test]
    fn test_expand_sweeps_interval() {
        let bb = cube(Vec3::zeros(), 1.0);
        let swept = bb.expand(&Vec3::new(4.0, 0.0, 0.0), 0.0, 1.0);

        assert_eq!(swept.mins[OctAxis::X], -1.0);
        assert_eq!(swept.maxs[OctAxis::X], 5.0);
        assert_eq!(swept.mins[OctAxis::Y], -1.0);

        // no motion leaves the box untouched
        assert_eq!(bb.expand(&Vec3::zeros(), 0.0, 1.0), bb);
    }

    #[test]
    fn test_standing_bumper_and_points() {
        let cv = OctBB::from_standing_bumper(&Bumper::new(5.0, 7.0, 20.0));
        assert_eq!(cv.mins[OctAxis::Z], 0.0);
        assert_eq!(cv.maxs[OctAxis::Z], 20.0);
        assert_eq!(cv.maxs[OctAxis::XY], 7.0);

        let pts = OctBB::from_points(&[Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 3.0)]);
        assert_eq!(pts.maxs[OctAxis::XY], 3.0);
        assert_eq!(pts.mins[OctAxis::YX], -1.0);
        assert!(OctBB::from_points(&[]).is_empty());
    }

    #[test]
    fn test_to_aabb() {
        let aabb = cube(Vec3::new(1.0, 1.0, 1.0), 2.0).to_aabb();
        assert_eq!(aabb.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 3.0, 3.0));
    }
}
