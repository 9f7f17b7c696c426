//! Narrow phase: continuous interval intersection of swept octagonal boxes
//!
//! Two boxes moving at constant velocity overlap on one axis during an
//! interval of time; they overlap as volumes during the intersection of the
//! five per-axis intervals. Times are measured in frames, with 0 the start of
//! the frame and 1 its end, so a window that starts at or before 0 means the
//! objects already overlapped when the frame began.
//!
//! The platform tolerance modes replace the horizontal box-vs-box test with a
//! point-vs-box test: the rider's centre must be over the platform. The
//! vertical test is unchanged; the platform's own volume already carries the
//! vertical slack.

use crate::foundation::math::Vec3;
use crate::geometry::{OctAxis, OctBB, OctVec};

/// Which side, if any, is tested as a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseTolerance {
    /// Plain volume overlap
    #[default]
    None,
    /// The first object is a platform, the second a rider
    Object1Platform,
    /// The second object is a platform, the first a rider
    Object2Platform,
}

/// Result of a successful intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalHit {
    /// Start of the overlap window
    pub tmin: f32,
    /// End of the overlap window
    pub tmax: f32,
    /// Overlap volume in world space; empty for the platform modes
    pub cv: OctBB,
}

/// A box in its own frame, placed at a position and moving at a velocity
#[derive(Debug, Clone, Copy)]
pub struct SweptVolume<'a> {
    /// Box relative to the position
    pub bounds: &'a OctBB,
    /// Position at the start of the frame
    pub pos: &'a Vec3,
    /// Displacement over one frame
    pub vel: &'a Vec3,
}

impl<'a> SweptVolume<'a> {
    /// Bundle a box with its position and velocity
    pub fn new(bounds: &'a OctBB, pos: &'a Vec3, vel: &'a Vec3) -> Self {
        Self { bounds, pos, vel }
    }
}

// per-axis view of one object
#[derive(Clone, Copy)]
struct AxisSpan {
    min: f32,
    max: f32,
    pos: f32,
}

impl AxisSpan {
    fn lo(self) -> f32 {
        self.min + self.pos
    }

    fn hi(self) -> f32 {
        self.max + self.pos
    }
}

enum AxisWindow {
    /// The axis constrains the window to `[tmin, tmax]`
    Moving(f32, f32),
    /// No relative motion, and the spans overlap for the whole frame
    Static,
    /// The spans can never overlap
    Disjoint,
}

fn spans(volume: &SweptVolume<'_>, opos: &OctVec, axis: OctAxis) -> AxisSpan {
    AxisSpan {
        min: volume.bounds.mins[axis],
        max: volume.bounds.maxs[axis],
        pos: opos[axis],
    }
}

/// Interval during which two spans overlap, `diff` the relative velocity
fn box_window(a: AxisSpan, b: AxisSpan, diff: f32) -> AxisWindow {
    if diff == 0.0 {
        return if a.lo() < b.hi() && b.lo() < a.hi() {
            AxisWindow::Static
        } else {
            AxisWindow::Disjoint
        };
    }

    let enter = (a.lo() - b.hi()) / diff;
    let leave = (a.hi() - b.lo()) / diff;
    AxisWindow::Moving(enter.min(leave), enter.max(leave))
}

/// Interval during which the centre of `point` is inside `span`
fn point_window(span: AxisSpan, point: f32, diff: f32) -> AxisWindow {
    if diff == 0.0 {
        return if span.lo() <= point && point <= span.hi() {
            AxisWindow::Static
        } else {
            AxisWindow::Disjoint
        };
    }

    // the span moves at -diff relative to the point
    let enter = (span.lo() - point) / diff;
    let leave = (span.hi() - point) / diff;
    AxisWindow::Moving(enter.min(leave), enter.max(leave))
}

/// Find when two swept boxes overlap during this frame
///
/// Returns `None` if either box is invalid, if some axis can never overlap,
/// or if the overlap window lies wholly outside `[0, 1]`. With no relative
/// motion on any axis the window is the whole frame. In
/// [`CloseTolerance::None`] mode the overlap volume over the clipped window
/// is computed and must be non-empty.
pub fn intersect_oct_bb(
    first: SweptVolume<'_>,
    second: SweptVolume<'_>,
    tolerance: CloseTolerance,
) -> Option<IntervalHit> {
    if first.bounds.is_empty() || second.bounds.is_empty() {
        return None;
    }

    let opos1 = OctVec::from_vec3(first.pos);
    let opos2 = OctVec::from_vec3(second.pos);
    let ovel1 = OctVec::from_vec3(first.vel);
    let ovel2 = OctVec::from_vec3(second.vel);

    let mut window: Option<(f32, f32)> = None;

    for axis in OctAxis::ALL {
        let a = spans(&first, &opos1, axis);
        let b = spans(&second, &opos2, axis);
        let diff = ovel2[axis] - ovel1[axis];

        let axis_window = match tolerance {
            CloseTolerance::Object1Platform if axis != OctAxis::Z => point_window(a, b.pos, diff),
            CloseTolerance::Object2Platform if axis != OctAxis::Z => point_window(b, a.pos, -diff),
            _ => box_window(a, b, diff),
        };

        match axis_window {
            AxisWindow::Disjoint => return None,
            AxisWindow::Static => {}
            AxisWindow::Moving(tmin, tmax) => {
                let (lo, hi) = match window {
                    Some((lo, hi)) => (lo.max(tmin), hi.min(tmax)),
                    None => (tmin, tmax),
                };
                if hi < lo {
                    return None;
                }
                window = Some((lo, hi));
            }
        }
    }

    let (tmin, tmax) = match window {
        // no relative motion on any axis
        None => (0.0, 1.0),
        Some((tmin, tmax)) if tmin > 1.0 || tmax < 0.0 => return None,
        Some(bounds) => bounds,
    };

    if tolerance != CloseTolerance::None {
        return Some(IntervalHit { tmin, tmax, cv: OctBB::EMPTY });
    }

    let cv = overlap_volume(&first, &second, tmin, tmax);
    if cv.is_empty() {
        return None;
    }

    Some(IntervalHit { tmin, tmax, cv })
}

/// Intersection of two boxes swept over `[tmin, tmax]` clipped to the frame
pub fn overlap_volume(first: &SweptVolume<'_>, second: &SweptVolume<'_>, tmin: f32, tmax: f32) -> OctBB {
    let lo = tmin.clamp(0.0, 1.0);
    let hi = tmax.clamp(0.0, 1.0);

    let exp1 = first.bounds.add_vector(first.pos).expand(first.vel, lo, hi);
    let exp2 = second.bounds.add_vector(second.pos).expand(second.vel, lo, hi);
    exp1.intersection(&exp2)
}

/// Static platform check: is the object's centre over the platform, with
/// the vertical spans overlapping?
pub fn over_platform(platform: &OctBB, platform_pos: &Vec3, object: &OctBB, object_pos: &Vec3) -> bool {
    if platform.is_empty() || object.is_empty() {
        return false;
    }

    let plat = platform.add_vector(platform_pos);
    let obj = object.add_vector(object_pos);
    let centre = OctVec::from_vec3(object_pos);

    let horizontal = OctAxis::HORIZONTAL
        .iter()
        .all(|&axis| plat.mins[axis] <= centre[axis] && centre[axis] <= plat.maxs[axis]);

    horizontal && plat.mins[OctAxis::Z] < obj.maxs[OctAxis::Z] && obj.mins[OctAxis::Z] < plat.maxs[OctAxis::Z]
}

/// Estimate a contact normal for character `a` from per-axis overlap depths
///
/// Shallow axes dominate: each overlapping axis contributes
/// `±1 / (depth / tolerance)^exponent`, signed to push `a` away from `b`.
/// Diagonal axes contribute to both x and y. The vertical term divides the
/// depth further by the exponent, so larger exponents favour vertical
/// support. Returns `None` if no axis overlaps.
pub fn estimate_chr_chr_normal(
    opos_a: &OctVec,
    opos_b: &OctVec,
    odepth: &OctVec,
    exponent: f32,
    tolerance: f32,
) -> Option<Vec3> {
    let mut nrm = Vec3::zeros();

    for axis in OctAxis::ALL {
        let depth = odepth[axis];
        if depth <= 0.0 {
            continue;
        }

        let sgn = if opos_b[axis] - opos_a[axis] > 0.0 { -1.0 } else { 1.0 };

        match axis {
            OctAxis::X => nrm.x += sgn / (depth / tolerance).powf(exponent),
            OctAxis::Y => nrm.y += sgn / (depth / tolerance).powf(exponent),
            OctAxis::XY => {
                let term = sgn / (depth / tolerance).powf(exponent);
                nrm.x += term;
                nrm.y += term;
            }
            OctAxis::YX => {
                let term = sgn / (depth / tolerance).powf(exponent);
                nrm.x -= term;
                nrm.y += term;
            }
            OctAxis::Z => nrm.z += sgn / (exponent * depth / tolerance).powf(exponent),
        }
    }

    let len = nrm.norm();
    (len > 0.0 && len.is_finite()).then(|| nrm / len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bumper;
    use approx::assert_relative_eq;

    fn cube(size: f32) -> OctBB {
        OctBB::from_bumper(&Bumper::new(size, size * std::f32::consts::SQRT_2, size))
    }

    #[test]
    fn test_stationary_overlap_fixture() {
        let bb = cube(10.0);
        let (pa, pb, still) = (Vec3::zeros(), Vec3::new(15.0, 0.0, 0.0), Vec3::zeros());

        let hit = intersect_oct_bb(
            SweptVolume::new(&bb, &pa, &still),
            SweptVolume::new(&bb, &pb, &still),
            CloseTolerance::None,
        )
        .expect("boxes overlap");

        assert!(hit.tmin <= 0.0);
        assert!(hit.tmax >= 0.0);
        assert_relative_eq!(hit.cv.mins[OctAxis::X], 5.0);
        assert_relative_eq!(hit.cv.maxs[OctAxis::X], 10.0);
        assert_relative_eq!(hit.cv.extents()[OctAxis::X], 5.0);
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let a = cube(10.0);
        let b = cube(6.0);
        let (pa, va) = (Vec3::new(0.0, 0.0, 0.0), Vec3::new(12.0, 3.0, 0.0));
        let (pb, vb) = (Vec3::new(25.0, 5.0, 2.0), Vec3::new(-10.0, 0.0, 0.0));

        let ab = intersect_oct_bb(SweptVolume::new(&a, &pa, &va), SweptVolume::new(&b, &pb, &vb), CloseTolerance::None)
            .expect("swept boxes meet");
        let ba = intersect_oct_bb(SweptVolume::new(&b, &pb, &vb), SweptVolume::new(&a, &pa, &va), CloseTolerance::None)
            .expect("swept boxes meet");

        assert_relative_eq!(ab.tmin, ba.tmin, epsilon = 1e-5);
        assert_relative_eq!(ab.tmax, ba.tmax, epsilon = 1e-5);
        assert!(ab.tmin > 0.0 && ab.tmin < 1.0);
    }

    #[test]
    fn test_static_gap_never_collides() {
        let bb = cube(1.0);
        let (pa, pb) = (Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0));
        let (va, vb) = (Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());

        // moving sideways while separated vertically
        assert!(intersect_oct_bb(SweptVolume::new(&bb, &pa, &va), SweptVolume::new(&bb, &pb, &vb), CloseTolerance::None)
            .is_none());
    }

    #[test]
    fn test_future_contact_is_rejected() {
        let bb = cube(1.0);
        let (pa, pb) = (Vec3::zeros(), Vec3::new(100.0, 0.0, 0.0));
        let (va, vb) = (Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());

        assert!(intersect_oct_bb(SweptVolume::new(&bb, &pa, &va), SweptVolume::new(&bb, &pb, &vb), CloseTolerance::None)
            .is_none());
    }

    #[test]
    fn test_platform_mode_uses_rider_centre() {
        let plat = OctBB::from_standing_bumper(&Bumper::new(20.0, 28.0, 30.0));
        let rider = OctBB::from_standing_bumper(&Bumper::new(5.0, 7.0, 20.0));
        let still = Vec3::zeros();
        let plat_pos = Vec3::zeros();

        let over = Vec3::new(15.0, 0.0, 25.0);
        let hit = intersect_oct_bb(
            SweptVolume::new(&plat, &plat_pos, &still),
            SweptVolume::new(&rider, &over, &still),
            CloseTolerance::Object1Platform,
        )
        .expect("rider centre over platform");
        assert!(hit.cv.is_empty());

        // boxes overlap but the centre hangs off the edge
        let edge = Vec3::new(23.0, 0.0, 25.0);
        assert!(intersect_oct_bb(
            SweptVolume::new(&plat, &plat_pos, &still),
            SweptVolume::new(&rider, &edge, &still),
            CloseTolerance::Object1Platform,
        )
        .is_none());

        // swapping roles gives the same answer
        assert!(intersect_oct_bb(
            SweptVolume::new(&rider, &over, &still),
            SweptVolume::new(&plat, &plat_pos, &still),
            CloseTolerance::Object2Platform,
        )
        .is_some());
    }

    #[test]
    fn test_chr_chr_normal_points_away() {
        let a = OctVec::from_vec3(&Vec3::zeros());
        let b = OctVec::from_vec3(&Vec3::new(10.0, 0.0, 0.0));
        let mut depth = OctVec::ZERO;
        depth[OctAxis::X] = 5.0;
        depth[OctAxis::Z] = 40.0;

        let n = estimate_chr_chr_normal(&a, &b, &depth, 1.0, 50.0).expect("normal");
        assert!(n.x < 0.0);
        // the shallow x axis dominates
        assert!(n.x.abs() > n.z.abs());
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);

        assert!(estimate_chr_chr_normal(&a, &b, &OctVec::ZERO, 1.0, 50.0).is_none());
    }
}
