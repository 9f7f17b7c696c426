//! Math utilities and types
//!
//! Provides the vector aliases and the small set of scalar helpers used by
//! the collision code. Facings are 16-bit binary angles (0x10000 == one turn).

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Binary angle, a full turn is 0x10000
pub type Facing = u16;

/// Common constants
pub mod constants {
    /// sqrt(2)
    pub const SQRT_TWO: f32 = std::f32::consts::SQRT_2;

    /// 1 / sqrt(2)
    pub const INV_SQRT_TWO: f32 = std::f32::consts::FRAC_1_SQRT_2;

    /// 1 / 255, converts an 8-bit alpha to [0, 1]
    pub const INV_FF: f32 = 1.0 / 255.0;

    /// Facing offset that turns "in front of" into "behind"
    pub const ATTACK_BEHIND: u16 = 0x8000;
}

/// Scalar helpers
pub mod utils {
    use super::{Facing, Vec3};

    /// Clamp `value` into `[lo, hi]`
    ///
    /// Unlike `f32::clamp` this never panics when the range is inverted;
    /// the lower bound wins.
    pub fn clip(value: f32, lo: f32, hi: f32) -> f32 {
        value.min(hi).max(lo)
    }

    /// Convert a direction in the xy-plane into a binary angle
    pub fn vec_to_facing(dx: f32, dy: f32) -> Facing {
        let radians = dy.atan2(dx) + std::f32::consts::PI;
        let turns = radians / std::f32::consts::TAU;

        // wrap into one turn, 0x10000 aliases to 0
        ((turns * 65536.0) as i64 & 0xFFFF) as Facing
    }

    /// Normalize a vector, returning `None` for the zero vector
    pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
        let len = v.norm();
        if len > 0.0 {
            Some(v / len)
        } else {
            None
        }
    }
}
