//! Scenario tests driving whole collision frames

mod frame_pass;

use crate::config::CollisionConfig;
use crate::foundation::math::constants::SQRT_TWO;
use crate::foundation::math::Vec3;
use crate::geometry::Bumper;
use crate::world::{Character, INFINITE_WEIGHT};

fn walker(pos: Vec3) -> Character {
    Character::new(pos, Bumper::new(10.0, 14.0, 40.0))
}

fn platform(pos: Vec3, size: f32, config: &CollisionConfig) -> Character {
    let mut plat = Character::new(pos, Bumper::new(size, size * SQRT_TWO, 20.0));
    plat.platform = true;
    plat.can_use_platforms = false;
    plat.phys.weight = INFINITE_WEIGHT;
    plat.update_collision_volumes(config.platform_tolerance);
    plat
}
