//! Character-character response
//!
//! A pair either rides (one stands on the other as a platform) or bumps.
//! Bumps come in two flavours. If the pair will first touch later in the
//! frame they exchange a velocity impulse; if they already overlap they
//! are pushed apart with a position correction. Friction opposes sliding in
//! both cases.

use log::trace;

use crate::foundation::math::constants::{INV_FF, INV_SQRT_TWO};
use crate::foundation::math::utils::clip;
use crate::foundation::math::Vec3;
use crate::geometry::{OctAxis, OctVec};
use crate::world::{Character, CharacterRef, World};

use super::super::candidate::{CollisionCandidate, CollisionEndpoint};
use super::super::context::FrameContext;
use super::super::error::{CollisionError, CollisionResult};
use super::super::intersect::{estimate_chr_chr_normal, intersect_oct_bb, overlap_volume, CloseTolerance, SweptVolume};
use super::platform::do_chr_platform_physics;

fn is_flying_platform(chr: &Character) -> bool {
    chr.platform && chr.flying
}

/// Whether `item` should be handled as riding `plat`
fn platform_test(item: &Character, plat_ref: CharacterRef, plat: &Character) -> bool {
    item.can_use_platforms
        && plat.platform
        && item.on_platform == Some(plat_ref)
        && !is_flying_platform(item)
        && item.attached_to.is_none()
}

/// Whether two characters may bump into each other at all
fn collision_test(a_ref: CharacterRef, a: &Character, b_ref: CharacterRef, b: &Character) -> bool {
    // items only bump platforms
    if (a.is_item && !b.platform) || (b.is_item && !a.platform) {
        return false;
    }

    if is_flying_platform(a) && is_flying_platform(b) {
        return false;
    }

    if b.attached_to == Some(a_ref) || a.attached_to == Some(b_ref) {
        return false;
    }

    a.bump.size != 0.0 && b.bump.size != 0.0
}

/// Handle one character-character candidate
///
/// Returns whether the pair was resolved, either as a rider on a platform or
/// as a bump. A failed platform interaction falls back to a bump.
pub fn do_chr_chr_collision(
    world: &mut World,
    candidate: &CollisionCandidate,
    ctx: &mut FrameContext<'_>,
) -> CollisionResult<bool> {
    let (ra, rb) = candidate.characters().ok_or(CollisionError::WrongCandidateKind {
        first: candidate.source,
        second: candidate.destination,
    })?;

    let a = world
        .character(ra)
        .filter(|c| c.in_game)
        .ok_or(CollisionError::StaleReference(CollisionEndpoint::Character(ra)))?;
    let b = world
        .character(rb)
        .filter(|c| c.in_game)
        .ok_or(CollisionError::StaleReference(CollisionEndpoint::Character(rb)))?;

    if a.packed || b.packed {
        return Ok(false);
    }

    let riding = if platform_test(a, rb, b) {
        Some((ra, rb))
    } else if platform_test(b, ra, a) {
        Some((rb, ra))
    } else {
        None
    };

    let do_collision = match riding {
        Some((item, plat)) => {
            if do_chr_platform_physics(world, item, plat, ctx) {
                return Ok(true);
            }
            trace!("{item} fell off {plat}, treating as a bump");
            true
        }
        None => collision_test(ra, a, rb, b),
    };

    if !do_collision {
        return Ok(false);
    }

    Ok(do_chr_chr_interaction(world, ra, rb, candidate, ctx))
}

/// Interaction falls off while a character is still dismounting from the other
fn dismount_lerp(chr: &Character, other: CharacterRef, dismount_time: u32) -> f32 {
    if chr.dismount_timer == 0 || chr.dismount_object != Some(other) || dismount_time == 0 {
        return 1.0;
    }

    clip(1.0 - chr.dismount_timer as f32 / dismount_time as f32, 0.0, 1.0)
}

/// Weaken a platform's push on someone standing on a different platform at the same level
fn neighbour_platform_lerp(
    world: &World,
    plat_ref: CharacterRef,
    plat: &Character,
    other: &Character,
    tolerance: f32,
) -> f32 {
    match other.on_platform {
        Some(on) if plat.platform && on != plat_ref && world.character_in_game(Some(on)) => {
            clip((other.pos.z - plat.top()) / tolerance, -1.0, 1.0).abs()
        }
        _ => 1.0,
    }
}

/// Centre of mass in octagonal coordinates
fn centre_of_mass(chr: &Character) -> OctVec {
    let mut opos = OctVec::from_vec3(&chr.pos);
    opos[OctAxis::Z] += (chr.min_cv.maxs[OctAxis::Z] + chr.min_cv.mins[OctAxis::Z]) * 0.5;
    opos
}

/// Split a velocity into its parts along and across a normal
fn decompose(vel: &Vec3, nrm: &Vec3) -> (Vec3, Vec3) {
    let perp = nrm * vel.dot(nrm);
    (perp, vel - perp)
}

/// Per-axis distance needed to separate along `nrm`
fn separation(odepth: &OctVec, nrm: &Vec3) -> Option<f32> {
    let projections = [
        (odepth[OctAxis::X], nrm.x),
        (odepth[OctAxis::Y], nrm.y),
        (odepth[OctAxis::Z], nrm.z),
        (odepth[OctAxis::XY], nrm.x + nrm.y),
        (odepth[OctAxis::YX], -nrm.x + nrm.y),
    ];

    let tmin = projections
        .iter()
        .filter(|(_, n)| *n != 0.0)
        .map(|(depth, n)| depth / n.abs())
        .fold(1e6_f32, f32::min);

    (tmin < 1e6).then_some(tmin)
}

/// Bounce or push apart two characters
fn do_chr_chr_interaction(
    world: &mut World,
    ra: CharacterRef,
    rb: CharacterRef,
    candidate: &CollisionCandidate,
    ctx: &mut FrameContext<'_>,
) -> bool {
    let config = ctx.config;
    let tolerance = config.platform_tolerance;

    let (Some(a), Some(b)) = (world.character(ra), world.character(rb)) else {
        return false;
    };

    let mut strength = f32::from(a.alpha) * INV_FF * f32::from(b.alpha) * INV_FF;
    strength *= dismount_lerp(a, rb, config.dismount_time);
    strength *= dismount_lerp(b, ra, config.dismount_time);

    let swept_a = SweptVolume::new(&a.min_cv, &a.pos, &a.vel);
    let swept_b = SweptVolume::new(&b.min_cv, &b.pos, &b.vel);

    // a platform candidate that was not used carries no volume
    let (tmin, tmax) = if candidate.cv.is_empty() {
        match intersect_oct_bb(swept_a, swept_b, CloseTolerance::None) {
            Some(hit) if hit.tmax >= 0.0 && hit.tmin <= 1.0 => (hit.tmin, hit.tmax),
            _ => return false,
        }
    } else {
        (candidate.tmin, candidate.tmax)
    };

    strength *= neighbour_platform_lerp(world, ra, a, b, tolerance);
    strength *= neighbour_platform_lerp(world, rb, b, a, tolerance);

    // depth from the first tenth of the contact window
    let early = overlap_volume(&swept_a, &swept_b, tmin, tmin + (tmax - tmin) * 0.1);
    let mut odepth = if early.is_empty() { OctVec::ZERO } else { early.extents() };
    odepth[OctAxis::XY] *= INV_SQRT_TWO;
    odepth[OctAxis::YX] *= INV_SQRT_TWO;

    let collision = tmin > 0.0;

    let (mut wa, mut wb) = (a.signed_weight(), b.signed_weight());
    if wa == 0.0 && wb == 0.0 {
        wa = 1.0;
        wb = 1.0;
    }

    // stacking objects behave more like tables
    let mut exponent = 1.0;
    if a.can_use_platforms && b.platform {
        exponent += 2.0;
    }
    if b.can_use_platforms && a.platform {
        exponent += 2.0;
    }

    let Some(nrm) = estimate_chr_chr_normal(&centre_of_mass(a), &centre_of_mass(b), &odepth, exponent, tolerance) else {
        return false;
    };

    let (vperp_a, vpara_a) = decompose(&a.vel, &nrm);
    let (vperp_b, vpara_b) = decompose(&b.vel, &nrm);

    let mut imp_a = Vec3::zeros();
    let mut imp_b = Vec3::zeros();

    let bump = if collision {
        let cr = config.restitution;
        if (wa < 0.0 && wb < 0.0) || wa == wb {
            let factor = 0.5 * (1.0 - cr);
            imp_a = (vperp_b - vperp_a) * factor;
            imp_b = (vperp_a - vperp_b) * factor;
        } else if wa < 0.0 || wb == 0.0 {
            imp_b = (vperp_a - vperp_b) * (1.0 - cr);
        } else if wb < 0.0 || wa == 0.0 {
            imp_a = (vperp_b - vperp_a) * (1.0 - cr);
        } else {
            imp_a = (vperp_b - vperp_a) * ((1.0 - cr) * wb / (wa + wb));
            imp_b = (vperp_a - vperp_b) * ((1.0 - cr) * wa / (wa + wb));
        }
        true
    } else {
        if let Some(depth) = separation(&odepth, &nrm) {
            let total = wa.abs() + wb.abs();
            if wa >= 0.0 {
                imp_a = nrm * (depth * wb.abs() / total * config.pressure_strength);
            }
            if wb >= 0.0 {
                imp_b = -nrm * (depth * wa.abs() / total * config.pressure_strength);
            }
        }

        // reversing into the contact counts as a fresh bump
        let reversed = |c: &Character| c.vel.dot(&nrm) * c.vel_old.dot(&nrm) < 0.0;
        reversed(a) || reversed(b)
    };

    let friction = |imp: &Vec3, vpara: &Vec3, chr: &Character| -> Vec3 {
        let (imp_len, vel_len) = (imp.norm(), vpara.norm());
        if imp_len > 0.0 && vel_len > 0.0 && chr.dismount_timer == 0 {
            -vpara * (clip(config.friction * imp_len / vel_len, 0.0, 1.0) * strength)
        } else {
            Vec3::zeros()
        }
    };
    let drag_a = friction(&imp_a, &vpara_a, a);
    let drag_b = friction(&imp_b, &vpara_b, b);

    let Some((chr_a, chr_b)) = world.character_pair_mut(ra, rb) else {
        return false;
    };

    if collision {
        chr_a.phys.accumulate_avel(&(imp_a * strength));
        chr_b.phys.accumulate_avel(&(imp_b * strength));
    } else {
        chr_a.phys.accumulate_apos_coll(&(imp_a * strength));
        chr_b.phys.accumulate_apos_coll(&(imp_b * strength));
    }
    chr_a.phys.accumulate_avel(&drag_a);
    chr_b.phys.accumulate_avel(&drag_b);

    if bump {
        chr_a.ai.set_bump_last(rb);
        chr_b.ai.set_bump_last(ra);
    }

    ctx.stats.chr_chr_collisions += 1;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::events::EventSystem;
    use crate::geometry::{Bumper, OctBB};
    use crate::physics::context::FrameStats;
    use approx::assert_relative_eq;

    fn body(pos: Vec3, vel: Vec3) -> Character {
        let mut chr = Character::new(pos, Bumper::new(10.0, 14.0, 40.0));
        chr.vel = vel;
        chr.vel_old = vel;
        chr
    }

    fn run(world: &mut World, a: CharacterRef, b: CharacterRef) -> CollisionResult<bool> {
        let config = CollisionConfig::default();
        let mut events = EventSystem::new();
        let mut stats = FrameStats::default();
        let mut ctx = FrameContext::new(&config, &mut events, &mut stats, world.frame);
        let candidate = CollisionCandidate::character_pair(a, b, 0.0, 1.0, OctBB::EMPTY);
        do_chr_chr_collision(world, &candidate, &mut ctx)
    }

    #[test]
    fn test_head_on_bump_is_symmetric() {
        let mut world = World::new();
        let a = world.spawn_character(body(Vec3::zeros(), Vec3::new(5.0, 0.0, 0.0)));
        let b = world.spawn_character(body(Vec3::new(25.0, 0.0, 0.0), Vec3::new(-5.0, 0.0, 0.0)));

        assert_eq!(run(&mut world, a, b), Ok(true));

        let (chr_a, chr_b) = (world.character(a).unwrap(), world.character(b).unwrap());
        assert!(chr_a.phys.avel.x < 0.0);
        assert!(chr_b.phys.avel.x > 0.0);
        assert_relative_eq!(chr_a.phys.avel, -chr_b.phys.avel, epsilon = 1e-4);
        assert_eq!(chr_a.phys.apos_coll, Vec3::zeros());
        assert_eq!(chr_a.ai.bump_last, Some(b));
        assert_eq!(chr_b.ai.bump_last, Some(a));
    }

    #[test]
    fn test_overlap_pushes_apart() {
        let mut world = World::new();
        let a = world.spawn_character(body(Vec3::zeros(), Vec3::zeros()));
        let b = world.spawn_character(body(Vec3::new(15.0, 0.0, 0.0), Vec3::zeros()));

        assert_eq!(run(&mut world, a, b), Ok(true));

        let (chr_a, chr_b) = (world.character(a).unwrap(), world.character(b).unwrap());
        assert!(chr_a.phys.apos_coll.x < 0.0);
        assert!(chr_b.phys.apos_coll.x > 0.0);
        assert_eq!(chr_a.phys.avel, Vec3::zeros());
        // resting contact is not a bump
        assert_eq!(chr_a.ai.bump_last, None);
    }

    #[test]
    fn test_immovable_side_does_not_move() {
        let mut world = World::new();
        let mut wall = body(Vec3::new(15.0, 0.0, 0.0), Vec3::zeros());
        wall.phys.weight = crate::world::INFINITE_WEIGHT;
        let a = world.spawn_character(body(Vec3::zeros(), Vec3::zeros()));
        let b = world.spawn_character(wall);

        assert_eq!(run(&mut world, a, b), Ok(true));

        assert!(world.character(a).unwrap().phys.apos_coll.x < 0.0);
        assert!(world.character(b).unwrap().phys.is_settled());
    }

    #[test]
    fn test_items_ignore_characters() {
        let mut world = World::new();
        let mut sword = body(Vec3::new(15.0, 0.0, 0.0), Vec3::zeros());
        sword.is_item = true;
        let a = world.spawn_character(body(Vec3::zeros(), Vec3::zeros()));
        let b = world.spawn_character(sword);

        assert_eq!(run(&mut world, a, b), Ok(false));
        assert!(world.character(a).unwrap().phys.is_settled());
    }

    #[test]
    fn test_stale_endpoint_is_reported() {
        let mut world = World::new();
        let a = world.spawn_character(body(Vec3::zeros(), Vec3::zeros()));

        assert_eq!(
            run(&mut world, a, CharacterRef(9)),
            Err(CollisionError::StaleReference(CollisionEndpoint::Character(CharacterRef(9))))
        );
    }
}
