//! Platform physics
//!
//! Objects on a platform are not bounced off it. A character standing on a
//! platform is pulled to the walk level and dragged along with the
//! platform's vertical motion and spin; a particle near a platform lands on
//! it, sticks to it, or is gently drawn along.

use crate::foundation::math::utils::clip;
use crate::foundation::math::Vec3;
use crate::geometry::{OctAxis, OctBB};
use crate::world::{CharacterRef, ParticleRef, World};

use super::super::attachment::detach_character_from_platform;
use super::super::context::FrameContext;
use super::super::intersect::over_platform;

/// Signed difference between two binary angles
fn facing_delta(now: u16, before: u16) -> f32 {
    f32::from(now.wrapping_sub(before) as i16)
}

/// Blend weights for a character on a platform
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlatformCoefficients {
    apos: f32,
    avel: f32,
    facing: f32,
}

impl PlatformCoefficients {
    fn for_height(walk_lerp: f32, plat_lerp: f32) -> Option<Self> {
        if walk_lerp < -1.0 {
            // stuck well inside the platform
            Some(Self { apos: 0.25, avel: 1.0, facing: 1.0 })
        } else if walk_lerp < 0.0 {
            Some(Self { apos: 0.125, avel: 0.25, facing: 1.0 })
        } else if plat_lerp > 0.0 {
            Some(Self {
                apos: 0.125 * plat_lerp,
                avel: 0.25 * plat_lerp,
                facing: plat_lerp,
            })
        } else {
            None
        }
    }
}

/// Keep a character on the platform it is attached to
///
/// Returns false, and detaches the character, if it is moving away from the
/// platform too fast or has drifted too far above it. Returns false without
/// detaching if `plat` is not the character's platform.
pub fn do_chr_platform_physics(
    world: &mut World,
    item: CharacterRef,
    plat: CharacterRef,
    ctx: &mut FrameContext<'_>,
) -> bool {
    let Some((chr, platform)) = world.character_pair_mut(item, plat) else {
        return false;
    };
    if chr.on_platform != Some(plat) {
        return false;
    }

    let max_vnrm = ctx.config.max_platform_normal_velocity;
    let tolerance = ctx.config.platform_tolerance;

    // platforms do not tilt, so "up" is world z
    let vnrm = chr.vel.z - platform.vel.z;

    let coefficients = if vnrm.abs() > max_vnrm {
        None
    } else {
        let walk_lerp = (chr.pos.z - platform.top()) / tolerance;
        let mut plat_lerp = if walk_lerp < 0.0 { 1.0 } else { clip(1.0 - walk_lerp, 0.0, 1.0) };

        // jumping off the platform loosens its hold
        if vnrm > 0.0 {
            plat_lerp *= 1.0 - clip(vnrm.abs() / max_vnrm, 0.0, 1.0);
        }

        PlatformCoefficients::for_height(walk_lerp, plat_lerp)
    };

    let Some(coefficients) = coefficients else {
        detach_character_from_platform(world, item, ctx);
        return false;
    };

    let rot_item = facing_delta(chr.facing, chr.facing_old);
    let rot_plat = facing_delta(platform.facing, platform.facing_old);

    let lift = (1.0 + chr.enviro.walk_level - chr.pos.z) * coefficients.apos;
    let drag = (platform.vel.z - chr.vel.z) * coefficients.avel;
    chr.phys.accumulate_apos_plat(&Vec3::new(0.0, 0.0, lift));
    chr.phys.accumulate_avel(&Vec3::new(0.0, 0.0, drag));

    let spin = ((rot_plat - rot_item) * coefficients.facing) as i32;
    chr.facing = chr.facing.wrapping_add(spin as u16);

    ctx.stats.platform_contacts += 1;
    true
}

/// How a particle met a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformContact {
    /// Fell onto the platform this frame
    Landed {
        /// The particle ends on landing
        terminate: bool,
    },
    /// Was already inside the platform and was pushed out
    Embedded,
    /// Is just above the platform and drifts with it
    Hovering,
}

/// Let a particle that is not resting on a platform interact with it
///
/// Positions and velocities are changed directly. Returns `None` if there
/// was no interaction.
pub fn do_prt_platform_physics(
    world: &mut World,
    prt: ParticleRef,
    plat: CharacterRef,
    ctx: &FrameContext<'_>,
) -> Option<PlatformContact> {
    let platform = world.character(plat).filter(|p| p.in_game && p.platform)?;
    let (plat_pos, plat_pos_old, plat_vel) = (platform.pos, platform.pos_old, platform.vel);
    let surface = platform.min_cv.maxs[OctAxis::Z];
    let floor = platform.min_cv.mins[OctAxis::Z];
    let reach = platform.max_cv;

    let in_game = world.character_in_game(world.particle(prt)?.attached_to);
    let particle = world.particle_mut(prt)?;
    if !particle.in_game || in_game || particle.on_platform == Some(plat) {
        return None;
    }

    let footprint = OctBB::from_bumper(&particle.bump_min);
    if !over_platform(&reach, &plat_pos, &footprint, &particle.pos) {
        return None;
    }

    let stick = ctx.config.platform_stick;
    let height = particle.bump_min.height;
    let overlaps = |z: f32, base: f32| z - height < base + surface && z + height > base + floor;

    let z_collide = overlaps(particle.pos.z, plat_pos.z);
    let was_z_collide = overlaps(particle.pos_old.z, plat_pos_old.z);

    let blend = |v: f32, target: f32, amount: f32| v * (1.0 - amount) + target * amount;

    if z_collide && !was_z_collide {
        particle.pos.z = plat_pos.z + surface;
        particle.vel.z = plat_vel.z - particle.vel.z * particle.profile.dampen;
        Some(PlatformContact::Landed { terminate: particle.profile.end_ground })
    } else if z_collide {
        particle.pos.z = plat_pos.z + surface + height;

        if particle.vel.z - plat_vel.z < 0.0 {
            particle.vel.z = plat_vel.z * particle.profile.dampen + stick * plat_vel.z;
        } else {
            particle.vel.z = blend(particle.vel.z, plat_vel.z, stick);
        }
        particle.vel.x = blend(particle.vel.x, plat_vel.x, stick);
        particle.vel.y = blend(particle.vel.y, plat_vel.y, stick);
        Some(PlatformContact::Embedded)
    } else {
        let lerp_z = clip(((particle.pos.z - height) - (plat_pos.z + surface)) / ctx.config.platform_tolerance, -1.0, 1.0);
        if lerp_z <= 0.0 {
            return None;
        }

        let amount = stick * lerp_z;
        particle.vel.x = blend(particle.vel.x, plat_vel.x, amount);
        particle.vel.y = blend(particle.vel.y, plat_vel.y, amount);
        particle.vel.z = blend(particle.vel.z, plat_vel.z, amount);
        Some(PlatformContact::Hovering)
    }
}
