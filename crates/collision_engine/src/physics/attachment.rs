//! Mount and platform attachment
//!
//! Attachments are resolved in two passes over the sorted candidate list.
//! Detection scores every eligible pair and remembers, on the rider, the best
//! target seen so far. Commit walks the list again and attaches a rider only
//! to the target it remembered. Attaching during detection would let a rider
//! hop between several platforms in one frame and leave its weight on each.
//!
//! Platform attachments must be reconfirmed every frame; anything whose
//! confirmation stamp is older than the current frame is detached by
//! [`cleanup_stale_platforms`].

use log::trace;

use crate::config::CollisionConfig;
use crate::events::{CollisionEvent, PlatformObject};
use crate::foundation::math::constants::{INV_SQRT_TWO, SQRT_TWO};
use crate::foundation::math::utils::clip;
use crate::foundation::math::Vec3;
use crate::geometry::{OctAxis, OctBB, OctVec};
use crate::world::{AlertFlags, Character, CharacterRef, ParticleRef, Slot, World, INFINITE_WEIGHT};

use super::candidate::CollisionCandidate;
use super::context::FrameContext;

/// Overlap along each axis of two world-space boxes
fn volume_depth(a: &OctBB, b: &OctBB) -> OctVec {
    a.maxs.min(&b.maxs) - a.mins.max(&b.mins)
}

/// Distance from a point to the nearest face of a box, per axis
fn point_depth(bounds: &OctBB, point: &OctVec) -> OctVec {
    (bounds.maxs - *point).min(&(*point - bounds.mins))
}

/// Horizontal overlap area estimated from the four octagon depths
///
/// Every axis, including z, must be positive.
fn footprint_area(mut depth: OctVec) -> Option<f32> {
    if OctAxis::ALL.iter().any(|&axis| depth[axis] <= 0.0) {
        return None;
    }

    depth[OctAxis::XY] *= INV_SQRT_TWO;
    depth[OctAxis::YX] *= INV_SQRT_TWO;

    let square = depth[OctAxis::X] * depth[OctAxis::Y];
    let diamond = depth[OctAxis::XY] * depth[OctAxis::YX];
    let area = square.min(diamond);
    (area > 0.0).then_some(area)
}

/// Vertical overlap of two boxes placed at two heights
fn z_overlap(a: &OctBB, a_z: f32, b: &OctBB, b_z: f32) -> f32 {
    (a.maxs[OctAxis::Z] + a_z).min(b.maxs[OctAxis::Z] + b_z) - (a.mins[OctAxis::Z] + a_z).max(b.mins[OctAxis::Z] + b_z)
}

/// When both objects qualify, decide whether `a` is the one on top
fn a_on_top(a_z: f32, a_top: f32, b_z: f32, b_top: f32, headroom: f32) -> bool {
    let depth_a = b_top - a_z;
    let depth_b = a_top - b_z;
    let depth_max = (b_top + headroom).min(a_top + headroom) - b_z.max(a_z);

    (depth_max - depth_a).abs() < (depth_max - depth_b).abs()
}

/// World-space grip volume of a mount and the grip origin
pub fn grip_volume(mount: &Character, config: &CollisionConfig) -> (OctBB, Vec3) {
    let half = config.grip_radius * mount.fat * 0.5;
    let diagonal = half * SQRT_TWO;
    let height = config.grip_height * mount.fat;

    let local = OctBB::new(
        OctVec([-half, -half, -diagonal, -diagonal, -height * 1.5]),
        OctVec([half, half, diagonal, diagonal, height * 0.5]),
    );

    let origin = mount.pos + mount.grip_offset.unwrap_or_else(Vec3::zeros);
    (local.add_vector(&origin), origin)
}

/// Score how well `obj_pos` sits on `plat`, `None` if it does not
fn platform_score(plat: &Character, obj_pos: &Vec3, tolerance: f32) -> Option<f32> {
    let point = OctVec::from_vec3(obj_pos);
    let reach = plat.max_cv.add_vector(&plat.pos);
    let area = footprint_area(point_depth(&reach, &point))?;

    let surface = plat.top();
    let vertical = clip(tolerance - (point[OctAxis::Z] - surface).abs(), 0.0, tolerance);
    (vertical > 0.0).then(|| area * vertical)
}

//--------------------------------------------------------------------------------------------
// Mounts

/// Score a possible mount between two characters
///
/// Returns true if a rider's target mount was updated.
pub fn detect_mount(world: &mut World, a: CharacterRef, b: CharacterRef, config: &CollisionConfig) -> bool {
    let (Some(chr_a), Some(chr_b)) = (world.character(a), world.character(b)) else {
        return false;
    };
    if !chr_a.in_game || !chr_b.in_game {
        return false;
    }

    // a can carry b, or b can carry a
    let mut mount_a = world.can_mount(b, a) && !world.character_in_game(chr_b.attached_to);
    let mut mount_b = world.can_mount(a, b) && !world.character_in_game(chr_a.attached_to);
    if !mount_a && !mount_b {
        return false;
    }

    if z_overlap(&chr_a.min_cv, chr_a.pos.z, &chr_b.min_cv, chr_b.pos.z) <= 0.0 {
        return false;
    }

    if mount_a && mount_b {
        if a_on_top(chr_a.pos.z, chr_a.top(), chr_b.pos.z, chr_b.top(), config.mount_tolerance) {
            mount_a = false;
        } else {
            mount_b = false;
        }
    }

    let (mount_ref, mount, rider_ref, rider) = if mount_a {
        (a, chr_a, b, chr_b)
    } else {
        (b, chr_b, a, chr_a)
    };

    if rider.enviro.grounded {
        return false;
    }

    let (grip_cv, grip_origin) = grip_volume(mount, config);

    // the rider must be dropping onto the grip
    let vdiff = rider.vel - mount.vel;
    if vdiff.z > 0.0 {
        return false;
    }
    if vdiff.dot(&(rider.pos - grip_origin)) >= 0.0 {
        return false;
    }

    let rider_cv = rider.min_cv.add_vector(&rider.pos);
    let depth = volume_depth(&grip_cv, &rider_cv);
    let Some(area) = footprint_area(depth) else {
        return false;
    };
    let score = area * depth[OctAxis::Z];

    if score <= rider.target_mount_score {
        return false;
    }

    if let Some(rider) = world.character_mut(rider_ref) {
        rider.target_mount = Some(mount_ref);
        rider.target_mount_score = score;
    }
    trace!("{rider_ref} targets mount {mount_ref} (score {score:.1})");
    true
}

/// Attach a rider to the left grip of a mount
pub fn attach_to_mount(world: &mut World, rider: CharacterRef, mount: CharacterRef, ctx: &mut FrameContext<'_>) -> bool {
    if !world.can_mount(rider, mount) {
        return false;
    }

    let Some((chr_rider, chr_mount)) = world.character_pair_mut(rider, mount) else {
        return false;
    };

    chr_rider.attached_to = Some(mount);
    chr_rider.target_mount = None;
    chr_rider.target_mount_score = 0.0;
    chr_rider.dismount_timer = 0;
    chr_rider.dismount_object = None;
    chr_rider.ai.alert |= AlertFlags::MOUNTED;

    chr_mount.holding[Slot::Left as usize] = Some(rider);

    ctx.stats.mounts += 1;
    ctx.emit(CollisionEvent::Mounted { rider, mount });
    trace!("{rider} mounted {mount}");
    true
}

/// Commit the remembered mount for either side of a character pair
pub fn commit_mount(world: &mut World, a: CharacterRef, b: CharacterRef, ctx: &mut FrameContext<'_>) -> bool {
    if !world.character_in_game(Some(a)) || !world.character_in_game(Some(b)) {
        return false;
    }

    let targets = |chr: CharacterRef, other: CharacterRef| {
        world
            .character(chr)
            .is_some_and(|c| c.target_mount_score > 0.0 && c.target_mount == Some(other))
    };
    let (a_rides_b, b_rides_a) = (targets(a, b), targets(b, a));

    if a_rides_b {
        attach_to_mount(world, a, b, ctx)
    } else if b_rides_a {
        attach_to_mount(world, b, a, ctx)
    } else {
        false
    }
}

/// Detect then commit every mount in the candidate list
pub fn resolve_mounts(world: &mut World, candidates: &[CollisionCandidate], ctx: &mut FrameContext<'_>) {
    for candidate in candidates {
        if let Some((a, b)) = candidate.characters() {
            detect_mount(world, a, b, ctx.config);
        }
    }

    for candidate in candidates {
        if let Some((a, b)) = candidate.characters() {
            commit_mount(world, a, b, ctx);
        }
    }
}

//--------------------------------------------------------------------------------------------
// Platforms

/// Score a possible character-on-platform attachment
///
/// Returns true if a rider's target platform was updated.
pub fn detect_chr_platform(world: &mut World, a: CharacterRef, b: CharacterRef, tolerance: f32) -> bool {
    let (Some(chr_a), Some(chr_b)) = (world.character(a), world.character(b)) else {
        return false;
    };
    if !chr_a.in_game || !chr_b.in_game {
        return false;
    }

    // mounted riders move with their mount
    if world.character_in_game(chr_a.attached_to) || world.character_in_game(chr_b.attached_to) {
        return false;
    }

    let mut platform_a = chr_b.can_use_platforms && chr_a.platform;
    let mut platform_b = chr_a.can_use_platforms && chr_b.platform;
    if !platform_a && !platform_b {
        return false;
    }

    // a mountable platform low enough to climb onto is left to the mount pass
    if world.can_mount(b, a) && chr_a.enviro.walk_level < chr_b.pos.z + chr_b.bump.height + tolerance {
        return false;
    }
    if world.can_mount(a, b) && chr_b.enviro.walk_level < chr_a.pos.z + chr_a.bump.height + tolerance {
        return false;
    }

    if z_overlap(&chr_a.max_cv, chr_a.pos.z, &chr_b.max_cv, chr_b.pos.z) <= 0.0 {
        return false;
    }

    if platform_a && platform_b {
        let top_a = chr_a.pos.z + chr_a.max_cv.maxs[OctAxis::Z];
        let top_b = chr_b.pos.z + chr_b.max_cv.maxs[OctAxis::Z];
        if a_on_top(chr_a.pos.z, top_a, chr_b.pos.z, top_b, 0.0) {
            platform_a = false;
        } else {
            platform_b = false;
        }
    }

    let (plat_ref, plat, rider_ref, rider) = if platform_a {
        (a, chr_a, b, chr_b)
    } else {
        (b, chr_b, a, chr_a)
    };

    let Some(score) = platform_score(plat, &rider.pos, tolerance) else {
        return false;
    };
    if score <= rider.target_platform_score {
        return false;
    }

    if let Some(rider) = world.character_mut(rider_ref) {
        rider.target_platform = Some(plat_ref);
        rider.target_platform_score = score;
    }
    true
}

/// Score a possible particle-on-platform attachment
pub fn detect_prt_platform(world: &mut World, chr: CharacterRef, prt: ParticleRef, tolerance: f32) -> bool {
    let (Some(plat), Some(particle)) = (world.character(chr), world.particle(prt)) else {
        return false;
    };
    if !plat.in_game || !particle.in_game || particle.hidden {
        return false;
    }

    if particle.attached_to.is_some() || world.character_in_game(plat.attached_to) {
        return false;
    }
    if !plat.platform {
        return false;
    }

    let particle_cv = OctBB::from_bumper(&particle.bump_min);
    if z_overlap(&plat.max_cv, plat.pos.z, &particle_cv, particle.pos.z) <= 0.0 {
        return false;
    }

    let Some(score) = platform_score(plat, &particle.pos, tolerance) else {
        return false;
    };
    if score <= particle.target_platform_score {
        return false;
    }

    if let Some(particle) = world.particle_mut(prt) {
        particle.target_platform = Some(chr);
        particle.target_platform_score = score;
    }
    true
}

/// Put a character on a platform, or confirm that it is still there
pub fn attach_chr_to_platform(
    world: &mut World,
    chr: CharacterRef,
    plat: CharacterRef,
    ctx: &mut FrameContext<'_>,
) -> bool {
    let Some(platform) = world.character(plat).filter(|p| p.in_game && p.platform) else {
        return false;
    };
    let surface = platform.top();

    let Some(rider) = world.character(chr).filter(|c| c.in_game) else {
        return false;
    };
    if !rider.can_use_platforms || rider.flying {
        return false;
    }

    let previous = rider.on_platform;
    if previous != Some(plat) {
        if previous.is_some() {
            detach_character_from_platform(world, chr, ctx);
        }

        if let Some(rider) = world.character_mut(chr) {
            rider.on_platform = Some(plat);
            rider.refresh_environment(Some(surface), ctx.platform_tolerance());
        }

        // pressure plates and the like react to being stood on
        if let Some(platform) = world.character_mut(plat) {
            platform.ai.set_bump_last(chr);
            platform.ai.alert |= AlertFlags::STOOD_ON;
        }

        ctx.emit(CollisionEvent::PlatformAttached { platform: plat, object: PlatformObject::Character(chr) });
        trace!("{chr} landed on {plat}");
    }

    if let Some(rider) = world.character_mut(chr) {
        rider.platform_update = ctx.frame;
        rider.target_platform = None;
        rider.target_platform_score = 0.0;
    }

    ctx.stats.platforms_attached += 1;
    true
}

/// Take a character off its platform and give the platform its weight back
pub fn detach_character_from_platform(world: &mut World, chr: CharacterRef, ctx: &mut FrameContext<'_>) -> bool {
    let Some(rider) = world.character_mut(chr) else {
        return false;
    };

    rider.platform_update = 0;
    rider.target_platform = None;
    rider.target_platform_score = 0.0;
    let previous = rider.on_platform.take();
    let weight = std::mem::take(&mut rider.platform_weight);

    let Some(plat) = previous else {
        return true;
    };

    if let Some(platform) = world.character_mut(plat) {
        platform.holding_weight = (platform.holding_weight - weight).max(0.0);
    }
    if let Some(rider) = world.character_mut(chr) {
        rider.refresh_environment(None, ctx.platform_tolerance());
    }

    ctx.stats.platforms_detached += 1;
    ctx.emit(CollisionEvent::PlatformDetached { platform: plat, object: PlatformObject::Character(chr) });
    trace!("{chr} left {plat}");
    true
}

/// Rest a particle on a platform, or confirm that it is still there
pub fn attach_prt_to_platform(world: &mut World, prt: ParticleRef, plat: CharacterRef, ctx: &mut FrameContext<'_>) -> bool {
    if !world.character(plat).is_some_and(|p| p.in_game && p.platform) {
        return false;
    }

    let Some(particle) = world.particle_mut(prt) else {
        return false;
    };

    let landed = particle.on_platform != Some(plat);
    particle.on_platform = Some(plat);
    particle.platform_update = ctx.frame;
    particle.target_platform = None;
    particle.target_platform_score = 0.0;

    if landed {
        ctx.emit(CollisionEvent::PlatformAttached { platform: plat, object: PlatformObject::Particle(prt) });
    }
    ctx.stats.platforms_attached += 1;
    true
}

/// Take a particle off its platform
pub fn detach_particle_from_platform(world: &mut World, prt: ParticleRef, ctx: &mut FrameContext<'_>) -> bool {
    let Some(particle) = world.particle_mut(prt) else {
        return false;
    };

    particle.platform_update = 0;
    particle.target_platform = None;
    particle.target_platform_score = 0.0;

    let Some(plat) = particle.on_platform.take() else {
        return true;
    };

    ctx.stats.platforms_detached += 1;
    ctx.emit(CollisionEvent::PlatformDetached { platform: plat, object: PlatformObject::Particle(prt) });
    true
}

/// Detach everything whose platform was not confirmed this frame
pub fn cleanup_stale_platforms(world: &mut World, ctx: &mut FrameContext<'_>) {
    let stale_characters: Vec<CharacterRef> = world
        .characters
        .iter()
        .filter(|(_, c)| c.on_platform.is_some() && c.platform_update < ctx.frame)
        .map(|(index, _)| CharacterRef(index))
        .collect();

    for chr in stale_characters {
        detach_character_from_platform(world, chr, ctx);
    }

    let stale_particles: Vec<ParticleRef> = world
        .particles
        .iter()
        .filter(|(_, p)| p.on_platform.is_some() && p.platform_update < ctx.frame)
        .map(|(index, _)| ParticleRef(index))
        .collect();

    for prt in stale_particles {
        detach_particle_from_platform(world, prt, ctx);
    }
}

/// Detect, commit and clean up every platform attachment
pub fn resolve_platforms(world: &mut World, candidates: &[CollisionCandidate], ctx: &mut FrameContext<'_>) {
    let tolerance = ctx.platform_tolerance();

    for candidate in candidates {
        if let Some((a, b)) = candidate.characters() {
            detect_chr_platform(world, a, b, tolerance);
        } else if let Some((chr, prt)) = candidate.character_and_particle() {
            detect_prt_platform(world, chr, prt, tolerance);
        }
    }

    for candidate in candidates {
        if let Some((a, b)) = candidate.characters() {
            if !world.character_in_game(Some(a)) || !world.character_in_game(Some(b)) {
                continue;
            }

            let targets = |rider: CharacterRef, plat: CharacterRef| {
                world
                    .character(rider)
                    .is_some_and(|c| c.target_platform_score > 0.0 && c.target_platform == Some(plat))
            };
            let (a_on_b, b_on_a) = (targets(a, b), targets(b, a));

            if a_on_b {
                attach_chr_to_platform(world, a, b, ctx);
            } else if b_on_a {
                attach_chr_to_platform(world, b, a, ctx);
            }
        } else if let Some((chr, prt)) = candidate.character_and_particle() {
            let targets = world.character_in_game(Some(chr))
                && world
                    .particle(prt)
                    .is_some_and(|p| p.in_game && p.target_platform_score > 0.0 && p.target_platform == Some(chr));

            if targets {
                attach_prt_to_platform(world, prt, chr, ctx);
            }
        }
    }

    cleanup_stale_platforms(world, ctx);
}

/// Move rider weight onto platforms once every rider has settled
pub fn update_platform_weights(world: &mut World) {
    let transfers: Vec<(CharacterRef, CharacterRef, f32)> = world
        .characters
        .iter()
        .filter_map(|(index, chr)| {
            let plat = chr.on_platform?;
            (chr.enviro.walk_lerp < chr.enviro.grid_lerp && chr.phys.weight != INFINITE_WEIGHT)
                .then(|| (CharacterRef(index), plat, chr.phys.weight as f32 * (1.0 - chr.enviro.walk_lerp)))
        })
        .collect();

    for (chr, plat, weight) in transfers {
        if !world.character_in_game(Some(plat)) {
            continue;
        }
        if let Some(rider) = world.character_mut(chr) {
            rider.platform_weight = weight;
        }
        if let Some(platform) = world.character_mut(plat) {
            platform.holding_weight += weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSystem;
    use crate::geometry::Bumper;
    use crate::physics::context::FrameStats;
    use approx::assert_relative_eq;

    fn platform_at(pos: Vec3, size: f32, config: &CollisionConfig) -> Character {
        let mut plat = Character::new(pos, Bumper::new(size, size * SQRT_TWO, 20.0));
        plat.platform = true;
        plat.can_use_platforms = false;
        plat.phys.weight = INFINITE_WEIGHT;
        plat.update_collision_volumes(config.platform_tolerance);
        plat
    }

    fn rider_at(pos: Vec3, config: &CollisionConfig) -> Character {
        let mut rider = Character::new(pos, Bumper::new(10.0, 14.0, 40.0));
        rider.update_collision_volumes(config.platform_tolerance);
        rider
    }

    #[test]
    fn test_footprint_area_requires_every_axis() {
        let mut depth = OctVec::splat(4.0);
        assert_relative_eq!(footprint_area(depth).unwrap(), 8.0, epsilon = 1e-4);

        depth[OctAxis::Z] = 0.0;
        assert!(footprint_area(depth).is_none());
    }

    #[test]
    fn test_platform_score_peaks_at_surface() {
        let config = CollisionConfig::default();
        let plat = platform_at(Vec3::zeros(), 40.0, &config);

        let on_top = platform_score(&plat, &Vec3::new(0.0, 0.0, 20.0), 50.0).unwrap();
        let hovering = platform_score(&plat, &Vec3::new(0.0, 0.0, 45.0), 50.0).unwrap();
        let off_edge = platform_score(&plat, &Vec3::new(60.0, 0.0, 20.0), 50.0);

        assert!(on_top > hovering);
        assert!(off_edge.is_none());
    }

    #[test]
    fn test_best_platform_wins_commit() {
        let config = CollisionConfig::default();
        let mut world = World::new();
        let rider = world.spawn_character(rider_at(Vec3::new(0.0, 0.0, 20.0), &config));
        let near = world.spawn_character(platform_at(Vec3::new(30.0, 0.0, 0.0), 40.0, &config));
        let under = world.spawn_character(platform_at(Vec3::zeros(), 40.0, &config));

        let candidates = [
            CollisionCandidate::character_pair(rider, near, 0.0, 1.0, OctBB::EMPTY),
            CollisionCandidate::character_pair(rider, under, 0.0, 1.0, OctBB::EMPTY),
        ];

        let mut events = EventSystem::new();
        let mut stats = FrameStats::default();
        let mut ctx = FrameContext::new(&config, &mut events, &mut stats, world.frame);
        resolve_platforms(&mut world, &candidates, &mut ctx);

        let chr = world.character(rider).unwrap();
        assert_eq!(chr.on_platform, Some(under));
        assert_eq!(chr.target_platform_score, 0.0);
        assert_eq!(chr.platform_update, world.frame);
        assert_eq!(world.character(under).unwrap().ai.bump_last, Some(rider));
        assert_eq!(stats.platforms_attached, 1);
    }

    #[test]
    fn test_stale_platform_detaches_and_returns_weight() {
        let config = CollisionConfig::default();
        let mut world = World::new();
        let rider = world.spawn_character(rider_at(Vec3::new(0.0, 0.0, 20.0), &config));
        let plat = world.spawn_character(platform_at(Vec3::zeros(), 40.0, &config));

        {
            let frame = world.frame;
            let chr = world.character_mut(rider).unwrap();
            chr.on_platform = Some(plat);
            chr.platform_update = frame - 1;
            chr.platform_weight = 60.0;
        }
        world.character_mut(plat).unwrap().holding_weight = 50.0;

        let mut events = EventSystem::new();
        let mut stats = FrameStats::default();
        let mut ctx = FrameContext::new(&config, &mut events, &mut stats, world.frame);
        cleanup_stale_platforms(&mut world, &mut ctx);

        let chr = world.character(rider).unwrap();
        assert_eq!(chr.on_platform, None);
        assert_eq!(chr.platform_weight, 0.0);
        // clamped, never negative
        assert_eq!(world.character(plat).unwrap().holding_weight, 0.0);
        assert_eq!(stats.platforms_detached, 1);
        assert_eq!(events.pending(), 1);
    }

    #[test]
    fn test_falling_rider_mounts() {
        let config = CollisionConfig::default();
        let mut world = World::new();

        let mut horse = Character::new(Vec3::zeros(), Bumper::new(20.0, 28.0, 60.0));
        horse.is_mount = true;
        horse.grip_offset = Some(Vec3::new(0.0, 0.0, 50.0));
        let horse = world.spawn_character(horse);

        let mut knight = rider_at(Vec3::new(0.0, 0.0, 55.0), &config);
        knight.vel = Vec3::new(0.0, 0.0, -4.0);
        knight.refresh_environment(None, config.platform_tolerance);
        let knight = world.spawn_character(knight);

        assert!(detect_mount(&mut world, horse, knight, &config));
        assert_eq!(world.character(knight).unwrap().target_mount, Some(horse));

        let mut events = EventSystem::new();
        let mut stats = FrameStats::default();
        let mut ctx = FrameContext::new(&config, &mut events, &mut stats, world.frame);
        assert!(commit_mount(&mut world, horse, knight, &mut ctx));

        assert_eq!(world.character(knight).unwrap().attached_to, Some(horse));
        assert_eq!(world.character(horse).unwrap().held(Slot::Left), Some(knight));
        assert!(world.character(knight).unwrap().ai.alert.contains(AlertFlags::MOUNTED));
        assert_eq!(stats.mounts, 1);
    }

    #[test]
    fn test_rising_rider_does_not_mount() {
        let config = CollisionConfig::default();
        let mut world = World::new();

        let mut horse = Character::new(Vec3::zeros(), Bumper::new(20.0, 28.0, 60.0));
        horse.is_mount = true;
        horse.grip_offset = Some(Vec3::new(0.0, 0.0, 50.0));
        let horse = world.spawn_character(horse);

        let mut knight = rider_at(Vec3::new(0.0, 0.0, 55.0), &config);
        knight.vel = Vec3::new(0.0, 0.0, 4.0);
        knight.refresh_environment(None, config.platform_tolerance);
        let knight = world.spawn_character(knight);

        assert!(!detect_mount(&mut world, horse, knight, &config));
        assert_eq!(world.character(knight).unwrap().target_mount, None);
    }
}
