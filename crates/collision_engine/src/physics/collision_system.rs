//! Per-frame collision pass
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! One call to [`CollisionSystem::run_frame`] does the whole pass:
//!
//! 1. rebuild the spatial index from this frame's swept bounds
//! 2. broad phase: every indexed character queries the index, and each hit
//!    that survives the interval test becomes a candidate in the table
//! 3. flatten the table into tmin order
//! 4. mount detection and commit, then platform detection and commit
//! 5. character-character and character-particle response, in order
//! 6. platform weights, accumulator flush, particle removal
//!
//! Later candidates see the effects of earlier ones, so the sort order is the
//! resolution priority.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::CollisionConfig;
use crate::events::{CollisionEvent, Event, EventSystem};
use crate::geometry::OctBB;
use crate::spatial::{LeafKind, Octree, SpatialLeaf, SpatialQuery};
use crate::world::{CharacterRef, DamageSink, ParticleRef, World};

use super::attachment::{resolve_mounts, resolve_platforms, update_platform_weights};
use super::candidate::{CollisionCandidate, CollisionEndpoint};
use super::candidate_table::{CandidateTable, InsertOutcome};
use super::context::{FrameContext, FrameStats};
use super::error::CollisionResult;
use super::intersect::{intersect_oct_bb, CloseTolerance, IntervalHit, SweptVolume};
use super::response::{do_chr_chr_collision, do_chr_prt_collision};

/// What one frame produced
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Counters
    pub stats: FrameStats,
    /// Events raised during the frame, after dispatch to handlers
    pub events: Vec<Event>,
}

/// Collision detection and response for a [`World`] (GEA 13.3)
///
/// Owns the spatial index, the candidate table and the event queue, and
/// reuses their storage from frame to frame.
pub struct CollisionSystem {
    /// Spatial partitioning structure for broad-phase
    spatial_query: Box<dyn SpatialQuery>,

    /// Deduplicated candidates for the current frame
    table: CandidateTable,

    /// Candidates in processing order
    sorted: Vec<CollisionCandidate>,

    /// Characters that query the index this frame
    queries: Vec<SpatialLeaf>,

    /// Query scratch space
    hits: Vec<SpatialLeaf>,

    /// Side effects for other subsystems
    events: EventSystem,

    /// Shield rolls
    rng: StdRng,

    config: CollisionConfig,
}

impl CollisionSystem {
    /// Create a collision system backed by an octree over the configured world bounds
    pub fn new(config: CollisionConfig) -> Self {
        let octree = Octree::new(config.world_bounds, config.octree.clone());
        Self::with_spatial(config, Box::new(octree))
    }

    /// Create a collision system with the given spatial query implementation
    pub fn with_spatial(config: CollisionConfig, spatial_query: Box<dyn SpatialQuery>) -> Self {
        Self {
            spatial_query,
            table: CandidateTable::new(config.candidate_capacity, config.hash_node_capacity),
            sorted: Vec::new(),
            queries: Vec::new(),
            hits: Vec::new(),
            events: EventSystem::new(),
            rng: StdRng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Tuning in use
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Event queue, for registering handlers
    pub fn events_mut(&mut self) -> &mut EventSystem {
        &mut self.events
    }

    /// Candidates processed by the last frame, in processing order
    pub fn candidates(&self) -> &[CollisionCandidate] {
        &self.sorted
    }

    /// Run the full collision pass and advance the world frame counter
    pub fn run_frame(&mut self, world: &mut World, sink: &mut dyn DamageSink) -> FrameReport {
        let frame = world.frame;
        self.events.update_frame(frame);

        self.fill_spatial_index(world);
        self.broad_phase(world);
        self.table.flatten_sorted(&mut self.sorted);

        let table_stats = self.table.stats();
        let mut stats = FrameStats {
            frame,
            candidates: table_stats.inserted,
            duplicates: table_stats.duplicates,
            dropped: table_stats.dropped,
            ..FrameStats::default()
        };

        {
            let mut ctx = FrameContext::new(&self.config, &mut self.events, &mut stats, frame);

            resolve_mounts(world, &self.sorted, &mut ctx);
            resolve_platforms(world, &self.sorted, &mut ctx);

            for candidate in &self.sorted {
                if let Err(err) = Self::respond(world, candidate, &mut ctx, sink, &mut self.rng) {
                    trace!("skipping candidate {} -> {}: {err}", candidate.source, candidate.destination);
                }
            }

            update_platform_weights(world);
            flush_accumulators(world);
            remove_terminated(world, &mut ctx);
        }

        if stats.dropped > 0 {
            debug!("frame {frame}: {} candidates dropped for lack of pool space", stats.dropped);
        }
        debug!("{stats}");

        world.frame = frame.wrapping_add(1);
        FrameReport { stats, events: self.events.dispatch() }
    }

    /// Rebuild the index from this frame's swept bounds
    ///
    /// Also clears the per-frame attachment scratch on every entity and
    /// refreshes collision volumes and walk levels.
    fn fill_spatial_index(&mut self, world: &mut World) {
        if self.config.should_prune(world.frame) {
            let freed = self.spatial_query.prune();
            trace!("pruned {freed} empty octree nodes");
        }
        self.spatial_query.empty();
        self.queries.clear();

        let tolerance = self.config.platform_tolerance;

        for (_, chr) in world.characters.iter_mut() {
            chr.holding_weight = 0.0;
            chr.target_mount = None;
            chr.target_mount_score = 0.0;
            chr.target_platform = None;
            chr.target_platform_score = 0.0;
            chr.update_collision_volumes(tolerance);
        }

        let platform_tops: Vec<(usize, Option<f32>)> = world
            .characters
            .iter()
            .map(|(index, chr)| {
                let top = chr.on_platform.and_then(|plat| world.character(plat)).map(|plat| plat.top());
                (index, top)
            })
            .collect();
        for (index, top) in platform_tops {
            if let Some(chr) = world.character_mut(CharacterRef(index)) {
                chr.refresh_environment(top, tolerance);
            }
        }

        for (index, chr) in world.characters.iter() {
            if !chr.is_collidable() || !chr.max_cv.is_valid() {
                continue;
            }
            let bounds = chr.max_cv.add_vector(&chr.pos).expand(&chr.vel, 0.0, 1.0).to_aabb();
            let leaf = SpatialLeaf::character(index, bounds);
            self.spatial_query.insert_leaf(leaf);
            self.queries.push(leaf);
        }

        for (index, prt) in world.particles.iter_mut() {
            prt.target_platform = None;
            prt.target_platform_score = 0.0;

            if !prt.is_collidable() || prt.cv.is_empty() {
                continue;
            }
            let bounds = prt.cv.add_vector(&prt.pos).expand(&prt.vel, 0.0, 1.0).to_aabb();
            self.spatial_query.insert_leaf(SpatialLeaf::particle(index, bounds));
        }

        trace!(
            "spatial index: {} leaves in {} nodes",
            self.spatial_query.leaf_count(),
            self.spatial_query.node_count()
        );
    }

    /// Query the index for every indexed character and fill the candidate table
    fn broad_phase(&mut self, world: &World) {
        self.table.reset();

        for query in &self.queries {
            let chr = CharacterRef(query.index);

            self.hits.clear();
            self.spatial_query.query_aabb(&query.bounds, &mut self.hits);

            for hit in &self.hits {
                let candidate = match hit.kind {
                    LeafKind::Character if hit.index != query.index => {
                        narrow_phase_chr_chr(world, chr, CharacterRef(hit.index))
                    }
                    LeafKind::Character => None,
                    LeafKind::Particle => narrow_phase_chr_prt(world, chr, ParticleRef(hit.index)),
                };

                let Some(candidate) = candidate else {
                    continue;
                };
                match self.table.insert_unique(candidate) {
                    Ok(InsertOutcome::Inserted | InsertOutcome::Duplicate) => {}
                    Err(err) => trace!("{}: {err}", candidate.destination),
                }
            }
        }
    }

    fn respond(
        world: &mut World,
        candidate: &CollisionCandidate,
        ctx: &mut FrameContext<'_>,
        sink: &mut dyn DamageSink,
        rng: &mut StdRng,
    ) -> CollisionResult<bool> {
        match (candidate.source, candidate.destination) {
            (CollisionEndpoint::Character(_), CollisionEndpoint::Character(_)) => {
                do_chr_chr_collision(world, candidate, ctx)
            }
            (CollisionEndpoint::Character(_), CollisionEndpoint::Particle(_)) => {
                do_chr_prt_collision(world, candidate, ctx, sink, rng)
            }
            // mesh collision is handled elsewhere
            (CollisionEndpoint::Tile(_), _) | (_, CollisionEndpoint::Tile(_)) => Ok(false),
            (CollisionEndpoint::Particle(_), _) => Ok(false),
        }
    }
}

/// Interval test between two characters
///
/// A platform is tried against a rider first, so a rider standing on it is
/// found even without volume overlap. Failing that, the plain volumes are
/// tested.
fn narrow_phase_chr_chr(world: &World, a: CharacterRef, b: CharacterRef) -> Option<CollisionCandidate> {
    let (chr_a, chr_b) = (world.character(a)?, world.character(b)?);

    if !chr_a.in_game || !chr_b.in_game || chr_a.hidden || chr_b.hidden {
        return None;
    }
    if !chr_a.bump.has_size() || !chr_b.bump.has_size() {
        return None;
    }
    if chr_a.attached_to == Some(b) || chr_b.attached_to == Some(a) {
        return None;
    }

    let test = |cv_a: &OctBB, cv_b: &OctBB, tolerance: CloseTolerance| {
        intersect_oct_bb(
            SweptVolume::new(cv_a, &chr_a.pos, &chr_a.vel),
            SweptVolume::new(cv_b, &chr_b.pos, &chr_b.vel),
            tolerance,
        )
    };

    let platform_hit = if chr_a.platform && chr_b.can_use_platforms {
        test(&chr_a.max_cv, &chr_b.min_cv, CloseTolerance::Object1Platform)
    } else if chr_b.platform && chr_a.can_use_platforms {
        test(&chr_a.min_cv, &chr_b.max_cv, CloseTolerance::Object2Platform)
    } else {
        None
    };

    let IntervalHit { tmin, tmax, cv } =
        platform_hit.or_else(|| test(&chr_a.min_cv, &chr_b.min_cv, CloseTolerance::None))?;
    Some(CollisionCandidate::character_pair(a, b, tmin, tmax, cv))
}

/// Interval test between a character and a particle
fn narrow_phase_chr_prt(world: &World, c: CharacterRef, p: ParticleRef) -> Option<CollisionCandidate> {
    let (chr, prt) = (world.character(c)?, world.particle(p)?);

    if chr.hidden || prt.hidden || prt.attached_to == Some(c) {
        return None;
    }

    let particle = SweptVolume::new(&prt.cv, &prt.pos, &prt.vel);

    let platform_hit = if chr.platform {
        intersect_oct_bb(
            SweptVolume::new(&chr.max_cv, &chr.pos, &chr.vel),
            particle,
            CloseTolerance::Object1Platform,
        )
    } else {
        None
    };

    let IntervalHit { tmin, tmax, cv } = platform_hit.or_else(|| {
        intersect_oct_bb(SweptVolume::new(&chr.min_cv, &chr.pos, &chr.vel), particle, CloseTolerance::None)
    })?;
    Some(CollisionCandidate::character_particle(c, p, tmin, tmax, cv))
}

/// Apply and zero every accumulator
fn flush_accumulators(world: &mut World) {
    for (_, chr) in world.characters.iter_mut() {
        chr.phys.flush(&mut chr.pos, &mut chr.vel);
    }
    for (_, prt) in world.particles.iter_mut() {
        prt.phys.flush(&mut prt.pos, &mut prt.vel);
    }
}

/// Remove particles that asked to end this frame
fn remove_terminated(world: &mut World, ctx: &mut FrameContext<'_>) {
    let doomed: Vec<ParticleRef> = world
        .particles
        .iter()
        .filter(|(_, prt)| prt.terminate_requested)
        .map(|(index, _)| ParticleRef(index))
        .collect();

    for prt in doomed {
        if world.remove_particle(prt).is_some() {
            ctx.stats.particles_terminated += 1;
            ctx.emit(CollisionEvent::ParticleTerminated { particle: prt });
            trace!("{prt} terminated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::geometry::Bumper;
    use crate::world::{Character, Particle, StandardDamage};

    #[test]
    fn test_empty_world_advances_frame() {
        let mut system = CollisionSystem::new(CollisionConfig::default());
        let mut world = World::new();
        let mut sink = StandardDamage::new(1);

        let report = system.run_frame(&mut world, &mut sink);
        assert_eq!(report.stats.frame, 1);
        assert_eq!(report.stats.candidates, 0);
        assert!(report.events.is_empty());
        assert_eq!(world.frame, 2);
    }

    #[test]
    fn test_overlapping_pair_is_found_once() {
        let mut system = CollisionSystem::new(CollisionConfig::default());
        let mut world = World::new();
        let bump = Bumper::new(10.0, 14.0, 40.0);
        world.spawn_character(Character::new(Vec3::zeros(), bump));
        world.spawn_character(Character::new(Vec3::new(15.0, 0.0, 0.0), bump));
        let mut sink = StandardDamage::new(1);

        let report = system.run_frame(&mut world, &mut sink);

        // each side finds the other
        assert_eq!(report.stats.candidates, 1);
        assert_eq!(report.stats.duplicates, 1);
        assert_eq!(system.candidates().len(), 1);
        assert_eq!(report.stats.chr_chr_collisions, 1);
    }

    #[test]
    fn test_hidden_particle_is_not_indexed() {
        let mut system = CollisionSystem::new(CollisionConfig::default());
        let mut world = World::new();
        world.spawn_character(Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 40.0)));

        let mut prt = Particle::new(Vec3::new(2.0, 0.0, 10.0), Vec3::zeros(), Bumper::new(4.0, 5.0, 4.0));
        prt.hidden = true;
        world.spawn_particle(prt);

        let mut sink = StandardDamage::new(1);
        let report = system.run_frame(&mut world, &mut sink);
        assert_eq!(report.stats.candidates, 0);
    }

    #[test]
    fn test_terminated_particle_is_removed() {
        let mut system = CollisionSystem::new(CollisionConfig::default());
        let mut world = World::new();
        let mut prt = Particle::new(Vec3::zeros(), Vec3::zeros(), Bumper::new(4.0, 5.0, 4.0));
        prt.terminate_requested = true;
        let prt = world.spawn_particle(prt);

        let mut sink = StandardDamage::new(1);
        let report = system.run_frame(&mut world, &mut sink);

        assert!(world.particle(prt).is_none());
        assert_eq!(report.stats.particles_terminated, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].payload, CollisionEvent::ParticleTerminated { particle: prt });
    }
}
