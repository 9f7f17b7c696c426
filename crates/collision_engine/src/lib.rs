//! # Collision Engine
//!
//! Frame-stepped collision detection and response for characters and
//! particles in a tile-based action game.
//!
//! ## Features
//!
//! - **Octagonal Bounds**: five-axis boxes (x, y, both diagonals, z)
//! - **Broad Phase**: loose octree rebuilt every frame from swept bounds
//! - **Continuous Narrow Phase**: overlap windows of moving boxes within a frame
//! - **Deduplicated Candidates**: fixed-pool hash table, earliest contact first
//! - **Attachments**: mounts and platforms chosen by a detect-then-commit pass
//! - **Response**: impulse and pressure between characters, damage, deflection
//!   and pickups for particles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collision_engine::prelude::*;
//!
//! fn main() {
//!     collision_engine::foundation::logging::init();
//!
//!     let mut world = World::new();
//!     world.spawn_character(Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 40.0)));
//!     world.spawn_character(Character::new(Vec3::new(15.0, 0.0, 0.0), Bumper::new(10.0, 14.0, 40.0)));
//!
//!     let mut collisions = CollisionSystem::new(CollisionConfig::default());
//!     let mut damage = StandardDamage::new(0);
//!
//!     let report = collisions.run_frame(&mut world, &mut damage);
//!     println!("{}", report.stats);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod geometry;
pub mod spatial;
pub mod world;
pub mod events;
pub mod physics;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError},
        events::{CollisionEvent, Event, EventHandler, EventSystem, EventType, PlatformObject},
        foundation::math::{Facing, Vec3},
        geometry::{Bumper, OctAxis, OctBB, OctVec, AABB},
        physics::{CollisionError, CollisionSystem, FrameReport, FrameStats},
        spatial::{Octree, OctreeConfig, SpatialQuery},
        world::{
            Character, CharacterRef, DamageRange, DamageSink, DamageType, Particle, ParticleRef,
            StandardDamage, TeamId, World,
        },
    };
}
