//! # Collision Configuration
//!
//! Tuning constants for the per-frame collision pass. Every field has a
//! default matching the stock game balance, so a partial TOML or RON file
//! only needs to name what it changes.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::geometry::AABB;
use crate::spatial::OctreeConfig;

/// Default size of the candidate pool
pub const DEFAULT_CANDIDATE_CAPACITY: usize = 512 * 16;

/// # Collision Configuration
///
/// Pool sizes, tolerances and response coefficients. Distances are world
/// units, times are game ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Capacity of the candidate record pool
    pub candidate_capacity: usize,
    /// Capacity of the hash-node pool
    pub hash_node_capacity: usize,
    /// The spatial index drops empty branches once every this many frames
    pub prune_interval: u32,
    /// Vertical slop allowed between a rider and a platform top
    pub platform_tolerance: f32,
    /// Extra headroom when choosing which of two mounts is on top
    pub mount_tolerance: f32,
    /// How strongly particles resting on a platform follow its motion
    pub platform_stick: f32,
    /// Relative vertical speed above which a rider falls off a platform
    pub max_platform_normal_velocity: f32,
    /// Coefficient of restitution for character impulses
    pub restitution: f32,
    /// Fraction of the remaining depth corrected per frame while overlapping
    pub pressure_strength: f32,
    /// Sliding friction scale
    pub friction: f32,
    /// Ticks of reduced interaction after a dismount
    pub dismount_time: u32,
    /// Reload penalty applied by a shield block
    pub shield_knockback_reload: u32,
    /// Horizontal radius of a mount's grip volume before scaling by fat
    pub grip_radius: f32,
    /// Vertical size of a mount's grip volume before scaling by fat
    pub grip_height: f32,
    /// Seed for shield and damage rolls
    pub rng_seed: u64,
    /// Region covered by the spatial index root
    pub world_bounds: AABB,
    /// Spatial index tuning
    pub octree: OctreeConfig,
}

impl CollisionConfig {
    /// Create a configuration with the stock values
    pub fn new() -> Self {
        Self {
            candidate_capacity: DEFAULT_CANDIDATE_CAPACITY,
            hash_node_capacity: 2 * DEFAULT_CANDIDATE_CAPACITY,
            prune_interval: 8,
            platform_tolerance: 50.0,
            mount_tolerance: 50.0,
            platform_stick: 0.5,
            max_platform_normal_velocity: 50.0,
            restitution: 0.5,
            pressure_strength: 0.125,
            friction: 0.5,
            dismount_time: 50,
            shield_knockback_reload: 40,
            grip_radius: 22.0,
            grip_height: 88.0,
            rng_seed: 0x5EED,
            world_bounds: AABB::new(
                Vec3::new(-4096.0, -4096.0, -1024.0),
                Vec3::new(4096.0, 4096.0, 1024.0),
            ),
            octree: OctreeConfig::default(),
        }
    }

    /// Set both pool capacities, hash nodes at twice the candidates
    pub fn with_candidate_capacity(mut self, capacity: usize) -> Self {
        self.candidate_capacity = capacity;
        self.hash_node_capacity = capacity * 2;
        self
    }

    /// Set the hash-node pool capacity on its own
    pub fn with_hash_node_capacity(mut self, capacity: usize) -> Self {
        self.hash_node_capacity = capacity;
        self
    }

    /// Set the pruning interval (power of two)
    pub fn with_prune_interval(mut self, interval: u32) -> Self {
        self.prune_interval = interval;
        self
    }

    /// Set the platform tolerance
    pub fn with_platform_tolerance(mut self, tolerance: f32) -> Self {
        self.platform_tolerance = tolerance;
        self
    }

    /// Set the restitution coefficient
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set the RNG seed
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Set the spatial index bounds
    pub fn with_world_bounds(mut self, bounds: AABB) -> Self {
        self.world_bounds = bounds;
        self
    }

    /// Set the spatial index tuning
    pub fn with_octree(mut self, octree: OctreeConfig) -> Self {
        self.octree = octree;
        self
    }

    /// Whether the spatial index should prune on this frame
    pub fn should_prune(&self, frame: u32) -> bool {
        let mask = self.prune_interval.max(1) - 1;
        frame & mask == mask
    }

    fn check(&self) -> Result<(), String> {
        if self.candidate_capacity == 0 {
            return Err("Candidate capacity must be at least 1".to_string());
        }

        if self.hash_node_capacity < self.candidate_capacity {
            return Err("Hash node capacity must not be smaller than candidate capacity".to_string());
        }

        if self.prune_interval == 0 || !self.prune_interval.is_power_of_two() {
            return Err(format!("Prune interval must be a power of two, got {}", self.prune_interval));
        }

        if self.platform_tolerance <= 0.0 || self.mount_tolerance < 0.0 {
            return Err("Platform tolerance must be positive".to_string());
        }

        if !(0.0..=1.0).contains(&self.platform_stick) {
            return Err("Platform stick must lie in [0, 1]".to_string());
        }

        if !(0.0..=1.0).contains(&self.restitution) {
            return Err("Restitution must lie in [0, 1]".to_string());
        }

        if self.max_platform_normal_velocity <= 0.0 {
            return Err("Max platform normal velocity must be positive".to_string());
        }

        if self.dismount_time == 0 {
            return Err("Dismount time must be at least one tick".to_string());
        }

        if self.octree.max_depth == 0 || self.octree.min_node_size <= 0.0 {
            return Err("Octree depth and minimum node size must be positive".to_string());
        }

        let size = self.world_bounds.max - self.world_bounds.min;
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err("World bounds must have positive volume".to_string());
        }

        Ok(())
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for CollisionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.check().map_err(ConfigError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CollisionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.candidate_capacity, 8192);
        assert_eq!(config.hash_node_capacity, 16384);
    }

    #[test]
    fn test_prune_schedule() {
        let config = CollisionConfig::default();
        assert!(!config.should_prune(0));
        assert!(config.should_prune(7));
        assert!(!config.should_prune(8));
        assert!(config.should_prune(15));
    }

    #[test]
    fn test_builder_chain() {
        let bounds = AABB::new(Vec3::new(-64.0, -64.0, 0.0), Vec3::new(64.0, 64.0, 32.0));
        let config = CollisionConfig::new()
            .with_candidate_capacity(64)
            .with_platform_tolerance(20.0)
            .with_restitution(0.25)
            .with_world_bounds(bounds)
            .with_octree(OctreeConfig { max_leaves_per_node: 2, ..OctreeConfig::default() });

        assert_eq!(config.hash_node_capacity, 128);
        assert_eq!(config.octree.max_leaves_per_node, 2);
        assert!(config.validate().is_ok());

        let starved = config.with_hash_node_capacity(32);
        assert!(matches!(starved.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_prune_interval() {
        let config = CollisionConfig::default().with_prune_interval(6);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CollisionConfig = toml::from_str("platform_tolerance = 25.0\n").unwrap();
        assert_eq!(config.platform_tolerance, 25.0);
        assert_eq!(config.prune_interval, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_roundtrip_file() {
        let path = std::env::temp_dir().join("collision_config_test.ron");

        let config = CollisionConfig::default().with_rng_seed(42);
        config.save_to_file(&path).unwrap();
        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.rng_seed, 42);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = CollisionConfig::load_from_file("collision.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
