//! Abstract spatial query interface for broad-phase collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! The collision system only talks to this trait, so the octree can be
//! swapped for a grid or BVH without touching candidate generation.

use crate::geometry::AABB;
use crate::spatial::{Octree, SpatialLeaf};

/// Abstract interface for the per-frame broad-phase index
///
/// Contract: a query never misses a leaf whose bounds overlap the query
/// box. Extra hits are allowed and are filtered by the narrow phase.
pub trait SpatialQuery: Send + Sync {
    /// Add a leaf for this frame
    fn insert_leaf(&mut self, leaf: SpatialLeaf);

    /// Remove every leaf without tearing down the structure
    fn empty(&mut self);

    /// Drop empty branches, returning how many nodes were freed
    fn prune(&mut self) -> usize;

    /// Append every leaf overlapping `aabb` to `results`
    fn query_aabb(&self, aabb: &AABB, results: &mut Vec<SpatialLeaf>);

    /// Number of leaves currently stored
    fn leaf_count(&self) -> usize;

    /// Number of nodes currently allocated
    fn node_count(&self) -> usize;
}

impl SpatialQuery for Octree {
    fn insert_leaf(&mut self, leaf: SpatialLeaf) {
        if !self.insert(leaf) {
            log::trace!("{:?} {} outside world bounds, kept at root", leaf.kind, leaf.index);
        }
    }

    fn empty(&mut self) {
        self.clear_leaves();
    }

    fn prune(&mut self) -> usize {
        Octree::prune(self)
    }

    fn query_aabb(&self, aabb: &AABB, results: &mut Vec<SpatialLeaf>) {
        self.root.query_aabb(aabb, results);
    }

    fn leaf_count(&self) -> usize {
        Octree::leaf_count(self)
    }

    fn node_count(&self) -> usize {
        Octree::node_count(self)
    }
}
