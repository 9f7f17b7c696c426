//! Loose octree over swept entity bounds
//!
//! Each leaf is stored in the deepest node whose bounds fully contain it, so
//! a leaf straddling a split plane stays in the parent. Leaves that do not fit
//! inside the world bounds at all are kept at the root. The node structure
//! survives [`Octree::clear_leaves`] and is only torn down by
//! [`Octree::prune`], which lets a per-frame rebuild reuse the allocations.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::geometry::AABB;

/// Subdivision limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// Maximum leaves per node before subdivision
    pub max_leaves_per_node: usize,

    /// Depth below which nodes never split
    pub max_depth: u32,

    /// Nodes no wider than this are not split
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_leaves_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

/// What a leaf refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// Index into the character store
    Character,
    /// Index into the particle store
    Particle,
}

/// Entity bounds stored in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialLeaf {
    /// Which store `index` refers to
    pub kind: LeafKind,
    /// Slot in that store
    pub index: usize,
    /// World-space bounds for this frame
    pub bounds: AABB,
}

impl SpatialLeaf {
    /// Leaf for a character slot
    pub fn character(index: usize, bounds: AABB) -> Self {
        Self { kind: LeafKind::Character, index, bounds }
    }

    /// Leaf for a particle slot
    pub fn particle(index: usize, bounds: AABB) -> Self {
        Self { kind: LeafKind::Particle, index, bounds }
    }
}

/// One cube of the tree
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Cube covered by this node
    pub bounds: AABB,

    /// Leaves stored at this level
    pub leaves: Vec<SpatialLeaf>,

    /// Octant children once split
    pub children: Option<Box<[OctreeNode; 8]>>,

    /// Root is 0
    pub depth: u32,
}

impl OctreeNode {
    /// Unsplit node with no leaves
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            leaves: Vec::new(),
            children: None,
            depth,
        }
    }

    /// True until the node has been split
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Split into eight octants and push resident leaves down
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        // Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
        let children = std::array::from_fn(|octant| {
            let side = |bit: usize| if octant & bit == 0 { -1.0 } else { 1.0 };
            let offset = Vec3::new(side(1), side(2), side(4)).component_mul(&quarter_extents);
            let child_center = center + offset;

            OctreeNode::new(AABB::from_center_extents(child_center, quarter_extents), depth)
        });
        self.children = Some(Box::new(children));

        // Push down whatever fits entirely inside one child
        let resident = std::mem::take(&mut self.leaves);
        for leaf in resident {
            if let Some(leaf) = self.push_to_child(leaf) {
                self.leaves.push(leaf);
            }
        }
    }

    /// Hand a leaf to the child that contains it, returning it if none does
    fn push_to_child(&mut self, leaf: SpatialLeaf) -> Option<SpatialLeaf> {
        let Some(children) = self.children.as_mut() else {
            return Some(leaf);
        };

        match children.iter_mut().find(|child| child.bounds.contains(&leaf.bounds)) {
            Some(child) => {
                child.leaves.push(leaf);
                None
            }
            None => Some(leaf),
        }
    }

    /// Insert a leaf that fits inside this node
    fn insert(&mut self, leaf: SpatialLeaf, config: &OctreeConfig) {
        if self.is_leaf() {
            let should_subdivide = self.leaves.len() >= config.max_leaves_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().x > config.min_node_size;

            if !should_subdivide {
                self.leaves.push(leaf);
                return;
            }

            self.subdivide();
        }

        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|child| child.bounds.contains(&leaf.bounds)) {
                child.insert(leaf, config);
                return;
            }
        }

        self.leaves.push(leaf);
    }

    /// Collect every leaf whose bounds overlap `aabb`
    pub fn query_aabb(&self, aabb: &AABB, results: &mut Vec<SpatialLeaf>) {
        results.extend(self.leaves.iter().filter(|leaf| leaf.bounds.intersects(aabb)));

        // A child's leaves lie inside the child, so a missed child has no hits
        if let Some(ref children) = self.children {
            for child in children.iter() {
                if child.bounds.intersects(aabb) {
                    child.query_aabb(aabb, results);
                }
            }
        }
    }

    /// Drop all leaves, keeping the node structure
    fn clear_leaves(&mut self) {
        self.leaves.clear();
        if let Some(ref mut children) = self.children {
            for child in children.iter_mut() {
                child.clear_leaves();
            }
        }
    }

    /// Collapse empty subtrees, returning true if this node is now bare
    fn prune(&mut self) -> bool {
        if let Some(ref mut children) = self.children {
            let mut all_bare = true;
            for child in children.iter_mut() {
                all_bare &= child.prune();
            }

            if all_bare {
                self.children = None;
            }
        }

        self.is_leaf() && self.leaves.is_empty()
    }

    /// Count total leaves in this node and all children
    pub fn count_leaves(&self) -> usize {
        let below: usize = self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(OctreeNode::count_leaves).sum());
        self.leaves.len() + below
    }

    /// Count this node and all descendants
    pub fn count_nodes(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(OctreeNode::count_nodes).sum())
    }
}

/// Tree of tagged leaves, rebuilt every frame
#[derive(Debug, Clone)]
pub struct Octree {
    /// Covers the world bounds
    pub root: OctreeNode,

    config: OctreeConfig,
}

impl Octree {
    /// Empty tree over `world_bounds`
    pub fn new(world_bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(world_bounds, 0),
            config,
        }
    }

    /// Insert a leaf; out-of-bounds leaves are kept at the root
    pub fn insert(&mut self, leaf: SpatialLeaf) -> bool {
        if self.root.bounds.contains(&leaf.bounds) {
            self.root.insert(leaf, &self.config);
            true
        } else {
            self.root.leaves.push(leaf);
            false
        }
    }

    /// Query all leaves overlapping an AABB
    pub fn query_aabb(&self, aabb: &AABB) -> Vec<SpatialLeaf> {
        let mut results = Vec::new();
        self.root.query_aabb(aabb, &mut results);
        results
    }

    /// Remove all leaves but keep the subdivision
    pub fn clear_leaves(&mut self) {
        self.root.clear_leaves();
    }

    /// Drop empty branches, returning how many nodes were freed
    pub fn prune(&mut self) -> usize {
        let before = self.root.count_nodes();
        self.root.prune();
        before - self.root.count_nodes()
    }

    /// Get total leaf count
    pub fn leaf_count(&self) -> usize {
        self.root.count_leaves()
    }

    /// Get total node count
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }
}
