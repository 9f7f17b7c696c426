//! Spatial partitioning data structures
//!
//! Broad-phase index rebuilt every frame from the swept bounds of
//! characters and particles.

mod octree;
mod spatial_query;

pub use octree::{LeafKind, Octree, OctreeConfig, OctreeNode, SpatialLeaf};
pub use spatial_query::SpatialQuery;
