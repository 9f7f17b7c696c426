//! Collision detection and response for characters and particles
//!
//! Candidates are found with the spatial index and the interval intersector,
//! deduplicated in the candidate table and resolved in earliest-contact order:
//! attachments first, then character and particle responses.

pub mod attachment;
pub mod candidate;
pub mod candidate_table;
pub mod collision_system;
pub mod context;
pub mod error;
pub mod intersect;
pub mod response;

#[cfg(test)]
mod tests;

pub use candidate::{CollisionCandidate, CollisionEndpoint};
pub use candidate_table::{CandidateTable, InsertOutcome, TableStats, BUCKET_COUNT};
pub use collision_system::{CollisionSystem, FrameReport};
pub use context::{FrameContext, FrameStats};
pub use error::{CollisionError, CollisionResult};
pub use intersect::{intersect_oct_bb, CloseTolerance, IntervalHit, SweptVolume};
