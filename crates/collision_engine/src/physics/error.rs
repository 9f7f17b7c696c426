//! Errors raised inside the collision pass
//!
//! None of these abort a frame. Pool exhaustion drops a candidate, and a
//! stale reference skips it.

use thiserror::Error;

use super::candidate::CollisionEndpoint;

/// Failure while building or processing collision candidates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    /// A fixed pool ran out of entries
    #[error("{pool} pool exhausted ({capacity} entries)")]
    PoolExhausted {
        /// Which pool
        pool: &'static str,
        /// Its capacity
        capacity: usize,
    },

    /// A candidate names an object that is no longer live
    #[error("stale collision endpoint {0}")]
    StaleReference(CollisionEndpoint),

    /// A collision volume was empty where a valid one was required
    #[error("invalid collision volume")]
    InvalidGeometry,

    /// A candidate was handed to a responder for a different pair kind
    #[error("candidate {first} -> {second} is the wrong kind for this responder")]
    WrongCandidateKind {
        /// Source endpoint
        first: CollisionEndpoint,
        /// Destination endpoint
        second: CollisionEndpoint,
    },
}

/// Result type for collision operations
pub type CollisionResult<T> = Result<T, CollisionError>;
