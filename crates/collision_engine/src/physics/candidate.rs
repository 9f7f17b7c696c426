//! Collision candidates produced by the broad phase
//!
//! A candidate names two endpoints, the time window `[tmin, tmax]` inside
//! the frame during which their swept volumes overlap, and optionally the
//! overlap volume itself. Endpoints are plain handles and may be stale by
//! the time the candidate is processed.

use std::cmp::Ordering;
use std::fmt;

use crate::geometry::OctBB;
use crate::world::{CharacterRef, ParticleRef};

/// One side of a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionEndpoint {
    /// A character
    Character(CharacterRef),
    /// A particle
    Particle(ParticleRef),
    /// A terrain tile
    Tile(u32),
}

impl CollisionEndpoint {
    /// Raw index used for hashing
    pub fn raw_index(&self) -> u32 {
        match self {
            CollisionEndpoint::Character(chr) => chr.0 as u32,
            CollisionEndpoint::Particle(prt) => prt.0 as u32,
            CollisionEndpoint::Tile(tile) => *tile,
        }
    }

    /// Character handle, if this endpoint is a character
    pub fn character(&self) -> Option<CharacterRef> {
        match self {
            CollisionEndpoint::Character(chr) => Some(*chr),
            _ => None,
        }
    }

    /// Particle handle, if this endpoint is a particle
    pub fn particle(&self) -> Option<ParticleRef> {
        match self {
            CollisionEndpoint::Particle(prt) => Some(*prt),
            _ => None,
        }
    }

    /// Tile index, if this endpoint is a tile
    pub fn tile(&self) -> Option<u32> {
        match self {
            CollisionEndpoint::Tile(tile) => Some(*tile),
            _ => None,
        }
    }
}

impl fmt::Display for CollisionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionEndpoint::Character(chr) => write!(f, "{chr}"),
            CollisionEndpoint::Particle(prt) => write!(f, "{prt}"),
            CollisionEndpoint::Tile(tile) => write!(f, "tile#{tile}"),
        }
    }
}

/// 8-bit bucket hash of an endpoint pair
///
/// The two halves are summed, so the hash does not depend on which endpoint
/// is the source.
pub fn pair_hash(a: u32, b: u32) -> u8 {
    let mix = |v: u32| v.wrapping_mul(0x0111).wrapping_add(0x006E);
    (mix(a).wrapping_add(mix(b)) & 0xFF) as u8
}

/// A possible collision between two endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionCandidate {
    /// Endpoint whose query found the pair
    pub source: CollisionEndpoint,
    /// Endpoint that was found
    pub destination: CollisionEndpoint,
    /// Start of the overlap window, in frames
    pub tmin: f32,
    /// End of the overlap window, in frames
    pub tmax: f32,
    /// Overlap volume, empty if it was not computed
    pub cv: OctBB,
}

impl CollisionCandidate {
    /// Candidate between two characters, lower index first
    pub fn character_pair(a: CharacterRef, b: CharacterRef, tmin: f32, tmax: f32, cv: OctBB) -> Self {
        let (source, destination) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source: CollisionEndpoint::Character(source),
            destination: CollisionEndpoint::Character(destination),
            tmin,
            tmax,
            cv,
        }
    }

    /// Candidate between a character and a particle
    pub fn character_particle(chr: CharacterRef, prt: ParticleRef, tmin: f32, tmax: f32, cv: OctBB) -> Self {
        Self {
            source: CollisionEndpoint::Character(chr),
            destination: CollisionEndpoint::Particle(prt),
            tmin,
            tmax,
            cv,
        }
    }

    /// Bucket of this candidate's endpoint pair
    pub fn hash(&self) -> u8 {
        pair_hash(self.source.raw_index(), self.destination.raw_index())
    }

    /// Whether two candidates join the same two endpoints, in either order
    pub fn same_pair(&self, other: &CollisionCandidate) -> bool {
        (self.source == other.source && self.destination == other.destination)
            || (self.source == other.destination && self.destination == other.source)
    }

    /// Both endpoints as characters
    pub fn characters(&self) -> Option<(CharacterRef, CharacterRef)> {
        Some((self.source.character()?, self.destination.character()?))
    }

    /// Character source and particle destination
    pub fn character_and_particle(&self) -> Option<(CharacterRef, ParticleRef)> {
        Some((self.source.character()?, self.destination.particle()?))
    }

    // absent endpoints sort after present ones
    fn endpoint_keys(&self) -> [usize; 5] {
        let chr = |e: &CollisionEndpoint| e.character().map_or(usize::MAX, |c| c.0);
        let prt = |e: &CollisionEndpoint| e.particle().map_or(usize::MAX, |p| p.0);
        let tile = self.destination.tile().map_or(usize::MAX, |t| t as usize);

        [
            chr(&self.source),
            prt(&self.source),
            prt(&self.destination),
            chr(&self.destination),
            tile,
        ]
    }

    /// Processing order: earliest contact first, then by endpoints
    pub fn priority_cmp(&self, other: &CollisionCandidate) -> Ordering {
        self.tmin
            .total_cmp(&other.tmin)
            .then_with(|| self.tmax.total_cmp(&other.tmax))
            .then_with(|| self.endpoint_keys().cmp(&other.endpoint_keys()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_hash_is_symmetric() {
        for (a, b) in [(0, 1), (3, 250), (1000, 7), (u32::MAX, 2)] {
            assert_eq!(pair_hash(a, b), pair_hash(b, a));
        }
        // 0x6E + 0x6E
        assert_eq!(pair_hash(0, 0), 0xDC);
    }

    #[test]
    fn test_character_pair_is_canonical() {
        let forward = CollisionCandidate::character_pair(CharacterRef(4), CharacterRef(2), 0.0, 1.0, OctBB::EMPTY);
        let backward = CollisionCandidate::character_pair(CharacterRef(2), CharacterRef(4), 0.0, 1.0, OctBB::EMPTY);

        assert_eq!(forward.source, CollisionEndpoint::Character(CharacterRef(2)));
        assert_eq!(forward, backward);
        assert!(forward.same_pair(&backward));
    }

    #[test]
    fn test_priority_order() {
        let early = CollisionCandidate::character_pair(CharacterRef(5), CharacterRef(6), -0.5, 1.0, OctBB::EMPTY);
        let late = CollisionCandidate::character_pair(CharacterRef(0), CharacterRef(1), 0.25, 1.0, OctBB::EMPTY);
        let late_short = CollisionCandidate::character_pair(CharacterRef(0), CharacterRef(1), 0.25, 0.5, OctBB::EMPTY);
        let late_prt =
            CollisionCandidate::character_particle(CharacterRef(0), ParticleRef(9), 0.25, 1.0, OctBB::EMPTY);

        assert_eq!(early.priority_cmp(&late), Ordering::Less);
        assert_eq!(late_short.priority_cmp(&late), Ordering::Less);
        // a particle destination sorts before a character destination
        assert_eq!(late_prt.priority_cmp(&late), Ordering::Less);
        assert_eq!(late.priority_cmp(&late), Ordering::Equal);
    }
}
