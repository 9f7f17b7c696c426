//! Per-frame candidate set
//!
//! 256 buckets keyed by [`pair_hash`](super::candidate::pair_hash), each a
//! singly linked list threaded through a fixed pool of hash nodes. Records
//! come from a second fixed pool. Both pools are reset wholesale at the start
//! of every frame; running out drops the candidate and logs once per pool.

use crate::foundation::collections::FixedPool;

use super::candidate::CollisionCandidate;
use super::error::CollisionError;

/// Number of hash buckets (8-bit hash)
pub const BUCKET_COUNT: usize = 256;

#[derive(Debug, Clone, Copy)]
struct HashNode {
    candidate: usize,
    next: Option<usize>,
}

/// Result of a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was stored
    Inserted,
    /// The pair was already present; nothing changed
    Duplicate,
}

/// Counters for the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Records stored
    pub inserted: usize,
    /// Inserts rejected as duplicates
    pub duplicates: usize,
    /// Inserts dropped for lack of pool space
    pub dropped: usize,
}

/// Deduplicating candidate hash table
#[derive(Debug)]
pub struct CandidateTable {
    heads: [Option<usize>; BUCKET_COUNT],
    counts: [usize; BUCKET_COUNT],
    candidates: FixedPool<CollisionCandidate>,
    nodes: FixedPool<HashNode>,
    stats: TableStats,
    warned_candidates: bool,
    warned_nodes: bool,
}

impl CandidateTable {
    /// Create a table with fixed pool capacities
    pub fn new(candidate_capacity: usize, node_capacity: usize) -> Self {
        Self {
            heads: [None; BUCKET_COUNT],
            counts: [0; BUCKET_COUNT],
            candidates: FixedPool::with_capacity(candidate_capacity),
            nodes: FixedPool::with_capacity(node_capacity),
            stats: TableStats::default(),
            warned_candidates: false,
            warned_nodes: false,
        }
    }

    /// Empty the table and both pools
    pub fn reset(&mut self) {
        self.heads = [None; BUCKET_COUNT];
        self.counts = [0; BUCKET_COUNT];
        self.candidates.reset();
        self.nodes.reset();
        self.stats = TableStats::default();
        self.warned_candidates = false;
        self.warned_nodes = false;
    }

    /// Store a candidate unless its endpoint pair is already present
    ///
    /// The whole bucket is scanned, so the first discovery of a pair wins
    /// regardless of which endpoint found it.
    pub fn insert_unique(&mut self, candidate: CollisionCandidate) -> Result<InsertOutcome, CollisionError> {
        let bucket = usize::from(candidate.hash());

        if self.bucket(bucket).any(|stored| stored.same_pair(&candidate)) {
            self.stats.duplicates += 1;
            return Ok(InsertOutcome::Duplicate);
        }

        if self.nodes.len() >= self.nodes.capacity() {
            return Err(self.exhausted("hash node", self.nodes.capacity()));
        }

        let index = match self.candidates.push(candidate) {
            Ok(index) => index,
            Err(full) => return Err(self.exhausted("candidate", full.capacity)),
        };

        let node = HashNode {
            candidate: index,
            next: self.heads[bucket],
        };
        let node_index = self
            .nodes
            .push(node)
            .map_err(|full| CollisionError::PoolExhausted { pool: "hash node", capacity: full.capacity })?;

        self.heads[bucket] = Some(node_index);
        self.counts[bucket] += 1;
        self.stats.inserted += 1;

        Ok(InsertOutcome::Inserted)
    }

    fn exhausted(&mut self, pool: &'static str, capacity: usize) -> CollisionError {
        let warned = match pool {
            "candidate" => &mut self.warned_candidates,
            _ => &mut self.warned_nodes,
        };

        if !*warned {
            log::warn!("{pool} pool exhausted ({capacity} entries), dropping collisions this frame");
            *warned = true;
        }

        self.stats.dropped += 1;
        CollisionError::PoolExhausted { pool, capacity }
    }

    /// Records in one bucket, most recent first
    fn bucket(&self, bucket: usize) -> impl Iterator<Item = &CollisionCandidate> + '_ {
        let mut cursor = self.heads[bucket];
        std::iter::from_fn(move || {
            let node = self.nodes.get(cursor?)?;
            cursor = node.next;
            self.candidates.get(node.candidate)
        })
    }

    /// Number of records in a bucket
    pub fn bucket_len(&self, bucket: u8) -> usize {
        self.counts[usize::from(bucket)]
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Counters for the current frame
    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Copy every record into `out`, sorted by processing priority
    pub fn flatten_sorted(&self, out: &mut Vec<CollisionCandidate>) {
        out.clear();
        out.extend_from_slice(self.candidates.as_slice());
        out.sort_by(CollisionCandidate::priority_cmp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::OctBB;
    use crate::world::{CharacterRef, ParticleRef};

    fn chr_pair(a: usize, b: usize, tmin: f32) -> CollisionCandidate {
        CollisionCandidate::character_pair(CharacterRef(a), CharacterRef(b), tmin, 1.0, OctBB::EMPTY)
    }

    #[test]
    fn test_pair_found_from_both_sides_is_stored_once() {
        let mut table = CandidateTable::new(16, 32);

        assert_eq!(table.insert_unique(chr_pair(3, 8, 0.0)), Ok(InsertOutcome::Inserted));
        assert_eq!(table.insert_unique(chr_pair(8, 3, 0.5)), Ok(InsertOutcome::Duplicate));
        assert_eq!(table.len(), 1);
        assert_eq!(table.stats().duplicates, 1);

        // first discovery wins
        let mut sorted = Vec::new();
        table.flatten_sorted(&mut sorted);
        assert_eq!(sorted[0].tmin, 0.0);
    }

    #[test]
    fn test_duplicate_deep_in_bucket_is_found() {
        let mut table = CandidateTable::new(64, 128);

        // every pair (k, 255 - k) hashes to the same bucket
        let target = chr_pair(0, 255, 0.0).hash();
        for k in 0..10 {
            let c = chr_pair(k, 255 - k, 0.0);
            assert_eq!(c.hash(), target);
            assert_eq!(table.insert_unique(c), Ok(InsertOutcome::Inserted));
        }
        assert_eq!(table.bucket_len(target), 10);

        // the oldest record sits at the tail of the list
        assert_eq!(table.insert_unique(chr_pair(255, 0, 0.3)), Ok(InsertOutcome::Duplicate));
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn test_exhaustion_drops_without_corrupting() {
        let mut table = CandidateTable::new(2, 4);

        assert!(table.insert_unique(chr_pair(0, 1, 0.0)).is_ok());
        assert!(table.insert_unique(chr_pair(0, 2, 0.0)).is_ok());
        assert_eq!(
            table.insert_unique(chr_pair(0, 3, 0.0)),
            Err(CollisionError::PoolExhausted { pool: "candidate", capacity: 2 })
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.stats().dropped, 1);

        table.reset();
        assert!(table.is_empty());
        assert!(table.insert_unique(chr_pair(0, 3, 0.0)).is_ok());
    }

    #[test]
    fn test_flatten_sorts_by_time_then_endpoints() {
        let mut table = CandidateTable::new(16, 32);
        table.insert_unique(chr_pair(4, 5, 0.5)).unwrap();
        table.insert_unique(chr_pair(1, 2, -0.25)).unwrap();
        table
            .insert_unique(CollisionCandidate::character_particle(CharacterRef(0), ParticleRef(1), 0.5, 1.0, OctBB::EMPTY))
            .unwrap();

        let mut sorted = Vec::new();
        table.flatten_sorted(&mut sorted);

        assert_eq!(sorted[0].tmin, -0.25);
        assert_eq!(sorted[1].source.character(), Some(CharacterRef(0)));
        assert_eq!(sorted[2].source.character(), Some(CharacterRef(4)));
    }
}
