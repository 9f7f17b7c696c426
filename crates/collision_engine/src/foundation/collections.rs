//! Storage for entities and per-frame scratch records
//!
//! `EntityArena` hands out small integer slots that are recycled after
//! removal, so a stored index can go stale and must be revalidated.
//! `FixedPool` is a capacity-bounded pool that is reset, not freed, between
//! frames.

/// Error returned when a fixed pool has no room left
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pool is full ({capacity} entries)")]
pub struct PoolFull {
    /// Capacity of the exhausted pool
    pub capacity: usize,
}

/// Slot arena with index recycling
#[derive(Debug, Clone)]
pub struct EntityArena<T> {
    slots: Vec<Option<T>>,
    vacant: Vec<usize>,
}

impl<T> EntityArena<T> {
    /// Arena with no slots
    pub fn new() -> Self {
        Self { slots: Vec::new(), vacant: Vec::new() }
    }

    /// Store `item`, reusing the most recently vacated slot first
    pub fn insert(&mut self, item: T) -> usize {
        match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot] = Some(item);
                slot
            }
            None => {
                self.slots.push(Some(item));
                self.slots.len() - 1
            }
        }
    }

    /// Vacate a slot, handing back what it held
    pub fn remove(&mut self, slot: usize) -> Option<T> {
        let item = self.slots.get_mut(slot)?.take()?;
        self.vacant.push(slot);
        Some(item)
    }

    /// Live item in `slot`
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Live item in `slot`, mutably
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Borrow two distinct live slots mutably at once
    pub fn get_pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut T, &mut T)> {
        if a == b || a.max(b) >= self.slots.len() {
            return None;
        }

        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = self.slots.split_at_mut(high);
        let lower = head[low].as_mut()?;
        let upper = tail[0].as_mut()?;

        Some(if a < b { (lower, upper) } else { (upper, lower) })
    }

    /// Whether the slot holds a live item
    pub fn contains(&self, slot: usize) -> bool {
        self.get(slot).is_some()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Whether the arena holds no live items
    pub fn is_empty(&self) -> bool {
        self.vacant.len() == self.slots.len()
    }

    /// Live `(slot, item)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| Some((slot, item.as_ref()?)))
    }

    /// Live `(slot, item)` pairs in slot order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, item)| Some((slot, item.as_mut()?)))
    }
}

impl<T> Default for EntityArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Capacity-bounded pool, reset wholesale once per frame
#[derive(Debug, Clone)]
pub struct FixedPool<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> FixedPool<T> {
    /// Create a pool that never grows beyond `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take the next free entry, or report exhaustion
    pub fn push(&mut self, item: T) -> Result<usize, PoolFull> {
        if self.items.len() >= self.capacity {
            return Err(PoolFull { capacity: self.capacity });
        }

        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// Release every entry, keeping the allocation
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Entry by index
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Number of entries in use
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no entries are in use
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in use, in allocation order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_recycles_indices() {
        let mut arena = EntityArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.remove(a), Some("a"));
        assert!(!arena.contains(a));

        // the freed slot is handed out again
        let c = arena.insert("c");
        assert_eq!(c, a);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_arena_pair_mut_order() {
        let mut arena = EntityArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);

        let (x, y) = arena.get_pair_mut(b, a).unwrap();
        assert_eq!((*x, *y), (2, 1));
        *x += 10;
        assert_eq!(arena.get(b), Some(&12));

        assert!(arena.get_pair_mut(a, a).is_none());
        arena.remove(b);
        assert!(arena.get_pair_mut(a, b).is_none());
    }

    #[test]
    fn test_fixed_pool_exhaustion() {
        let mut pool = FixedPool::with_capacity(2);
        assert_eq!(pool.push(1), Ok(0));
        assert_eq!(pool.push(2), Ok(1));
        assert_eq!(pool.push(3), Err(PoolFull { capacity: 2 }));

        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.push(4), Ok(0));
    }
}
