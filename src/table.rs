//! Unique table for hash consing.
//!
//! The table maps `(index, high, low)` triplets to the vertex that carries
//! them, so structurally equal nodes are shared and handle equality
//! coincides with family equality.

use std::collections::HashMap;

use crate::reference::VertexId;

/// Key of the unique table: literal index plus the two child handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub index: i32,
    pub high: VertexId,
    pub low: VertexId,
}

/// Table of unique set nodes, keyed by `(index, high, low)`.
///
/// The table stores handles only; vertex lifetime is owned by the engine's
/// store and the whole table is dropped with it at phase boundaries.
#[derive(Debug, Default)]
pub struct UniqueTable {
    map: HashMap<UniqueKey, VertexId>,
}

impl UniqueTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Looks up the vertex with the given triplet.
    pub fn get(&self, index: i32, high: VertexId, low: VertexId) -> Option<VertexId> {
        self.map.get(&UniqueKey { index, high, low }).copied()
    }

    /// Registers a freshly created vertex under its triplet.
    ///
    /// # Panics
    ///
    /// Debug-panics if the triplet is already taken (hash-consing breach).
    pub fn insert(&mut self, index: i32, high: VertexId, low: VertexId, vertex: VertexId) {
        let previous = self.map.insert(UniqueKey { index, high, low }, vertex);
        debug_assert!(previous.is_none(), "duplicate unique-table entry for ({}, {}, {})", index, high, low);
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut table = UniqueTable::new();
        let vertex = VertexId::new(2);

        assert!(table.get(1, VertexId::BASE, VertexId::EMPTY).is_none());

        table.insert(1, VertexId::BASE, VertexId::EMPTY, vertex);
        assert_eq!(table.get(1, VertexId::BASE, VertexId::EMPTY), Some(vertex));

        // A complement literal is a distinct key.
        assert!(table.get(-1, VertexId::BASE, VertexId::EMPTY).is_none());
    }

    #[test]
    fn test_clear() {
        let mut table = UniqueTable::new();
        table.insert(1, VertexId::BASE, VertexId::EMPTY, VertexId::new(2));
        assert_eq!(table.len(), 1);
        table.clear();
        assert!(table.is_empty());
    }
}
