//! Compute tables for set operations.
//!
//! Results of Apply and Subsume are memoised here. Entries are keyed by
//! vertex handles (and the order budget for Apply), so the tables must be
//! flushed whenever the engine moves to a new phase; see
//! [`Zbdd::clear_tables`](crate::zbdd::Zbdd::clear_tables).

use std::collections::HashMap;

use crate::reference::VertexId;

/// Boolean operation over set families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    And,
    Or,
}

/// Cache key for Apply: operand handles and the order budget.
///
/// Apply is commutative, so keys are normalized to `{min_id, max_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub one: VertexId,
    pub two: VertexId,
    pub limit_order: i32,
}

impl CacheKey {
    /// Creates a key with the operands in canonical order.
    pub fn commutative(one: VertexId, two: VertexId, limit_order: i32) -> Self {
        let (one, two) = if one.raw() <= two.raw() { (one, two) } else { (two, one) };
        Self { one, two, limit_order }
    }
}

/// Memoisation table for one Apply operator.
#[derive(Debug, Default)]
pub struct ComputeCache {
    map: HashMap<CacheKey, VertexId>,
    hits: usize,
    misses: usize,
}

impl ComputeCache {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a memoised result.
    pub fn get(&mut self, key: &CacheKey) -> Option<VertexId> {
        match self.map.get(key) {
            Some(&result) => {
                self.hits += 1;
                Some(result)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Records a computed result.
    pub fn insert(&mut self, key: CacheKey, result: VertexId) {
        self.map.insert(key, result);
    }

    /// Drops all entries; the hit/miss counters survive.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of lookups that found an entry.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of lookups that missed.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Memoisation table for Subsume, keyed by `(high, low)`.
///
/// Subsume is not commutative; the key keeps the argument order.
#[derive(Debug, Default)]
pub struct PairCache {
    map: HashMap<(VertexId, VertexId), VertexId>,
}

impl PairCache {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a memoised result.
    pub fn get(&self, high: VertexId, low: VertexId) -> Option<VertexId> {
        self.map.get(&(high, low)).copied()
    }

    /// Records a computed result.
    pub fn insert(&mut self, high: VertexId, low: VertexId, result: VertexId) {
        self.map.insert((high, low), result);
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}
