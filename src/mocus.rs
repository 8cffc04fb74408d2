//! Cut sets produced by a MOCUS-style expansion, and their conversion into
//! a minimized ZBDD.
//!
//! A MOCUS driver hands over one [`CutSetContainer`] per module, in
//! topological order, with the root module identified by its index. Every
//! cut set lists module indices first and then basic-event literals; the
//! variable order in this world is `index + 1`.

use std::time::Instant;

use log::debug;

use crate::reference::VertexId;
use crate::settings::Settings;
use crate::zbdd::Zbdd;

/// A single cut set from MOCUS: module indices and basic-event literals.
#[derive(Debug, Clone, Default)]
pub struct CutSet {
    modules: Vec<i32>,
    literals: Vec<i32>,
}

impl CutSet {
    /// Creates an empty cut set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module index.
    pub fn add_module(&mut self, index: i32) {
        assert!(index > 0, "module index must be positive");
        self.modules.push(index);
    }

    /// Adds a basic-event literal.
    pub fn add_literal(&mut self, index: i32) {
        assert_ne!(index, 0, "literal index must be non-zero");
        self.literals.push(index);
    }

    /// The cardinality of the cut set.
    pub fn order(&self) -> usize {
        self.modules.len() + self.literals.len()
    }

    pub fn modules(&self) -> &[i32] {
        &self.modules
    }

    pub fn literals(&self) -> &[i32] {
        &self.literals
    }
}

/// A bag of cut sets belonging to one module.
#[derive(Debug, Clone, Default)]
pub struct CutSetContainer {
    cut_sets: Vec<CutSet>,
}

impl CutSetContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cut set.
    pub fn push(&mut self, cut_set: CutSet) {
        self.cut_sets.push(cut_set);
    }

    /// Iterates over the stored cut sets.
    pub fn iter(&self) -> impl Iterator<Item = &CutSet> {
        self.cut_sets.iter()
    }

    /// The number of stored cut sets.
    pub fn len(&self) -> usize {
        self.cut_sets.len()
    }

    /// Returns true if the container holds no cut sets.
    pub fn is_empty(&self) -> bool {
        self.cut_sets.is_empty()
    }
}

impl Zbdd {
    /// Converts MOCUS-generated cut sets into a minimized ZBDD.
    ///
    /// The containers must arrive in topological order so every module is
    /// registered before a cut set mentions it; `root_index` identifies
    /// the root module. Each container must hold a minimal family: the
    /// merge absorbs supersets that share a spine with a smaller set, but
    /// it is not a subsumption pass, and the nodes it builds are flagged
    /// minimal.
    pub fn from_cut_sets(
        root_index: i32,
        cut_sets: &[(i32, CutSetContainer)],
        settings: &Settings,
    ) -> Self {
        let init_time = Instant::now();
        debug!("Creating ZBDD from MOCUS cut sets...");
        let mut zbdd = Zbdd::with_settings(settings);
        for (index, container) in cut_sets {
            let root = zbdd.convert_cut_sets(container);
            if *index == root_index {
                zbdd.root = root;
            } else {
                zbdd.modules.insert(*index, root);
            }
        }
        debug!("The total number of ZBDD vertices generated: {}", zbdd.num_vertices());
        debug!("Created ZBDD from MOCUS cut sets in {:?}", init_time.elapsed());
        zbdd
    }

    /// Merges one module's cut sets into a set graph.
    fn convert_cut_sets(&mut self, container: &CutSetContainer) -> VertexId {
        let mut cut_sets: Vec<&CutSet> = container.iter().collect();
        // Smaller sets first, so later supersets are absorbed on arrival.
        cut_sets.sort_by_key(|cut_set| cut_set.order());

        let mut root = VertexId::EMPTY;
        for cut_set in cut_sets {
            let vertex = self.emplace_spine(cut_set);
            root = self.emplace_cut_set(root, vertex);
        }
        root
    }

    /// Builds the single-path ZBDD of one cut set, bottom-up.
    ///
    /// Negative literals are discarded. A cut set holding a module that
    /// reduced to the Empty family is dropped; a module that reduced to
    /// the Base family is skipped as an always-true factor.
    fn emplace_spine(&mut self, cut_set: &CutSet) -> VertexId {
        let mut entries: Vec<(i32, bool)> = Vec::new();
        for &index in cut_set.modules() {
            let module = *self
                .modules
                .get(&index)
                .unwrap_or_else(|| panic!("module {} is not registered", index));
            if module == VertexId::EMPTY {
                return VertexId::EMPTY;
            }
            if module == VertexId::BASE {
                continue;
            }
            entries.push((index, true));
        }
        for &literal in cut_set.literals() {
            if literal < 0 {
                continue;
            }
            entries.push((literal, false));
        }

        // Deepest literal first; the spine grows upward through high edges.
        entries.sort_by(|lhs, rhs| rhs.0.cmp(&lhs.0));

        let mut result = VertexId::BASE;
        for (index, module) in entries {
            let node = self.fetch(index, result, VertexId::EMPTY, index as u32 + 1, module);
            self.mark_minimal(node);
            result = node;
        }
        result
    }

    /// Adds a single cut set into a cut-set database.
    ///
    /// Descends along the ordering, taking set-union on matching levels
    /// and splicing the deeper spine into the low branch otherwise.
    fn emplace_cut_set(&mut self, root: VertexId, cut_set: VertexId) -> VertexId {
        if cut_set == VertexId::EMPTY {
            return root; // The cut set was dropped.
        }
        if cut_set == VertexId::BASE {
            return VertexId::BASE; // The empty set subsumes everything.
        }
        if root == VertexId::EMPTY {
            return cut_set;
        }
        if root == VertexId::BASE {
            return root;
        }

        let base = self.shape(root);
        let spine = self.shape(cut_set);
        let node = if base.order == spine.order {
            debug_assert_eq!(base.index, spine.index);
            let high = self.emplace_cut_set(base.high, spine.high);
            self.fetch(base.index, high, base.low, base.order, base.module)
        } else if base.order < spine.order {
            let low = self.emplace_cut_set(base.low, cut_set);
            self.fetch(base.index, base.high, low, base.order, base.module)
        } else {
            self.fetch(spine.index, spine.high, root, spine.order, spine.module)
        };
        self.mark_minimal(node);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(zbdd: &Zbdd) -> Vec<Vec<i32>> {
        let mut sets: Vec<Vec<i32>> = zbdd
            .cut_sets()
            .iter()
            .map(|s| {
                let mut s = s.clone();
                s.sort();
                s
            })
            .collect();
        sets.sort();
        sets
    }

    fn literal_set(literals: &[i32]) -> CutSet {
        let mut cut_set = CutSet::new();
        for &literal in literals {
            cut_set.add_literal(literal);
        }
        cut_set
    }

    #[test]
    fn test_single_module() {
        let mut container = CutSetContainer::new();
        container.push(literal_set(&[1]));
        container.push(literal_set(&[2, 3]));

        let mut zbdd =
            Zbdd::from_cut_sets(100, &[(100, container)], &Settings::new().with_limit_order(5));
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1], vec![2, 3]]);
    }

    #[test]
    fn test_supersets_absorbed() {
        let mut container = CutSetContainer::new();
        container.push(literal_set(&[1, 2]));
        container.push(literal_set(&[1]));
        container.push(literal_set(&[2, 3]));

        let mut zbdd =
            Zbdd::from_cut_sets(100, &[(100, container)], &Settings::new().with_limit_order(5));
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1], vec![2, 3]]);
    }

    #[test]
    fn test_negative_literals_discarded() {
        let mut container = CutSetContainer::new();
        let mut cut_set = CutSet::new();
        cut_set.add_literal(1);
        cut_set.add_literal(-2);
        container.push(cut_set);

        let mut zbdd =
            Zbdd::from_cut_sets(100, &[(100, container)], &Settings::new().with_limit_order(5));
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1]]);
    }

    #[test]
    fn test_module_expansion() {
        // Module 10 = {{1}, {2}}; root = {{10, 3}}.
        let mut module = CutSetContainer::new();
        module.push(literal_set(&[1]));
        module.push(literal_set(&[2]));

        let mut root = CutSetContainer::new();
        let mut cut_set = CutSet::new();
        cut_set.add_module(10);
        cut_set.add_literal(3);
        root.push(cut_set);

        let mut zbdd = Zbdd::from_cut_sets(
            100,
            &[(10, module), (100, root)],
            &Settings::new().with_limit_order(5),
        );
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1, 3], vec![2, 3]]);
    }

    #[test]
    fn test_empty_module_drops_cut_set() {
        let empty_module = CutSetContainer::new(); // No cut sets: ∅.

        let mut root = CutSetContainer::new();
        let mut with_module = CutSet::new();
        with_module.add_module(10);
        with_module.add_literal(1);
        root.push(with_module);
        root.push(literal_set(&[2]));

        let mut zbdd = Zbdd::from_cut_sets(
            100,
            &[(10, empty_module), (100, root)],
            &Settings::new().with_limit_order(5),
        );
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![2]]);
    }

    #[test]
    fn test_unity_module_skipped() {
        // A module whose only cut set is empty is an always-true factor.
        let mut unity = CutSetContainer::new();
        unity.push(CutSet::new());

        let mut root = CutSetContainer::new();
        let mut with_module = CutSet::new();
        with_module.add_module(10);
        with_module.add_literal(1);
        root.push(with_module);

        let mut zbdd = Zbdd::from_cut_sets(
            100,
            &[(10, unity), (100, root)],
            &Settings::new().with_limit_order(5),
        );
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1]]);
    }
}
