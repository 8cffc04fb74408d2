//! Intermediate cut-set storage for a MOCUS-style top-down expansion.
//!
//! The [`CutSetContainer`] keeps the cut sets of one module as a ZBDD
//! while the driver repeatedly finds an unexpanded gate, pulls out the
//! cut sets mentioning it, substitutes the gate's own cut sets and merges
//! the product back. Literal indices above `gate_index_bound` are gates;
//! indices at or below it are basic events. The variable order in this
//! world is `index + 1`.

use std::collections::HashMap;

use log::debug;

use crate::cache::OpType;
use crate::graph::{BooleanGraph, Gate, GateType};
use crate::mocus;
use crate::reference::VertexId;
use crate::settings::Settings;
use crate::zbdd::Zbdd;

/// Storage for generated cut sets in MOCUS; semantically a set of cut sets.
pub struct CutSetContainer {
    zbdd: Zbdd,
    /// Exclusive lower bound for gate indices.
    gate_index_bound: i32,
}

impl CutSetContainer {
    /// Creates an empty container.
    ///
    /// Gates must be indexed above `gate_index_bound`, basic events at or
    /// below it, and no gate may appear complemented.
    pub fn new(settings: &Settings, gate_index_bound: i32) -> Self {
        Self { zbdd: Zbdd::with_settings(settings), gate_index_bound }
    }

    /// The root vertex of the stored cut sets.
    pub fn root(&self) -> VertexId {
        self.zbdd.root()
    }

    /// Checks if a literal index belongs to a gate.
    fn is_gate(&self, index: i32) -> bool {
        index > self.gate_index_bound
    }

    /// Converts one Boolean-graph gate into intermediate cut sets.
    ///
    /// Child gates stay unexpanded: they enter the sets as proxy literals,
    /// module gates with the module flag raised.
    pub fn convert_gate(&mut self, graph: &BooleanGraph, index: i32) -> VertexId {
        let gate = graph.gate(index);
        if let Some(value) = gate.constant_value() {
            return if value { VertexId::BASE } else { VertexId::EMPTY };
        }

        let mut arguments: Vec<(u32, VertexId)> = Vec::new();
        for &literal in gate.variables() {
            let order = literal.index.unsigned_abs() + 1;
            let vertex =
                self.zbdd.fetch(literal.index, VertexId::BASE, VertexId::EMPTY, order, false);
            arguments.push((order, vertex));
        }
        for &sub_index in gate.gates() {
            assert!(self.is_gate(sub_index), "gate {} is indexed below the bound", sub_index);
            let sub: &Gate = graph.gate(sub_index);
            let order = sub_index as u32 + 1;
            let proxy =
                self.zbdd.fetch(sub_index, VertexId::BASE, VertexId::EMPTY, order, sub.module());
            arguments.push((order, proxy));
        }

        arguments.sort_by(|lhs, rhs| rhs.0.cmp(&lhs.0));

        match gate.gate_type() {
            GateType::Null => {
                assert_eq!(arguments.len(), 1, "NULL gate must have exactly one argument");
                arguments[0].1
            }
            GateType::And | GateType::Or => {
                let op = if gate.gate_type() == GateType::And { OpType::And } else { OpType::Or };
                assert!(!arguments.is_empty(), "gate {} has no arguments", index);
                let limit_order = self.zbdd.settings().limit_order();
                let mut result = arguments[0].1;
                for &(_, argument) in &arguments[1..] {
                    result = self.zbdd.apply(op, result, argument, limit_order);
                    self.zbdd.clear_tables();
                }
                result
            }
        }
    }

    /// Finds any unexpanded (non-module) gate in the stored cut sets.
    ///
    /// Returns 0 if none is left. The search leaves traversal marks; the
    /// following extraction clears them.
    pub fn get_next_gate(&mut self) -> i32 {
        let root = self.zbdd.root();
        self.next_gate(root)
    }

    fn next_gate(&mut self, vertex: VertexId) -> i32 {
        if vertex.is_terminal() {
            return 0;
        }
        if self.zbdd.vertex(vertex).as_set().mark {
            return 0;
        }
        self.zbdd.vertex_mut(vertex).as_set_mut().mark = true;
        let node = self.zbdd.shape(vertex);
        if self.is_gate(node.index) && !node.module {
            return node.index;
        }
        let found = self.next_gate(node.high);
        if found != 0 {
            return found;
        }
        self.next_gate(node.low)
    }

    /// Extracts (removes) the intermediate cut sets containing a gate.
    ///
    /// The returned half has the gate literal stripped; the remainder
    /// stays as the container's root. Traversal marks are cleared.
    pub fn extract_intermediate_cut_sets(&mut self, index: i32) -> VertexId {
        assert!(self.is_gate(index), "{} is not a gate index", index);
        debug!("Extracting cut sets for gate {}", index);
        let root = self.zbdd.root();
        self.zbdd.clear_marks(root);
        let mut splits = HashMap::new();
        let (with_gate, without) = self.split(root, index, index as u32 + 1, &mut splits);
        self.zbdd.root = without;
        with_gate
    }

    /// Splits a graph into the sets containing `index` (stripped of it)
    /// and the sets free of it.
    fn split(
        &mut self,
        vertex: VertexId,
        index: i32,
        gate_order: u32,
        splits: &mut HashMap<u32, (VertexId, VertexId)>,
    ) -> (VertexId, VertexId) {
        if vertex.is_terminal() {
            return (VertexId::EMPTY, vertex);
        }
        if let Some(&pair) = splits.get(&vertex.raw()) {
            return pair;
        }
        let node = self.zbdd.shape(vertex);
        let pair = if node.index == index {
            (node.high, node.low)
        } else if node.order > gate_order {
            // The gate literal cannot occur below its own level.
            (VertexId::EMPTY, vertex)
        } else {
            let (high_with, high_without) = self.split(node.high, index, gate_order, splits);
            let (low_with, low_without) = self.split(node.low, index, gate_order, splits);
            (
                self.zbdd.fetch(node.index, high_with, low_with, node.order, node.module),
                self.zbdd.fetch(node.index, high_without, low_without, node.order, node.module),
            )
        };
        splits.insert(vertex.raw(), pair);
        pair
    }

    /// Expands a gate's own cut sets into the sets that mentioned it.
    pub fn expand_gate(&mut self, gate_zbdd: VertexId, cut_sets: VertexId) -> VertexId {
        let limit_order = self.zbdd.settings().limit_order();
        self.zbdd.apply(OpType::And, gate_zbdd, cut_sets, limit_order)
    }

    /// Merges a set of cut sets into the container and flushes the
    /// compute tables.
    pub fn merge(&mut self, vertex: VertexId) {
        let limit_order = self.zbdd.settings().limit_order();
        let root = self.zbdd.root();
        self.zbdd.root = self.zbdd.apply(OpType::Or, root, vertex, limit_order);
        self.zbdd.clear_tables();
    }

    /// Eliminates all complements from the stored cut sets.
    pub fn eliminate_complements(&mut self) {
        let mut results = HashMap::new();
        let root = self.zbdd.root();
        self.zbdd.root = self.zbdd.eliminate_complements(root, &mut results);
    }

    /// Joins a finished module container under its gate index.
    ///
    /// Vertices live in per-engine stores, so the module's graph is copied
    /// structurally into this container, flags preserved.
    pub fn join_module(&mut self, index: i32, container: &CutSetContainer) {
        assert!(self.is_gate(index), "{} is not a gate index", index);
        assert!(!self.zbdd.modules.contains_key(&index), "module {} is already joined", index);
        debug!("Joining module container for gate {}", index);
        let mut imported = HashMap::new();
        let sub_modules: Vec<(i32, VertexId)> =
            container.zbdd.modules.iter().map(|(&i, &v)| (i, v)).collect();
        for (sub_index, sub_root) in sub_modules {
            let root = self.import(&container.zbdd, sub_root, &mut imported);
            self.zbdd.modules.insert(sub_index, root);
        }
        let root = self.import(&container.zbdd, container.zbdd.root(), &mut imported);
        self.zbdd.modules.insert(index, root);
    }

    fn import(
        &mut self,
        other: &Zbdd,
        vertex: VertexId,
        imported: &mut HashMap<u32, VertexId>,
    ) -> VertexId {
        if vertex.is_terminal() {
            return vertex;
        }
        if let Some(&copy) = imported.get(&vertex.raw()) {
            return copy;
        }
        let node = other.shape(vertex);
        let high = self.import(other, node.high, imported);
        let low = self.import(other, node.low, imported);
        let copy = self.zbdd.fetch(node.index, high, low, node.order, node.module);
        if node.minimal {
            self.zbdd.mark_minimal(copy);
        }
        imported.insert(vertex.raw(), copy);
        copy
    }

    /// Sanitizes the container after all generation operations: proxies of
    /// constant modules are folded away.
    pub fn sanitize(&mut self) {
        let mut results = HashMap::new();
        let root = self.zbdd.root();
        self.zbdd.root = self.sanitize_vertex(root, &mut results);
        self.zbdd.modules.retain(|_, module| !module.is_terminal());
    }

    fn sanitize_vertex(
        &mut self,
        vertex: VertexId,
        results: &mut HashMap<u32, VertexId>,
    ) -> VertexId {
        if vertex.is_terminal() {
            return vertex;
        }
        if let Some(&result) = results.get(&vertex.raw()) {
            return result;
        }
        let node = self.zbdd.shape(vertex);
        let high = self.sanitize_vertex(node.high, results);
        let low = self.sanitize_vertex(node.low, results);
        let result = if node.module {
            match self.zbdd.modules[&node.index] {
                VertexId::EMPTY => low,
                VertexId::BASE => {
                    let limit_order = self.zbdd.settings().limit_order();
                    self.zbdd.apply(OpType::Or, high, low, limit_order)
                }
                _ => self.zbdd.fetch(node.index, high, low, node.order, true),
            }
        } else {
            self.zbdd.fetch(node.index, high, low, node.order, false)
        };
        results.insert(vertex.raw(), result);
        result
    }

    /// Harvests the finished container into per-module MOCUS cut sets.
    ///
    /// Module proxies are kept as module entries and split from basic
    /// events by the gate index bound.
    pub fn into_cut_sets(mut self) -> mocus::CutSetContainer {
        let root = self.zbdd.root();
        let root = self.zbdd.minimize(root);
        self.zbdd.root = root;
        let mut memo = HashMap::new();
        let sets = self.harvest(root, &mut memo);

        let mut container = mocus::CutSetContainer::new();
        for set in sets {
            let mut cut_set = mocus::CutSet::new();
            for index in set {
                if self.is_gate(index) {
                    cut_set.add_module(index);
                } else {
                    cut_set.add_literal(index);
                }
            }
            container.push(cut_set);
        }
        container
    }

    /// Collects cut sets without expanding module proxies.
    fn harvest(&mut self, vertex: VertexId, memo: &mut HashMap<u32, Vec<Vec<i32>>>) -> Vec<Vec<i32>> {
        if vertex == VertexId::EMPTY {
            return Vec::new();
        }
        if vertex == VertexId::BASE {
            return vec![Vec::new()];
        }
        if let Some(sets) = memo.get(&vertex.raw()) {
            return sets.clone();
        }
        let node = self.zbdd.shape(vertex);
        let limit_order = self.zbdd.settings().limit_order();
        let mut result = self.harvest(node.low, memo);
        for mut set in self.harvest(node.high, memo) {
            // Module proxies are budget-free until their expansion.
            if node.module || (set.len() as i32) < limit_order {
                set.push(node.index);
                result.push(set);
            }
        }
        memo.insert(vertex.raw(), result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Literal;

    const BOUND: i32 = 50;

    fn settings() -> Settings {
        Settings::new().with_limit_order(5)
    }

    /// root(100) = OR(g101, x3); g101 = AND(x1, x2).
    fn two_level_graph() -> BooleanGraph {
        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::Or, 1);
        root.add_gate(101);
        root.add_variable(Literal::new(3, 4));
        graph.add_gate(root);

        let mut and = Gate::new(101, GateType::And, 1);
        and.add_variable(Literal::new(1, 2));
        and.add_variable(Literal::new(2, 3));
        graph.add_gate(and);
        graph
    }

    #[test]
    fn test_mocus_expansion_loop() {
        let graph = two_level_graph();
        let mut container = CutSetContainer::new(&settings(), BOUND);

        let root = container.convert_gate(&graph, 100);
        container.merge(root);

        // Drive the expansion until no gate literal is left.
        loop {
            let gate = container.get_next_gate();
            if gate == 0 {
                break;
            }
            let cut_sets = container.extract_intermediate_cut_sets(gate);
            let gate_zbdd = container.convert_gate(&graph, gate);
            let product = container.expand_gate(gate_zbdd, cut_sets);
            container.merge(product);
        }

        let bag = container.into_cut_sets();
        let mut sets: Vec<Vec<i32>> = bag
            .iter()
            .map(|cut_set| {
                assert!(cut_set.modules().is_empty());
                let mut literals = cut_set.literals().to_vec();
                literals.sort();
                literals
            })
            .collect();
        sets.sort();
        assert_eq!(sets, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_get_next_gate_finds_nothing_in_events() {
        let mut container = CutSetContainer::new(&settings(), BOUND);
        let mut event_gate = Gate::new(102, GateType::Or, 1);
        event_gate.add_variable(Literal::new(1, 2));
        let mut graph = BooleanGraph::new(102);
        graph.add_gate(event_gate);
        let root = container.convert_gate(&graph, 102);
        container.merge(root);
        assert_eq!(container.get_next_gate(), 0);
    }

    #[test]
    fn test_extract_splits_and_strips() {
        let graph = two_level_graph();
        let mut container = CutSetContainer::new(&settings(), BOUND);
        let root = container.convert_gate(&graph, 100);
        container.merge(root);

        let gate = container.get_next_gate();
        assert_eq!(gate, 101);
        let extracted = container.extract_intermediate_cut_sets(101);

        // The extracted half is the bare {∅} left after stripping the gate;
        // the remainder holds {{3}}.
        assert_eq!(extracted, VertexId::BASE);
        let remainder = container.root();
        let node = container.zbdd.shape(remainder);
        assert_eq!(node.index, 3);
    }

    #[test]
    fn test_join_module_imports_graph() {
        let mut module = CutSetContainer::new(&settings(), BOUND);
        let mut graph = BooleanGraph::new(60);
        let mut gate = Gate::new(60, GateType::And, 1);
        gate.add_variable(Literal::new(1, 2));
        gate.add_variable(Literal::new(2, 3));
        graph.add_gate(gate);
        let root = module.convert_gate(&graph, 60);
        module.merge(root);

        let mut host = CutSetContainer::new(&settings(), BOUND);
        host.join_module(60, &module);
        assert!(host.zbdd.modules.contains_key(&60));
        let imported = host.zbdd.modules[&60];
        assert_eq!(host.zbdd.shape(imported).index, 1);
    }

    #[test]
    fn test_sanitize_folds_constant_modules() {
        let mut host = CutSetContainer::new(&settings(), BOUND);
        host.zbdd.modules.insert(60, VertexId::BASE);

        // Root = {{60, 1}} with 60 a unity module.
        let proxy = host.zbdd.fetch(60, VertexId::BASE, VertexId::EMPTY, 61, true);
        let root = host.zbdd.fetch(1, proxy, VertexId::EMPTY, 2, false);
        host.zbdd.root = root;

        host.sanitize();
        assert!(host.zbdd.modules.is_empty());
        let node = host.zbdd.shape(host.root());
        assert_eq!(node.index, 1);
        assert_eq!(node.high, VertexId::BASE);
    }
}
