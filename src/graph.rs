//! Indexed Boolean graph input interface and conversion into a ZBDD.
//!
//! The graph comes out of the external preprocessor: gates are AND, OR,
//! NULL (pass-through) or constant, complements are already pushed down to
//! the variables, and every variable carries an order. Modules are marked
//! by the caller.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::cache::OpType;
use crate::reference::VertexId;
use crate::settings::Settings;
use crate::zbdd::Zbdd;

/// Connective of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateType {
    And,
    Or,
    /// Single-argument pass-through.
    Null,
}

/// A variable argument of a gate: signed literal index plus its order.
///
/// A complement carries the negative index and the order of its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    pub index: i32,
    pub order: u32,
}

impl Literal {
    /// Creates a literal argument.
    ///
    /// # Panics
    ///
    /// Panics on a zero index or zero order.
    pub fn new(index: i32, order: u32) -> Self {
        assert_ne!(index, 0, "literal index must be non-zero");
        assert!(order > 0, "variable order must be positive");
        Self { index, order }
    }
}

/// A gate of the indexed Boolean graph.
#[derive(Debug, Clone)]
pub struct Gate {
    index: i32,
    gate_type: GateType,
    order: u32,
    module: bool,
    constant: Option<bool>,
    variables: Vec<Literal>,
    gates: Vec<i32>,
}

impl Gate {
    /// Creates a gate with the given connective.
    ///
    /// The order matters only for module gates, which appear as proxy
    /// literals in their parents.
    pub fn new(index: i32, gate_type: GateType, order: u32) -> Self {
        assert!(index > 0, "gate index must be positive");
        Self {
            index,
            gate_type,
            order,
            module: false,
            constant: None,
            variables: Vec::new(),
            gates: Vec::new(),
        }
    }

    /// Creates a constant gate.
    pub fn constant(index: i32, value: bool) -> Self {
        let mut gate = Self::new(index, GateType::Null, 1);
        gate.constant = Some(value);
        gate
    }

    /// Marks the gate as a module.
    pub fn into_module(mut self) -> Self {
        self.module = true;
        self
    }

    /// Adds a variable argument.
    pub fn add_variable(&mut self, literal: Literal) {
        self.variables.push(literal);
    }

    /// Adds a gate argument by index.
    ///
    /// # Panics
    ///
    /// Panics on a negative index: complements of gates must have been
    /// pushed down by the preprocessor.
    pub fn add_gate(&mut self, index: i32) {
        assert!(index > 0, "complements must be pushed down to variables");
        self.gates.push(index);
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn gate_type(&self) -> GateType {
        self.gate_type
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn module(&self) -> bool {
        self.module
    }

    pub fn constant_value(&self) -> Option<bool> {
        self.constant
    }

    pub fn variables(&self) -> &[Literal] {
        &self.variables
    }

    pub fn gates(&self) -> &[i32] {
        &self.gates
    }
}

/// A preprocessed, indexed fault tree.
#[derive(Debug)]
pub struct BooleanGraph {
    root: i32,
    gates: HashMap<i32, Gate>,
}

impl BooleanGraph {
    /// Creates a graph with the given root gate index.
    pub fn new(root: i32) -> Self {
        Self { root, gates: HashMap::new() }
    }

    /// Registers a gate.
    pub fn add_gate(&mut self, gate: Gate) {
        self.gates.insert(gate.index(), gate);
    }

    /// The root gate index.
    pub fn root(&self) -> i32 {
        self.root
    }

    /// The gate behind an index.
    ///
    /// # Panics
    ///
    /// Panics on an unknown index.
    pub fn gate(&self, index: i32) -> &Gate {
        self.gates
            .get(&index)
            .unwrap_or_else(|| panic!("gate {} is not in the graph", index))
    }

    /// True if no gate argues with a complement literal.
    pub fn coherent(&self) -> bool {
        self.gates
            .values()
            .all(|gate| gate.variables().iter().all(|literal| literal.index > 0))
    }

    /// In-degree of every gate, for per-gate conversion memoisation.
    fn parent_counts(&self) -> HashMap<i32, usize> {
        let mut counts = HashMap::new();
        for gate in self.gates.values() {
            for &argument in gate.gates() {
                *counts.entry(argument).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl Zbdd {
    /// Produces a ZBDD directly from a preprocessed Boolean graph.
    ///
    /// Non-coherent graphs are rewritten into positive-literal form at the
    /// end of the conversion.
    pub fn from_graph(graph: &BooleanGraph, settings: &Settings) -> Self {
        let init_time = Instant::now();
        debug!("Creating ZBDD from Boolean graph...");
        let mut zbdd = Zbdd::with_settings(settings);
        let parents = graph.parent_counts();
        let mut gates = HashMap::new();
        zbdd.root = zbdd.convert_graph(graph, graph.gate(graph.root()), &mut gates, &parents);
        zbdd.clear_tables();
        if !graph.coherent() {
            debug!("Eliminating complements from the non-coherent ZBDD...");
            let mut results = HashMap::new();
            let root = zbdd.root;
            zbdd.root = zbdd.eliminate_complements(root, &mut results);
        }
        debug!("The total number of ZBDD vertices generated: {}", zbdd.num_vertices());
        debug!("Created ZBDD from Boolean graph in {:?}", init_time.elapsed());
        zbdd
    }

    /// Folds one gate into a set graph.
    ///
    /// Shared gates (in-degree above one) are memoised with a use count
    /// that evicts the entry on its last reuse. Compute tables are flushed
    /// after every fold step to keep per-gate locality.
    fn convert_graph(
        &mut self,
        graph: &BooleanGraph,
        gate: &Gate,
        gates: &mut HashMap<i32, (VertexId, usize)>,
        parents: &HashMap<i32, usize>,
    ) -> VertexId {
        if let Some(value) = gate.constant_value() {
            return if value { VertexId::BASE } else { VertexId::EMPTY };
        }
        if let Some(&(vertex, uses)) = gates.get(&gate.index()) {
            if uses <= 1 {
                gates.remove(&gate.index());
            } else {
                gates.insert(gate.index(), (vertex, uses - 1));
            }
            return vertex;
        }

        let mut arguments: Vec<(u32, VertexId)> = Vec::new();
        for &literal in gate.variables() {
            let vertex =
                self.fetch(literal.index, VertexId::BASE, VertexId::EMPTY, literal.order, false);
            arguments.push((literal.order, vertex));
        }
        for &sub_index in gate.gates() {
            let sub = graph.gate(sub_index);
            if sub.module() {
                if !self.modules.contains_key(&sub_index) {
                    let module = self.convert_graph(graph, sub, gates, parents);
                    self.modules.insert(sub_index, module);
                }
                let proxy =
                    self.fetch(sub_index, VertexId::BASE, VertexId::EMPTY, sub.order(), true);
                arguments.push((sub.order(), proxy));
            } else {
                let vertex = self.convert_graph(graph, sub, gates, parents);
                arguments.push((self.fold_order(vertex), vertex));
            }
        }

        // Deepest arguments first, so the fold builds bottom-up.
        arguments.sort_by(|lhs, rhs| rhs.0.cmp(&lhs.0));

        let result = match gate.gate_type() {
            GateType::Null => {
                assert_eq!(arguments.len(), 1, "NULL gate must have exactly one argument");
                arguments[0].1
            }
            GateType::And | GateType::Or => {
                let op = if gate.gate_type() == GateType::And { OpType::And } else { OpType::Or };
                assert!(!arguments.is_empty(), "gate {} has no arguments", gate.index());
                let limit_order = self.settings.limit_order();
                let mut result = arguments[0].1;
                for &(_, argument) in &arguments[1..] {
                    result = self.apply(op, result, argument, limit_order);
                    self.clear_tables();
                }
                result
            }
        };

        let uses = parents.get(&gate.index()).copied().unwrap_or(0);
        if uses > 1 {
            gates.insert(gate.index(), (result, uses - 1));
        }
        result
    }

    fn fold_order(&self, vertex: VertexId) -> u32 {
        if vertex.is_terminal() {
            u32::MAX
        } else {
            self.shape(vertex).order
        }
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

    #[test]
    fn test_or_of_variables() {
        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::Or, 1);
        root.add_variable(Literal::new(1, 1));
        root.add_variable(Literal::new(2, 2));
        graph.add_gate(root);

        let mut zbdd = Zbdd::from_graph(&graph, &Settings::new().with_limit_order(5));
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_null_gate_passthrough() {
        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::Null, 1);
        root.add_variable(Literal::new(1, 1));
        graph.add_gate(root);

        let mut zbdd = Zbdd::from_graph(&graph, &Settings::default());
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1]]);
    }

    #[test]
    fn test_constant_gates() {
        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::And, 1);
        root.add_variable(Literal::new(1, 1));
        root.add_gate(101);
        graph.add_gate(root);
        graph.add_gate(Gate::constant(101, true));

        let mut zbdd = Zbdd::from_graph(&graph, &Settings::default());
        zbdd.analyze();
        assert_eq!(normalized(&zbdd), vec![vec![1]]);

        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::And, 1);
        root.add_variable(Literal::new(1, 1));
        root.add_gate(101);
        graph.add_gate(root);
        graph.add_gate(Gate::constant(101, false));

        let mut zbdd = Zbdd::from_graph(&graph, &Settings::default());
        zbdd.analyze();
        assert!(zbdd.cut_sets().is_empty());
    }

    #[test]
    fn test_shared_gate_converted_once() {
        // g is an argument of both parents; its second use must come from
        // the per-gate memo and leave the memo empty afterwards.
        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::Or, 1);
        root.add_gate(101);
        root.add_gate(102);
        graph.add_gate(root);

        let mut left = Gate::new(101, GateType::And, 1);
        left.add_variable(Literal::new(1, 1));
        left.add_gate(103);
        graph.add_gate(left);

        let mut right = Gate::new(102, GateType::And, 1);
        right.add_variable(Literal::new(2, 2));
        right.add_gate(103);
        graph.add_gate(right);

        let mut shared = Gate::new(103, GateType::Or, 1);
        shared.add_variable(Literal::new(3, 3));
        shared.add_variable(Literal::new(4, 4));
        graph.add_gate(shared);

        let mut zbdd = Zbdd::from_graph(&graph, &Settings::new().with_limit_order(5));
        zbdd.analyze();
        assert_eq!(
            normalized(&zbdd),
            vec![vec![1, 3], vec![1, 4], vec![2, 3], vec![2, 4]],
        );
    }

    #[test]
    fn test_coherence_detection() {
        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::And, 1);
        root.add_variable(Literal::new(1, 1));
        root.add_variable(Literal::new(-2, 2));
        graph.add_gate(root);
        assert!(!graph.coherent());

        let mut graph = BooleanGraph::new(100);
        let mut root = Gate::new(100, GateType::And, 1);
        root.add_variable(Literal::new(1, 1));
        graph.add_gate(root);
        assert!(graph.coherent());
    }
}
