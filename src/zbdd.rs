//! Zero-Suppressed Binary Decision Diagram engine for minimal cut sets.
//!
//! The [`Zbdd`] manager owns every vertex of the set graph and performs all
//! operations on it. The manager maintains:
//!
//! - the vertex store (terminals pinned at slots 0 and 1)
//! - the unique table for hash consing
//! - compute tables memoising Apply and Subsume
//! - the module table mapping module indices to their private sub-diagrams
//!
//! # Semantics
//!
//! A ZBDD vertex denotes a family of sets of literals. The reduction rule
//! is zero-suppression: a node whose high branch is Empty is replaced by
//! its low branch. Together with hash consing this makes the
//! representation canonical for a fixed variable ordering.
//!
//! # Ordering
//!
//! Every literal carries an order. On every edge the parent is above the
//! child: `parent.order < child.order`, or equal orders with
//! `parent.index > child.index`, which places a complement literal
//! immediately below its variable.
//!
//! # Analysis flow
//!
//! Builder → [`Zbdd::analyze`]: Minimize → destructive cut-set extraction →
//! sorted integer sets via [`Zbdd::cut_sets`]. The analysis destroys the
//! graph; a second run yields empty results.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::cache::{CacheKey, ComputeCache, OpType, PairCache};
use crate::node::{CutSet, SetNode, Vertex};
use crate::reference::VertexId;
use crate::settings::Settings;
use crate::table::UniqueTable;

/// Copyable snapshot of a set node, for recursion without holding borrows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shape {
    pub index: i32,
    pub order: u32,
    pub high: VertexId,
    pub low: VertexId,
    pub module: bool,
    pub minimal: bool,
}

/// The ZBDD manager: owns all vertices and handles operations.
pub struct Zbdd {
    pub(crate) settings: Settings,
    /// Vertex store. Slot 0 = Empty, slot 1 = Base; set nodes start at 2.
    nodes: Vec<Vertex>,
    unique_table: UniqueTable,
    and_table: ComputeCache,
    or_table: ComputeCache,
    subsume_table: PairCache,
    /// Memoisation of minimal vertices, by input vertex id.
    minimal_results: HashMap<u32, VertexId>,
    /// Module index -> root of the module's private sub-diagram.
    pub(crate) modules: HashMap<i32, VertexId>,
    pub(crate) root: VertexId,
    cut_sets: Vec<CutSet>,
}

impl Zbdd {
    /// Creates an empty engine with the given settings.
    pub(crate) fn with_settings(settings: &Settings) -> Self {
        Self {
            settings: *settings,
            nodes: vec![Vertex::Terminal(false), Vertex::Terminal(true)],
            unique_table: UniqueTable::new(),
            and_table: ComputeCache::new(),
            or_table: ComputeCache::new(),
            subsume_table: PairCache::new(),
            minimal_results: HashMap::new(),
            modules: HashMap::new(),
            root: VertexId::EMPTY,
            cut_sets: Vec::new(),
        }
    }

    /// Cut sets generated by the analysis.
    ///
    /// Each inner list is sorted by descending variable order.
    pub fn cut_sets(&self) -> &[CutSet] {
        &self.cut_sets
    }

    /// The analysis settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The root vertex of the set graph.
    pub fn root(&self) -> VertexId {
        self.root
    }
}

// Vertex accessors.
impl Zbdd {
    pub(crate) fn vertex(&self, id: VertexId) -> &Vertex {
        &self.nodes[id.index()]
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn shape(&self, id: VertexId) -> Shape {
        let node = self.vertex(id).as_set();
        Shape {
            index: node.index,
            order: node.order,
            high: node.high,
            low: node.low,
            module: node.module,
            minimal: node.minimal,
        }
    }

    fn is_minimal(&self, id: VertexId) -> bool {
        id.is_terminal() || self.vertex(id).as_set().minimal
    }

    pub(crate) fn mark_minimal(&mut self, id: VertexId) {
        if !id.is_terminal() {
            self.vertex_mut(id).as_set_mut().minimal = true;
        }
    }

    /// True if `one` sits above `two` in the diagram ordering.
    pub(crate) fn precedes(&self, one: VertexId, two: VertexId) -> bool {
        let a = self.shape(one);
        let b = self.shape(two);
        a.order < b.order || (a.order == b.order && a.index > b.index)
    }

    /// Total number of vertices ever created, terminals included.
    pub fn num_vertices(&self) -> usize {
        self.nodes.len()
    }
}

// Hash consing.
impl Zbdd {
    /// Fetches the unique set node with the given attributes, creating it
    /// if it does not exist yet.
    ///
    /// Applies the reduction rules first: an Empty high branch yields the
    /// low branch (zero-suppression), equal branches yield the low branch
    /// (redundancy). The supplied `order` and `module` flag must agree with
    /// any existing node under the same `(index, high, low)` key, which
    /// holds by construction.
    pub(crate) fn fetch(
        &mut self,
        index: i32,
        high: VertexId,
        low: VertexId,
        order: u32,
        module: bool,
    ) -> VertexId {
        assert_ne!(index, 0, "literal index must be non-zero");
        assert!(order > 0, "variable order must be positive");

        if high == VertexId::EMPTY {
            return low; // Zero-suppression rule.
        }
        if high == low {
            return low; // Redundancy rule.
        }

        if let Some(existing) = self.unique_table.get(index, high, low) {
            return existing;
        }

        debug_assert!(self.edge_ordered(index, order, high), "high child out of order");
        debug_assert!(self.edge_ordered(index, order, low), "low child out of order");

        let id = VertexId::new(self.nodes.len() as u32);
        self.nodes.push(Vertex::Set(SetNode::new(index, order, high, low, module)));
        self.unique_table.insert(index, high, low, id);
        id
    }

    fn edge_ordered(&self, index: i32, order: u32, child: VertexId) -> bool {
        if child.is_terminal() {
            return true;
        }
        let c = self.shape(child);
        order < c.order || (order == c.order && index > c.index)
    }
}

// Apply: binary Boolean algebra on set families.
impl Zbdd {
    /// Applies a Boolean operation to two set families.
    ///
    /// `limit_order` is the residual budget on cut-set cardinality; it
    /// shrinks by one whenever a positive non-module literal is added on a
    /// high branch. The bound is enforced conservatively: complements and
    /// module proxies are budget-free.
    pub(crate) fn apply(
        &mut self,
        op: OpType,
        one: VertexId,
        two: VertexId,
        limit_order: i32,
    ) -> VertexId {
        if one.is_terminal() && two.is_terminal() {
            return Self::apply_terminals(op, one, two);
        }
        if one.is_terminal() {
            return Self::apply_terminal(op, two, one);
        }
        if two.is_terminal() {
            return Self::apply_terminal(op, one, two);
        }
        if one == two {
            return one; // Idempotence.
        }
        if limit_order < 0 {
            return VertexId::EMPTY; // Budget exhausted.
        }

        let key = CacheKey::commutative(one, two, limit_order);
        let cached = match op {
            OpType::And => self.and_table.get(&key),
            OpType::Or => self.or_table.get(&key),
        };
        if let Some(result) = cached {
            return result;
        }

        // Canonicalize so the first operand is the upper one.
        let (one, two) = if self.precedes(one, two) { (one, two) } else { (two, one) };
        let result = self.apply_sets(op, one, two, limit_order);
        let result = self.minimize(result);

        match op {
            OpType::And => self.and_table.insert(key, result),
            OpType::Or => self.or_table.insert(key, result),
        }
        result
    }

    fn apply_terminals(op: OpType, one: VertexId, two: VertexId) -> VertexId {
        match op {
            OpType::Or => {
                if one.is_base() || two.is_base() {
                    VertexId::BASE
                } else {
                    VertexId::EMPTY
                }
            }
            OpType::And => {
                if one.is_base() && two.is_base() {
                    VertexId::BASE
                } else {
                    VertexId::EMPTY
                }
            }
        }
    }

    fn apply_terminal(op: OpType, set: VertexId, term: VertexId) -> VertexId {
        match op {
            OpType::Or => {
                if term.is_base() {
                    VertexId::BASE // The empty set subsumes everything.
                } else {
                    set
                }
            }
            OpType::And => {
                if term.is_base() {
                    set
                } else {
                    VertexId::EMPTY
                }
            }
        }
    }

    /// Apply on two set nodes; `one` is the upper operand.
    fn apply_sets(&mut self, op: OpType, one: VertexId, two: VertexId, limit_order: i32) -> VertexId {
        let a = self.shape(one);
        let b = self.shape(two);

        // High-branch budget: a positive non-module literal costs one.
        let limit_high = if a.index > 0 && !a.module { limit_order - 1 } else { limit_order };

        let (high, low);
        if a.order == b.order && a.index == b.index {
            // The same literal on both sides.
            match op {
                OpType::Or => {
                    high = self.apply(OpType::Or, a.high, b.high, limit_high);
                    low = self.apply(OpType::Or, a.low, b.low, limit_order);
                }
                OpType::And => {
                    // (x f1 + f0)(x g1 + g0) = x (f1 (g1 + g0) + f0 g1) + f0 g0
                    let combined = self.apply(OpType::Or, b.high, b.low, limit_high);
                    let left = self.apply(OpType::And, a.high, combined, limit_high);
                    let right = self.apply(OpType::And, a.low, b.high, limit_high);
                    high = self.apply(OpType::Or, left, right, limit_high);
                    low = self.apply(OpType::And, a.low, b.low, limit_order);
                }
            }
        } else {
            match op {
                OpType::Or => {
                    if a.order == b.order && a.high.is_terminal() && b.high.is_terminal() {
                        // x + ~x: the top event is guaranteed.
                        return VertexId::BASE;
                    }
                    high = a.high;
                    low = self.apply(OpType::Or, a.low, two, limit_order);
                }
                OpType::And => {
                    high = if a.order == b.order {
                        // x & ~x sets conflict; keep only ~x-free sets of two.
                        self.apply(OpType::And, a.high, b.low, limit_high)
                    } else {
                        self.apply(OpType::And, a.high, two, limit_high)
                    };
                    low = self.apply(OpType::And, a.low, two, limit_order);
                }
            }
        }

        // A set cannot contain a literal and its complement: if the
        // complement surfaced at the top of the high branch, absorb it.
        let mut high = high;
        if !high.is_terminal() {
            let h = self.shape(high);
            if h.order == a.order && h.index < a.index {
                high = h.low;
            }
        }

        self.fetch(a.index, high, low, a.order, a.module)
    }
}

// Minimization: subsumption of non-minimal sets.
impl Zbdd {
    /// Reduces the family to the antichain of its minimal sets.
    pub(crate) fn minimize(&mut self, vertex: VertexId) -> VertexId {
        if vertex.is_terminal() {
            return vertex;
        }
        if self.is_minimal(vertex) {
            return vertex;
        }
        if let Some(&result) = self.minimal_results.get(&vertex.raw()) {
            return result;
        }

        let node = self.shape(vertex);
        if node.module {
            let module = self.modules[&node.index];
            let minimal = self.minimize(module);
            self.modules.insert(node.index, minimal);
        }

        let high = self.minimize(node.high);
        let low = self.minimize(node.low);
        let high = self.subsume(high, low);

        let result = if high == VertexId::EMPTY {
            low // Reduction rule.
        } else {
            debug_assert_ne!(high, low, "subsume left the high branch equal to low");
            let fetched = self.fetch(node.index, high, low, node.order, node.module);
            self.mark_minimal(fetched);
            fetched
        };
        self.minimal_results.insert(vertex.raw(), result);
        result
    }

    /// Removes from `high` the sets that are supersets of any set in `low`.
    pub(crate) fn subsume(&mut self, high: VertexId, low: VertexId) -> VertexId {
        if low == VertexId::EMPTY {
            return high; // Nothing subsumes.
        }
        if low == VertexId::BASE {
            return VertexId::EMPTY; // Every set is a superset of {}.
        }
        if high.is_terminal() {
            return high;
        }
        if let Some(result) = self.subsume_table.get(high, low) {
            return result;
        }

        // Sets holding low's top literal cannot subsume anything in high
        // when that literal sits above high.
        if self.precedes(low, high) {
            let l = self.shape(low);
            let result = self.subsume(high, l.low);
            self.subsume_table.insert(high, low, result);
            return result;
        }

        let h = self.shape(high);
        let l = self.shape(low);
        let (subhigh, sublow);
        if h.order == l.order && h.index == l.index {
            // A set {x} ∪ s is subsumed by the x-sets of low and by its
            // x-free sets alike.
            let reduced = self.subsume(h.high, l.high);
            subhigh = self.subsume(reduced, l.low);
            sublow = self.subsume(h.low, l.low);
        } else {
            subhigh = self.subsume(h.high, low);
            sublow = self.subsume(h.low, low);
        }

        let result = if subhigh == VertexId::EMPTY || subhigh == sublow {
            sublow
        } else {
            let fetched = self.fetch(h.index, subhigh, sublow, h.order, h.module);
            if h.minimal {
                self.mark_minimal(fetched);
            }
            fetched
        };
        self.subsume_table.insert(high, low, result);
        result
    }
}

// Complement elimination for non-coherent inputs.
impl Zbdd {
    /// Rewrites the subgraph into positive-literal form.
    ///
    /// Complement literals are absorbed by merging their branches; modules
    /// are rewritten transitively, and proxies of constant modules are
    /// folded away.
    pub(crate) fn eliminate_complements(
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

        let node = self.shape(vertex);
        if node.module {
            let module = self.modules[&node.index];
            let processed = self.eliminate_complements(module, results);
            self.modules.insert(node.index, processed);
        }
        let high = self.eliminate_complements(node.high, results);
        let low = self.eliminate_complements(node.low, results);
        let result = self.eliminate_complement(node, high, low);
        results.insert(vertex.raw(), result);
        result
    }

    fn eliminate_complement(&mut self, node: Shape, high: VertexId, low: VertexId) -> VertexId {
        let limit_order = self.settings.limit_order();
        if node.index < 0 {
            // The complement branch is absorbed into the low branch.
            return self.apply(OpType::Or, high, low, limit_order);
        }
        if node.module {
            match self.modules[&node.index] {
                VertexId::EMPTY => return low,
                VertexId::BASE => return self.apply(OpType::Or, high, low, limit_order),
                _ => {}
            }
        }
        let fetched = self.fetch(node.index, high, low, node.order, node.module);
        self.minimize(fetched)
    }
}

// Destructive cut-set extraction.
impl Zbdd {
    /// Collects the cut sets of the subgraph rooted at `vertex`.
    ///
    /// The traversal is destructive: once a vertex has handed its cut sets
    /// up, its branches are cut and the result is parked on the vertex so a
    /// second visit of a shared vertex returns the memoised list.
    pub(crate) fn generate_cut_sets(&mut self, vertex: VertexId) -> Vec<CutSet> {
        if vertex == VertexId::EMPTY {
            return Vec::new();
        }
        if vertex == VertexId::BASE {
            return vec![Vec::new()];
        }

        if self.vertex(vertex).as_set().mark {
            return self.vertex(vertex).as_set().cut_sets.clone();
        }
        self.vertex_mut(vertex).as_set_mut().mark = true;

        let node = self.shape(vertex);
        let limit_order = self.settings.limit_order();
        let mut result = self.generate_cut_sets(node.low);
        let high = self.generate_cut_sets(node.high);

        if node.module {
            let module_root = self.modules[&node.index];
            let module = self.generate_cut_sets(module_root);
            for cut_set in &high {
                for module_set in &module {
                    if (cut_set.len() + module_set.len()) as i32 <= limit_order {
                        let mut combo = cut_set.clone();
                        combo.extend_from_slice(module_set);
                        result.push(combo);
                    }
                }
            }
        } else {
            for mut cut_set in high {
                if (cut_set.len() as i32) < limit_order {
                    cut_set.push(node.index);
                    result.push(cut_set);
                }
            }
        }

        let set_node = self.vertex_mut(vertex).as_set_mut();
        set_node.cut_branches();
        set_node.cut_sets = result.clone();
        result
    }
}

// Counting and traversal bookkeeping.
impl Zbdd {
    /// Counts set nodes, including those inside modules.
    ///
    /// Marks must be clear before the call.
    pub(crate) fn count_set_nodes(&mut self, vertex: VertexId) -> usize {
        if vertex.is_terminal() {
            return 0;
        }
        if self.vertex(vertex).as_set().mark {
            return 0;
        }
        self.vertex_mut(vertex).as_set_mut().mark = true;
        let node = self.shape(vertex);
        let in_module = if node.module {
            let module = self.modules[&node.index];
            self.count_set_nodes(module)
        } else {
            0
        };
        1 + in_module + self.count_set_nodes(node.high) + self.count_set_nodes(node.low)
    }

    /// Counts the sets in the family, expanding modules multiplicatively.
    ///
    /// Marks must be clear before the call.
    pub(crate) fn count_cut_sets(&mut self, vertex: VertexId) -> i64 {
        if vertex.is_terminal() {
            return if self.vertex(vertex).terminal_value() { 1 } else { 0 };
        }
        if self.vertex(vertex).as_set().mark {
            return self.vertex(vertex).as_set().count;
        }
        self.vertex_mut(vertex).as_set_mut().mark = true;
        let node = self.shape(vertex);
        let multiplier = if node.module {
            let module = self.modules[&node.index];
            self.count_cut_sets(module)
        } else {
            1
        };
        let count = multiplier * self.count_cut_sets(node.high) + self.count_cut_sets(node.low);
        self.vertex_mut(vertex).as_set_mut().count = count;
        count
    }

    /// Resets traversal marks set by a preceding counting or search pass.
    pub(crate) fn clear_marks(&mut self, vertex: VertexId) {
        if vertex.is_terminal() {
            return;
        }
        if !self.vertex(vertex).as_set().mark {
            return;
        }
        self.vertex_mut(vertex).as_set_mut().mark = false;
        let node = self.shape(vertex);
        if node.module {
            let module = self.modules[&node.index];
            self.clear_marks(module);
        }
        self.clear_marks(node.high);
        self.clear_marks(node.low);
    }

    /// Verifies the structural invariants of the graph.
    ///
    /// Marks must be clear before the call; the caller clears them after.
    ///
    /// # Panics
    ///
    /// Panics on any canonicity violation.
    pub(crate) fn test_structure(&mut self, vertex: VertexId) {
        if vertex.is_terminal() {
            return;
        }
        if self.vertex(vertex).as_set().mark {
            return;
        }
        self.vertex_mut(vertex).as_set_mut().mark = true;

        let node = self.shape(vertex);
        assert_ne!(node.index, 0, "malformed literal index");
        assert!(node.high != VertexId::EMPTY, "zero-suppression rule violated");
        assert!(node.high != node.low, "degenerate set node");
        assert!(self.edge_ordered(node.index, node.order, node.high), "high edge out of order");
        assert!(self.edge_ordered(node.index, node.order, node.low), "low edge out of order");
        if node.minimal {
            assert!(self.is_minimal(node.high), "minimal node with non-minimal high branch");
            assert!(self.is_minimal(node.low), "minimal node with non-minimal low branch");
        }
        if node.module {
            let module = *self
                .modules
                .get(&node.index)
                .unwrap_or_else(|| panic!("module {} is not registered", node.index));
            assert!(!module.is_terminal(), "module {} reduced to a constant", node.index);
            self.test_structure(module);
        }
        self.test_structure(node.high);
        self.test_structure(node.low);
    }
}

// Table management and analysis orchestration.
impl Zbdd {
    /// Flushes all compute tables.
    ///
    /// Must be called at phase boundaries: between gate foldings and before
    /// the final extraction, so cached intermediates do not pin the working
    /// set.
    pub(crate) fn clear_tables(&mut self) {
        self.and_table.clear();
        self.or_table.clear();
        self.subsume_table.clear();
        self.minimal_results.clear();
    }

    /// Releases the whole set graph, keeping only the terminals.
    fn release_graph(&mut self) {
        self.nodes.truncate(2);
        self.unique_table.clear();
        self.clear_tables();
        self.modules.clear();
        self.root = VertexId::EMPTY;
    }

    /// Runs the analysis on the constructed set graph.
    ///
    /// Minimizes the family, then destructively extracts the cut sets.
    /// The graph is released afterwards; running `analyze` again yields
    /// empty results.
    pub fn analyze(&mut self) {
        let analysis_time = Instant::now();
        debug!("Analyzing ZBDD...");

        let minimize_time = Instant::now();
        debug!("Minimizing ZBDD...");
        let root = self.root;
        self.root = self.minimize(root);
        debug!("Finished ZBDD minimization in {:?}", minimize_time.elapsed());

        let root = self.root;
        if cfg!(debug_assertions) {
            self.test_structure(root);
            self.clear_marks(root);
        }
        debug!("The total number of ZBDD vertices generated: {}", self.num_vertices());
        let nodes = self.count_set_nodes(root);
        self.clear_marks(root);
        debug!("# of SetNodes in ZBDD: {}", nodes);
        let number = self.count_cut_sets(root);
        self.clear_marks(root);
        debug!("There are {} cut sets in total.", number);

        let gen_time = Instant::now();
        debug!("Getting cut sets from minimized ZBDD...");
        self.clear_tables();
        self.unique_table.clear();
        self.cut_sets = self.generate_cut_sets(root);
        self.release_graph();
        debug!("{} cut sets are found in {:?}", self.cut_sets.len(), gen_time.elapsed());
        debug!("Finished ZBDD analysis in {:?}", analysis_time.elapsed());
    }
}
