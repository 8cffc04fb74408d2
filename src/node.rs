use crate::reference::VertexId;

/// A cut set: literal indices, emitted in descending variable order.
pub type CutSet = Vec<i32>;

/// A vertex of the set graph: either a terminal or a decision node.
///
/// Only two terminals exist per engine, pinned at fixed store slots:
/// `Terminal(false)` is Empty (the family ∅), `Terminal(true)` is Base
/// (the family {∅}).
#[derive(Debug, Clone)]
pub enum Vertex {
    Terminal(bool),
    Set(SetNode),
}

impl Vertex {
    /// Returns true for the two terminal vertices.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Vertex::Terminal(_))
    }

    /// The Boolean value of a terminal vertex.
    ///
    /// # Panics
    ///
    /// Panics on set nodes.
    pub fn terminal_value(&self) -> bool {
        match self {
            Vertex::Terminal(value) => *value,
            Vertex::Set(_) => panic!("set node has no terminal value"),
        }
    }

    /// Borrows the decision-node data.
    ///
    /// # Panics
    ///
    /// Panics on terminals.
    pub fn as_set(&self) -> &SetNode {
        match self {
            Vertex::Set(node) => node,
            Vertex::Terminal(_) => panic!("terminal vertex has no set node"),
        }
    }

    /// Mutably borrows the decision-node data.
    ///
    /// # Panics
    ///
    /// Panics on terminals.
    pub fn as_set_mut(&mut self) -> &mut SetNode {
        match self {
            Vertex::Set(node) => node,
            Vertex::Terminal(_) => panic!("terminal vertex has no set node"),
        }
    }
}

/// A non-terminal ZBDD vertex denoting a family of sets.
///
/// The family is `F(low) ∪ {S ∪ {index} | S ∈ F(high)}`: the low branch
/// collects the sets without this literal, the high branch the sets with it
/// (stored without the literal itself).
///
/// # Fields
///
/// - `index`: signed literal; negative indices are complements of the
///   variable with the same magnitude
/// - `order`: position in the variable ordering; a complement shares the
///   order of its variable and sits immediately below it
/// - `module`: this vertex is a proxy whose expansion lives in the engine's
///   module table under `index`
/// - `minimal`: the subgraph rooted here has been minimized (antichain)
/// - `mark`, `count`, `cut_sets`: transient traversal state and payload
///
/// # Invariants
///
/// - `high` is never Empty (zero-suppression)
/// - `high != low` (non-degeneracy)
/// - on every edge the parent is above the child: smaller order, or equal
///   order with larger index
#[derive(Debug, Clone)]
pub struct SetNode {
    pub index: i32,
    pub order: u32,
    pub high: VertexId,
    pub low: VertexId,
    pub module: bool,
    pub minimal: bool,
    pub mark: bool,
    /// Scratch value for counting traversals.
    pub count: i64,
    /// Cut sets harvested from this vertex during destructive extraction.
    pub cut_sets: Vec<CutSet>,
}

impl SetNode {
    /// Creates a new set node.
    ///
    /// # Panics
    ///
    /// Debug-panics on a zero index or an Empty high branch.
    pub fn new(index: i32, order: u32, high: VertexId, low: VertexId, module: bool) -> Self {
        debug_assert_ne!(index, 0, "literal index must be non-zero");
        debug_assert!(!high.is_empty(), "set node cannot have high=∅ (zero-suppression rule)");
        Self {
            index,
            order,
            high,
            low,
            module,
            minimal: false,
            mark: false,
            count: 0,
            cut_sets: Vec::new(),
        }
    }

    /// Cuts this vertex off from its branches.
    ///
    /// Used by destructive cut-set extraction once both children have been
    /// harvested; the branches must not be visited again.
    pub fn cut_branches(&mut self) {
        self.high = VertexId::INVALID;
        self.low = VertexId::INVALID;
    }
}
