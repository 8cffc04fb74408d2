//! # zbdd-rs: Zero-Suppressed BDDs for minimal cut sets
//!
//! **`zbdd-rs`** computes the **minimal cut sets** (MCS) of a Boolean fault
//! tree for probabilistic risk analysis. The engine accepts a Reduced
//! Ordered BDD of the top function, an indexed Boolean graph, or a bag of
//! MOCUS-generated cut sets, and produces the unique, order-bounded,
//! minimal family of implicant sets as sorted integer lists.
//!
//! ## What is a ZBDD?
//!
//! A Zero-Suppressed Binary Decision Diagram represents a family of sets
//! as a directed acyclic graph. Its reduction rule eliminates nodes whose
//! high branch is the Empty family, which makes sparse set families (such
//! as cut sets of a large fault tree) extremely compact, and makes the
//! representation **canonical** for a fixed variable ordering.
//!
//! ## Key Features
//!
//! - **Manager-centric architecture**: all operations go through the
//!   [`Zbdd`][crate::zbdd::Zbdd] engine, which hash-conses vertices and
//!   memoises Apply and Subsume in compute tables.
//! - **Order cutoff**: a caller-supplied `limit_order` bounds cut-set
//!   cardinality throughout construction, not just at the end.
//! - **Subsumption**: families are minimized to antichains, so no emitted
//!   cut set is a superset of another.
//! - **Non-coherent inputs**: complement literals are eliminated into
//!   positive-literal form before extraction.
//! - **Modules**: independent sub-trees are kept as proxy literals with
//!   private sub-diagrams and expanded transitively during extraction.
//!
//! ## Basic Usage
//!
//! ```rust
//! use zbdd_rs::graph::{BooleanGraph, Gate, GateType, Literal};
//! use zbdd_rs::settings::Settings;
//! use zbdd_rs::zbdd::Zbdd;
//!
//! // f = (a AND b) OR c
//! let mut graph = BooleanGraph::new(100);
//! let mut root = Gate::new(100, GateType::Or, 1);
//! root.add_gate(101);
//! root.add_variable(Literal::new(3, 3));
//! graph.add_gate(root);
//! let mut and = Gate::new(101, GateType::And, 1);
//! and.add_variable(Literal::new(1, 1));
//! and.add_variable(Literal::new(2, 2));
//! graph.add_gate(and);
//!
//! let settings = Settings::new().with_limit_order(4);
//! let mut zbdd = Zbdd::from_graph(&graph, &settings);
//! zbdd.analyze();
//!
//! let mut cut_sets = zbdd.cut_sets().to_vec();
//! for cut_set in &mut cut_sets {
//!     cut_set.sort();
//! }
//! cut_sets.sort();
//! assert_eq!(cut_sets, vec![vec![1, 2], vec![3]]);
//! ```
//!
//! ## Core Components
//!
//! - **[`zbdd`]**: the heart of the crate. Contains the
//!   [`Zbdd`][crate::zbdd::Zbdd] engine with Apply, Minimize/Subsume,
//!   complement elimination and destructive cut-set extraction.
//! - **[`bdd`]**, **[`graph`]**, **[`mocus`]**: the three input interfaces
//!   and their builders.
//! - **[`container`]**: the intermediate cut-set container driving a
//!   MOCUS-style expansion.
//!
//! The analysis is destructive: [`Zbdd::analyze`][crate::zbdd::Zbdd::analyze]
//! releases the set graph after extracting the cut sets, and a repeated
//! run yields empty results.

pub mod bdd;
pub mod cache;
pub mod container;
pub mod graph;
pub mod mocus;
pub mod node;
pub mod reference;
pub mod settings;
pub mod table;
pub mod zbdd;
