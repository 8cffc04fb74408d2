//! Reduced Ordered BDD input interface and conversion into a ZBDD.
//!
//! The engine does not build BDDs; it consumes one produced by an external
//! analyzer. The interface mirrors the producer's representation:
//! attributed edges with a single True terminal, where only low edges and
//! function handles may carry a complement flag.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::reference::VertexId;
use crate::settings::Settings;
use crate::zbdd::Zbdd;

/// A reference to an ITE vertex of the input BDD.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct BddId(u32);

impl BddId {
    /// The single True terminal of the attributed-edge BDD.
    pub const ONE: BddId = BddId(0);

    /// Returns the raw vertex id.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true for the terminal vertex.
    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

/// A BDD function: root vertex plus interpretation flag.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Function {
    pub vertex: BddId,
    pub complement: bool,
}

/// An if-then-else vertex of the input BDD.
///
/// The high edge is never complemented; complementation is attributed to
/// the low edge (`complement_edge`) and to function handles.
#[derive(Debug, Clone)]
pub struct Ite {
    pub index: i32,
    pub order: u32,
    pub module: bool,
    pub high: BddId,
    pub low: BddId,
    pub complement_edge: bool,
}

/// The input ROBDD: ITE vertices, a root function, and module functions.
#[derive(Debug, Default)]
pub struct Bdd {
    nodes: Vec<Ite>,
    root: Option<Function>,
    modules: HashMap<i32, Function>,
}

impl Bdd {
    /// Creates an empty BDD with only the True terminal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ITE vertex and returns its id.
    ///
    /// # Panics
    ///
    /// Panics on a non-positive variable index or zero order.
    pub fn mk_ite(
        &mut self,
        index: i32,
        order: u32,
        high: BddId,
        low: BddId,
        complement_edge: bool,
    ) -> BddId {
        assert!(index > 0, "BDD variables carry positive indices");
        assert!(order > 0, "variable order must be positive");
        self.nodes.push(Ite { index, order, module: false, high, low, complement_edge });
        BddId(self.nodes.len() as u32)
    }

    /// Adds a module proxy vertex and returns its id.
    ///
    /// The module function itself must be registered with
    /// [`Bdd::register_module`] under the same index.
    pub fn mk_module_ite(
        &mut self,
        index: i32,
        order: u32,
        high: BddId,
        low: BddId,
        complement_edge: bool,
    ) -> BddId {
        let id = self.mk_ite(index, order, high, low, complement_edge);
        self.nodes[id.0 as usize - 1].module = true;
        id
    }

    /// Sets the root function.
    pub fn set_root(&mut self, vertex: BddId, complement: bool) {
        self.root = Some(Function { vertex, complement });
    }

    /// Registers the function of a module.
    pub fn register_module(&mut self, index: i32, vertex: BddId, complement: bool) {
        self.modules.insert(index, Function { vertex, complement });
    }

    /// The root function.
    ///
    /// # Panics
    ///
    /// Panics if the root has not been set.
    pub fn root(&self) -> Function {
        self.root.expect("BDD root function is not set")
    }

    /// The ITE vertex behind an id.
    pub fn ite(&self, id: BddId) -> &Ite {
        assert!(!id.is_terminal(), "terminal vertex has no ITE data");
        &self.nodes[id.0 as usize - 1]
    }

    /// The function of a module.
    ///
    /// # Panics
    ///
    /// Panics on an unregistered module index.
    pub fn module(&self, index: i32) -> Function {
        *self
            .modules
            .get(&index)
            .unwrap_or_else(|| panic!("module {} is not registered", index))
    }
}

impl Zbdd {
    /// Converts a Reduced Ordered BDD into a ZBDD of its cut sets.
    pub fn from_bdd(bdd: &Bdd, settings: &Settings) -> Self {
        let init_time = Instant::now();
        debug!("Creating ZBDD from BDD...");
        let mut zbdd = Zbdd::with_settings(settings);
        let root = bdd.root();
        let mut ites = HashMap::new();
        let limit_order = settings.limit_order();
        zbdd.root = zbdd.convert_bdd(bdd, root.vertex, root.complement, limit_order, &mut ites);
        debug!("The total number of ZBDD vertices generated: {}", zbdd.num_vertices());
        debug!("Created ZBDD from BDD in {:?}", init_time.elapsed());
        zbdd
    }

    /// Converts one BDD function vertex, memoised by signed id and budget.
    fn convert_bdd(
        &mut self,
        bdd: &Bdd,
        vertex: BddId,
        complement: bool,
        limit_order: i32,
        ites: &mut HashMap<(i64, i32), VertexId>,
    ) -> VertexId {
        if vertex.is_terminal() {
            return if complement { VertexId::EMPTY } else { VertexId::BASE };
        }
        let sign: i64 = if complement { -1 } else { 1 };
        let key = (sign * vertex.raw() as i64, limit_order);
        if let Some(&result) = ites.get(&key) {
            return result;
        }

        let ite = bdd.ite(vertex).clone();
        let low = self.convert_bdd(bdd, ite.low, ite.complement_edge ^ complement, limit_order, ites);

        let result = if limit_order == 0 {
            // No room for any literal: only the constant part survives.
            if low.is_terminal() {
                low
            } else {
                VertexId::EMPTY
            }
        } else if ite.module {
            if !self.modules.contains_key(&ite.index) {
                // Modules are sized independently; the joint bound is
                // enforced at extraction.
                let function = bdd.module(ite.index);
                let full_limit = self.settings.limit_order();
                let module =
                    self.convert_bdd(bdd, function.vertex, function.complement, full_limit, ites);
                self.modules.insert(ite.index, module);
            }
            let high = self.convert_bdd(bdd, ite.high, complement, limit_order, ites);
            match self.modules[&ite.index] {
                VertexId::EMPTY => low,
                VertexId::BASE => self.apply(crate::cache::OpType::Or, high, low, limit_order),
                _ => self.fetch(ite.index, high, low, ite.order, true),
            }
        } else {
            let high = self.convert_bdd(bdd, ite.high, complement, limit_order - 1, ites);
            self.fetch(ite.index, high, low, ite.order, false)
        };

        ites.insert(key, result);
        result
    }
}
