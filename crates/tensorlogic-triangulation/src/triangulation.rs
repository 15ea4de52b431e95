//! Ready-made triangulations.
//!
//! [`Triangulation`] is the common interface of the driver and of the
//! convenience types pairing it with a given elimination strategy:
//!
//! | Type | Elimination order |
//! |------|-------------------|
//! | [`DefaultTriangulation`] | weighted min-fill heuristic |
//! | [`OrderedTriangulation`] | imposed total order |
//! | [`PartialOrderedTriangulation`] | imposed sequence of node subsets |

use std::collections::BTreeMap;

use crate::clique_graph::{CliqueGraph, CliqueId};
use crate::config::TriangulationConfig;
use crate::elimination::{
    DefaultEliminationSequenceStrategy, OrderedEliminationSequenceStrategy,
    PartialOrderedEliminationSequenceStrategy,
};
use crate::error::Result;
use crate::graph::{DomainSizes, EdgeSet, NodeId, NodeSet, UndirectedGraph};
use crate::junction_tree::{DefaultJunctionTreeStrategy, JunctionTreeStrategy};
use crate::static_triangulation::StaticTriangulation;

/// Triangulation of an undirected graph into a junction tree.
///
/// Every query runs the elimination on first use and is memoized until the
/// graph is rebound.
pub trait Triangulation {
    /// The underlying driver.
    fn as_static(&self) -> &StaticTriangulation;

    /// The underlying driver, mutably.
    fn as_static_mut(&mut self) -> &mut StaticTriangulation;

    /// Bind a graph and its domain sizes, discarding previous results.
    fn set_graph(&mut self, graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> Result<()> {
        self.as_static_mut().set_graph(graph, domain_sizes)
    }

    /// Forget the graph and every derived structure.
    fn clear(&mut self) {
        self.as_static_mut().clear()
    }

    /// Current configuration.
    fn config(&self) -> &TriangulationConfig {
        self.as_static().config()
    }

    /// Replace the configuration, discarding computed results.
    fn set_config(&mut self, config: TriangulationConfig) -> Result<()> {
        self.as_static_mut().set_config(config)
    }

    /// Replace the junction tree strategy, keeping the elimination result.
    fn set_junction_tree_strategy(&mut self, strategy: Box<dyn JunctionTreeStrategy>) {
        self.as_static_mut().set_junction_tree_strategy(strategy)
    }

    /// The triangulated graph.
    fn triangulated_graph(&mut self) -> Result<&UndirectedGraph> {
        self.as_static_mut().triangulated_graph()
    }

    /// Fill-in edges, empty unless requested by the configuration or the
    /// junction tree strategy.
    fn fill_ins(&mut self) -> Result<&EdgeSet> {
        self.as_static_mut().fill_ins()
    }

    /// Nodes in elimination order.
    fn elimination_order(&mut self) -> Result<&[NodeId]> {
        self.as_static_mut().elimination_order()
    }

    /// Position of `node` in the elimination order.
    fn elimination_order_of(&mut self, node: NodeId) -> Result<usize> {
        self.as_static_mut().elimination_order_of(node)
    }

    /// Clique created by the elimination of `node`.
    fn eliminated_clique(&mut self, node: NodeId) -> Result<&NodeSet> {
        self.as_static_mut().eliminated_clique(node)
    }

    /// The elimination tree.
    fn elimination_tree(&mut self) -> Result<&CliqueGraph> {
        self.as_static_mut().elimination_tree()
    }

    /// The junction tree.
    fn junction_tree(&mut self) -> Result<&CliqueGraph> {
        self.as_static_mut().junction_tree()
    }

    /// Junction tree clique created by, or absorbing, each node's elimination.
    fn created_cliques(&mut self) -> Result<&BTreeMap<NodeId, CliqueId>> {
        self.as_static_mut().created_cliques()
    }

    /// Junction tree clique created by the elimination of `node`.
    fn created_clique(&mut self, node: NodeId) -> Result<CliqueId> {
        self.as_static_mut().created_clique(node)
    }

    /// Largest `log10` domain size product over the junction tree cliques.
    fn max_log10_clique_domain_size(&mut self) -> Result<f64> {
        self.as_static_mut().max_log10_clique_domain_size()
    }
}

impl Triangulation for StaticTriangulation {
    fn as_static(&self) -> &StaticTriangulation {
        self
    }

    fn as_static_mut(&mut self) -> &mut StaticTriangulation {
        self
    }
}

/// Triangulation driven by the weighted min-fill heuristic.
#[derive(Debug, Default)]
pub struct DefaultTriangulation {
    inner: StaticTriangulation,
}

impl DefaultTriangulation {
    /// Create an unbound triangulation.
    pub fn new(config: TriangulationConfig) -> Self {
        Self {
            inner: StaticTriangulation::new(
                Box::new(DefaultEliminationSequenceStrategy::new()),
                Box::new(DefaultJunctionTreeStrategy::new()),
                config,
            ),
        }
    }

    /// Create a triangulation already bound to `graph`.
    pub fn with_graph(
        graph: &UndirectedGraph,
        domain_sizes: &DomainSizes,
        config: TriangulationConfig,
    ) -> Result<Self> {
        let mut triangulation = Self::new(config);
        triangulation.set_graph(graph, domain_sizes)?;
        Ok(triangulation)
    }
}

impl Triangulation for DefaultTriangulation {
    fn as_static(&self) -> &StaticTriangulation {
        &self.inner
    }

    fn as_static_mut(&mut self) -> &mut StaticTriangulation {
        &mut self.inner
    }
}

/// Triangulation eliminating the nodes in an imposed order.
///
/// The order may list nodes absent from the graph; they are skipped. Binding a
/// graph with a node missing from the order fails with `IncompatibleOrder`.
///
/// With `minimality_required`, removing fill-ins can make the imposed order
/// imperfect for the thinned graph. It is then replaced by a maximum
/// cardinality search order (logged at `warn`), so
/// [`elimination_order`](Triangulation::elimination_order) may differ from
/// [`order`](Self::order).
#[derive(Debug)]
pub struct OrderedTriangulation {
    inner: StaticTriangulation,
    order: Vec<NodeId>,
}

impl OrderedTriangulation {
    /// Create an unbound triangulation imposing `order`.
    pub fn new(order: Vec<NodeId>, config: TriangulationConfig) -> Self {
        Self {
            inner: StaticTriangulation::new(
                Box::new(OrderedEliminationSequenceStrategy::with_order(order.clone())),
                Box::new(DefaultJunctionTreeStrategy::new()),
                config,
            ),
            order,
        }
    }

    /// Replace the order and rebind the current graph, if any.
    pub fn set_order(&mut self, order: Vec<NodeId>) -> Result<()> {
        self.order = order.clone();
        self.inner
            .set_elimination_strategy(Box::new(OrderedEliminationSequenceStrategy::with_order(order)))
    }

    /// The imposed order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }
}

impl Triangulation for OrderedTriangulation {
    fn as_static(&self) -> &StaticTriangulation {
        &self.inner
    }

    fn as_static_mut(&mut self) -> &mut StaticTriangulation {
        &mut self.inner
    }
}

/// Triangulation eliminating the subsets of a partial order one after the
/// other, using the min-fill heuristic inside each subset.
#[derive(Debug)]
pub struct PartialOrderedTriangulation {
    inner: StaticTriangulation,
    partial_order: Vec<NodeSet>,
}

impl PartialOrderedTriangulation {
    /// Create an unbound triangulation imposing `partial_order`.
    pub fn new(partial_order: Vec<NodeSet>, config: TriangulationConfig) -> Self {
        Self {
            inner: StaticTriangulation::new(
                Box::new(PartialOrderedEliminationSequenceStrategy::with_partial_order(
                    partial_order.clone(),
                )),
                Box::new(DefaultJunctionTreeStrategy::new()),
                config,
            ),
            partial_order,
        }
    }

    /// Replace the partial order and rebind the current graph, if any.
    pub fn set_partial_order(&mut self, partial_order: Vec<NodeSet>) -> Result<()> {
        self.partial_order = partial_order.clone();
        self.inner.set_elimination_strategy(Box::new(
            PartialOrderedEliminationSequenceStrategy::with_partial_order(partial_order),
        ))
    }

    /// The imposed subsets, in elimination order.
    pub fn partial_order(&self) -> &[NodeSet] {
        &self.partial_order
    }
}

impl Triangulation for PartialOrderedTriangulation {
    fn as_static(&self) -> &StaticTriangulation {
        &self.inner
    }

    fn as_static_mut(&mut self) -> &mut StaticTriangulation {
        &mut self.inner
    }
}
