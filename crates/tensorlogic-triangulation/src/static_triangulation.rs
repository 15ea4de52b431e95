//! Triangulation driver.
//!
//! [`StaticTriangulation`] owns a copy of the input graph and runs one
//! elimination pass over it on demand: the bound elimination sequence strategy
//! picks the nodes, the driver records the cliques, and the bound junction tree
//! strategy assembles the tree from the resulting [`EliminationRecord`].
//!
//! All derived structures are computed once on first access and kept until the
//! graph, the configuration or a strategy is replaced.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

use crate::clique_graph::{CliqueGraph, CliqueId};
use crate::config::TriangulationConfig;
use crate::elimination::{DefaultEliminationSequenceStrategy, EliminationSequenceStrategy};
use crate::error::{Result, TriangulationError};
use crate::graph::{check_domain_sizes, DomainSizes, EdgeSet, NodeId, NodeSet, UndirectedGraph};
use crate::junction_tree::{DefaultJunctionTreeStrategy, JunctionTreeStrategy};
use crate::record::EliminationRecord;

/// Triangulation of a fixed graph with pluggable strategies.
pub struct StaticTriangulation {
    elimination: Box<dyn EliminationSequenceStrategy>,
    junction: Box<dyn JunctionTreeStrategy>,
    config: TriangulationConfig,
    /// Graph as given by the caller, never mutated
    original: Option<UndirectedGraph>,
    domain_sizes: DomainSizes,
    /// Copy consumed by the elimination pass
    working: UndirectedGraph,
    record: Option<Rc<EliminationRecord>>,
}

impl StaticTriangulation {
    /// Create an unbound triangulation with the given strategies.
    pub fn new(
        elimination: Box<dyn EliminationSequenceStrategy>,
        junction: Box<dyn JunctionTreeStrategy>,
        config: TriangulationConfig,
    ) -> Self {
        Self {
            elimination,
            junction,
            config,
            original: None,
            domain_sizes: DomainSizes::new(),
            working: UndirectedGraph::new(),
            record: None,
        }
    }

    /// Bind a graph and its domain sizes.
    ///
    /// The graph is copied. Any previous result is discarded. Fails if a node
    /// has no positive domain size or if the elimination strategy rejects the
    /// graph; the triangulation is then left unbound.
    pub fn set_graph(&mut self, graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> Result<()> {
        self.clear();
        check_domain_sizes(graph, domain_sizes)?;
        self.original = Some(graph.clone());
        self.domain_sizes = domain_sizes.clone();
        self.rebind()
    }

    /// Forget the graph and every derived structure.
    pub fn clear(&mut self) {
        self.original = None;
        self.domain_sizes.clear();
        self.working.clear();
        self.record = None;
        self.elimination.clear();
        self.junction.clear();
    }

    /// Whether a graph is bound.
    pub fn is_bound(&self) -> bool {
        self.original.is_some()
    }

    /// Current configuration.
    pub fn config(&self) -> &TriangulationConfig {
        &self.config
    }

    /// Replace the configuration, discarding any computed result.
    pub fn set_config(&mut self, config: TriangulationConfig) -> Result<()> {
        self.config = config;
        self.rebind()
    }

    /// Replace the elimination sequence strategy and bind it to the current graph.
    pub fn set_elimination_strategy(
        &mut self,
        strategy: Box<dyn EliminationSequenceStrategy>,
    ) -> Result<()> {
        self.elimination = strategy;
        self.rebind()
    }

    /// Replace the junction tree strategy.
    ///
    /// An existing elimination result is kept and handed to the new strategy.
    pub fn set_junction_tree_strategy(&mut self, strategy: Box<dyn JunctionTreeStrategy>) {
        self.junction = strategy;
        if let Some(record) = &self.record {
            self.junction.set_triangulation(Rc::clone(record));
        }
    }

    /// Run the elimination pass now if it has not been run yet.
    pub fn triangulate(&mut self) -> Result<()> {
        self.ensure_triangulated().map(|_| ())
    }

    /// Graph bound by the last [`set_graph`](Self::set_graph).
    pub fn original_graph(&self) -> Result<&UndirectedGraph> {
        self.original.as_ref().ok_or_else(Self::unbound)
    }

    /// Domain sizes bound by the last [`set_graph`](Self::set_graph).
    pub fn domain_sizes(&self) -> Result<&DomainSizes> {
        if self.is_bound() {
            Ok(&self.domain_sizes)
        } else {
            Err(Self::unbound())
        }
    }

    /// Shared handle on the elimination result.
    pub fn elimination_record(&mut self) -> Result<Rc<EliminationRecord>> {
        self.ensure_triangulated().map(Rc::clone)
    }

    /// The triangulated graph.
    pub fn triangulated_graph(&mut self) -> Result<&UndirectedGraph> {
        Ok(self.ensure_triangulated()?.triangulated_graph())
    }

    /// Fill-in edges; empty unless `fill_ins_required` is set or the junction
    /// tree strategy needs them.
    pub fn fill_ins(&mut self) -> Result<&EdgeSet> {
        Ok(self.ensure_triangulated()?.fill_ins())
    }

    /// Nodes in elimination order.
    pub fn elimination_order(&mut self) -> Result<&[NodeId]> {
        Ok(self.ensure_triangulated()?.elimination_order())
    }

    /// Position of `node` in the elimination order.
    pub fn elimination_order_of(&mut self, node: NodeId) -> Result<usize> {
        self.ensure_triangulated()?
            .position(node)
            .ok_or_else(|| Self::unknown_node(node))
    }

    /// Clique created by the elimination of `node`.
    pub fn eliminated_clique(&mut self, node: NodeId) -> Result<&NodeSet> {
        self.ensure_triangulated()?
            .eliminated_clique(node)
            .ok_or_else(|| Self::unknown_node(node))
    }

    /// Clique created by each eliminated node.
    pub fn eliminated_cliques(&mut self) -> Result<&BTreeMap<NodeId, NodeSet>> {
        Ok(self.ensure_triangulated()?.eliminated_cliques())
    }

    /// The elimination tree.
    pub fn elimination_tree(&mut self) -> Result<&CliqueGraph> {
        Ok(self.ensure_triangulated()?.elimination_tree())
    }

    /// The junction tree built by the junction tree strategy.
    pub fn junction_tree(&mut self) -> Result<&CliqueGraph> {
        self.ensure_triangulated()?;
        self.junction.junction_tree()
    }

    /// For each node, the junction tree clique created by its elimination or
    /// the one that absorbed it.
    pub fn created_cliques(&mut self) -> Result<&BTreeMap<NodeId, CliqueId>> {
        self.ensure_triangulated()?;
        self.junction.created_cliques()
    }

    /// Junction tree clique created by the elimination of `node`.
    pub fn created_clique(&mut self, node: NodeId) -> Result<CliqueId> {
        self.ensure_triangulated()?;
        self.junction.created_clique(node)
    }

    /// Largest `log10` domain size product over the junction tree cliques.
    pub fn max_log10_clique_domain_size(&mut self) -> Result<f64> {
        self.ensure_triangulated()?;
        let tree = self.junction.junction_tree()?;
        tree.max_log10_domain_size(&self.domain_sizes)
    }

    /// Reset the working copy and bind the elimination strategy to it again.
    fn rebind(&mut self) -> Result<()> {
        self.record = None;
        self.junction.clear();
        let Some(original) = &self.original else {
            self.elimination.clear();
            return Ok(());
        };
        self.working = original.clone();

        if !self.elimination.set_graph(&self.working, &self.domain_sizes) {
            let nodes = self.working.size();
            warn!(nodes, "elimination strategy rejected the graph");
            self.clear();
            return Err(TriangulationError::IncompatibleOrder(format!(
                "the elimination strategy cannot eliminate this graph of {} nodes",
                nodes
            )));
        }
        Ok(())
    }

    fn ensure_triangulated(&mut self) -> Result<&Rc<EliminationRecord>> {
        if self.record.is_none() {
            let record = match self.eliminate_all() {
                Ok(record) => Rc::new(record),
                Err(err) if self.is_bound() => {
                    // The pass consumed part of the working copy
                    warn!(error = %err, "elimination pass failed, restoring the bound graph");
                    if let Err(rebind_err) = self.rebind() {
                        debug!(error = %rebind_err, "rebinding after a failed pass failed");
                    }
                    return Err(err);
                }
                Err(err) => return Err(err),
            };
            self.junction.set_triangulation(Rc::clone(&record));
            self.record = Some(record);
        }
        self.record.as_ref().ok_or_else(Self::unbound)
    }

    /// The elimination loop.
    fn eliminate_all(&mut self) -> Result<EliminationRecord> {
        let original = self.original.as_ref().ok_or_else(Self::unbound)?;

        let needs_fill_ins = self.config.fill_ins_required || self.junction.requires_fill_ins();
        self.elimination.ask_fill_ins(needs_fill_ins);
        let strategy_fill_ins = self.elimination.provides_fill_ins();
        let strategy_updates = self.elimination.provides_graph_update();

        let total = self.working.size();
        let mut order = Vec::with_capacity(total);
        let mut cliques = BTreeMap::new();
        let mut fill_ins = EdgeSet::new();

        debug!(
            nodes = total,
            edges = self.working.size_edges(),
            minimality = self.config.minimality_required,
            "triangulation started"
        );

        while !self.working.is_empty() {
            if order.len() == total {
                return Err(TriangulationError::OutOfBounds(format!(
                    "working graph still has {} nodes after {} eliminations",
                    self.working.size(),
                    total
                )));
            }

            let node = self.elimination.next_node_to_eliminate(&self.working)?;
            let mut clique = self.working.neighbours(node)?.clone();
            clique.insert(node);

            if !strategy_updates {
                let added = self.working.eliminate_node(node)?;
                if needs_fill_ins {
                    fill_ins.extend(added);
                }
            } else if needs_fill_ins && !strategy_fill_ins {
                fill_ins.extend(self.working.missing_edges_among(&clique));
            }

            self.elimination
                .elimination_update(&mut self.working, node)?;
            if self.working.exists_node(node) {
                return Err(TriangulationError::OutOfBounds(format!(
                    "node {} was not removed from the working graph",
                    node
                )));
            }

            trace!(node, clique = clique.len(), step = order.len(), "node eliminated");
            order.push(node);
            cliques.insert(node, clique);
        }

        if needs_fill_ins && strategy_updates && strategy_fill_ins {
            fill_ins = self.elimination.fill_ins().clone();
        }

        let mut record = EliminationRecord::new(original, order, cliques, fill_ins)?;
        if self.config.minimality_required {
            record = record.thinned(original, needs_fill_ins)?;
        }

        debug!(
            nodes = total,
            edges = record.triangulated_graph().size_edges(),
            added = record.triangulated_graph().size_edges() - original.size_edges(),
            "triangulation done"
        );
        Ok(record)
    }

    fn unbound() -> TriangulationError {
        TriangulationError::UndefinedElement("no graph bound to the triangulation".to_string())
    }

    fn unknown_node(node: NodeId) -> TriangulationError {
        TriangulationError::UndefinedElement(format!("node {} is not in the triangulated graph", node))
    }
}

impl Default for StaticTriangulation {
    fn default() -> Self {
        Self::new(
            Box::new(DefaultEliminationSequenceStrategy::new()),
            Box::new(DefaultJunctionTreeStrategy::new()),
            TriangulationConfig::default(),
        )
    }
}

impl fmt::Debug for StaticTriangulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTriangulation")
            .field("elimination", &self.elimination)
            .field("junction", &self.junction)
            .field("config", &self.config)
            .field("nodes", &self.original.as_ref().map(UndirectedGraph::size))
            .field("triangulated", &self.record.is_some())
            .finish()
    }
}
