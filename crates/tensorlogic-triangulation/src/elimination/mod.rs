//! Elimination sequence strategies.
//!
//! A strategy decides, at each step of a triangulation pass, which node of the
//! working graph is eliminated next. Three variants are provided:
//!
//! - [`DefaultEliminationSequenceStrategy`]: greedy weighted min-fill heuristic
//! - [`OrderedEliminationSequenceStrategy`]: a user-imposed total order
//! - [`PartialOrderedEliminationSequenceStrategy`]: ordered subsets of nodes,
//!   free order inside each subset
//!
//! The working graph is owned by the triangulation driver. A strategy is bound
//! to it with [`EliminationSequenceStrategy::set_graph`] and then receives it
//! explicitly on every call, so it never holds a reference of its own.

mod default;
mod ordered;
mod partial_ordered;

pub use default::DefaultEliminationSequenceStrategy;
pub use ordered::OrderedEliminationSequenceStrategy;
pub use partial_ordered::PartialOrderedEliminationSequenceStrategy;

use std::fmt;

use crate::error::Result;
use crate::graph::{DomainSizes, EdgeSet, NodeId, UndirectedGraph};

/// Policy deciding the order in which nodes are eliminated.
///
/// The driver calls, in lockstep and until the working graph is empty:
/// [`next_node_to_eliminate`](Self::next_node_to_eliminate), then (unless
/// [`provides_graph_update`](Self::provides_graph_update)) removes the node and
/// connects its neighbours itself, then
/// [`elimination_update`](Self::elimination_update).
pub trait EliminationSequenceStrategy: fmt::Debug {
    /// Bind the strategy to the working graph of a new triangulation pass.
    ///
    /// Resets any position state. Returns `false` when the strategy cannot
    /// triangulate this graph (e.g. an imposed order misses some of its nodes).
    fn set_graph(&mut self, graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> bool;

    /// The node the driver should eliminate next.
    ///
    /// Fails with `NotFound` if no graph is bound, the graph is empty, or the
    /// imposed order is exhausted or does not match the graph.
    fn next_node_to_eliminate(&mut self, graph: &UndirectedGraph) -> Result<NodeId>;

    /// Inform the strategy that `node` has just been eliminated.
    ///
    /// When [`provides_graph_update`](Self::provides_graph_update) is `true`
    /// the strategy removes `node` from `graph` here; otherwise the driver has
    /// already done it. Fails with `OutOfBounds` if `node` is not the node the
    /// strategy expected.
    fn elimination_update(&mut self, graph: &mut UndirectedGraph, node: NodeId) -> Result<()>;

    /// Whether [`fill_ins`](Self::fill_ins) reports the fill-in edges.
    fn provides_fill_ins(&self) -> bool;

    /// Whether [`elimination_update`](Self::elimination_update) updates the graph.
    fn provides_graph_update(&self) -> bool;

    /// Tell a fill-in capable strategy whether the caller needs fill-ins at all.
    fn ask_fill_ins(&mut self, do_it: bool);

    /// Fill-in edges added so far during the current pass.
    fn fill_ins(&self) -> &EdgeSet;

    /// Return to the "bound to no graph" state.
    fn clear(&mut self);
}
